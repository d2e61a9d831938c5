use std::path::{Path, PathBuf};

mod add;
mod check;
mod confirm;
mod extract;
mod init;
mod link;
mod next_id;
mod relevant;
mod render;
mod show;
mod status;
mod terminal;
mod unlink;

use anyhow::Context as _;
use clap::ArgAction;
use contextgit::{NodeId, Repository};
use render::{Format, Renderer};

/// Parse a node id, normalizing to uppercase.
///
/// This is a CLI boundary function that accepts lowercase input
/// and normalizes it before parsing.
fn parse_node_id(s: &str) -> Result<NodeId, String> {
    s.to_uppercase().parse().map_err(|e| format!("{e}"))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The repository root (default: search upward from the current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let context = Context {
            root: self.root,
            format: self.format,
        };
        self.command
            .unwrap_or(Command::Status(status::Command {}))
            .run(&context)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    root: Option<PathBuf>,
    format: Format,
}

impl Context {
    /// Context for a repository rooted at `root`, used by the command tests.
    #[cfg(test)]
    pub fn at(root: &Path) -> Self {
        Self {
            root: Some(root.to_path_buf()),
            format: Format::Json,
        }
    }

    /// Open the repository at `--root`, or the one containing the working
    /// directory.
    fn repository(&self) -> anyhow::Result<Repository> {
        let repository = match &self.root {
            Some(root) => Repository::open(root.clone())?,
            None => Repository::discover(&current_dir()?)?,
        };
        Ok(repository)
    }

    fn renderer(&self, repository: &Repository) -> Box<dyn Renderer> {
        self.format
            .renderer(repository.config().sync_labels().clone())
    }
}

/// Resolve a user-supplied path to its repository-relative form.
fn relative_path(repository: &Repository, path: &Path) -> anyhow::Result<String> {
    Ok(repository.relative_path(path, &current_dir()?))
}

fn current_dir() -> anyhow::Result<PathBuf> {
    std::env::current_dir().context("failed to determine the working directory")
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show requirement counts, link health and cycles (default)
    Status(status::Command),

    /// Initialise a new repository
    Init(init::Command),

    /// Register a requirement declared in a document
    Add(add::Command),

    /// Link a requirement to the one it refines
    Link(link::Command),

    /// Remove the links between two requirements
    Unlink(unlink::Command),

    /// Print the next free id for a requirement tier
    NextId(next_id::Command),

    /// Show a requirement and its links
    Show(show::Command),

    /// Print the current text of a requirement
    Extract(extract::Command),

    /// List the requirements relevant to a file
    ///
    /// Starts from the requirements declared in the file and follows links
    /// upstream, breadth-first, up to the given depth.
    Relevant(relevant::Command),

    /// Recompute the sync status of every link
    ///
    /// Exits with code 2 if any link is stale or broken.
    Check(check::Command),

    /// Acknowledge that a requirement's current text is correct
    ///
    /// Records the requirement's current checksum and marks every link to it
    /// as in sync.
    Confirm(confirm::Command),
}

impl Command {
    fn run(self, context: &Context) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(context),
            Self::Init(command) => command.run(context),
            Self::Add(command) => command.run(context),
            Self::Link(command) => command.run(context),
            Self::Unlink(command) => command.run(context),
            Self::NextId(command) => command.run(context),
            Self::Show(command) => command.run(context),
            Self::Extract(command) => command.run(context),
            Self::Relevant(command) => command.run(context),
            Self::Check(command) => command.run(context),
            Self::Confirm(command) => command.run(context),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use test_case::test_case;

    use super::*;

    #[test_case("br-001", "BR-001"; "lowercase is normalised")]
    #[test_case("SR-12", "SR-12"; "padding is preserved")]
    fn parses_node_ids(input: &str, expected: &str) {
        assert_eq!(parse_node_id(input).unwrap().as_str(), expected);
    }

    #[test]
    fn rejects_malformed_node_ids() {
        assert!(parse_node_id("BR001").is_err());
    }

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "contextgit",
            "relevant",
            "src/api.py",
            "--format",
            "json",
            "--root",
            "/repo",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.root.as_deref(), Some(Path::new("/repo")));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Command::Relevant(_))));
    }

    #[test]
    fn defaults_to_status() {
        let cli = Cli::try_parse_from(["contextgit"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.format, Format::Text);
    }

    #[test]
    fn clap_configuration_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
