use std::path::PathBuf;

use contextgit::{Config, Repository};
use tracing::instrument;

use super::Context;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Directory to initialise (default: --root, or the current directory)
    dir: Option<PathBuf>,

    /// Overwrite an existing configuration and index
    #[arg(long, short)]
    force: bool,
}

impl Command {
    #[instrument(level = "debug", skip(context))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let dir = match (self.dir, &context.root) {
            (Some(dir), _) => dir,
            (None, Some(root)) => root.clone(),
            (None, None) => super::current_dir()?,
        };

        let repository = Repository::init(&dir, self.force)?;

        let renderer = context.format.renderer(Config::default().sync_labels().clone());
        println!("{}", renderer.initialised(repository.root()));
        Ok(())
    }
}
