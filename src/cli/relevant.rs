use std::path::PathBuf;

use contextgit::find_relevant;
use tracing::instrument;

use super::{Context, relative_path};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The source file
    file: PathBuf,

    /// How many links to follow upstream
    #[arg(long, short, default_value_t = 3)]
    depth: usize,
}

impl Command {
    #[instrument(level = "debug", skip(context))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let repository = context.repository()?;
        let index = repository.load_index()?;

        let file = relative_path(&repository, &self.file)?;
        let nodes = find_relevant(&index, &file, self.depth);

        println!("{}", context.renderer(&repository).relevant(&file, &nodes));
        Ok(())
    }
}
