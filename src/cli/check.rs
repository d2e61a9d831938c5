use std::process;

use contextgit::{Repository, SyncReport, recompute_sync_status};
use tracing::instrument;

use super::Context;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Report link status without updating the index
    #[arg(long)]
    dry_run: bool,
}

impl Command {
    #[instrument(level = "debug", skip(context))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let repository = context.repository()?;
        let report = self.execute(&repository)?;

        println!(
            "{}",
            context
                .renderer(&repository)
                .checked(&report, !self.dry_run)
        );

        if !report.is_clean() {
            process::exit(2);
        }
        Ok(())
    }

    fn execute(&self, repository: &Repository) -> anyhow::Result<SyncReport> {
        let mut index = repository.load_index()?;
        let report = recompute_sync_status(&mut index, repository);
        if !self.dry_run {
            repository.save_index(&index)?;
        }
        Ok(report)
    }
}
