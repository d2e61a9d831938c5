use std::process;

use anyhow::Context as _;
use contextgit::{NodeId, fingerprint};
use tracing::instrument;

use super::{Context, parse_node_id};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The requirement whose current text is correct
    #[clap(value_parser = parse_node_id)]
    id: NodeId,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Command {
    #[instrument(level = "debug", skip(context))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let repository = context.repository()?;
        let mut index = repository.load_index()?;

        let Some(node) = index.node(&self.id) else {
            anyhow::bail!("requirement {} not found", self.id);
        };
        let content = repository
            .extract(node)
            .with_context(|| format!("cannot confirm {}", self.id))?;
        let checksum = fingerprint(content.as_bytes());

        if checksum == node.checksum {
            tracing::info!(id = %self.id, "checksum unchanged");
        }

        if !self.yes {
            let incoming = index.incoming_links(&self.id).count();
            let proceed = dialoguer::Confirm::new()
                .with_prompt(format!(
                    "Record the current text of {} and mark {incoming} incoming links in sync?",
                    self.id
                ))
                .default(false)
                .interact()?;
            if !proceed {
                println!("Cancelled");
                process::exit(130);
            }
        }

        let reset = index.confirm(&self.id, checksum)?;
        repository.save_index(&index)?;

        let node = index
            .node(&self.id)
            .with_context(|| format!("requirement {} vanished", self.id))?;
        println!("{}", context.renderer(&repository).confirmed(node, reset));
        Ok(())
    }
}
