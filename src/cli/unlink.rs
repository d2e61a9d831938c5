use contextgit::NodeId;
use tracing::instrument;

use super::{Context, parse_node_id};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The more detailed requirement
    #[clap(value_parser = parse_node_id)]
    from: NodeId,

    /// The requirement it refines
    #[clap(value_parser = parse_node_id)]
    to: NodeId,
}

impl Command {
    #[instrument(level = "debug", skip(context))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let repository = context.repository()?;
        let mut index = repository.load_index()?;

        let removed = index.remove_link(&self.from, &self.to);
        if removed == 0 {
            anyhow::bail!("{} is not linked to {}", self.from, self.to);
        }
        repository.save_index(&index)?;

        println!(
            "{}",
            context
                .renderer(&repository)
                .unlinked(&self.from, &self.to, removed)
        );
        Ok(())
    }
}
