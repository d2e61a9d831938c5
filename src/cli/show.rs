use contextgit::NodeId;
use tracing::instrument;

use super::{Context, parse_node_id, render::NodeDetail};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The requirement to show
    #[clap(value_parser = parse_node_id)]
    id: NodeId,
}

impl Command {
    #[instrument(level = "debug", skip(context))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let repository = context.repository()?;
        let index = repository.load_index()?;

        let Some(node) = index.node(&self.id) else {
            anyhow::bail!("requirement {} not found", self.id);
        };
        let detail = NodeDetail {
            node,
            outgoing: index.outgoing_links(&self.id).collect(),
            incoming: index.incoming_links(&self.id).collect(),
        };

        println!("{}", context.renderer(&repository).node(&detail));
        Ok(())
    }
}
