use anyhow::Context as _;
use contextgit::domain::NodeType;
use tracing::instrument;

use super::Context;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The requirement tier, e.g. 'business'
    node_type: NodeType,
}

impl Command {
    #[instrument(level = "debug", skip(context))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let repository = context.repository()?;
        let index = repository.load_index()?;

        let id = index.next_id(&self.node_type).with_context(|| {
            let tiers: Vec<_> = repository
                .config()
                .tiers()
                .map(|(tier, prefix)| format!("{tier} ({prefix})"))
                .collect();
            format!("configured tiers: {}", tiers.join(", "))
        })?;

        println!("{}", context.renderer(&repository).next_id(&id));
        Ok(())
    }
}
