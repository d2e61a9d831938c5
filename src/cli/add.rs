use std::path::PathBuf;

use anyhow::Context as _;
use contextgit::{
    Node, NodeId,
    domain::{NodeType, Status},
    fingerprint,
};
use non_empty_string::NonEmptyString;
use tracing::instrument;

use super::{Context, parse_node_id, relative_path};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The requirement tier, e.g. 'business' or 'system'
    node_type: NodeType,

    /// The requirement's title
    #[arg(long, short)]
    title: String,

    /// The document declaring the requirement
    #[arg(long, short)]
    file: PathBuf,

    /// Heading breadcrumb of the requirement's section, e.g.
    /// 'Requirements/Authentication' (default: the whole file)
    #[arg(long, short, value_delimiter = '/')]
    location: Vec<String>,

    /// Lifecycle status
    #[arg(long, short)]
    status: Option<Status>,

    /// Explicit id (default: the next free id for the tier)
    #[arg(long, value_parser = parse_node_id)]
    id: Option<NodeId>,
}

impl Command {
    #[instrument(level = "debug", skip(context))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let repository = context.repository()?;
        let mut index = repository.load_index()?;

        let id = match self.id {
            Some(id) => id,
            None => index.next_id(&self.node_type)?,
        };
        let title = NonEmptyString::new(self.title)
            .map_err(|_| anyhow::anyhow!("title must not be empty"))?;
        let file = relative_path(&repository, &self.file)?;

        let mut node = Node::new(id, self.node_type, title, file).with_location(self.location);
        if let Some(status) = self.status {
            node = node.with_status(status);
        }

        let content = repository
            .extract(&node)
            .with_context(|| format!("cannot read the text of {}", node.id))?;
        node.checksum = fingerprint(content.as_bytes());

        index.add_node(node.clone())?;
        repository.save_index(&index)?;

        println!("{}", context.renderer(&repository).added(&node));
        Ok(())
    }
}
