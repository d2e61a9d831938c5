use std::process;

use contextgit::Index;
use tracing::instrument;

use super::{Context, render::Summary};

#[derive(Debug, clap::Parser, Default)]
#[command(about = "Show requirement counts, link health and cycles")]
pub struct Command {}

impl Command {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let repository = context.repository()?;
        let index = repository.load_index()?;

        let summary = summarise(&index);
        println!("{}", context.renderer(&repository).summary(&summary));

        if !summary.cycles.is_empty() {
            process::exit(3);
        }
        Ok(())
    }
}

/// Counts per tier and per recorded link status, plus the cycles.
///
/// Link statuses are reported as stored; run `check` to refresh them.
fn summarise(index: &Index) -> Summary {
    let mut summary = Summary::default();
    for node in index.nodes() {
        *summary
            .types
            .entry(node.node_type.to_string())
            .or_default() += 1;
    }
    for link in index.links() {
        *summary.links.entry(link.sync_status).or_default() += 1;
    }
    summary.cycles = index.cycles();
    summary
}

#[cfg(test)]
mod tests {
    use contextgit::{Config, SyncStatus, storage::index_file};

    use super::*;

    #[test]
    fn counts_types_and_link_statuses() {
        let index = index_file::parse(
            "nodes:\n\
             - {id: BR-001, type: business, title: A, file: a.md, status: active}\n\
             - {id: BR-002, type: business, title: B, file: a.md, status: active}\n\
             - {id: SR-001, type: system, title: C, file: b.rs, status: draft}\n\
             links:\n\
             - {from: SR-001, to: BR-001, relation_type: refines, sync_status: stale}\n\
             - {from: SR-001, to: BR-002, relation_type: refines, sync_status: ok}\n",
            &Config::default(),
        )
        .unwrap();

        let summary = summarise(&index);

        assert_eq!(summary.types["business"], 2);
        assert_eq!(summary.types["system"], 1);
        assert_eq!(summary.links[&SyncStatus::Ok], 1);
        assert_eq!(summary.links[&SyncStatus::Stale], 1);
        assert!(!summary.links.contains_key(&SyncStatus::Broken));
        assert!(summary.cycles.is_empty());
    }

    #[test]
    fn reports_cycles() {
        let index = index_file::parse(
            "nodes:\n\
             - {id: BR-001, type: business, title: A, file: a.md, status: active}\n\
             - {id: BR-002, type: business, title: B, file: a.md, status: active}\n\
             links:\n\
             - {from: BR-001, to: BR-002, relation_type: depends_on}\n\
             - {from: BR-002, to: BR-001, relation_type: depends_on}\n",
            &Config::default(),
        )
        .unwrap();

        let summary = summarise(&index);

        assert_eq!(summary.cycles.len(), 1);
        assert_eq!(summary.cycles[0].len(), 2);
    }
}
