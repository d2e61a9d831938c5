use contextgit::{Link, NodeId, domain::{RelationType, target_status}};
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

    /// The kind of relation
    #[arg(long, default_value = "refines")]
    relation: RelationType,
}

impl Command {
    #[instrument(level = "debug", skip(context))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let repository = context.repository()?;
        let mut index = repository.load_index()?;

        let mut link = Link::new(self.from, self.to, self.relation);
        if let Some(target) = index.node(&link.to) {
            link.sync_status = target_status(target, &repository);
        }

        let created = index.add_link(link.clone())?;
        if created {
            repository.save_index(&index)?;
        } else {
            tracing::info!(from = %link.from, to = %link.to, "link already exists");
        }

        println!("{}", context.renderer(&repository).linked(&link, created));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use contextgit::{Index, IndexError, Node, Repository, SyncStatus, fingerprint};
    use non_empty_string::NonEmptyString;
    use tempfile::tempdir;

    use super::*;

    fn id(s: &str) -> NodeId {
        s.parse().unwrap()
    }

    fn setup(recorded: &str) -> (tempfile::TempDir, Repository) {
        let tmp = tempdir().unwrap();
        let repository = Repository::init(tmp.path(), false).unwrap();
        fs::write(tmp.path().join("req.md"), "Log every request.").unwrap();

        let mut index = Index::with_config(repository.config());
        for (node_id, node_type) in [("BR-001", "business"), ("SR-001", "system")] {
            let node = Node::new(
                id(node_id),
                node_type.parse().unwrap(),
                NonEmptyString::new(format!("Requirement {node_id}")).unwrap(),
                "req.md".to_string(),
            )
            .with_checksum(fingerprint(recorded.as_bytes()));
            index.add_node(node).unwrap();
        }
        repository.save_index(&index).unwrap();
        (tmp, repository)
    }

    fn command(from: &str, to: &str) -> Command {
        Command {
            from: id(from),
            to: id(to),
            relation: RelationType::refines(),
        }
    }

    #[test]
    fn link_is_saved_in_sync() {
        let (tmp, repository) = setup("Log every request.");

        command("SR-001", "BR-001").run(&Context::at(tmp.path())).unwrap();

        let index = repository.load_index().unwrap();
        assert_eq!(index.links().len(), 1);
        assert_eq!(index.links()[0].sync_status, SyncStatus::Ok);
    }

    #[test]
    fn link_to_drifted_target_starts_stale() {
        let (tmp, repository) = setup("Something else.");

        command("SR-001", "BR-001").run(&Context::at(tmp.path())).unwrap();

        let index = repository.load_index().unwrap();
        assert_eq!(index.links()[0].sync_status, SyncStatus::Stale);
    }

    #[test]
    fn duplicate_link_is_not_stored_twice() {
        let (tmp, repository) = setup("Log every request.");
        let context = Context::at(tmp.path());

        command("SR-001", "BR-001").run(&context).unwrap();
        command("SR-001", "BR-001").run(&context).unwrap();

        assert_eq!(repository.load_index().unwrap().links().len(), 1);
    }

    #[test]
    fn dangling_and_self_links_are_rejected() {
        let (tmp, repository) = setup("Log every request.");
        let context = Context::at(tmp.path());

        let err = command("SR-001", "BR-009").run(&context).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IndexError>(),
            Some(IndexError::DanglingReference { .. })
        ));

        let err = command("SR-001", "SR-001").run(&context).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IndexError>(),
            Some(IndexError::SelfLoop(_))
        ));

        assert!(repository.load_index().unwrap().links().is_empty());
    }
}
