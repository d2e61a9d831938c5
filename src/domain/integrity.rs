//! Link integrity checking.
//!
//! A link is only as trustworthy as its target: if the requirement a link
//! points at has been edited since its fingerprint was recorded, the link is
//! [`SyncStatus::Stale`]; if the requirement can no longer be found at all,
//! it is [`SyncStatus::Broken`].

use std::collections::HashMap;

use tracing::instrument;

use crate::domain::{Index, Node, NodeId, SyncStatus, fingerprint};

/// Supplies the current content of a node.
///
/// Implementations typically read the node's `file` and extract the section
/// named by its `location`. Returning `None` signals that the content cannot
/// be located (file deleted, heading removed), which marks links to the node
/// as [`SyncStatus::Broken`].
pub trait ContentResolver {
    /// The bytes the node's checksum should reflect, or `None` if they cannot
    /// be found.
    fn resolve(&self, node: &Node) -> Option<Vec<u8>>;
}

impl<F> ContentResolver for F
where
    F: Fn(&Node) -> Option<Vec<u8>>,
{
    fn resolve(&self, node: &Node) -> Option<Vec<u8>> {
        self(node)
    }
}

/// A link whose status was recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkChange {
    /// The link's source.
    pub from: NodeId,
    /// The link's target.
    pub to: NodeId,
    /// Status before recomputation.
    pub previous: SyncStatus,
    /// Status after recomputation.
    pub current: SyncStatus,
}

impl LinkChange {
    /// Whether the recomputation changed the status.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// The outcome of [`recompute_sync_status`], one entry per link in stored
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Every link with its old and new status.
    pub links: Vec<LinkChange>,
}

impl SyncReport {
    /// Links whose status changed.
    pub fn changes(&self) -> impl Iterator<Item = &LinkChange> {
        self.links.iter().filter(|link| link.changed())
    }

    /// Number of links currently in `status`.
    #[must_use]
    pub fn count(&self, status: SyncStatus) -> usize {
        self.links
            .iter()
            .filter(|link| link.current == status)
            .count()
    }

    /// Returns `true` if every link is [`SyncStatus::Ok`].
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.links.iter().all(|link| !link.current.needs_attention())
    }
}

/// Recompute the sync status of every link in `index`.
///
/// For each link, the current content of its target is obtained from
/// `resolver` and fingerprinted. If the content cannot be found the link is
/// broken; if the fingerprint differs from the target's recorded checksum the
/// link is stale; otherwise it is ok.
///
/// Node checksums are never modified; see [`Index::confirm`]. The resolver is
/// consulted at most once per distinct target, and running this twice with
/// unchanged content yields the same statuses.
///
/// # Panics
///
/// Panics if a link targets a node missing from the index, which
/// [`Index::add_link`] rules out.
#[instrument(level = "debug", skip_all, fields(links = index.links().len()))]
pub fn recompute_sync_status<R>(index: &mut Index, resolver: &R) -> SyncReport
where
    R: ContentResolver + ?Sized,
{
    let mut by_target: HashMap<&NodeId, SyncStatus> = HashMap::new();
    let mut statuses = Vec::with_capacity(index.links().len());

    for link in index.links() {
        let status = *by_target.entry(&link.to).or_insert_with(|| {
            // Links are validated on insertion, so the target always exists.
            let target = index
                .node(&link.to)
                .expect("link target must exist in a well-formed index");
            target_status(target, resolver)
        });
        statuses.push((link.from.clone(), link.to.clone(), link.sync_status, status));
    }

    let mut report = SyncReport::default();
    for (position, (from, to, previous, current)) in statuses.into_iter().enumerate() {
        index.set_sync_status(position, current);
        report.links.push(LinkChange {
            from,
            to,
            previous,
            current,
        });
    }

    tracing::debug!(
        stale = report.count(SyncStatus::Stale),
        broken = report.count(SyncStatus::Broken),
        "recomputed link status"
    );
    report
}

/// The status a link to `target` should have, given its current content.
///
/// This is the per-target rule [`recompute_sync_status`] applies to every
/// link; it is exposed so a single new link can be given its status up front.
pub fn target_status<R>(target: &Node, resolver: &R) -> SyncStatus
where
    R: ContentResolver + ?Sized,
{
    let Some(content) = resolver.resolve(target) else {
        tracing::debug!(node = %target.id, file = %target.file, "content not found");
        return SyncStatus::Broken;
    };

    let current = fingerprint(&content);
    if current == target.checksum {
        SyncStatus::Ok
    } else {
        tracing::debug!(
            node = %target.id,
            recorded = %target.checksum,
            %current,
            "content changed"
        );
        SyncStatus::Stale
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap};

    use super::*;
    use crate::domain::index::tests::{index, node};

    fn id(s: &str) -> NodeId {
        s.parse().unwrap()
    }

    /// Resolves nodes from a fixed table; absent entries are not found.
    struct Table(HashMap<&'static str, &'static str>);

    impl ContentResolver for Table {
        fn resolve(&self, node: &Node) -> Option<Vec<u8>> {
            self.0
                .get(node.id.as_str())
                .map(|content| content.as_bytes().to_vec())
        }
    }

    fn scenario() -> Index {
        let mut index = Index::default();
        index
            .add_node(node("BR-001", "docs/req.md").with_checksum(fingerprint(b"Log every request.")))
            .unwrap();
        index.add_node(node("SR-001", "src/api.py")).unwrap();
        index
            .add_link(crate::Link::refines(id("SR-001"), id("BR-001")))
            .unwrap();
        index
    }

    #[test]
    fn matching_content_is_ok() {
        let mut index = scenario();
        let resolver = Table([("BR-001", "Log every request.")].into());

        let report = recompute_sync_status(&mut index, &resolver);

        assert_eq!(index.links()[0].sync_status, SyncStatus::Ok);
        assert!(report.is_clean());
        assert_eq!(report.changes().count(), 0);
    }

    #[test]
    fn changed_content_is_stale() {
        let mut index = scenario();
        let resolver = Table([("BR-001", "Log every request and response.")].into());

        let report = recompute_sync_status(&mut index, &resolver);

        assert_eq!(index.links()[0].sync_status, SyncStatus::Stale);
        let change = report.changes().next().unwrap();
        assert_eq!(change.previous, SyncStatus::Ok);
        assert_eq!(change.current, SyncStatus::Stale);
    }

    #[test]
    fn recorded_checksum_from_elsewhere_is_stale() {
        let mut index = Index::default();
        index
            .add_node(node("BR-001", "docs/req.md").with_checksum("abc123".to_string()))
            .unwrap();
        index.add_node(node("SR-001", "src/api.py")).unwrap();
        index
            .add_link(crate::Link::refines(id("SR-001"), id("BR-001")))
            .unwrap();
        let resolver = Table([("BR-001", "anything")].into());

        recompute_sync_status(&mut index, &resolver);

        assert_eq!(index.links()[0].sync_status, SyncStatus::Stale);
    }

    #[test]
    fn missing_content_is_broken_not_stale() {
        let mut index = scenario();
        let resolver = Table(HashMap::new());

        let report = recompute_sync_status(&mut index, &resolver);

        assert_eq!(index.links()[0].sync_status, SyncStatus::Broken);
        assert_eq!(report.count(SyncStatus::Broken), 1);
        assert_eq!(report.count(SyncStatus::Stale), 0);
    }

    #[test]
    fn drift_marks_every_incoming_link() {
        let mut index = index(
            &[
                ("BR-001", "docs/req.md"),
                ("SR-001", "src/a.py"),
                ("SR-002", "src/b.py"),
                ("AR-001", "docs/arch.md"),
            ],
            &[("SR-001", "BR-001"), ("SR-002", "BR-001"), ("AR-001", "SR-001")],
        );
        let resolver = |node: &Node| match node.id.as_str() {
            "BR-001" => Some(b"changed".to_vec()),
            _ => Some(Vec::new()),
        };
        // Both targets were last recorded with empty content.
        let empty = fingerprint(b"");
        for target in ["BR-001", "SR-001"] {
            index.confirm(&id(target), empty.clone()).unwrap();
        }

        recompute_sync_status(&mut index, &resolver);

        let statuses: Vec<_> = index.links().iter().map(|l| l.sync_status).collect();
        assert_eq!(
            statuses,
            [SyncStatus::Stale, SyncStatus::Stale, SyncStatus::Ok]
        );
    }

    #[test]
    fn recomputation_is_idempotent() {
        let mut index = scenario();
        let resolver = Table([("BR-001", "edited")].into());

        let first = recompute_sync_status(&mut index, &resolver);
        let after_first = index.clone();
        let second = recompute_sync_status(&mut index, &resolver);

        assert_eq!(index, after_first);
        assert_eq!(second.changes().count(), 0);
        assert_eq!(
            first.links.iter().map(|l| l.current).collect::<Vec<_>>(),
            second.links.iter().map(|l| l.current).collect::<Vec<_>>()
        );
    }

    #[test]
    fn checksums_are_not_modified() {
        let mut index = scenario();
        let before = index.node(&id("BR-001")).unwrap().checksum.clone();
        let resolver = Table([("BR-001", "edited")].into());

        recompute_sync_status(&mut index, &resolver);

        assert_eq!(index.node(&id("BR-001")).unwrap().checksum, before);
    }

    #[test]
    fn resolves_each_target_once() {
        let mut index = index(
            &[("BR-001", "a.md"), ("SR-001", "b.py"), ("SR-002", "c.py")],
            &[("SR-001", "BR-001"), ("SR-002", "BR-001")],
        );
        let calls = RefCell::new(Vec::new());
        let resolver = |node: &Node| -> Option<Vec<u8>> {
            calls.borrow_mut().push(node.id.to_string());
            None
        };

        recompute_sync_status(&mut index, &resolver);

        assert_eq!(calls.into_inner(), ["BR-001"]);
    }

    #[test]
    fn broken_link_recovers_when_content_returns() {
        let mut index = scenario();

        recompute_sync_status(&mut index, &Table(HashMap::new()));
        assert_eq!(index.links()[0].sync_status, SyncStatus::Broken);

        let report = recompute_sync_status(&mut index, &Table([("BR-001", "Log every request.")].into()));
        assert_eq!(index.links()[0].sync_status, SyncStatus::Ok);
        assert_eq!(report.changes().count(), 1);
    }
}
