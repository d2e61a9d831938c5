use std::fmt;

use crate::domain::{NodeId, RelationType};

/// A directed edge from a derived requirement to the requirement it refines.
///
/// `from` is the more detailed requirement, `to` is the more abstract one.
/// The `sync_status` is derived by the integrity checker and is not meant to
/// be edited by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// The derived requirement.
    pub from: NodeId,
    /// The parent requirement.
    pub to: NodeId,
    /// The relationship the link expresses.
    pub relation_type: RelationType,
    /// Whether the parent's content still matches its recorded fingerprint.
    pub sync_status: SyncStatus,
}

impl Link {
    /// Create a `refines` link with status [`SyncStatus::Ok`].
    #[must_use]
    pub fn refines(from: NodeId, to: NodeId) -> Self {
        Self::new(from, to, RelationType::refines())
    }

    /// Create a link with status [`SyncStatus::Ok`].
    #[must_use]
    pub const fn new(from: NodeId, to: NodeId, relation_type: RelationType) -> Self {
        Self {
            from,
            to,
            relation_type,
            sync_status: SyncStatus::Ok,
        }
    }

    /// Whether two links connect the same pair of nodes with the same
    /// relation.
    #[must_use]
    pub fn same_edge(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && self.relation_type == other.relation_type
    }
}

/// Health of a link, derived from the content of its target node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SyncStatus {
    /// The target's current content matches its recorded fingerprint.
    #[default]
    Ok,
    /// The target's content has changed since it was recorded.
    Stale,
    /// The target's content could not be located.
    Broken,
}

impl SyncStatus {
    /// All statuses, healthiest first.
    pub const ALL: [Self; 3] = [Self::Ok, Self::Stale, Self::Broken];

    /// Returns `true` unless the status is [`SyncStatus::Ok`].
    #[must_use]
    pub const fn needs_attention(self) -> bool {
        !matches!(self, Self::Ok)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Stale => "stale",
            Self::Broken => "broken",
        };
        f.write_str(s)
    }
}
