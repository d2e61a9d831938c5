//! In-memory requirement graph.
//!
//! The [`Index`] knows nothing about the filesystem. It holds the nodes keyed
//! by id and the links in the order they were added, and it enforces the
//! structural invariants at mutation time: an `Index` that exists is always
//! free of duplicate ids, dangling references and self-loops.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    num::NonZeroUsize,
};

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use thiserror::Error;

use crate::domain::{
    Config, Link, Node, NodeId, NodeIdError, NodeType, RelationType, Status, SyncStatus,
};

/// The terms an [`Index`] accepts, derived from the [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    id_padding: usize,
    tiers: BTreeMap<NodeType, String>,
    /// If empty, all statuses are allowed.
    statuses: BTreeSet<Status>,
    /// If empty, all relations are allowed.
    relation_types: BTreeSet<RelationType>,
}

impl Vocabulary {
    pub(crate) const fn new(
        id_padding: usize,
        tiers: BTreeMap<NodeType, String>,
        statuses: BTreeSet<Status>,
        relation_types: BTreeSet<RelationType>,
    ) -> Self {
        Self {
            id_padding,
            tiers,
            statuses,
            relation_types,
        }
    }

    /// The id prefix of a tier, if the tier is known.
    #[must_use]
    pub fn prefix_for(&self, tier: &NodeType) -> Option<&str> {
        self.tiers.get(tier).map(String::as_str)
    }

    /// Checks if a status is allowed.
    #[must_use]
    pub fn is_status_allowed(&self, status: &Status) -> bool {
        self.statuses.is_empty() || self.statuses.contains(status)
    }

    /// Checks if a relation is allowed.
    #[must_use]
    pub fn is_relation_allowed(&self, relation: &RelationType) -> bool {
        self.relation_types.is_empty() || self.relation_types.contains(relation)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Config::default().vocabulary()
    }
}

/// The requirement graph: nodes keyed by id plus an ordered list of links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    vocabulary: Vocabulary,

    /// Nodes keyed by id. `BTreeMap` so iteration order is deterministic.
    nodes: BTreeMap<NodeId, Node>,

    /// Links in insertion order. This order is preserved on save and in every
    /// query.
    links: Vec<Link>,

    /// Positions in `links`, keyed by `from`, ascending.
    outgoing: HashMap<NodeId, Vec<usize>>,

    /// Positions in `links`, keyed by `to`, ascending.
    incoming: HashMap<NodeId, Vec<usize>>,
}

/// Errors raised when an edit would make the [`Index`] inconsistent.
///
/// The index is left unchanged when any of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// A node with this id already exists.
    #[error("duplicate node id {0}")]
    DuplicateId(NodeId),

    /// A link endpoint does not exist.
    #[error("link {from} → {to} references missing node {missing}")]
    DanglingReference {
        /// The link's source.
        from: NodeId,
        /// The link's target.
        to: NodeId,
        /// The endpoint that could not be found.
        missing: NodeId,
    },

    /// A link would connect a node to itself.
    #[error("link {0} → {0} would connect a node to itself")]
    SelfLoop(NodeId),

    /// The node's type is not a configured tier.
    #[error("node {id} has unknown type '{node_type}'")]
    UnknownType {
        /// The offending node.
        id: NodeId,
        /// The unrecognised type.
        node_type: NodeType,
    },

    /// The node's id prefix does not match its tier.
    #[error("node {id} has type '{node_type}', whose ids must start with '{expected}-'")]
    PrefixMismatch {
        /// The offending node.
        id: NodeId,
        /// The node's type.
        node_type: NodeType,
        /// The prefix configured for that type.
        expected: String,
    },

    /// The node's status is not allowed.
    #[error("node {id} has unknown status '{status}'")]
    UnknownStatus {
        /// The offending node.
        id: NodeId,
        /// The unrecognised status.
        status: Status,
    },

    /// The link's relation is not allowed.
    #[error("link {from} → {to} has unknown relation '{relation_type}'")]
    UnknownRelation {
        /// The link's source.
        from: NodeId,
        /// The link's target.
        to: NodeId,
        /// The unrecognised relation.
        relation_type: RelationType,
    },

    /// No node with this id exists.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The type is not a configured tier.
    #[error("unknown requirement type '{0}'")]
    UnknownTier(NodeType),

    /// Every number for this prefix is taken.
    #[error("no ids left with prefix '{0}'")]
    IdsExhausted(String),

    /// The configured prefix cannot form an id.
    #[error(transparent)]
    InvalidId(#[from] NodeIdError),
}

impl Index {
    /// Creates an empty index validated against `vocabulary`.
    #[must_use]
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            ..Self::default()
        }
    }

    /// Creates an empty index validated against the vocabulary of `config`.
    #[must_use]
    pub fn with_config(config: &Config) -> Self {
        Self::new(config.vocabulary())
    }

    /// The vocabulary this index validates against.
    #[must_use]
    pub const fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Adds a node.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DuplicateId`] if the id is already present, or a
    /// vocabulary error if the node's type, id prefix or status is not
    /// allowed.
    pub fn add_node(&mut self, node: Node) -> Result<(), IndexError> {
        if self.nodes.contains_key(&node.id) {
            return Err(IndexError::DuplicateId(node.id));
        }

        let Some(expected) = self.vocabulary.prefix_for(&node.node_type) else {
            return Err(IndexError::UnknownType {
                id: node.id,
                node_type: node.node_type,
            });
        };
        if node.id.prefix() != expected {
            return Err(IndexError::PrefixMismatch {
                expected: expected.to_string(),
                id: node.id,
                node_type: node.node_type,
            });
        }

        if !self.vocabulary.is_status_allowed(&node.status) {
            return Err(IndexError::UnknownStatus {
                id: node.id,
                status: node.status,
            });
        }

        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Adds a link.
    ///
    /// Returns `true` if the link was added, or `false` if an identical link
    /// (same endpoints and relation) already existed, in which case nothing
    /// is stored.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DanglingReference`] if either endpoint is not a
    /// node in the index, [`IndexError::SelfLoop`] if both endpoints are the
    /// same node, or [`IndexError::UnknownRelation`] if the relation is not
    /// allowed.
    pub fn add_link(&mut self, link: Link) -> Result<bool, IndexError> {
        for endpoint in [&link.from, &link.to] {
            if !self.nodes.contains_key(endpoint) {
                return Err(IndexError::DanglingReference {
                    missing: endpoint.clone(),
                    from: link.from.clone(),
                    to: link.to.clone(),
                });
            }
        }

        if link.from == link.to {
            return Err(IndexError::SelfLoop(link.from));
        }

        if !self.vocabulary.is_relation_allowed(&link.relation_type) {
            return Err(IndexError::UnknownRelation {
                from: link.from,
                to: link.to,
                relation_type: link.relation_type,
            });
        }

        if self.outgoing_links(&link.from).any(|l| l.same_edge(&link)) {
            return Ok(false);
        }

        let position = self.links.len();
        self.outgoing
            .entry(link.from.clone())
            .or_default()
            .push(position);
        self.incoming.entry(link.to.clone()).or_default().push(position);
        self.links.push(link);
        Ok(true)
    }

    /// Removes every link from `from` to `to`, whatever its relation.
    ///
    /// Returns the number of links removed.
    pub fn remove_link(&mut self, from: &NodeId, to: &NodeId) -> usize {
        let before = self.links.len();
        self.links.retain(|link| !(&link.from == from && &link.to == to));
        let removed = before - self.links.len();
        if removed > 0 {
            self.rebuild_adjacency();
        }
        removed
    }

    fn rebuild_adjacency(&mut self) {
        self.outgoing.clear();
        self.incoming.clear();
        for (position, link) in self.links.iter().enumerate() {
            self.outgoing
                .entry(link.from.clone())
                .or_default()
                .push(position);
            self.incoming.entry(link.to.clone()).or_default().push(position);
        }
    }

    /// Finds a node by id.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Returns an iterator over all nodes, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns all links in stored order.
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the index contains no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes declared in `path`.
    ///
    /// Returns an empty set if there are none.
    #[must_use]
    pub fn nodes_for_file(&self, path: &str) -> BTreeSet<&NodeId> {
        self.nodes
            .values()
            .filter(|node| node.file == path)
            .map(|node| &node.id)
            .collect()
    }

    /// All links whose `from` is `id`, in stored order.
    pub fn outgoing_links<'a>(&'a self, id: &NodeId) -> impl Iterator<Item = &'a Link> + use<'a> {
        self.positions(&self.outgoing, id)
    }

    /// All links whose `to` is `id`, in stored order.
    pub fn incoming_links<'a>(&'a self, id: &NodeId) -> impl Iterator<Item = &'a Link> + use<'a> {
        self.positions(&self.incoming, id)
    }

    fn positions<'a>(
        &'a self,
        adjacency: &'a HashMap<NodeId, Vec<usize>>,
        id: &NodeId,
    ) -> impl Iterator<Item = &'a Link> + use<'a> {
        adjacency
            .get(id)
            .into_iter()
            .flatten()
            .map(|&position| &self.links[position])
    }

    /// Overwrites the sync status of the link at `position`.
    pub(crate) fn set_sync_status(&mut self, position: usize, status: SyncStatus) {
        self.links[position].sync_status = status;
    }

    /// Records `checksum` as the node's in-sync fingerprint and marks every
    /// link pointing at it as [`SyncStatus::Ok`].
    ///
    /// This acknowledges drift detected by the integrity checker. Returns the
    /// number of links whose status changed.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NodeNotFound`] if the node does not exist.
    pub fn confirm(&mut self, id: &NodeId, checksum: String) -> Result<usize, IndexError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| IndexError::NodeNotFound(id.clone()))?;
        node.checksum = checksum;

        let positions = self.incoming.get(id).cloned().unwrap_or_default();
        let mut changed = 0;
        for position in positions {
            if self.links[position].sync_status != SyncStatus::Ok {
                self.set_sync_status(position, SyncStatus::Ok);
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Returns the next unused id for a tier.
    ///
    /// This is one more than the highest number in use with the tier's
    /// prefix, padded to the configured width.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::UnknownTier`] if the tier is not configured, or
    /// [`IndexError::IdsExhausted`] if the highest number in use is
    /// `usize::MAX`.
    pub fn next_id(&self, tier: &NodeType) -> Result<NodeId, IndexError> {
        let prefix = self
            .vocabulary
            .prefix_for(tier)
            .ok_or_else(|| IndexError::UnknownTier(tier.clone()))?;

        let highest = self
            .nodes
            .keys()
            .filter(|id| id.prefix() == prefix)
            .map(NodeId::number)
            .max();
        let next = match highest {
            None => NonZeroUsize::MIN,
            Some(n) => n
                .checked_add(1)
                .ok_or_else(|| IndexError::IdsExhausted(prefix.to_string()))?,
        };

        Ok(NodeId::new(prefix, next, self.vocabulary.id_padding)?)
    }

    /// Return all cycles in the link graph as sorted lists of node ids.
    ///
    /// Links are expected to form a DAG, but this is not enforced.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<NodeId>> {
        let mut graph: DiGraphMap<&NodeId, ()> =
            DiGraphMap::with_capacity(self.nodes.len(), self.links.len());
        for id in self.nodes.keys() {
            graph.add_node(id);
        }
        for link in &self.links {
            graph.add_edge(&link.from, &link.to, ());
        }

        let mut cycles: Vec<Vec<NodeId>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut ids: Vec<NodeId> = component.into_iter().cloned().collect();
                ids.sort();
                ids
            })
            .collect();

        cycles.sort();
        cycles
    }
}
