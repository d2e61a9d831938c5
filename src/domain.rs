//! Domain models for the requirement graph.
//!
//! This module contains the core types: node identifiers, nodes, links, the
//! [`Index`] aggregate, and the two algorithms that operate on it (integrity
//! checking and relevance traversal). Nothing here touches the filesystem
//! apart from loading and saving the [`Config`].

/// Content fingerprinting.
pub mod checksum;
pub use checksum::fingerprint;

mod config;
pub use config::{Config, ConfigError, SyncLabels};

/// Node identifier types and parsing.
pub mod node_id;
pub use node_id::{Error as NodeIdError, NodeId};

mod node;
pub use node::{InvalidTermError, Node, NodeType, RelationType, Status};

mod link;
pub use link::{Link, SyncStatus};

pub(crate) mod index;
pub use index::{Index, IndexError, Vocabulary};

mod integrity;
pub use integrity::{
    ContentResolver, LinkChange, SyncReport, recompute_sync_status, target_status,
};

mod relevance;
pub use relevance::{RelevantNode, find_relevant};
