//! Requirement Traceability Graph
//!
//! Requirements are declared in plain-text documents and indexed in a single
//! YAML file. The index links detailed requirements to the abstract ones they
//! refine, records a fingerprint of each requirement's body, and answers the
//! question "which requirements matter for this source file?".

pub mod domain;
pub use domain::{
    Config, ContentResolver, Index, IndexError, Link, Node, NodeId, RelevantNode, SyncReport,
    SyncStatus, find_relevant, fingerprint, recompute_sync_status,
};

/// Filesystem storage, repository discovery and content extraction.
pub mod storage;
pub use storage::{Repository, RepositoryError};
