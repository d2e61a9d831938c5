//! YAML serialization of the [`Index`].
//!
//! The file lists nodes (sorted by id) and then links (in stored order), in
//! block style:
//!
//! ```yaml
//! nodes:
//! - id: BR-001
//!   type: business
//!   title: User authentication
//!   file: docs/requirements.md
//!   location:
//!   - Requirements
//!   - Authentication
//!   status: active
//!   checksum: 9f86d081...
//! links:
//! - from: SR-001
//!   to: BR-001
//!   relation_type: refines
//!   sync_status: ok
//! ```
//!
//! Loading rebuilds the index through [`Index::add_node`] and
//! [`Index::add_link`], so a hand-edited file that breaks a structural rule
//! is rejected rather than repaired.

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Config, Index, IndexError, InvalidTermError, Link, Node, NodeIdError, SyncStatus,
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    links: Vec<LinkRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    id: String,
    #[serde(rename = "type")]
    node_type: String,
    title: String,
    file: String,
    #[serde(default)]
    location: Vec<String>,
    status: String,
    #[serde(default)]
    checksum: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkRecord {
    from: String,
    to: String,
    relation_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sync_status: Option<String>,
}

/// Errors that can occur when loading the index file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file is not valid YAML or does not have the expected shape.
    #[error("malformed index: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A node id could not be parsed.
    #[error("malformed index: {0}")]
    NodeId(#[from] NodeIdError),

    /// A type, status or relation is not a valid term.
    #[error("malformed index: {0}")]
    Term(#[from] InvalidTermError),

    /// A node has an empty title.
    #[error("malformed index: node {0} has an empty title")]
    EmptyTitle(String),

    /// A link has a sync status that is not one of the configured labels.
    #[error("malformed index: link {from} → {to} has unknown sync status '{label}'")]
    SyncStatus {
        /// The link's source.
        from: String,
        /// The link's target.
        to: String,
        /// The unrecognised label.
        label: String,
    },

    /// The file violates a structural rule of the index.
    #[error("malformed index: {0}")]
    Structure(#[from] IndexError),
}

/// Parse an index from YAML, validating it against `config`.
///
/// An empty document yields an empty index. Links without a `sync_status`
/// are assumed to be in sync until the next integrity check.
///
/// # Errors
///
/// Returns an error if the YAML is malformed, if any id or term is invalid,
/// or if the content violates a structural rule of the [`Index`].
pub fn parse(yaml: &str, config: &Config) -> Result<Index, LoadError> {
    let file: IndexFile = if yaml.trim().is_empty() {
        IndexFile::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    let mut index = Index::with_config(config);

    for record in file.nodes {
        let title =
            NonEmptyString::new(record.title).map_err(|_| LoadError::EmptyTitle(record.id.clone()))?;
        let node = Node {
            id: record.id.parse()?,
            node_type: record.node_type.parse()?,
            title,
            file: record.file,
            location: record.location,
            status: record.status.parse()?,
            checksum: record.checksum,
        };
        index.add_node(node)?;
    }

    for record in file.links {
        let sync_status = match record.sync_status {
            None => SyncStatus::Ok,
            Some(label) => config.sync_labels().parse(&label).ok_or_else(|| {
                LoadError::SyncStatus {
                    from: record.from.clone(),
                    to: record.to.clone(),
                    label,
                }
            })?,
        };
        let mut link = Link::new(
            record.from.parse()?,
            record.to.parse()?,
            record.relation_type.parse()?,
        );
        link.sync_status = sync_status;
        index.add_link(link)?;
    }

    Ok(index)
}

/// Render an index as YAML.
///
/// Rendering the same index twice produces identical output.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render(index: &Index, config: &Config) -> Result<String, serde_yaml::Error> {
    let labels = config.sync_labels();
    let file = IndexFile {
        nodes: index
            .nodes()
            .map(|node| NodeRecord {
                id: node.id.to_string(),
                node_type: node.node_type.to_string(),
                title: node.title.to_string(),
                file: node.file.clone(),
                location: node.location.clone(),
                status: node.status.to_string(),
                checksum: node.checksum.clone(),
            })
            .collect(),
        links: index
            .links()
            .iter()
            .map(|link| LinkRecord {
                from: link.from.to_string(),
                to: link.to.to_string(),
                relation_type: link.relation_type.to_string(),
                sync_status: Some(labels.label(link.sync_status).to_string()),
            })
            .collect(),
    };
    serde_yaml::to_string(&file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeId, SyncLabels};

    const SAMPLE: &str = "\
nodes:
- id: SR-001
  type: system
  title: JWT token implementation
  file: docs/system-spec.md
  location:
  - System Design
  - Auth
  status: active
  checksum: def456ghi789
- id: BR-001
  type: business
  title: User authentication
  file: docs/requirements.md
  location:
  - Requirements
  - Authentication
  status: active
  checksum: abc123def456
links:
- from: SR-001
  to: BR-001
  relation_type: refines
  sync_status: ok
";

    fn id(s: &str) -> NodeId {
        s.parse().unwrap()
    }

    #[test]
    fn parses_nodes_and_links() {
        let index = parse(SAMPLE, &Config::default()).unwrap();

        let node = index.node(&id("BR-001")).unwrap();
        assert_eq!(node.title.as_str(), "User authentication");
        assert_eq!(node.location, ["Requirements", "Authentication"]);
        assert_eq!(node.checksum, "abc123def456");

        assert_eq!(index.links().len(), 1);
        assert_eq!(index.links()[0].from, id("SR-001"));
        assert_eq!(index.links()[0].sync_status, SyncStatus::Ok);
    }

    #[test]
    fn render_is_deterministic_and_sorted() {
        let config = Config::default();
        let index = parse(SAMPLE, &config).unwrap();

        let first = render(&index, &config).unwrap();
        let second = render(&index, &config).unwrap();

        assert_eq!(first, second);
        let br = first.find("id: BR-001").unwrap();
        let sr = first.find("id: SR-001").unwrap();
        assert!(br < sr, "nodes should be sorted by id:\n{first}");
        assert!(!first.contains('{') && !first.contains('['), "{first}");
    }

    #[test]
    fn render_then_parse_preserves_index() {
        let config = Config::default();
        let index = parse(SAMPLE, &config).unwrap();

        let reparsed = parse(&render(&index, &config).unwrap(), &config).unwrap();

        assert_eq!(reparsed, index);
    }

    #[test]
    fn empty_document_is_empty_index() {
        let index = parse("", &Config::default()).unwrap();
        assert!(index.is_empty());
        assert!(index.links().is_empty());

        let index = parse("nodes: []\nlinks: []\n", &Config::default()).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn dangling_link_is_rejected() {
        let yaml = SAMPLE.replace("to: BR-001", "to: BR-002");

        let err = parse(&yaml, &Config::default()).unwrap_err();

        assert!(matches!(
            err,
            LoadError::Structure(IndexError::DanglingReference { .. })
        ));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let yaml = SAMPLE.replace("id: SR-001", "id: BR-001").replace("type: system", "type: business");

        let err = parse(&yaml, &Config::default()).unwrap_err();

        assert!(matches!(err, LoadError::Structure(IndexError::DuplicateId(_))));
    }

    #[test]
    fn unknown_sync_label_is_rejected() {
        let yaml = SAMPLE.replace("sync_status: ok", "sync_status: fine");

        let err = parse(&yaml, &Config::default()).unwrap_err();

        assert!(matches!(err, LoadError::SyncStatus { label, .. } if label == "fine"));
    }

    #[test]
    fn missing_sync_status_defaults_to_ok() {
        let yaml = SAMPLE.replace("  sync_status: ok\n", "");
        let index = parse(&yaml, &Config::default()).unwrap();
        assert_eq!(index.links()[0].sync_status, SyncStatus::Ok);
    }

    #[test]
    fn empty_title_is_rejected() {
        let yaml = SAMPLE.replace("title: User authentication", "title: ''");

        let err = parse(&yaml, &Config::default()).unwrap_err();

        assert!(matches!(err, LoadError::EmptyTitle(id) if id == "BR-001"));
    }

    #[test]
    fn custom_sync_labels_are_used_both_ways() {
        let yaml = "_version: '1'\ntiers:\n  business: BR\n  system: SR\nstatuses: [active]\nrelation_types: [refines]\nsync_labels:\n  ok: current\n  stale: drifted\n  broken: missing\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_ne!(config.sync_labels(), &SyncLabels::default());

        let index = parse(&SAMPLE.replace("sync_status: ok", "sync_status: drifted"), &config).unwrap();
        assert_eq!(index.links()[0].sync_status, SyncStatus::Stale);

        let rendered = render(&index, &config).unwrap();
        assert!(rendered.contains("sync_status: drifted"), "{rendered}");
    }
}
