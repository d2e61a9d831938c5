use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::domain::{NodeType, RelationType, Status, SyncStatus, Vocabulary};

/// Configuration for a requirements repository.
///
/// This struct holds the vocabularies the index is validated against and the
/// formatting of node identifiers. It is passed explicitly to the
/// [`Index`](crate::Index) rather than read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Versions", into = "Versions")]
pub struct Config {
    /// The number of digits in a node number.
    ///
    /// Numbers are padded to this width with leading zeros, e.g. '001'.
    id_padding: usize,

    /// Requirement tiers and the id prefix each one uses.
    ///
    /// For example `business` → `BR`, so business requirements are numbered
    /// `BR-001`, `BR-002`, ...
    tiers: BTreeMap<NodeType, String>,

    /// Allowed lifecycle states.
    statuses: BTreeSet<Status>,

    /// Allowed link relations.
    relation_types: BTreeSet<RelationType>,

    /// Words used for the sync states in the index file and in output.
    sync_labels: SyncLabels,
}

impl Default for Config {
    fn default() -> Self {
        let term = |s: &str| s.to_string();
        Versions::V1 {
            id_padding: default_id_padding(),
            tiers: [
                ("business", "BR"),
                ("system", "SR"),
                ("architecture", "AR"),
                ("code", "CODE"),
                ("test", "TEST"),
                ("decision", "ADR"),
            ]
            .into_iter()
            .map(|(tier, prefix)| (term(tier), term(prefix)))
            .collect(),
            statuses: ["active", "draft", "deprecated"].map(term).to_vec(),
            relation_types: ["refines", "implements", "tests", "depends_on"]
                .map(term)
                .to_vec(),
            sync_labels: SyncLabels::default(),
        }
        .try_into()
        .expect("default configuration must be valid")
    }
}

impl Config {
    /// Loads the configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the YAML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        serde_yaml::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Saves the configuration to a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or if the
    /// file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Returns the number of digits node numbers are padded to.
    #[must_use]
    pub const fn id_padding(&self) -> usize {
        self.id_padding
    }

    /// Returns the configured tiers and their prefixes.
    pub fn tiers(&self) -> impl Iterator<Item = (&NodeType, &str)> {
        self.tiers.iter().map(|(tier, prefix)| (tier, prefix.as_str()))
    }

    /// Returns the words used for the sync states.
    #[must_use]
    pub const fn sync_labels(&self) -> &SyncLabels {
        &self.sync_labels
    }

    /// Builds the vocabulary an [`Index`](crate::Index) validates against.
    #[must_use]
    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary::new(
            self.id_padding,
            self.tiers.clone(),
            self.statuses.clone(),
            self.relation_types.clone(),
        )
    }
}

/// The words used to represent each [`SyncStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLabels {
    /// Label for [`SyncStatus::Ok`].
    pub ok: String,
    /// Label for [`SyncStatus::Stale`].
    pub stale: String,
    /// Label for [`SyncStatus::Broken`].
    pub broken: String,
}

impl Default for SyncLabels {
    fn default() -> Self {
        Self {
            ok: "ok".to_string(),
            stale: "stale".to_string(),
            broken: "broken".to_string(),
        }
    }
}

impl SyncLabels {
    /// The label of a status.
    #[must_use]
    pub fn label(&self, status: SyncStatus) -> &str {
        match status {
            SyncStatus::Ok => &self.ok,
            SyncStatus::Stale => &self.stale,
            SyncStatus::Broken => &self.broken,
        }
    }

    /// The status a label denotes, if any.
    #[must_use]
    pub fn parse(&self, label: &str) -> Option<SyncStatus> {
        SyncStatus::ALL
            .into_iter()
            .find(|&status| self.label(status) == label)
    }

    fn validate(&self) -> Result<(), String> {
        let labels = [&self.ok, &self.stale, &self.broken];
        if labels.iter().any(|label| label.trim().is_empty()) {
            return Err("sync labels must not be empty".to_string());
        }
        if labels.iter().collect::<BTreeSet<_>>().len() != labels.len() {
            return Err("sync labels must be distinct".to_string());
        }
        Ok(())
    }
}

/// Errors that can occur when loading or saving the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file: {0}")]
    Read(#[source] io::Error),
    /// The configuration file is not valid.
    #[error("Failed to parse config file: {0}")]
    Parse(#[source] serde_yaml::Error),
    /// The configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml::Error),
    /// The configuration file could not be written.
    #[error("Failed to write config file: {0}")]
    Write(#[source] io::Error),
}

const fn default_id_padding() -> usize {
    3
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_id_padding")]
        id_padding: usize,

        /// Tier name → id prefix.
        tiers: BTreeMap<String, String>,

        statuses: Vec<String>,

        relation_types: Vec<String>,

        #[serde(default)]
        sync_labels: SyncLabels,
    },
}

impl TryFrom<Versions> for Config {
    type Error = String;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        match versions {
            Versions::V1 {
                id_padding,
                tiers,
                statuses,
                relation_types,
                sync_labels,
            } => {
                let mut prefixes = BTreeSet::new();
                let tiers = tiers
                    .into_iter()
                    .map(|(tier, prefix)| {
                        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
                            return Err(format!(
                                "prefix '{prefix}' of tier '{tier}' must contain only uppercase \
                                 letters (A-Z)"
                            ));
                        }
                        if !prefixes.insert(prefix.clone()) {
                            return Err(format!("prefix '{prefix}' is used by more than one tier"));
                        }
                        let tier = NodeType::new(tier).map_err(|e| e.to_string())?;
                        Ok((tier, prefix))
                    })
                    .collect::<Result<_, _>>()?;
                let statuses = statuses
                    .into_iter()
                    .map(|s| Status::new(s).map_err(|e| e.to_string()))
                    .collect::<Result<_, _>>()?;
                let relation_types = relation_types
                    .into_iter()
                    .map(|s| RelationType::new(s).map_err(|e| e.to_string()))
                    .collect::<Result<_, _>>()?;
                sync_labels.validate()?;

                Ok(Self {
                    id_padding,
                    tiers,
                    statuses,
                    relation_types,
                    sync_labels,
                })
            }
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            id_padding: config.id_padding,
            tiers: config
                .tiers
                .into_iter()
                .map(|(tier, prefix)| (tier.to_string(), prefix))
                .collect(),
            statuses: config.statuses.iter().map(ToString::to_string).collect(),
            relation_types: config
                .relation_types
                .iter()
                .map(ToString::to_string)
                .collect(),
            sync_labels: config.sync_labels,
        }
    }
}
