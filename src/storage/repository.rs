//! A filesystem backed requirements repository.
//!
//! A repository is any directory containing a `.contextgit/` folder, which
//! holds the configuration and the index. Requirement documents live anywhere
//! below the repository root and are referred to by root-relative paths.

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use tracing::instrument;

use crate::{
    domain::{Config, ConfigError, ContentResolver, Index, Node},
    storage::{LoadError, extract_section, index_file},
};

/// Name of the directory marking a repository root.
pub const CONTEXTGIT_DIR: &str = ".contextgit";
/// Name of the index file inside [`CONTEXTGIT_DIR`].
pub const INDEX_FILE: &str = "requirements_index.yaml";
/// Name of the configuration file inside [`CONTEXTGIT_DIR`].
pub const CONFIG_FILE: &str = "config.yaml";
/// Documents larger than this are never read.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// A requirements repository on disk.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    config: Config,
}

/// Errors that can occur when working with a repository.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No repository was found at or above the given directory.
    #[error("not a contextgit repository (or any parent): {}", .0.display())]
    NotFound(PathBuf),

    /// `init` was run on a directory that already holds a repository.
    #[error("{} is already a contextgit repository (use --force to overwrite)", .0.display())]
    AlreadyInitialised(PathBuf),

    /// A repository file could not be read or written.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The configuration file is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The index file is invalid.
    #[error("{}: {source}", path.display())]
    Load {
        /// The index file.
        path: PathBuf,
        /// What is wrong with it.
        #[source]
        source: LoadError,
    },

    /// The index could not be serialized.
    #[error("failed to serialize index: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Reasons a node's content cannot be extracted.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The node's file does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The node's file exceeds [`MAX_FILE_SIZE`].
    #[error("{} is too large ({size} bytes)", path.display())]
    TooLarge {
        /// The file.
        path: PathBuf,
        /// Its size in bytes.
        size: u64,
    },

    /// The node's file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// No section of the file matches the node's location.
    #[error("section '{}' not found in {file}", location.join(" > "))]
    LocationNotFound {
        /// The node's file.
        file: String,
        /// The heading breadcrumb that did not match.
        location: Vec<String>,
    },
}

impl Repository {
    /// Find the repository containing `start`, searching upward through its
    /// ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if neither `start` nor any of its
    /// ancestors contains a `.contextgit` directory, or an error if the
    /// configuration is invalid.
    #[instrument(level = "debug")]
    pub fn discover(start: &Path) -> Result<Self, RepositoryError> {
        let root = start
            .ancestors()
            .find(|dir| dir.join(CONTEXTGIT_DIR).is_dir())
            .ok_or_else(|| RepositoryError::NotFound(start.to_path_buf()))?;
        tracing::debug!(root = %root.display(), "found repository");
        Self::open(root.to_path_buf())
    }

    /// Open the repository rooted exactly at `root`.
    ///
    /// A missing configuration file falls back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if `root` has no `.contextgit`
    /// directory, or an error if the configuration exists but is invalid.
    pub fn open(root: PathBuf) -> Result<Self, RepositoryError> {
        let dir = root.join(CONTEXTGIT_DIR);
        if !dir.is_dir() {
            return Err(RepositoryError::NotFound(root));
        }
        let config = load_config(&dir.join(CONFIG_FILE))?;
        Ok(Self { root, config })
    }

    /// Create a new repository at `root` with the default configuration and
    /// an empty index.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::AlreadyInitialised`] if a repository already
    /// exists and `force` is not set, or an error if the files cannot be
    /// written.
    #[instrument(level = "debug")]
    pub fn init(root: &Path, force: bool) -> Result<Self, RepositoryError> {
        let dir = root.join(CONTEXTGIT_DIR);
        if dir.is_dir() && !force {
            return Err(RepositoryError::AlreadyInitialised(root.to_path_buf()));
        }
        fs::create_dir_all(&dir).map_err(|source| RepositoryError::Io {
            path: dir.clone(),
            source,
        })?;

        let repository = Self {
            root: root.to_path_buf(),
            config: Config::default(),
        };
        repository.config.save(&repository.config_path())?;
        repository.save_index(&Index::with_config(&repository.config))?;

        tracing::info!(root = %root.display(), "initialised repository");
        Ok(repository)
    }

    /// The repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The repository configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONTEXTGIT_DIR).join(CONFIG_FILE)
    }

    /// Path of the index file.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.root.join(CONTEXTGIT_DIR).join(INDEX_FILE)
    }

    /// Load the index, validating it against the configuration.
    ///
    /// A missing index file is treated as an empty index.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    #[instrument(level = "debug", skip(self))]
    pub fn load_index(&self) -> Result<Index, RepositoryError> {
        let path = self.index_path();
        let yaml = match fs::read_to_string(&path) {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no index file, starting empty");
                String::new()
            }
            Err(source) => return Err(RepositoryError::Io { path, source }),
        };
        let index = index_file::parse(&yaml, &self.config)
            .map_err(|source| RepositoryError::Load { path, source })?;
        tracing::debug!(
            nodes = index.node_count(),
            links = index.links().len(),
            "loaded index"
        );
        Ok(index)
    }

    /// Save the index.
    ///
    /// The file is written to a temporary sibling and renamed into place, so
    /// a failed save leaves the previous index intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be serialized or written.
    #[instrument(level = "debug", skip_all)]
    pub fn save_index(&self, index: &Index) -> Result<(), RepositoryError> {
        let path = self.index_path();
        let yaml = index_file::render(index, &self.config)?;

        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml).map_err(|source| RepositoryError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| RepositoryError::Io { path, source })
    }

    /// Express `path` relative to the repository root, with `/` separators.
    ///
    /// Relative paths are interpreted against `cwd` when it lies inside the
    /// repository, and against the root otherwise. `.` and `..` components
    /// are resolved lexically. Paths outside the root are returned in their
    /// normalised absolute form.
    #[must_use]
    pub fn relative_path(&self, path: &Path, cwd: &Path) -> String {
        let root = normalise(&self.root);
        let cwd = normalise(cwd);
        let base = if cwd.starts_with(&root) { &cwd } else { &root };
        let absolute = normalise(&base.join(path));

        match absolute.strip_prefix(&root) {
            Ok(relative) => relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => absolute
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/"),
        }
    }

    /// Read the current text of a node: the section of its file named by its
    /// location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, too large or unreadable, or if
    /// the location does not match.
    pub fn extract(&self, node: &Node) -> Result<String, ExtractError> {
        let path = self.root.join(&node.file);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ExtractError::FileNotFound(path));
            }
            Err(source) => return Err(ExtractError::Io { path, source }),
        };
        if metadata.len() > MAX_FILE_SIZE {
            return Err(ExtractError::TooLarge {
                path,
                size: metadata.len(),
            });
        }

        let document =
            fs::read_to_string(&path).map_err(|source| ExtractError::Io { path, source })?;
        extract_section(&document, &node.location).ok_or_else(|| ExtractError::LocationNotFound {
            file: node.file.clone(),
            location: node.location.clone(),
        })
    }
}

impl ContentResolver for Repository {
    fn resolve(&self, node: &Node) -> Option<Vec<u8>> {
        match self.extract(node) {
            Ok(text) => Some(text.into_bytes()),
            Err(e @ (ExtractError::FileNotFound(_) | ExtractError::LocationNotFound { .. })) => {
                tracing::debug!(node = %node.id, "{e}");
                None
            }
            Err(e) => {
                tracing::warn!(node = %node.id, "{e}");
                None
            }
        }
    }
}

fn load_config(path: &Path) -> Result<Config, RepositoryError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    Ok(Config::load(path)?)
}

fn normalise(path: &Path) -> PathBuf {
    let mut normalised = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalised.pop();
            }
            other => normalised.push(other),
        }
    }
    normalised
}
