/// The on-disk representation of the index.
pub mod index_file;
/// Markdown section extraction.
pub mod markdown;
mod repository;

pub use index_file::LoadError;
pub use markdown::extract_section;
pub use repository::{
    CONFIG_FILE, CONTEXTGIT_DIR, ExtractError, INDEX_FILE, MAX_FILE_SIZE, Repository,
    RepositoryError,
};
