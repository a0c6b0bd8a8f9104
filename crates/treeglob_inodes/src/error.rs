use thiserror::Error;
use treeglob_store::FetchError;

/// Errors returned by operations on a [`crate::TreeInode`].
#[derive(Debug, Error)]
pub enum InodeError {
    /// No entry with the given name exists.
    #[error("'{0}' does not exist")]
    NotFound(String),

    /// The entry exists but is not a directory.
    #[error("'{0}' is not a directory")]
    NotADirectory(String),

    /// The entry is a directory where a file was expected.
    #[error("'{0}' is a directory")]
    IsADirectory(String),

    /// An entry with the given name already exists.
    #[error("'{0}' already exists")]
    AlreadyExists(String),

    /// The directory still has entries.
    #[error("'{0}' is not empty")]
    DirectoryNotEmpty(String),

    /// The name cannot be used for a directory entry.
    #[error("'{0}' is not a valid entry name")]
    InvalidName(String),

    /// Loading a snapshot object failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
