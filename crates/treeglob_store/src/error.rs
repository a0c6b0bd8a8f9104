use std::path::PathBuf;

use thiserror::Error;

use crate::ObjectId;

/// Errors that can occur while retrieving objects from a store.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The store has no object with the given id.
    #[error("object {0} not found")]
    NotFound(ObjectId),

    /// An object was found but it is not a tree.
    #[error("object {0} is not a tree")]
    NotATree(ObjectId),

    /// An object was found but could not be decoded as a tree.
    #[error("object {0} is not a valid tree")]
    InvalidTree(ObjectId, #[source] serde_json::Error),

    /// Reading the object failed.
    #[error("failed to read object {id} from {}", .path.display())]
    Io {
        /// The object being read.
        id: ObjectId,
        /// Where the object was expected.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Any other failure reported by a store implementation.
    #[error("{0}")]
    Backend(String),

    /// The fetch was cancelled before it completed.
    #[error("the operation was cancelled")]
    Cancelled,
}
