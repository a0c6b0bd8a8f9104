use thiserror::Error;
use treeglob_inodes::InodeError;
use treeglob_store::FetchError;

/// Errors that can occur when adding a pattern to a [`crate::GlobTree`].
///
/// A failed `parse` leaves the tree exactly as it was.
#[derive(Debug, Error)]
pub enum GlobCompileError {
    /// The pattern is empty.
    #[error("glob pattern is empty")]
    EmptyPattern,

    /// The pattern contains an empty, `.` or `..` component.
    #[error("invalid component '{component}' in glob pattern '{pattern}'")]
    InvalidComponent {
        /// The full pattern.
        pattern: String,
        /// The offending component.
        component: String,
    },

    /// A component could not be compiled by the glob matcher.
    #[error("failed to compile glob fragment '{fragment}'")]
    InvalidFragment {
        /// The offending fragment.
        fragment: String,
        /// The error reported by the matcher.
        #[source]
        source: glob::PatternError,
    },
}

/// Errors that can occur while evaluating globs.
///
/// An evaluation that fails produces no results at all.
#[derive(Debug, Error)]
pub enum GlobError {
    /// One of the patterns failed to compile.
    #[error(transparent)]
    Compile(#[from] GlobCompileError),

    /// A tree or blob could not be fetched from the object store.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A live directory could not be loaded.
    #[error(transparent)]
    Inode(#[from] InodeError),

    /// The requested search root does not exist.
    #[error("search root '{0}' does not exist")]
    SearchRootNotFound(String),

    /// The requested search root is not a directory.
    #[error("search root '{0}' is not a directory")]
    SearchRootNotADirectory(String),
}
