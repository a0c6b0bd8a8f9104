#![deny(missing_docs)]

//! Compiled glob pattern trees evaluated against directory trees.
//!
//! Patterns are compiled into a [`GlobTree`], a prefix tree with one
//! [`GlobNode`] per path component. Patterns with a common leading component
//! share the node for it. A tree is evaluated against a [`GlobRoot`], either an
//! immutable snapshot [`Tree`](treeglob_store::Tree) or a live
//! [`TreeInode`](treeglob_inodes::TreeInode). Live directories that were never
//! loaded are walked through their snapshot trees, so globbing never loads
//! inodes.
//!
//! Supported syntax per component is `*`, `?`, `[...]` and `\` escapes. A
//! component consisting of exactly `**` matches zero or more directories.
//! Unless dotfiles are included, wildcards never match names starting with `.`.
//!
//! # Usage
//!
//! ```rust
//! use treeglob::{GlobContext, GlobRoot, GlobTree, RootId};
//! use treeglob_store::{FetchContext, MemoryObjectStore, ObjectStore, SnapshotBuilder};
//!
//! # futures::executor::block_on(async {
//! let store = MemoryObjectStore::new();
//! let mut builder = SnapshotBuilder::new();
//! builder
//!     .add_file("a.txt", "a")
//!     .unwrap()
//!     .add_file("src/lib/x.rs", "x")
//!     .unwrap();
//! let id = builder.write(&store).unwrap();
//!
//! let fetch = FetchContext::new();
//! let root = GlobRoot::Snapshot(store.get_tree(&id, &fetch).await.unwrap());
//! let origin = RootId::from(id);
//!
//! let tree = GlobTree::from_patterns(["*.txt", "src/**/*.rs"], false).unwrap();
//! let matches = tree
//!     .evaluate(&GlobContext::new(&store, &fetch), root, &origin)
//!     .await
//!     .unwrap();
//! let names: Vec<_> = matches.iter().map(|m| m.name.as_str()).collect();
//! assert_eq!(names, ["a.txt", "src/lib/x.rs"]);
//! # });
//! ```

mod error;
mod evaluate;
mod glob_files;
mod matcher;
mod node;
mod prefetch;
mod result;
mod source;

pub use error::{GlobCompileError, GlobError};
pub use evaluate::GlobContext;
pub use glob_files::{GlobFilesRequest, GlobFilesResponse};
pub use matcher::{has_specials, GlobMatcher};
pub use node::{GlobNode, GlobTree};
pub use prefetch::PrefetchList;
pub use result::{GlobResult, GlobResultSet, RootId};
pub use source::{ChildEntry, ChildHandle, GlobRoot, TreeSource};
