#![deny(missing_docs)]

//! Content addressed storage for directory snapshots.
//!
//! A snapshot is a tree of [`Tree`] objects whose entries point at further
//! trees or at file blobs by their [`ObjectId`]. Every object is identified by
//! the SHA-256 of its encoded bytes, so identical subtrees and identical file
//! contents are stored once.
//!
//! # Components
//!
//! - [`ObjectStore`]: async read access to trees and blobs
//! - [`ObjectWriter`]: synchronous write access used to build snapshots
//! - [`MemoryObjectStore`]: everything in a [`dashmap::DashMap`]
//! - [`CasObjectStore`]: objects on disk in a content addressable layout
//! - [`CachingObjectStore`]: an in-memory tier in front of another store
//! - [`SnapshotBuilder`]: assembles nested trees from a flat list of paths
//! - [`FetchContext`]: request scoped fetch accounting
//!
//! # Usage
//!
//! ```rust
//! use treeglob_store::{FetchContext, MemoryObjectStore, ObjectStore, SnapshotBuilder};
//!
//! let store = MemoryObjectStore::new();
//! let mut builder = SnapshotBuilder::new();
//! builder.add_file("src/main.rs", "fn main() {}").unwrap();
//! let root = builder.write(&store).unwrap();
//!
//! let context = FetchContext::new();
//! let tree = futures::executor::block_on(store.get_tree(&root, &context)).unwrap();
//! assert_eq!(tree.entries()[0].name, "src");
//! ```

mod builder;
mod cache;
mod cas;
mod context;
mod error;
mod memory;
mod object_id;
mod store;
mod tree;

pub use builder::{SnapshotBuilder, SnapshotBuilderError};
pub use cache::CachingObjectStore;
pub use cas::{path_for_id, CasObjectStore};
pub use context::{FetchContext, FetchStats, RequestTimer};
pub use error::FetchError;
pub use memory::MemoryObjectStore;
pub use object_id::{ObjectId, ParseObjectIdError};
pub use store::{ObjectStore, ObjectWriter};
pub use tree::{EntryType, Tree, TreeEntry};
