#![deny(missing_docs)]

//! A live directory tree layered on top of an immutable snapshot.
//!
//! A [`TreeInode`] starts out as a view of a snapshot [`Tree`]. Child
//! directories are only turned into inodes when they are first accessed, and
//! any modification *materializes* the directory: from then on its contents
//! live in memory and no longer correspond to a snapshot object. Directories
//! that were never touched keep pointing at their snapshot [`ObjectId`], which
//! lets readers such as the glob evaluator walk them straight from the object
//! store without loading inodes.
//!
//! Every directory guards its entries with a [`parking_lot::RwLock`]. Locks are
//! only held while entries are read or replaced and never across a fetch.

mod error;
mod inode;

pub use error::InodeError;
pub use inode::{LiveEntry, TreeInode};

#[doc(no_inline)]
pub use treeglob_store::{EntryType, ObjectId, Tree};
