//! Uniform access to the directories a glob is evaluated against.

use std::sync::Arc;

use treeglob_inodes::{InodeError, TreeInode};
use treeglob_store::{EntryType, FetchContext, FetchError, ObjectId, ObjectStore, Tree};

use crate::GlobError;

/// How to reach the contents of a directory entry.
#[derive(Debug, Clone)]
pub enum ChildHandle {
    /// The entry is identical to a snapshot object.
    Object(ObjectId),
    /// The entry is a loaded live directory.
    Inode(Arc<TreeInode>),
    /// The entry only exists in memory and has no snapshot object.
    Materialized,
}

/// One entry of a directory listing.
#[derive(Debug, Clone)]
pub struct ChildEntry {
    /// The name of the entry.
    pub name: String,
    /// The kind of entry.
    pub entry_type: EntryType,
    /// How to reach the entry's contents.
    pub handle: ChildHandle,
}

impl ChildEntry {
    /// The snapshot object of the entry, if any.
    pub fn object_id(&self) -> Option<&ObjectId> {
        match &self.handle {
            ChildHandle::Object(id) => Some(id),
            _ => None,
        }
    }
}

/// A directory whose children can be listed.
///
/// Listings are sorted by name.
#[async_trait::async_trait]
pub trait TreeSource: Send + Sync {
    /// Lists the entries of the directory.
    async fn list_children(&self, context: &FetchContext) -> Result<Vec<ChildEntry>, FetchError>;
}

#[async_trait::async_trait]
impl TreeSource for Arc<Tree> {
    async fn list_children(&self, _context: &FetchContext) -> Result<Vec<ChildEntry>, FetchError> {
        Ok(self
            .entries()
            .iter()
            .map(|entry| ChildEntry {
                name: entry.name.clone(),
                entry_type: entry.entry_type,
                handle: ChildHandle::Object(entry.id),
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl TreeSource for Arc<TreeInode> {
    async fn list_children(&self, _context: &FetchContext) -> Result<Vec<ChildEntry>, FetchError> {
        Ok(self
            .list()
            .into_iter()
            .map(|entry| {
                let handle = match (entry.inode, entry.id) {
                    (Some(inode), _) => ChildHandle::Inode(inode),
                    (None, Some(id)) => ChildHandle::Object(id),
                    (None, None) => ChildHandle::Materialized,
                };
                ChildEntry {
                    name: entry.name,
                    entry_type: entry.entry_type,
                    handle,
                }
            })
            .collect())
    }
}

/// A directory in either a snapshot or a live tree.
#[derive(Debug, Clone)]
pub enum GlobRoot {
    /// An immutable snapshot tree.
    Snapshot(Arc<Tree>),
    /// A live directory.
    Live(Arc<TreeInode>),
}

impl From<Arc<Tree>> for GlobRoot {
    fn from(tree: Arc<Tree>) -> Self {
        GlobRoot::Snapshot(tree)
    }
}

impl From<Arc<TreeInode>> for GlobRoot {
    fn from(inode: Arc<TreeInode>) -> Self {
        GlobRoot::Live(inode)
    }
}

#[async_trait::async_trait]
impl TreeSource for GlobRoot {
    async fn list_children(&self, context: &FetchContext) -> Result<Vec<ChildEntry>, FetchError> {
        match self {
            GlobRoot::Snapshot(tree) => tree.list_children(context).await,
            GlobRoot::Live(inode) => inode.list_children(context).await,
        }
    }
}

impl GlobRoot {
    /// Opens a directory entry of this directory.
    ///
    /// Loaded live directories stay live. Entries that still correspond to a
    /// snapshot tree are continued on that tree without loading an inode.
    pub async fn open_child(
        &self,
        entry: &ChildEntry,
        store: &dyn ObjectStore,
        context: &FetchContext,
    ) -> Result<GlobRoot, GlobError> {
        match (&entry.handle, self) {
            (ChildHandle::Inode(inode), _) => Ok(GlobRoot::Live(inode.clone())),
            (ChildHandle::Object(id), _) => {
                Ok(GlobRoot::Snapshot(store.get_tree(id, context).await?))
            }
            (ChildHandle::Materialized, GlobRoot::Live(parent)) => Ok(GlobRoot::Live(
                parent.get_or_load_child_tree(&entry.name, context).await?,
            )),
            (ChildHandle::Materialized, GlobRoot::Snapshot(_)) => {
                Err(InodeError::NotADirectory(entry.name.clone()).into())
            }
        }
    }

    /// Resolves a `/` separated directory path below this directory. An empty
    /// path resolves to this directory.
    pub async fn resolve(
        &self,
        path: &str,
        store: &dyn ObjectStore,
        context: &FetchContext,
    ) -> Result<GlobRoot, GlobError> {
        let mut current = self.clone();
        let mut resolved = String::new();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            if !resolved.is_empty() {
                resolved.push('/');
            }
            resolved.push_str(component);

            let entries = current.list_children(context).await?;
            let entry = match entries.binary_search_by(|e| e.name.as_str().cmp(component)) {
                Ok(index) => &entries[index],
                Err(_) => return Err(GlobError::SearchRootNotFound(resolved)),
            };
            if !entry.entry_type.is_directory() {
                return Err(GlobError::SearchRootNotADirectory(resolved));
            }
            current = current.open_child(entry, store, context).await?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use treeglob_store::{MemoryObjectStore, SnapshotBuilder};

    use super::*;

    fn snapshot() -> (Arc<MemoryObjectStore>, ObjectId) {
        let store = Arc::new(MemoryObjectStore::new());
        let mut builder = SnapshotBuilder::new();
        builder
            .add_file("a.txt", "a")
            .unwrap()
            .add_file("src/main.rs", "fn main() {}")
            .unwrap();
        let root = builder.write(store.as_ref()).unwrap();
        (store, root)
    }

    #[tokio::test]
    async fn test_live_listing_handles() {
        let (store, root) = snapshot();
        let context = FetchContext::new();
        let inode = TreeInode::load(store.clone(), &root, &context).await.unwrap();
        inode.write_file("new.txt", "new").unwrap();
        inode.get_or_load_child_tree("src", &context).await.unwrap();

        let entries = inode.list_children(&context).await.unwrap();
        let names = entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a.txt", "new.txt", "src"]);
        assert_matches!(entries[0].handle, ChildHandle::Object(_));
        assert_matches!(entries[1].handle, ChildHandle::Materialized);
        assert_matches!(entries[2].handle, ChildHandle::Inode(_));
    }

    #[tokio::test]
    async fn test_resolve() {
        let (store, root) = snapshot();
        let context = FetchContext::new();
        let tree = store.get_tree(&root, &context).await.unwrap();
        let root = GlobRoot::Snapshot(tree);

        let src = root.resolve("src", store.as_ref(), &context).await.unwrap();
        let entries = src.list_children(&context).await.unwrap();
        assert_eq!(entries[0].name, "main.rs");

        assert_matches!(
            root.resolve("missing", store.as_ref(), &context).await,
            Err(GlobError::SearchRootNotFound(path)) if path == "missing"
        );
        assert_matches!(
            root.resolve("src/main.rs", store.as_ref(), &context).await,
            Err(GlobError::SearchRootNotADirectory(path)) if path == "src/main.rs"
        );
    }
}
