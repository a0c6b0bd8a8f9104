use std::{
    collections::BTreeMap,
    sync::{Arc, Weak},
};

use bytes::Bytes;
use parking_lot::RwLock;
use treeglob_store::{EntryType, FetchContext, ObjectId, ObjectStore, Tree};

use crate::InodeError;

#[derive(Debug, Clone)]
enum EntryState {
    /// Content is identical to the snapshot object with this id.
    Unmaterialized(ObjectId),
    /// A directory whose inode has been loaded.
    LoadedTree(Arc<TreeInode>),
    /// A file or symlink whose content has been written in memory.
    Materialized(Bytes),
}

#[derive(Debug, Clone)]
struct DirEntry {
    entry_type: EntryType,
    state: EntryState,
}

#[derive(Debug)]
struct DirContents {
    entries: BTreeMap<String, DirEntry>,
    /// The snapshot tree these contents were loaded from, `None` once
    /// materialized.
    source: Option<ObjectId>,
}

/// One entry of a [`TreeInode`] as seen at the time of listing.
#[derive(Debug, Clone)]
pub struct LiveEntry {
    /// The name of the entry.
    pub name: String,

    /// The kind of entry.
    pub entry_type: EntryType,

    /// The snapshot object holding the entry's content. `None` when the entry
    /// is materialized (a loaded directory reports the id of the tree it was
    /// loaded from as long as it is unmodified).
    pub id: Option<ObjectId>,

    /// The loaded inode of a directory entry, if any.
    pub inode: Option<Arc<TreeInode>>,
}

impl LiveEntry {
    /// Returns true if the entry's content no longer corresponds to a
    /// snapshot object.
    pub fn is_materialized(&self) -> bool {
        self.id.is_none()
    }
}

/// A directory of the live tree.
pub struct TreeInode {
    store: Arc<dyn ObjectStore>,
    parent: Option<Weak<TreeInode>>,
    contents: RwLock<DirContents>,
}

impl TreeInode {
    /// Creates an empty, materialized root directory.
    pub fn new_empty(store: Arc<dyn ObjectStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            parent: None,
            contents: RwLock::new(DirContents {
                entries: BTreeMap::new(),
                source: None,
            }),
        })
    }

    /// Creates a root directory that mirrors the given snapshot tree.
    pub fn from_tree(store: Arc<dyn ObjectStore>, tree: &Tree) -> Arc<Self> {
        Arc::new(Self::unloaded(store, None, tree))
    }

    /// Fetches the snapshot tree with the given id and creates a root
    /// directory for it.
    pub async fn load(
        store: Arc<dyn ObjectStore>,
        id: &ObjectId,
        context: &FetchContext,
    ) -> Result<Arc<Self>, InodeError> {
        let tree = store.get_tree(id, context).await?;
        Ok(Self::from_tree(store, &tree))
    }

    fn unloaded(store: Arc<dyn ObjectStore>, parent: Option<Weak<TreeInode>>, tree: &Tree) -> Self {
        let entries = tree
            .entries()
            .iter()
            .map(|entry| {
                (
                    entry.name.clone(),
                    DirEntry {
                        entry_type: entry.entry_type,
                        state: EntryState::Unmaterialized(entry.id),
                    },
                )
            })
            .collect();
        Self {
            store,
            parent,
            contents: RwLock::new(DirContents {
                entries,
                source: Some(*tree.id()),
            }),
        }
    }

    /// The store snapshot objects are loaded from.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Returns true if this directory has been modified since it was loaded.
    pub fn is_materialized(&self) -> bool {
        self.contents.read().source.is_none()
    }

    /// The id of the snapshot tree this directory still corresponds to.
    pub fn source_id(&self) -> Option<ObjectId> {
        self.contents.read().source
    }

    /// Returns a copy of all entries, sorted by name.
    pub fn list(&self) -> Vec<LiveEntry> {
        let contents = self.contents.read();
        contents
            .entries
            .iter()
            .map(|(name, entry)| live_entry(name, entry))
            .collect()
    }

    /// Returns a copy of a single entry.
    pub fn lookup(&self, name: &str) -> Option<LiveEntry> {
        let contents = self.contents.read();
        contents
            .entries
            .get(name)
            .map(|entry| live_entry(name, entry))
    }

    /// Returns the inode of the child directory `name`, loading it from the
    /// snapshot if needed. Concurrent loads of the same child resolve to the
    /// same inode.
    pub async fn get_or_load_child_tree(
        self: &Arc<Self>,
        name: &str,
        context: &FetchContext,
    ) -> Result<Arc<TreeInode>, InodeError> {
        let id = {
            let contents = self.contents.read();
            let entry = contents
                .entries
                .get(name)
                .ok_or_else(|| InodeError::NotFound(name.to_string()))?;
            match &entry.state {
                EntryState::LoadedTree(inode) => return Ok(inode.clone()),
                EntryState::Unmaterialized(id) if entry.entry_type.is_directory() => *id,
                _ => return Err(InodeError::NotADirectory(name.to_string())),
            }
        };

        // Fetch without holding the lock.
        let tree = self.store.get_tree(&id, context).await?;

        let mut contents = self.contents.write();
        let entry = contents
            .entries
            .get_mut(name)
            .ok_or_else(|| InodeError::NotFound(name.to_string()))?;
        if let EntryState::LoadedTree(inode) = &entry.state {
            // Another task finished loading first.
            return Ok(inode.clone());
        }
        if !matches!(entry.state, EntryState::Unmaterialized(current) if current == id) {
            return Err(InodeError::NotADirectory(name.to_string()));
        }

        tracing::trace!("loaded directory inode '{name}' from tree {id}");
        let inode = Arc::new(Self::unloaded(
            self.store.clone(),
            Some(Arc::downgrade(self)),
            &tree,
        ));
        entry.state = EntryState::LoadedTree(inode.clone());
        Ok(inode)
    }

    /// Resolves a `/` separated path of directories below this one. An empty
    /// path resolves to this directory.
    pub async fn get_or_load_path(
        self: &Arc<Self>,
        path: &str,
        context: &FetchContext,
    ) -> Result<Arc<TreeInode>, InodeError> {
        let mut current = self.clone();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current = current.get_or_load_child_tree(component, context).await?;
        }
        Ok(current)
    }

    /// Reads the content of a file or the target of a symlink.
    pub async fn read_file(&self, name: &str, context: &FetchContext) -> Result<Bytes, InodeError> {
        let state = {
            let contents = self.contents.read();
            let entry = contents
                .entries
                .get(name)
                .ok_or_else(|| InodeError::NotFound(name.to_string()))?;
            if entry.entry_type.is_directory() {
                return Err(InodeError::IsADirectory(name.to_string()));
            }
            entry.state.clone()
        };
        match state {
            EntryState::Materialized(content) => Ok(content),
            EntryState::Unmaterialized(id) => Ok(self.store.get_blob(&id, context).await?),
            EntryState::LoadedTree(_) => Err(InodeError::IsADirectory(name.to_string())),
        }
    }

    /// Creates a new, empty child directory.
    pub fn mkdir(self: &Arc<Self>, name: &str) -> Result<Arc<TreeInode>, InodeError> {
        validate_name(name)?;
        let inode = {
            let mut contents = self.contents.write();
            if contents.entries.contains_key(name) {
                return Err(InodeError::AlreadyExists(name.to_string()));
            }
            let inode = Arc::new(Self {
                store: self.store.clone(),
                parent: Some(Arc::downgrade(self)),
                contents: RwLock::new(DirContents {
                    entries: BTreeMap::new(),
                    source: None,
                }),
            });
            contents.entries.insert(
                name.to_string(),
                DirEntry {
                    entry_type: EntryType::Directory,
                    state: EntryState::LoadedTree(inode.clone()),
                },
            );
            contents.source = None;
            inode
        };
        self.materialize_parents();
        Ok(inode)
    }

    /// Creates or replaces a regular file.
    pub fn write_file(&self, name: &str, content: impl Into<Bytes>) -> Result<(), InodeError> {
        self.set_leaf(name, EntryType::RegularFile, content.into())
    }

    /// Creates or replaces a symlink pointing at `target`.
    pub fn symlink(&self, name: &str, target: &str) -> Result<(), InodeError> {
        self.set_leaf(
            name,
            EntryType::Symlink,
            Bytes::copy_from_slice(target.as_bytes()),
        )
    }

    fn set_leaf(&self, name: &str, entry_type: EntryType, content: Bytes) -> Result<(), InodeError> {
        validate_name(name)?;
        {
            let mut contents = self.contents.write();
            if let Some(existing) = contents.entries.get(name) {
                if existing.entry_type.is_directory() {
                    return Err(InodeError::IsADirectory(name.to_string()));
                }
            }
            contents.entries.insert(
                name.to_string(),
                DirEntry {
                    entry_type,
                    state: EntryState::Materialized(content),
                },
            );
            contents.source = None;
        }
        self.materialize_parents();
        Ok(())
    }

    /// Removes a file or symlink.
    pub fn unlink(&self, name: &str) -> Result<(), InodeError> {
        {
            let mut contents = self.contents.write();
            let entry = contents
                .entries
                .get(name)
                .ok_or_else(|| InodeError::NotFound(name.to_string()))?;
            if entry.entry_type.is_directory() {
                return Err(InodeError::IsADirectory(name.to_string()));
            }
            contents.entries.remove(name);
            contents.source = None;
        }
        self.materialize_parents();
        Ok(())
    }

    /// Removes an empty child directory.
    pub async fn rmdir(self: &Arc<Self>, name: &str, context: &FetchContext) -> Result<(), InodeError> {
        let child = self.get_or_load_child_tree(name, context).await?;
        {
            // Lock order is parent before child.
            let mut contents = self.contents.write();
            if !child.contents.read().entries.is_empty() {
                return Err(InodeError::DirectoryNotEmpty(name.to_string()));
            }
            contents.entries.remove(name);
            contents.source = None;
        }
        self.materialize_parents();
        Ok(())
    }

    /// Marks every ancestor as materialized.
    fn materialize_parents(&self) {
        let mut parent = self.parent.as_ref().and_then(Weak::upgrade);
        while let Some(dir) = parent {
            {
                let mut contents = dir.contents.write();
                if contents.source.is_none() {
                    break;
                }
                contents.source = None;
            }
            parent = dir.parent.as_ref().and_then(Weak::upgrade);
        }
    }
}

impl std::fmt::Debug for TreeInode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let contents = self.contents.read();
        f.debug_struct("TreeInode")
            .field("source", &contents.source)
            .field("entries", &contents.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn live_entry(name: &str, entry: &DirEntry) -> LiveEntry {
    let (id, inode) = match &entry.state {
        EntryState::Unmaterialized(id) => (Some(*id), None),
        EntryState::LoadedTree(inode) => (inode.source_id(), Some(inode.clone())),
        EntryState::Materialized(_) => (None, None),
    };
    LiveEntry {
        name: name.to_string(),
        entry_type: entry.entry_type,
        id,
        inode,
    }
}

fn validate_name(name: &str) -> Result<(), InodeError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(InodeError::InvalidName(name.to_string()));
    }
    Ok(())
}
