//! An on-disk content addressable object store.
//!
//! Objects are stored in a directory structure based on their id:
//! ```text
//! <root>/
//!   <first 2 hex chars>/
//!     <next 2 hex chars>/
//!       <remaining hex chars>
//! ```
//!
//! Writes go through a temporary file in `<root>/.tmp` which is atomically
//! persisted to its final location, so readers never observe partial objects.
//! Writing content that is already stored is a no-op.

use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::Bytes;
use fs_err::tokio as fs;

use crate::{FetchContext, FetchError, ObjectId, ObjectStore, ObjectWriter, Tree};

/// Returns the relative path in the store for a given id. Note that the path
/// might not exist.
pub fn path_for_id(id: &ObjectId) -> PathBuf {
    let hex = id.to_string();
    PathBuf::from(format!("{}/{}/{}", &hex[0..2], &hex[2..4], &hex[4..]))
}

/// An [`ObjectStore`] backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct CasObjectStore {
    root: PathBuf,
}

impl CasObjectStore {
    /// Opens a store rooted at `root`. The directory is created lazily on the
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns true if an object with the given id is stored.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.root.join(path_for_id(id)).is_file()
    }

    fn temp_dir(&self) -> PathBuf {
        self.root.join(".tmp")
    }

    /// Writes a byte buffer to the store, returning its id.
    fn write_bytes(&self, content: &[u8]) -> std::io::Result<ObjectId> {
        let id = ObjectId::for_content(content);
        let path = self.root.join(path_for_id(&id));

        // Fast path: the object is already stored.
        if path.exists() {
            return Ok(id);
        }

        fs_err::create_dir_all(path.parent().expect("parent directory must exist"))?;

        let temp_dir = self.temp_dir();
        fs_err::create_dir_all(&temp_dir)?;

        let mut temp = tempfile::Builder::new().tempfile_in(&temp_dir)?;
        temp.write_all(content)?;
        temp.flush()?;

        // Persist the file, ignoring AlreadyExists from a concurrent writer.
        match temp.persist_noclobber(&path) {
            Ok(_) => Ok(id),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(id),
            Err(e) => Err(e.error),
        }
    }

    async fn read(&self, id: &ObjectId) -> Result<Vec<u8>, FetchError> {
        let path = self.root.join(path_for_id(id));
        match fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(*id))
            }
            Err(source) => Err(FetchError::Io {
                id: *id,
                path,
                source,
            }),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for CasObjectStore {
    async fn get_tree(
        &self,
        id: &ObjectId,
        context: &FetchContext,
    ) -> Result<Arc<Tree>, FetchError> {
        let content = self.read(id).await?;
        let tree = Tree::decode(&content).map_err(|err| FetchError::InvalidTree(*id, err))?;
        tracing::trace!("read tree {id} with {} entries", tree.entries().len());
        context.record_tree_fetch();
        Ok(Arc::new(tree))
    }

    async fn get_blob(&self, id: &ObjectId, context: &FetchContext) -> Result<Bytes, FetchError> {
        let content = self.read(id).await?;
        context.record_blob_fetch();
        Ok(Bytes::from(content))
    }
}

impl ObjectWriter for CasObjectStore {
    fn put_blob(&self, content: &[u8]) -> std::io::Result<ObjectId> {
        self.write_bytes(content)
    }

    fn put_tree(&self, tree: &Tree) -> std::io::Result<ObjectId> {
        self.write_bytes(&tree.encode())
    }
}
