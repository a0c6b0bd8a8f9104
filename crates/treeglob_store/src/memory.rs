use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;

use crate::{FetchContext, FetchError, ObjectId, ObjectStore, ObjectWriter, Tree};

#[derive(Debug, Clone)]
enum StoredObject {
    Tree(Arc<Tree>),
    Blob(Bytes),
}

/// An [`ObjectStore`] that keeps every object in memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<ObjectId, StoredObject>,
}

impl MemoryObjectStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a blob and returns its id.
    pub fn insert_blob(&self, content: impl Into<Bytes>) -> ObjectId {
        let content = content.into();
        let id = ObjectId::for_content(&content);
        self.objects.insert(id, StoredObject::Blob(content));
        id
    }

    /// Stores a tree and returns its id.
    pub fn insert_tree(&self, tree: Tree) -> ObjectId {
        let id = *tree.id();
        self.objects.insert(id, StoredObject::Tree(Arc::new(tree)));
        id
    }

    /// Removes an object, making later fetches of it fail.
    pub fn remove(&self, id: &ObjectId) -> bool {
        self.objects.remove(id).is_some()
    }

    /// The number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_tree(
        &self,
        id: &ObjectId,
        context: &FetchContext,
    ) -> Result<Arc<Tree>, FetchError> {
        let object = self.objects.get(id).map(|entry| entry.value().clone());
        match object {
            Some(StoredObject::Tree(tree)) => {
                context.record_tree_fetch();
                Ok(tree)
            }
            Some(StoredObject::Blob(_)) => Err(FetchError::NotATree(*id)),
            None => Err(FetchError::NotFound(*id)),
        }
    }

    async fn get_blob(&self, id: &ObjectId, context: &FetchContext) -> Result<Bytes, FetchError> {
        let object = self.objects.get(id).map(|entry| entry.value().clone());
        match object {
            Some(StoredObject::Blob(content)) => {
                context.record_blob_fetch();
                Ok(content)
            }
            Some(StoredObject::Tree(tree)) => {
                context.record_blob_fetch();
                Ok(Bytes::from(tree.encode()))
            }
            None => Err(FetchError::NotFound(*id)),
        }
    }
}

impl ObjectWriter for MemoryObjectStore {
    fn put_blob(&self, content: &[u8]) -> std::io::Result<ObjectId> {
        Ok(self.insert_blob(Bytes::copy_from_slice(content)))
    }

    fn put_tree(&self, tree: &Tree) -> std::io::Result<ObjectId> {
        Ok(self.insert_tree(tree.clone()))
    }
}
