use std::sync::Arc;

use bytes::Bytes;

use crate::{FetchContext, FetchError, ObjectId, Tree};

/// Read access to trees and blobs by their content id.
///
/// Implementations may have to go to disk or over the network, so every
/// method is async. Retrying failed fetches is up to the implementation;
/// callers treat an error as final.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the tree with the given id.
    async fn get_tree(&self, id: &ObjectId, context: &FetchContext)
        -> Result<Arc<Tree>, FetchError>;

    /// Returns the contents of the blob with the given id.
    async fn get_blob(&self, id: &ObjectId, context: &FetchContext) -> Result<Bytes, FetchError>;

    /// Hints that the given blobs will be read soon.
    ///
    /// The default implementation does nothing, which is appropriate for
    /// stores where reads are already cheap.
    async fn prefetch_blobs(
        &self,
        ids: &[ObjectId],
        context: &FetchContext,
    ) -> Result<(), FetchError> {
        let _ = (ids, context);
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    async fn get_tree(
        &self,
        id: &ObjectId,
        context: &FetchContext,
    ) -> Result<Arc<Tree>, FetchError> {
        (**self).get_tree(id, context).await
    }

    async fn get_blob(&self, id: &ObjectId, context: &FetchContext) -> Result<Bytes, FetchError> {
        (**self).get_blob(id, context).await
    }

    async fn prefetch_blobs(
        &self,
        ids: &[ObjectId],
        context: &FetchContext,
    ) -> Result<(), FetchError> {
        (**self).prefetch_blobs(ids, context).await
    }
}

/// Write access used to build snapshots.
pub trait ObjectWriter {
    /// Stores a blob and returns its id.
    fn put_blob(&self, content: &[u8]) -> std::io::Result<ObjectId>;

    /// Stores a tree and returns its id.
    fn put_tree(&self, tree: &Tree) -> std::io::Result<ObjectId>;
}
