use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use futures::future::try_join_all;

use crate::{FetchContext, FetchError, ObjectId, ObjectStore, Tree};

/// An in-memory cache tier in front of another [`ObjectStore`].
///
/// Trees and blobs are cached after their first successful fetch. Objects are
/// immutable so the cache never needs invalidation.
#[derive(Debug)]
pub struct CachingObjectStore<S> {
    inner: S,
    trees: DashMap<ObjectId, Arc<Tree>>,
    blobs: DashMap<ObjectId, Bytes>,
}

impl<S> CachingObjectStore<S> {
    /// Wraps `inner` with an empty cache.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            trees: DashMap::new(),
            blobs: DashMap::new(),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns true if the blob with the given id is cached.
    pub fn has_cached_blob(&self, id: &ObjectId) -> bool {
        self.blobs.contains_key(id)
    }

    /// Number of cached trees and blobs.
    pub fn cached_objects(&self) -> usize {
        self.trees.len() + self.blobs.len()
    }
}

#[async_trait::async_trait]
impl<S: ObjectStore> ObjectStore for CachingObjectStore<S> {
    async fn get_tree(
        &self,
        id: &ObjectId,
        context: &FetchContext,
    ) -> Result<Arc<Tree>, FetchError> {
        if let Some(tree) = self.trees.get(id) {
            context.record_cache_hit();
            return Ok(tree.clone());
        }
        let tree = self.inner.get_tree(id, context).await?;
        self.trees.insert(*id, tree.clone());
        Ok(tree)
    }

    async fn get_blob(&self, id: &ObjectId, context: &FetchContext) -> Result<Bytes, FetchError> {
        if let Some(blob) = self.blobs.get(id) {
            context.record_cache_hit();
            return Ok(blob.clone());
        }
        let blob = self.inner.get_blob(id, context).await?;
        self.blobs.insert(*id, blob.clone());
        Ok(blob)
    }

    async fn prefetch_blobs(
        &self,
        ids: &[ObjectId],
        context: &FetchContext,
    ) -> Result<(), FetchError> {
        let missing: Vec<_> = ids
            .iter()
            .filter(|id| !self.blobs.contains_key(*id))
            .collect();
        tracing::debug!(
            "prefetching {} of {} requested blobs",
            missing.len(),
            ids.len()
        );
        try_join_all(missing.into_iter().map(|id| self.get_blob(id, context))).await?;
        Ok(())
    }
}
