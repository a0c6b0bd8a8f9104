//! Evaluation of a [`GlobTree`] against a directory tree.
//!
//! Every directory is listed once per node that reaches it. Sibling
//! descents and `**` expansions are polled concurrently within the same
//! future, and the first failure aborts the whole evaluation.

use std::sync::Arc;

use futures::{future::try_join_all, future::BoxFuture, FutureExt};
use treeglob_store::{FetchContext, ObjectStore};

use crate::{
    source::{ChildEntry, ChildHandle, GlobRoot, TreeSource},
    GlobError, GlobNode, GlobResult, GlobResultSet, GlobTree, PrefetchList, RootId,
};

type Matches<'a, 'o> = BoxFuture<'a, Result<Vec<GlobResult<'o>>, GlobError>>;

/// The collaborators used by an evaluation.
#[derive(Clone, Copy)]
pub struct GlobContext<'a> {
    store: &'a dyn ObjectStore,
    fetch: &'a FetchContext,
    prefetch: Option<&'a PrefetchList>,
}

impl<'a> GlobContext<'a> {
    /// Creates a context that fetches snapshot trees from `store`.
    pub fn new(store: &'a dyn ObjectStore, fetch: &'a FetchContext) -> Self {
        Self {
            store,
            fetch,
            prefetch: None,
        }
    }

    /// Collects the content ids of matched files into `list`.
    pub fn with_prefetch(mut self, list: &'a PrefetchList) -> Self {
        self.prefetch = Some(list);
        self
    }

    /// The store snapshot trees are fetched from.
    pub fn store(&self) -> &'a dyn ObjectStore {
        self.store
    }

    /// The fetch accounting of the request.
    pub fn fetch_context(&self) -> &'a FetchContext {
        self.fetch
    }
}

#[derive(Clone, Copy)]
struct Walk<'a, 'o> {
    context: GlobContext<'a>,
    origin: &'o RootId,
}

impl<'a, 'o: 'a> Walk<'a, 'o> {
    fn emit(&self, results: &mut Vec<GlobResult<'o>>, path: String, entry: &ChildEntry) {
        if let (Some(prefetch), ChildHandle::Object(id)) = (self.context.prefetch, &entry.handle) {
            if !entry.entry_type.is_directory() {
                prefetch.push(*id);
            }
        }
        results.push(GlobResult::new(path, entry.entry_type, self.origin));
    }

    async fn open(&self, parent: &GlobRoot, entry: &ChildEntry) -> Result<GlobRoot, GlobError> {
        parent
            .open_child(entry, self.context.store, self.context.fetch)
            .await
    }

    async fn list(&self, root: &GlobRoot) -> Result<Arc<Vec<ChildEntry>>, GlobError> {
        Ok(Arc::new(root.list_children(self.context.fetch).await?))
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

fn lookup<'e>(entries: &'e [ChildEntry], name: &str) -> Option<&'e ChildEntry> {
    entries
        .binary_search_by(|entry| entry.name.as_str().cmp(name))
        .ok()
        .map(|index| &entries[index])
}

impl GlobNode {
    /// Matches the children of this node against the entries of `root`.
    fn evaluate_impl<'a, 'o: 'a>(
        &'a self,
        walk: Walk<'a, 'o>,
        path: String,
        root: GlobRoot,
    ) -> Matches<'a, 'o> {
        async move {
            let entries = walk.list(&root).await?;
            tracing::trace!("matching {} entries of '{path}'", entries.len());
            self.evaluate_entries(walk, &path, &root, &entries).await
        }
        .boxed()
    }

    fn evaluate_entries<'a, 'o: 'a>(
        &'a self,
        walk: Walk<'a, 'o>,
        path: &str,
        root: &GlobRoot,
        entries: &Arc<Vec<ChildEntry>>,
    ) -> Matches<'a, 'o> {
        let mut results = Vec::new();
        let mut pending: Vec<Matches<'a, 'o>> = Vec::new();

        for node in &self.children {
            let matched: Vec<&ChildEntry> = if node.has_specials {
                entries.iter().filter(|entry| node.matches(&entry.name)).collect()
            } else {
                lookup(entries, &node.pattern).into_iter().collect()
            };

            for entry in matched {
                let child_path = join_path(path, &entry.name);
                if node.is_leaf {
                    walk.emit(&mut results, child_path.clone(), entry);
                }
                if node.has_descendants() && entry.entry_type.is_directory() {
                    let parent = root.clone();
                    let entry = entry.clone();
                    pending.push(
                        async move {
                            let child = walk.open(&parent, &entry).await?;
                            node.evaluate_impl(walk, child_path, child).await
                        }
                        .boxed(),
                    );
                }
            }
        }

        for node in &self.recursive_children {
            pending.push(node.evaluate_recursive(
                walk,
                path.to_string(),
                root.clone(),
                entries.clone(),
            ));
        }

        async move {
            for matches in try_join_all(pending).await? {
                results.extend(matches);
            }
            Ok::<_, GlobError>(results)
        }
        .boxed()
    }

    /// Expands a `**` node at `root`, matching zero or more directories.
    fn evaluate_recursive<'a, 'o: 'a>(
        &'a self,
        walk: Walk<'a, 'o>,
        path: String,
        root: GlobRoot,
        entries: Arc<Vec<ChildEntry>>,
    ) -> Matches<'a, 'o> {
        let mut results = Vec::new();
        let mut pending = vec![self.evaluate_entries(walk, &path, &root, &entries)];

        for entry in entries.iter().filter(|entry| self.matches(&entry.name)) {
            let child_path = join_path(&path, &entry.name);
            if self.is_leaf {
                walk.emit(&mut results, child_path.clone(), entry);
            }
            if entry.entry_type.is_directory() {
                let parent = root.clone();
                let entry = entry.clone();
                pending.push(
                    async move {
                        let child = walk.open(&parent, &entry).await?;
                        let entries = walk.list(&child).await?;
                        self.evaluate_recursive(walk, child_path, child, entries)
                            .await
                    }
                    .boxed(),
                );
            }
        }

        async move {
            for matches in try_join_all(pending).await? {
                results.extend(matches);
            }
            Ok::<_, GlobError>(results)
        }
        .boxed()
    }
}

impl GlobTree {
    /// Evaluates every pattern against `root`.
    ///
    /// Matched paths are relative to `root` and tagged with `origin`. Any
    /// failure to list or fetch a directory fails the whole evaluation.
    pub async fn evaluate<'o>(
        &self,
        context: &GlobContext<'_>,
        root: GlobRoot,
        origin: &'o RootId,
    ) -> Result<GlobResultSet<'o>, GlobError> {
        self.evaluate_at(context, root, "", origin).await
    }

    /// Like [`GlobTree::evaluate`], but prefixes every matched path with
    /// `base`, the location of `root` below the tree the origin refers to.
    pub async fn evaluate_at<'o>(
        &self,
        context: &GlobContext<'_>,
        root: GlobRoot,
        base: &str,
        origin: &'o RootId,
    ) -> Result<GlobResultSet<'o>, GlobError> {
        let walk = Walk {
            context: *context,
            origin,
        };
        let base = base.trim_matches('/').to_string();
        let results = self.root().evaluate_impl(walk, base, root).await?;
        let set = GlobResultSet::from_unsorted(results);
        tracing::debug!("glob against {origin} matched {} entries", set.len());
        Ok(set)
    }
}
