//! Evaluating a list of patterns against several roots at once.

use futures::future::try_join_all;
use itertools::Itertools;
use treeglob_store::{FetchContext, ObjectStore, RequestTimer};

use crate::{
    GlobCompileError, GlobContext, GlobError, GlobResultSet, GlobRoot, GlobTree, PrefetchList,
    RootId,
};

/// The options of a glob request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobFilesRequest {
    /// The patterns to evaluate.
    pub patterns: Vec<String>,

    /// Whether wildcards match names starting with `.`.
    pub include_dotfiles: bool,

    /// Whether to prefetch the contents of matched files.
    pub prefetch_files: bool,

    /// Whether to return an empty list of matches. Useful together with
    /// `prefetch_files`.
    pub suppress_file_list: bool,

    /// Whether to leave directories out of the matches.
    pub list_only_files: bool,

    /// A directory below each root to evaluate the patterns from. Matched
    /// paths still include this prefix.
    pub search_root: String,
}

/// The outcome of a [`GlobFilesRequest`].
#[derive(Debug, Clone, Default)]
pub struct GlobFilesResponse<'o> {
    /// All matches of all roots.
    pub matches: GlobResultSet<'o>,

    /// The number of distinct blobs handed to the store for prefetching.
    pub prefetched: usize,
}

impl GlobFilesRequest {
    /// Creates a request for the given patterns with every option disabled.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Compiles the patterns of this request.
    pub fn compile(&self) -> Result<GlobTree, GlobCompileError> {
        GlobTree::from_patterns(&self.patterns, self.include_dotfiles)
    }

    /// Evaluates the request against every root concurrently.
    pub async fn run<'o>(
        &self,
        store: &dyn ObjectStore,
        fetch: &FetchContext,
        roots: &'o [(RootId, GlobRoot)],
    ) -> Result<GlobFilesResponse<'o>, GlobError> {
        let mut timer = RequestTimer::start();
        let tree = self.compile()?;

        let prefetch = PrefetchList::new();
        let mut context = GlobContext::new(store, fetch);
        if self.prefetch_files {
            context = context.with_prefetch(&prefetch);
        }

        let search_root = self.search_root.trim_matches('/');
        let tree = &tree;
        let context = &context;
        let evaluations = roots.iter().map(|(origin, root)| async move {
            let root = root.resolve(search_root, store, fetch).await?;
            tree.evaluate_at(context, root, search_root, origin).await
        });

        let mut matches = GlobResultSet::new();
        for set in try_join_all(evaluations).await? {
            matches.merge(set);
        }

        let mut prefetched = 0;
        if self.prefetch_files {
            let ids = prefetch.drain().into_iter().sorted().dedup().collect_vec();
            prefetched = ids.len();
            store.prefetch_blobs(&ids, fetch).await?;
        }

        if self.list_only_files {
            matches.retain(|result| !result.entry_type.is_directory());
        }
        if self.suppress_file_list {
            matches.clear();
        }

        tracing::debug!(
            "glob of {} patterns against {} roots matched {} entries, prefetched {} blobs in {:?}",
            self.patterns.len(),
            roots.len(),
            matches.len(),
            prefetched,
            timer.stop()
        );
        Ok(GlobFilesResponse {
            matches,
            prefetched,
        })
    }
}
