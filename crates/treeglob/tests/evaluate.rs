use std::sync::Arc;

use assert_matches::assert_matches;
use insta::assert_yaml_snapshot;
use rstest::rstest;
use treeglob::{
    GlobContext, GlobError, GlobFilesRequest, GlobResultSet, GlobRoot, GlobTree, PrefetchList,
    RootId,
};
use treeglob_inodes::TreeInode;
use treeglob_store::{
    CachingObjectStore, EntryType, FetchContext, FetchError, MemoryObjectStore, ObjectId,
    ObjectStore, SnapshotBuilder,
};

struct Fixture {
    store: Arc<MemoryObjectStore>,
    root: ObjectId,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(MemoryObjectStore::new());
        let mut builder = SnapshotBuilder::new();
        builder
            .add_file("a.txt", "a")
            .unwrap()
            .add_file("b.rs", "b")
            .unwrap()
            .add_file(".hidden", "hidden")
            .unwrap()
            .add_file(".config/settings.txt", "settings")
            .unwrap()
            .add_file("docs/readme.md", "readme")
            .unwrap()
            .add_file("src/main.rs", "fn main() {}")
            .unwrap()
            .add_file("src/lib/x.rs", "x")
            .unwrap()
            .add_file("src/lib/y.txt", "y")
            .unwrap()
            .add_file("src/.cache/z.rs", "z")
            .unwrap()
            .add_symlink("link", "a.txt")
            .unwrap();
        let root = builder.write(store.as_ref()).unwrap();
        Self { store, root }
    }

    async fn snapshot(&self, fetch: &FetchContext) -> GlobRoot {
        GlobRoot::Snapshot(self.store.get_tree(&self.root, fetch).await.unwrap())
    }

    async fn live(&self, fetch: &FetchContext) -> Arc<TreeInode> {
        TreeInode::load(self.store.clone(), &self.root, fetch)
            .await
            .unwrap()
    }

    async fn glob(
        &self,
        patterns: &[&str],
        include_dotfiles: bool,
        root: GlobRoot,
    ) -> Result<Vec<String>, GlobError> {
        let fetch = FetchContext::new();
        let origin = RootId::from(self.root);
        let tree = GlobTree::from_patterns(patterns, include_dotfiles)?;
        let matches = tree
            .evaluate(&GlobContext::new(self.store.as_ref(), &fetch), root, &origin)
            .await?;
        Ok(names(&matches))
    }

    /// The id of the tree at `path`, looked up through the snapshot.
    async fn tree_id(&self, path: &str) -> ObjectId {
        let fetch = FetchContext::new();
        let mut id = self.root;
        for component in path.split('/') {
            let tree = self.store.get_tree(&id, &fetch).await.unwrap();
            id = tree.get(component).unwrap().id;
        }
        id
    }
}

fn names(matches: &GlobResultSet<'_>) -> Vec<String> {
    matches.iter().map(|m| m.name.clone()).collect()
}

#[tokio::test]
async fn test_txt_and_recursive_rs() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let root = fixture.snapshot(&fetch).await;
    let paths = fixture
        .glob(&["*.txt", "src/**/*.rs"], false, root)
        .await
        .unwrap();
    assert_yaml_snapshot!(paths, @r###"
    - a.txt
    - src/lib/x.rs
    - src/main.rs
    "###);
}

#[tokio::test]
async fn test_recursive_matches_zero_directories() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let paths = fixture
        .glob(&["src/**/main.rs", "**/b.rs"], false, fixture.snapshot(&fetch).await)
        .await
        .unwrap();
    assert_eq!(paths, vec!["b.rs", "src/main.rs"]);
}

#[tokio::test]
async fn test_trailing_recursive_matches_everything_below() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let paths = fixture
        .glob(&["src/**"], false, fixture.snapshot(&fetch).await)
        .await
        .unwrap();
    assert_yaml_snapshot!(paths, @r###"
    - src/lib
    - src/lib/x.rs
    - src/lib/y.txt
    - src/main.rs
    "###);
}

#[tokio::test]
async fn test_dotfiles_excluded_by_wildcards() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();

    let without = fixture
        .glob(&["*", "**/*.rs"], false, fixture.snapshot(&fetch).await)
        .await
        .unwrap();
    assert!(without.iter().all(|path| !path
        .split('/')
        .any(|component| component.starts_with('.'))));
    assert!(without.contains(&"link".to_string()));

    let with = fixture
        .glob(&["*", "**/*.rs"], true, fixture.snapshot(&fetch).await)
        .await
        .unwrap();
    assert!(with.contains(&".hidden".to_string()));
    assert!(with.contains(&".config".to_string()));
    assert!(with.contains(&"src/.cache/z.rs".to_string()));
}

#[tokio::test]
async fn test_literal_dotfiles_always_match() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let paths = fixture
        .glob(
            &[".hidden", ".config/*.txt", "src/.cache/*"],
            false,
            fixture.snapshot(&fetch).await,
        )
        .await
        .unwrap();
    assert_eq!(
        paths,
        vec![".config/settings.txt", ".hidden", "src/.cache/z.rs"]
    );
}

#[rstest]
#[case("src/main.rs", "src/[m]ain.rs")]
#[case("docs/readme.md", "do?s/readme.m?")]
#[case("src/lib/x.rs", "src/*/x.rs")]
#[tokio::test]
async fn test_name_lookup_matches_wildcard(#[case] literal: &str, #[case] wildcard: &str) {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let by_name = fixture
        .glob(&[literal], false, fixture.snapshot(&fetch).await)
        .await
        .unwrap();
    let by_match = fixture
        .glob(&[wildcard], false, fixture.snapshot(&fetch).await)
        .await
        .unwrap();
    assert_eq!(by_name, vec![literal.to_string()]);
    assert_eq!(by_name, by_match);
}

#[tokio::test]
async fn test_overlapping_patterns_are_deduplicated() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let paths = fixture
        .glob(
            &["src/*.rs", "src/**/*.rs", "**/main.rs"],
            false,
            fixture.snapshot(&fetch).await,
        )
        .await
        .unwrap();
    assert_eq!(paths, vec!["src/lib/x.rs", "src/main.rs"]);
}

#[tokio::test]
async fn test_entry_types_are_reported() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let origin = RootId::from(fixture.root);
    let tree = GlobTree::from_patterns(["*"], false).unwrap();
    let matches = tree
        .evaluate(
            &GlobContext::new(fixture.store.as_ref(), &fetch),
            fixture.snapshot(&fetch).await,
            &origin,
        )
        .await
        .unwrap();
    let types = matches
        .iter()
        .map(|m| (m.name.as_str(), m.entry_type))
        .collect::<Vec<_>>();
    assert_eq!(
        types,
        vec![
            ("a.txt", EntryType::RegularFile),
            ("b.rs", EntryType::RegularFile),
            ("docs", EntryType::Directory),
            ("link", EntryType::Symlink),
            ("src", EntryType::Directory),
        ]
    );
}

#[tokio::test]
async fn test_missing_tree_fails_the_evaluation() {
    let fixture = Fixture::new();
    let lib = fixture.tree_id("src/lib").await;
    assert!(fixture.store.remove(&lib));

    let fetch = FetchContext::new();
    let result = fixture
        .glob(&["*.txt", "src/**/*.rs"], false, fixture.snapshot(&fetch).await)
        .await;
    assert_matches!(result, Err(GlobError::Fetch(FetchError::NotFound(id))) if id == lib);

    // Patterns that never reach the missing tree still succeed.
    let paths = fixture
        .glob(&["*.txt", "src/*.rs"], false, fixture.snapshot(&fetch).await)
        .await
        .unwrap();
    assert_eq!(paths, vec!["a.txt", "src/main.rs"]);
}

#[tokio::test]
async fn test_live_and_snapshot_agree() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let live = fixture.live(&fetch).await;
    // A loaded but unmodified directory.
    live.get_or_load_child_tree("docs", &fetch).await.unwrap();

    for patterns in [
        vec!["*.txt", "src/**/*.rs"],
        vec!["**"],
        vec!["*/*", "docs/*.md"],
    ] {
        let from_snapshot = fixture
            .glob(&patterns, true, fixture.snapshot(&fetch).await)
            .await
            .unwrap();
        let from_live = fixture
            .glob(&patterns, true, GlobRoot::Live(live.clone()))
            .await
            .unwrap();
        assert_eq!(from_snapshot, from_live, "patterns {patterns:?}");
    }
}

#[tokio::test]
async fn test_live_tree_sees_modifications() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let live = fixture.live(&fetch).await;
    let src = live.get_or_load_child_tree("src", &fetch).await.unwrap();
    src.write_file("new.rs", "new").unwrap();
    src.unlink("main.rs").unwrap();
    let scratch = live.mkdir("scratch").unwrap();
    scratch.write_file("notes.rs", "notes").unwrap();

    let paths = fixture
        .glob(&["**/*.rs"], false, GlobRoot::Live(live.clone()))
        .await
        .unwrap();
    assert_yaml_snapshot!(paths, @r###"
    - b.rs
    - scratch/notes.rs
    - src/lib/x.rs
    - src/new.rs
    "###);

    // Globbing walks unloaded directories through the snapshot.
    assert!(src.lookup("lib").unwrap().inode.is_none());
}

#[tokio::test]
async fn test_prefetch_collects_file_ids() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let live = fixture.live(&fetch).await;
    live.write_file("local.rs", "local").unwrap();

    let prefetch = PrefetchList::new();
    let context = GlobContext::new(fixture.store.as_ref(), &fetch).with_prefetch(&prefetch);
    let origin = RootId::from(fixture.root);
    let tree = GlobTree::from_patterns(["*.rs", "src", "src/**/*.rs"], false).unwrap();
    let matches = tree
        .evaluate(&context, GlobRoot::Live(live), &origin)
        .await
        .unwrap();
    assert_eq!(
        names(&matches),
        vec!["b.rs", "local.rs", "src", "src/lib/x.rs", "src/main.rs"]
    );

    // Directories and materialized files have nothing to prefetch.
    let mut ids = prefetch.drain();
    ids.sort();
    let mut expected = vec![
        ObjectId::for_content("b"),
        ObjectId::for_content("x"),
        ObjectId::for_content("fn main() {}"),
    ];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_results_keep_their_origin() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let first = RootId::from(fixture.root);
    let second = RootId::from(fixture.root);
    let context = GlobContext::new(fixture.store.as_ref(), &fetch);
    let tree = GlobTree::from_patterns(["*.txt"], false).unwrap();

    let mut matches = tree
        .evaluate(&context, fixture.snapshot(&fetch).await, &first)
        .await
        .unwrap();
    let other = tree
        .evaluate(&context, fixture.snapshot(&fetch).await, &second)
        .await
        .unwrap();
    matches.merge(other);

    assert_eq!(matches.len(), 2);
    assert_eq!(
        matches
            .iter()
            .filter(|m| std::ptr::eq(m.origin, &first))
            .count(),
        1
    );
    assert_eq!(
        matches
            .iter()
            .filter(|m| std::ptr::eq(m.origin, &second))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_glob_files_across_roots() {
    let fixture = Fixture::new();
    let store = CachingObjectStore::new(fixture.store.clone());
    let fetch = FetchContext::new();
    let roots = vec![
        (
            RootId::from("snapshot"),
            GlobRoot::Snapshot(store.get_tree(&fixture.root, &fetch).await.unwrap()),
        ),
        (
            RootId::from("live"),
            GlobRoot::Live(fixture.live(&fetch).await),
        ),
    ];

    let request = GlobFilesRequest {
        search_root: "src".to_string(),
        list_only_files: true,
        prefetch_files: true,
        ..GlobFilesRequest::new(["**"])
    };
    let response = request.run(&store, &fetch, &roots).await.unwrap();

    let found = response
        .matches
        .iter()
        .map(|m| format!("{} {}", m.origin, m.name))
        .collect::<Vec<_>>();
    // Equal names are ordered by the position of their origin in `roots`.
    assert_yaml_snapshot!(found, @r###"
    - snapshot src/lib/x.rs
    - live src/lib/x.rs
    - snapshot src/lib/y.txt
    - live src/lib/y.txt
    - snapshot src/main.rs
    - live src/main.rs
    "###);

    // Both roots share the same blobs.
    assert_eq!(response.prefetched, 3);
    assert!(store.has_cached_blob(&ObjectId::for_content("y")));
    assert!(!store.has_cached_blob(&ObjectId::for_content("a")));
}

#[tokio::test]
async fn test_glob_files_suppressed_list() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let roots = vec![(RootId::from(fixture.root), fixture.snapshot(&fetch).await)];

    let request = GlobFilesRequest {
        prefetch_files: true,
        suppress_file_list: true,
        ..GlobFilesRequest::new(["*.txt", "*.rs"])
    };
    let response = request
        .run(fixture.store.as_ref(), &fetch, &roots)
        .await
        .unwrap();
    assert!(response.matches.is_empty());
    assert_eq!(response.prefetched, 2);
}

#[tokio::test]
async fn test_glob_files_errors() {
    let fixture = Fixture::new();
    let fetch = FetchContext::new();
    let roots = vec![(RootId::from(fixture.root), fixture.snapshot(&fetch).await)];

    let request = GlobFilesRequest {
        search_root: "missing".to_string(),
        ..GlobFilesRequest::new(["*"])
    };
    assert_matches!(
        request.run(fixture.store.as_ref(), &fetch, &roots).await,
        Err(GlobError::SearchRootNotFound(_))
    );

    let request = GlobFilesRequest::new(["src/[abc"]);
    assert_matches!(
        request.run(fixture.store.as_ref(), &fetch, &roots).await,
        Err(GlobError::Compile(_))
    );
}
