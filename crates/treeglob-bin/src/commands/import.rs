use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic};
use treeglob_store::{CasObjectStore, ObjectId, RequestTimer, SnapshotBuilder};

#[derive(Debug, clap::Parser)]
pub struct Opt {
    /// The directory to import
    dir: PathBuf,

    /// Place the contents below this path inside the snapshot
    #[clap(long, default_value = "")]
    prefix: String,
}

pub fn import(store: &Path, opt: Opt) -> miette::Result<()> {
    let id = import_dir(store, &opt.dir, &opt.prefix)?;
    println!("{id}");
    Ok(())
}

/// Snapshots `dir` into the store at `store` and returns the root tree id.
pub fn import_dir(store: &Path, dir: &Path, prefix: &str) -> miette::Result<ObjectId> {
    let mut timer = RequestTimer::start();
    let mut builder = SnapshotBuilder::new();
    builder
        .add_local_dir(prefix.trim_matches('/'), dir)
        .into_diagnostic()
        .with_context(|| format!("failed to read {}", dir.display()))?;

    let store = CasObjectStore::new(store);
    let id = builder
        .write(&store)
        .into_diagnostic()
        .with_context(|| format!("failed to write to {}", store.root().display()))?;

    tracing::info!(
        "imported {} as {id} in {:?}",
        dir.display(),
        timer.stop()
    );
    Ok(id)
}

#[cfg(test)]
mod tests {
    use treeglob_store::{FetchContext, ObjectStore};

    use super::*;

    #[tokio::test]
    async fn test_import_dir() {
        let source = tempfile::tempdir().unwrap();
        std::fs::create_dir(source.path().join("src")).unwrap();
        std::fs::write(source.path().join("src/main.rs"), "fn main() {}").unwrap();
        std::fs::write(source.path().join("README.md"), "readme").unwrap();
        let store = tempfile::tempdir().unwrap();

        let id = import_dir(store.path(), source.path(), "").unwrap();
        let again = import_dir(store.path(), source.path(), "").unwrap();
        assert_eq!(id, again);

        let fetch = FetchContext::new();
        let tree = CasObjectStore::new(store.path())
            .get_tree(&id, &fetch)
            .await
            .unwrap();
        let names = tree
            .entries()
            .iter()
            .map(|entry| entry.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["README.md", "src"]);
    }
}
