use std::{path::Path, sync::Arc};

use itertools::Itertools;
use miette::IntoDiagnostic;
use serde::Serialize;
use treeglob::{GlobFilesRequest, GlobResultSet, GlobRoot, RootId};
use treeglob_inodes::TreeInode;
use treeglob_store::{
    CachingObjectStore, CasObjectStore, EntryType, FetchContext, ObjectId, ObjectStore,
};

#[derive(Debug, clap::Parser)]
pub struct Opt {
    /// The id of the snapshot tree to glob
    tree: ObjectId,

    /// The patterns to evaluate
    #[clap(required = true)]
    patterns: Vec<String>,

    /// Walk the snapshot through a live directory tree
    #[clap(long)]
    live: bool,

    /// Let wildcards match names starting with a dot
    #[clap(long)]
    dotfiles: bool,

    /// Prefetch the contents of matched files
    #[clap(long)]
    prefetch: bool,

    /// Leave directories out of the output
    #[clap(long)]
    only_files: bool,

    /// Evaluate the patterns from this directory inside the snapshot
    #[clap(long, default_value = "")]
    search_root: String,

    /// Print the matches as JSON
    #[clap(long)]
    json: bool,
}

#[derive(Serialize)]
struct Match<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    entry_type: EntryType,
}

pub async fn glob(store: &Path, opt: Opt) -> miette::Result<()> {
    let store: Arc<dyn ObjectStore> = Arc::new(CachingObjectStore::new(CasObjectStore::new(store)));
    let fetch = FetchContext::new();

    let root = if opt.live {
        GlobRoot::Live(
            TreeInode::load(store.clone(), &opt.tree, &fetch)
                .await
                .into_diagnostic()?,
        )
    } else {
        GlobRoot::Snapshot(store.get_tree(&opt.tree, &fetch).await.into_diagnostic()?)
    };
    let roots = [(RootId::from(opt.tree), root)];

    let request = GlobFilesRequest {
        include_dotfiles: opt.dotfiles,
        prefetch_files: opt.prefetch,
        list_only_files: opt.only_files,
        search_root: opt.search_root,
        ..GlobFilesRequest::new(opt.patterns)
    };
    let response = request
        .run(store.as_ref(), &fetch, &roots)
        .await
        .into_diagnostic()?;

    print_matches(&response.matches, opt.json)?;

    let stats = fetch.stats();
    tracing::info!(
        "{} matches, {} trees and {} blobs fetched, {} cache hits, {} blobs prefetched",
        response.matches.len(),
        stats.trees,
        stats.blobs,
        stats.cache_hits,
        response.prefetched
    );
    Ok(())
}

fn print_matches(matches: &GlobResultSet<'_>, json: bool) -> miette::Result<()> {
    if json {
        let matches = matches
            .iter()
            .map(|m| Match {
                name: &m.name,
                entry_type: m.entry_type,
            })
            .collect_vec();
        println!(
            "{}",
            serde_json::to_string_pretty(&matches).into_diagnostic()?
        );
    } else {
        for m in matches {
            if m.entry_type.is_directory() {
                println!("{}/", m.name);
            } else {
                println!("{}", m.name);
            }
        }
    }
    Ok(())
}
