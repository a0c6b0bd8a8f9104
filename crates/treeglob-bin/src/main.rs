use std::path::PathBuf;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::{filter::LevelFilter, util::SubscriberInitExt, EnvFilter};

mod commands;

/// Snapshot directories into a content addressable store and glob them.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory of the object store
    #[arg(long, global = true, env = "TREEGLOB_STORE", default_value = ".treeglob")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Import a local directory as a snapshot and print its tree id
    Import(commands::import::Opt),

    /// Evaluate glob patterns against a snapshot
    Glob(commands::glob::Opt),

    /// Print the compiled form of a set of patterns
    Dump(commands::dump::Opt),
}

/// Entry point of the `treeglob` cli.
#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()
        .into_diagnostic()?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .finish()
        .try_init()
        .into_diagnostic()?;

    match cli.command {
        Commands::Import(opt) => commands::import::import(&cli.store, opt),
        Commands::Glob(opt) => commands::glob::glob(&cli.store, opt).await,
        Commands::Dump(opt) => commands::dump::dump(opt),
    }
}
