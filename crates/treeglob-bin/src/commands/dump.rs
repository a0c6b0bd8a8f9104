use miette::IntoDiagnostic;
use treeglob::GlobTree;

#[derive(Debug, clap::Parser)]
pub struct Opt {
    /// The patterns to compile
    #[clap(required = true)]
    patterns: Vec<String>,

    /// Let wildcards match names starting with a dot
    #[clap(long)]
    dotfiles: bool,
}

pub fn dump(opt: Opt) -> miette::Result<()> {
    let tree = GlobTree::from_patterns(&opt.patterns, opt.dotfiles).into_diagnostic()?;
    print!("{}", tree.debug_dump());
    Ok(())
}
