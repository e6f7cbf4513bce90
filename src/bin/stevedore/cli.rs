//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// Stevedore - builds signed, documented module repositories
#[derive(Parser)]
#[command(name = "stevedore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Filesystem root of the repository containing src/Modules/*.cs
    #[arg(short, long)]
    pub root: PathBuf,

    /// Path to the private key file used for signing
    #[arg(short, long)]
    pub key: PathBuf,

    /// Module compiler program
    #[arg(long, default_value = "csc")]
    pub compiler: String,

    /// Markdown-to-PDF engine program
    #[arg(long, default_value = "mdpdf")]
    pub doc_engine: String,

    /// Host application assembly added to the base reference set
    #[arg(long)]
    pub host_assembly: Option<String>,

    /// Skip PDF documentation rendering
    #[arg(long)]
    pub skip_docs: bool,

    /// Override the per-user installed-modules directory
    #[arg(long)]
    pub install_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
