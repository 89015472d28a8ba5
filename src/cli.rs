//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Fetch filedot.to files and folders through the gated free-download flow.
///
/// Resolves each link's multi-step "free download" gate and hands the final
/// URL to aria2c for the actual transfer.
#[derive(Parser, Debug)]
#[command(name = "fdget")]
#[command(author, version, about)]
pub struct Args {
    /// File or folder URL to download
    #[arg(value_name = "URL", required_unless_present = "list")]
    pub url: Option<String>,

    /// Download directory
    #[arg(short = 'd', long = "dir", default_value = ".")]
    pub dir: PathBuf,

    /// Number of concurrent downloads
    #[arg(short = 'N', long = "concurrent", default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..))]
    pub concurrent: u8,

    /// File containing a list of URLs to download, one per line
    #[arg(long, value_name = "PATH")]
    pub list: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
