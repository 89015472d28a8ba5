//! CLI entry point for fdget.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fdget_core::{
    Aria2Agent, BatchReport, DownloadDispatcher, FolderEnumerator, LinkResolver, Pacer,
    SiteProfile, read_url_list,
};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let inputs: Vec<String> = if let Some(list_path) = &args.list {
        read_url_list(list_path)?
    } else {
        args.url.clone().into_iter().collect()
    };

    if inputs.is_empty() {
        info!("no URLs to download");
        return Ok(());
    }

    let profile = Arc::new(SiteProfile::filedot());
    let resolver = LinkResolver::new(Arc::clone(&profile));
    let agent = Arc::new(Aria2Agent::new(profile.user_agent.clone()));
    let dispatcher = DownloadDispatcher::new(
        usize::from(args.concurrent),
        Arc::new(resolver),
        agent,
        Pacer::new(profile.launch_delay),
    )?;
    let enumerator = FolderEnumerator::new(Arc::clone(&profile));

    let mut completed = 0usize;
    let mut failed = 0usize;

    // Single-URL and list runs share the same path; each input is
    // independently treated as a folder or an item.
    for input in &inputs {
        let outcome = if profile.is_folder_url(input) {
            download_folder(&enumerator, &dispatcher, input, &args.dir).await
        } else {
            download_items(&dispatcher, std::slice::from_ref(input), &args.dir).await
        };
        match outcome {
            Ok(report) => {
                completed += report.completed();
                failed += report.failed();
            }
            Err(error) => {
                warn!(url = %input, error = %format!("{error:#}"), "input failed");
                failed += 1;
            }
        }
    }

    info!(completed, failed, total = completed + failed, "all done");

    Ok(())
}

/// Enumerates a folder and downloads its items into a subdirectory named
/// after the folder.
async fn download_folder(
    enumerator: &FolderEnumerator,
    dispatcher: &DownloadDispatcher,
    folder_url: &str,
    base_dir: &Path,
) -> Result<BatchReport> {
    let listing = enumerator.enumerate(folder_url).await?;
    if listing.item_urls.is_empty() {
        info!(folder = %listing.folder_name, "no file links found in folder");
        return Ok(BatchReport::default());
    }

    let folder_dir = base_dir.join(&listing.folder_name);
    info!(
        folder = %listing.folder_name,
        items = listing.item_urls.len(),
        "starting folder batch"
    );
    download_items(dispatcher, &listing.item_urls, &folder_dir).await
}

/// Dispatches `item_urls` into `dest_dir`, creating the directory first.
async fn download_items(
    dispatcher: &DownloadDispatcher,
    item_urls: &[String],
    dest_dir: &Path,
) -> Result<BatchReport> {
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("creating download directory {}", dest_dir.display()))?;
    Ok(dispatcher.dispatch(item_urls, dest_dir).await?)
}
