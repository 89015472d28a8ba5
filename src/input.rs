//! URL-list file input.
//!
//! Plain text, one URL per line. Blank and malformed lines are skipped with
//! a warning; a bad line never aborts the batch.

use std::path::Path;

use thiserror::Error;
use tracing::warn;

/// Errors reading a URL-list file.
#[derive(Debug, Error)]
pub enum InputError {
    /// The list file could not be read.
    #[error("failed to read list file {path}: {source}")]
    Io {
        /// The list file path.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Reads a URL-list file.
///
/// # Errors
///
/// Returns [`InputError::Io`] when the file cannot be read; individual bad
/// lines are skipped, not errors.
pub fn read_url_list(path: &Path) -> Result<Vec<String>, InputError> {
    let contents = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_url_list(&contents))
}

/// Extracts the usable URLs from list-file contents.
#[must_use]
pub fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| {
            if line.is_empty() {
                return false;
            }
            if !line.starts_with("http://") && !line.starts_with("https://") {
                warn!(line = %line, "skipping non-URL line in list file");
                return false;
            }
            true
        })
        .map(str::to_string)
        .collect()
}
