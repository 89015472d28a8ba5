//! Error types for link resolution.

use thiserror::Error;

use crate::session::FetchError;

/// Errors that terminate one item's resolution.
///
/// A resolution failure aborts only its own item; sibling resolutions are
/// unaffected.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The URL does not match the host's item-path pattern.
    #[error("no item identifier in URL: {url}")]
    NoIdentifier {
        /// The URL that failed the pattern match.
        url: String,
    },

    /// The challenge response carried no content-delivery link.
    #[error("no final download link on challenge response for {url}")]
    NoFinalLink {
        /// The item URL whose resolution failed.
        url: String,
    },

    /// A pipeline request failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
