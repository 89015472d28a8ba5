//! Per-resolution HTTP session with persistent cookie state.
//!
//! One [`HttpSession`] spans exactly one item's resolution: cookies set by
//! the landing page must still be present on both form submissions, and
//! sessions are never shared across concurrent resolutions so items cannot
//! poison each other's cookie state.

use std::sync::Arc;

use reqwest::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::REFERER;
use thiserror::Error;
use tracing::trace;
use url::Url;

use crate::extract::FormFields;

/// Errors raised by session requests. No request is retried.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

/// HTTP client plus cookie jar scoped to a single resolution.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    jar: Arc<Jar>,
}

impl HttpSession {
    /// Creates a session with a fresh, empty cookie jar.
    ///
    /// The user agent is injected rather than baked in so tests can
    /// substitute it.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] when client construction fails.
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|source| FetchError::Client { source })?;
        Ok(Self { client, jar })
    }

    /// Fetches `url` and returns the response body.
    ///
    /// Cookies from the response are merged into the session's jar.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failure or non-success status.
    pub async fn get(&self, url: &str) -> Result<String, FetchError> {
        trace!(%url, "session GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;
        Self::success_body(url, response).await
    }

    /// Submits `fields` form-encoded to `url` with the given Referer.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failure or non-success status.
    pub async fn post_form(
        &self,
        url: &str,
        fields: &FormFields,
        referer: &str,
    ) -> Result<String, FetchError> {
        trace!(%url, field_count = fields.len(), "session POST");
        let response = self
            .client
            .post(url)
            .header(REFERER, referer)
            .form(fields)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;
        Self::success_body(url, response).await
    }

    /// Reconstructs the `Cookie` header the jar would send to `url`.
    ///
    /// Returns `None` when the URL is unparsable or no cookie matches its
    /// host.
    #[must_use]
    pub fn cookie_header(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let header = self.jar.cookies(&parsed)?;
        header.to_str().ok().map(str::to_string)
    }

    async fn success_body(url: &str, response: reqwest::Response) -> Result<String, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_status_display() {
        let error = FetchError::Status {
            url: "https://filedot.to/abc".to_string(),
            status: 503,
        };
        let msg = error.to_string();
        assert!(msg.contains("503"), "expected status in: {msg}");
        assert!(
            msg.contains("https://filedot.to/abc"),
            "expected URL in: {msg}"
        );
    }

    #[test]
    fn test_cookie_header_empty_jar_is_none() {
        let session = HttpSession::new("test-agent").unwrap();
        assert!(session.cookie_header("https://filedot.to/abc").is_none());
    }

    #[test]
    fn test_cookie_header_unparsable_url_is_none() {
        let session = HttpSession::new("test-agent").unwrap();
        assert!(session.cookie_header("not a url").is_none());
    }
}
