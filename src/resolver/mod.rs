//! Multi-step link resolution for one gated item.
//!
//! A resolution walks the host's free-download flow in order: fetch the
//! landing page (cookie acquisition), submit the free-download intent form,
//! reconstruct the positional captcha from the response, wait out the
//! mandatory pacing delay, submit the challenge form, and read the final
//! content-delivery link off the last response. Any failed step aborts only
//! this item; nothing is retried.

mod error;

pub use error::ResolveError;

use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, info, instrument};

use crate::extract::{FormFields, captcha_code, file_name, final_download_link, hidden_fields};
use crate::pacing::Pacer;
use crate::session::HttpSession;
use crate::site::SiteProfile;

/// Terminal output of a successful resolution.
///
/// Owned by the task that produced it; handed to the download agent and then
/// discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// The directly fetchable URL.
    pub final_url: String,
    /// Display filename read off the final page, when the host showed one.
    pub file_name: Option<String>,
    /// The original item URL; the agent replays it as the Referer.
    pub referer_url: String,
    /// `Cookie` header for the final URL's host, reconstructed from the
    /// session's jar; `None` when no stored cookie matches.
    pub cookie_header: Option<String>,
}

/// Resolution contract the dispatcher drives.
///
/// Object-safe so dispatch logic can be exercised with stub resolutions.
#[async_trait]
pub trait TargetResolver: Send + Sync {
    /// Resolves `item_url` into a directly fetchable target.
    async fn resolve(&self, item_url: &str) -> Result<ResolvedTarget, ResolveError>;
}

/// Drives one item URL through the host's gated free-download flow.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    profile: Arc<SiteProfile>,
    challenge_pacer: Pacer,
}

impl LinkResolver {
    /// Creates a resolver with the profile's challenge pacing.
    #[must_use]
    pub fn new(profile: Arc<SiteProfile>) -> Self {
        let challenge_pacer = Pacer::new(profile.challenge_delay);
        Self {
            profile,
            challenge_pacer,
        }
    }

    /// Overrides the challenge pacer (tests disable it).
    #[must_use]
    pub fn with_challenge_pacer(mut self, pacer: Pacer) -> Self {
        self.challenge_pacer = pacer;
        self
    }

    /// Resolves `item_url` into a [`ResolvedTarget`].
    ///
    /// Each call runs on a fresh session whose cookies span all three
    /// requests; sessions are never reused across items.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoIdentifier`] when the URL does not match
    /// the item-path pattern, [`ResolveError::NoFinalLink`] when the
    /// challenge response has no content-delivery link, and
    /// [`ResolveError::Fetch`] for transport or status failures.
    #[instrument(skip(self), fields(url = %item_url))]
    pub async fn resolve(&self, item_url: &str) -> Result<ResolvedTarget, ResolveError> {
        let item_id = self
            .profile
            .item_id(item_url)
            .ok_or_else(|| ResolveError::NoIdentifier {
                url: item_url.to_string(),
            })?;
        debug!(%item_id, "resolving item");

        let session = HttpSession::new(&self.profile.user_agent)?;

        // The landing page body is not parsed; this request only seeds the
        // session cookies the later POSTs depend on.
        session.get(item_url).await?;

        let mut intent = FormFields::new();
        intent.set("op", "download1");
        intent.set("id", item_id);
        intent.set("referer", self.profile.intent_referer.clone());
        intent.set("method_free", "Free Download");

        let challenge_page = session.post_form(item_url, &intent, item_url).await?;
        let (mut fields, code) = parse_challenge_page(&challenge_page, &self.profile);
        if code.is_empty() {
            // Permissive by contract: some responses present no grid and the
            // challenge form is submitted without a code.
            debug!("no challenge grid on response; submitting without code");
        } else {
            debug!(code_len = code.len(), "challenge code reconstructed");
            fields.set("code", code);
        }

        self.challenge_pacer.wait().await;

        let final_page = session.post_form(item_url, &fields, item_url).await?;
        let (link, name) = parse_final_page(&final_page, &self.profile);
        let Some(final_url) = link else {
            return Err(ResolveError::NoFinalLink {
                url: item_url.to_string(),
            });
        };

        info!(
            file = name.as_deref().unwrap_or("<unnamed>"),
            "download target resolved"
        );
        Ok(ResolvedTarget {
            cookie_header: session.cookie_header(&final_url),
            final_url,
            file_name: name,
            referer_url: item_url.to_string(),
        })
    }
}

#[async_trait]
impl TargetResolver for LinkResolver {
    async fn resolve(&self, item_url: &str) -> Result<ResolvedTarget, ResolveError> {
        LinkResolver::resolve(self, item_url).await
    }
}

/// Hidden fields plus reconstructed challenge code from the intent response.
fn parse_challenge_page(body: &str, profile: &SiteProfile) -> (FormFields, String) {
    let doc = Html::parse_document(body);
    (hidden_fields(&doc), captcha_code(&doc, profile))
}

/// Final link and display filename from the challenge response.
fn parse_final_page(body: &str, profile: &SiteProfile) -> (Option<String>, Option<String>) {
    let doc = Html::parse_document(body);
    (final_download_link(&doc, profile), file_name(&doc, profile))
}
