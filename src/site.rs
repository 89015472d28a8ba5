//! Site contract for the filedot.to markup and download flow.
//!
//! Every host-specific marker the pipeline relies on lives in [`SiteProfile`]
//! so a markup change on the host touches exactly one place. The markers
//! encode observed site behavior, not a published API, and can rot without
//! notice.

use std::time::Duration;

use regex::Regex;

/// Compiles a static regex pattern, panicking on invalid input.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Path fragment naming the item host; item URLs carry an id right after it.
const HOST_MARKER: &str = "filedot.to/";

/// Path fragment that distinguishes folder-listing URLs from item URLs.
const FOLDER_MARKER: &str = "/folder/";

/// Substring marking content-delivery anchors (the host's `fs*` subdomain
/// naming). Known-fragile: may false-positive on unrelated anchors; kept
/// as-is because it tracks the live site's markup.
const FINAL_LINK_MARKER: &str = "fs";

/// Inline style signature of the captcha digit grid container.
const CAPTCHA_GRID_STYLE: &str =
    "width:80px;height:26px;font:bold 13px Arial;background:#ccc;text-align:left;direction:ltr;";

/// Tag the host uses to display the filename on the final page.
const FILENAME_TAG: &str = "nobr";

/// External referer the free-download intent form expects.
const INTENT_REFERER: &str = "https://www.google.com/";

/// Label used when a folder page yields no readable title.
const DEFAULT_FOLDER_LABEL: &str = "downloads";

/// Browser-like User-Agent; the host rejects obviously non-browser clients.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36";

/// Mandatory wait between solving the challenge and submitting it.
const CHALLENGE_DELAY: Duration = Duration::from_secs(6);

/// Mandatory wait before each batch task starts its resolution.
const LAUNCH_DELAY: Duration = Duration::from_secs(2);

/// All site-specific markers and pacing constants in one injectable value.
///
/// [`SiteProfile::filedot`] is the production contract; tests build profiles
/// pointed at mock servers via [`SiteProfile::for_host_marker`].
#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Substring identifying item URLs on this host.
    pub host_marker: String,
    /// Substring identifying folder-listing URLs.
    pub folder_marker: String,
    /// Substring identifying the final content-delivery anchor.
    pub final_link_marker: String,
    /// Exact inline style of the captcha grid container.
    pub captcha_grid_style: String,
    /// Tag carrying the display filename on the final page.
    pub filename_tag: String,
    /// Referer value submitted with the free-download intent form.
    pub intent_referer: String,
    /// User-Agent attached to every session request.
    pub user_agent: String,
    /// Folder label substituted when the listing page has no readable title.
    pub default_folder_label: String,
    /// Wait imposed before the challenge submission.
    pub challenge_delay: Duration,
    /// Wait imposed before each dispatched task begins resolving.
    pub launch_delay: Duration,
    item_id_re: Regex,
}

impl SiteProfile {
    /// The production filedot.to contract.
    #[must_use]
    pub fn filedot() -> Self {
        Self::for_host_marker(HOST_MARKER)
    }

    /// Builds a profile whose item URLs live under `host_marker`.
    ///
    /// Tests point this at a mock server path; everything else keeps the
    /// production values.
    #[must_use]
    pub fn for_host_marker(host_marker: &str) -> Self {
        let item_id_re = compile_static_regex(&format!(
            "{}([a-zA-Z0-9]+)",
            regex::escape(host_marker)
        ));
        Self {
            host_marker: host_marker.to_string(),
            folder_marker: FOLDER_MARKER.to_string(),
            final_link_marker: FINAL_LINK_MARKER.to_string(),
            captcha_grid_style: CAPTCHA_GRID_STYLE.to_string(),
            filename_tag: FILENAME_TAG.to_string(),
            intent_referer: INTENT_REFERER.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            default_folder_label: DEFAULT_FOLDER_LABEL.to_string(),
            challenge_delay: CHALLENGE_DELAY,
            launch_delay: LAUNCH_DELAY,
            item_id_re,
        }
    }

    /// Item identifier: the alphanumeric token following the host marker.
    ///
    /// Returns `None` when the URL does not match the item-path pattern.
    #[must_use]
    pub fn item_id(&self, url: &str) -> Option<String> {
        self.item_id_re
            .captures(url)
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str().to_string())
    }

    /// A URL denotes a folder listing iff it carries the folder path marker.
    #[must_use]
    pub fn is_folder_url(&self, url: &str) -> bool {
        url.contains(&self.folder_marker)
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self::filedot()
    }
}
