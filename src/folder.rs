//! Folder-listing enumeration.
//!
//! One fetch turns a folder URL into a title and the ordered item links of
//! its listing table. Sub-folder links are excluded, never followed.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::extract;
use crate::session::{FetchError, HttpSession};
use crate::site::SiteProfile;

/// One folder page reduced to a title and its item links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderListing {
    /// Folder title, or the profile's default label when the page had none.
    pub folder_name: String,
    /// Item URLs in document order; may contain duplicates.
    pub item_urls: Vec<String>,
}

/// Fetches and parses folder-listing pages.
#[derive(Debug, Clone)]
pub struct FolderEnumerator {
    profile: Arc<SiteProfile>,
}

impl FolderEnumerator {
    /// Creates an enumerator for the given site profile.
    #[must_use]
    pub fn new(profile: Arc<SiteProfile>) -> Self {
        Self { profile }
    }

    /// Lists the folder's name and item URLs.
    ///
    /// Destination-directory creation is the caller's concern; a later
    /// filesystem failure does not invalidate the listing returned here.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the listing page cannot be fetched.
    #[instrument(skip(self), fields(url = %folder_url))]
    pub async fn enumerate(&self, folder_url: &str) -> Result<FolderListing, FetchError> {
        let session = HttpSession::new(&self.profile.user_agent)?;
        let body = session.get(folder_url).await?;
        let listing = parse_listing(&body, &self.profile);
        info!(
            folder = %listing.folder_name,
            items = listing.item_urls.len(),
            "folder enumerated"
        );
        Ok(listing)
    }
}

fn parse_listing(body: &str, profile: &SiteProfile) -> FolderListing {
    let doc = scraper::Html::parse_document(body);
    let folder_name =
        extract::folder_name(&doc).unwrap_or_else(|| profile.default_folder_label.clone());
    FolderListing {
        folder_name,
        item_urls: extract::folder_item_links(&doc, profile),
    }
}
