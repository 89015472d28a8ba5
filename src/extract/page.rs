//! Final-link, filename, and folder-listing extraction.

use scraper::{Html, Selector};

use crate::site::SiteProfile;

/// First anchor whose href carries the content-delivery marker.
#[must_use]
pub fn final_download_link(doc: &Html, profile: &SiteProfile) -> Option<String> {
    let selector = Selector::parse("a").ok()?;
    doc.select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .find(|href| href.contains(&profile.final_link_marker))
        .map(str::to_string)
}

/// Display filename from the first filename-tag element, if any.
#[must_use]
pub fn file_name(doc: &Html, profile: &SiteProfile) -> Option<String> {
    let selector = Selector::parse(&profile.filename_tag).ok()?;
    let element = doc.select(&selector).next()?;
    let text = element.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Folder title: concatenated descendant text of the first `<h1>`, trimmed.
#[must_use]
pub fn folder_name(doc: &Html) -> Option<String> {
    let selector = Selector::parse("h1").ok()?;
    let heading = doc.select(&selector).next()?;
    let text = heading.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Item links inside the listing table, in document order.
///
/// Links that themselves denote a sub-folder are excluded (listings are not
/// descended recursively). Duplicates are kept.
#[must_use]
pub fn folder_item_links(doc: &Html, profile: &SiteProfile) -> Vec<String> {
    let Ok(selector) = Selector::parse("table a") else {
        return Vec::new();
    };
    doc.select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| {
            href.contains(&profile.host_marker) && !href.contains(&profile.folder_marker)
        })
        .map(str::to_string)
        .collect()
}
