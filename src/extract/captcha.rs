//! Positional-offset captcha reconstruction.
//!
//! The host renders the challenge code as absolutely positioned digit
//! fragments whose nesting order is shuffled; the `padding-left` offset of
//! each fragment encodes the true reading order.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::site::{SiteProfile, compile_static_regex};

/// Offset declaration inside a digit fragment's style. Whitespace around the
/// value is tolerated.
static PADDING_LEFT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"padding-left:\s*(\d+)\s*px;"));

/// One rendered digit fragment and its horizontal position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaDigit {
    /// The fragment's trimmed text.
    pub text: String,
    /// Horizontal offset in pixels; encodes the true digit order.
    pub offset: u32,
}

/// Reconstructs the challenge code from the digit grid.
///
/// Fragments are sorted ascending by offset (stable, so equal offsets keep
/// their encounter order) and concatenated. Returns an empty string when the
/// page presents no grid, which is a legitimate no-challenge response, not
/// an error.
#[must_use]
pub fn captcha_code(doc: &Html, profile: &SiteProfile) -> String {
    let Some(container) = find_grid_container(doc, profile) else {
        return String::new();
    };
    let mut digits = collect_digits(container);
    digits.sort_by_key(|digit| digit.offset);
    digits.into_iter().map(|digit| digit.text).collect()
}

/// The single `<div>` whose inline style exactly matches the grid signature.
fn find_grid_container<'a>(doc: &'a Html, profile: &SiteProfile) -> Option<ElementRef<'a>> {
    let selector = Selector::parse("div").ok()?;
    doc.select(&selector)
        .find(|el| el.value().attr("style") == Some(profile.captcha_grid_style.as_str()))
}

/// Digit fragments from the container's immediate `<span>` children.
///
/// Spans without a parsable offset declaration are skipped.
fn collect_digits(container: ElementRef<'_>) -> Vec<CaptchaDigit> {
    container
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "span")
        .filter_map(|span| {
            let style = span.value().attr("style")?;
            let offset = PADDING_LEFT_RE
                .captures(style)?
                .get(1)?
                .as_str()
                .parse()
                .ok()?;
            Some(CaptchaDigit {
                text: span.text().collect::<String>().trim().to_string(),
                offset,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const GRID_STYLE: &str =
        "width:80px;height:26px;font:bold 13px Arial;background:#ccc;text-align:left;direction:ltr;";

    fn grid_page(spans: &str) -> Html {
        Html::parse_document(&format!(r#"<div style="{GRID_STYLE}">{spans}</div>"#))
    }

    #[test]
    fn test_digits_ordered_by_offset_not_document_order() {
        let doc = grid_page(concat!(
            r#"<span style="padding-left:40px;">3</span>"#,
            r#"<span style="padding-left:0px;">1</span>"#,
            r#"<span style="padding-left:20px;">2</span>"#,
        ));
        assert_eq!(captcha_code(&doc, &SiteProfile::filedot()), "123");
    }

    #[test]
    fn test_result_independent_of_child_order() {
        let orders = [
            ["1", "2", "3"],
            ["3", "2", "1"],
            ["2", "1", "3"],
        ];
        let offsets = [0u32, 20, 40];
        for order in orders {
            let spans: String = order
                .iter()
                .map(|digit| {
                    // Offset reflects the digit's value so every permutation
                    // must decode to the same code.
                    let offset = offsets[digit.parse::<usize>().unwrap() - 1];
                    format!(r#"<span style="padding-left:{offset}px;">{digit}</span>"#)
                })
                .collect();
            let doc = grid_page(&spans);
            assert_eq!(
                captcha_code(&doc, &SiteProfile::filedot()),
                "123",
                "order {order:?} must not affect the code"
            );
        }
    }

    #[test]
    fn test_whitespace_inside_offset_declaration_tolerated() {
        let doc = grid_page(concat!(
            r#"<span style="padding-left: 40 px;">3</span>"#,
            r#"<span style="padding-left:0px;">1</span>"#,
            r#"<span style="padding-left: 20px;">2</span>"#,
        ));
        assert_eq!(captcha_code(&doc, &SiteProfile::filedot()), "123");
    }

    #[test]
    fn test_equal_offsets_keep_encounter_order() {
        let doc = grid_page(concat!(
            r#"<span style="padding-left:10px;">7</span>"#,
            r#"<span style="padding-left:10px;">8</span>"#,
            r#"<span style="padding-left:0px;">5</span>"#,
        ));
        assert_eq!(captcha_code(&doc, &SiteProfile::filedot()), "578");
    }

    #[test]
    fn test_no_grid_yields_empty_code() {
        let doc = Html::parse_document("<html><body><p>no challenge here</p></body></html>");
        assert_eq!(captcha_code(&doc, &SiteProfile::filedot()), "");
    }

    #[test]
    fn test_wrong_container_style_is_ignored() {
        let doc = Html::parse_document(
            r#"<div style="width:80px;"><span style="padding-left:0px;">9</span></div>"#,
        );
        assert_eq!(captcha_code(&doc, &SiteProfile::filedot()), "");
    }

    #[test]
    fn test_span_without_offset_is_skipped() {
        let doc = grid_page(concat!(
            r#"<span style="padding-left:0px;">4</span>"#,
            r#"<span>x</span>"#,
            r#"<span style="padding-left:20px;">2</span>"#,
        ));
        assert_eq!(captcha_code(&doc, &SiteProfile::filedot()), "42");
    }

    #[test]
    fn test_nested_span_is_not_an_immediate_child() {
        let doc = grid_page(concat!(
            r#"<span style="padding-left:0px;">4</span>"#,
            r#"<div><span style="padding-left:20px;">9</span></div>"#,
        ));
        assert_eq!(captcha_code(&doc, &SiteProfile::filedot()), "4");
    }

    #[test]
    fn test_digit_text_is_trimmed() {
        let doc = grid_page(r#"<span style="padding-left:0px;"> 6 </span>"#);
        assert_eq!(captcha_code(&doc, &SiteProfile::filedot()), "6");
    }
}
