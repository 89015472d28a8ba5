//! Hidden form-field collection.

use scraper::Html;
use scraper::Selector;
use serde::Serialize;

/// Ordered form-field collection; last write wins on duplicate names.
///
/// Rebuilt from each challenge response and consumed by the following POST.
/// Serializes as a sequence of pairs, so it plugs straight into
/// form-encoded request bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    /// Creates an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    /// Current value for `name`, if set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The fields as name/value pairs, in insertion order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// Collects every `<input>` name/value pair in the document, at any depth.
///
/// Inputs with an empty or missing `name` are skipped; a missing `value`
/// reads as the empty string.
#[must_use]
pub fn hidden_fields(doc: &Html) -> FormFields {
    let mut fields = FormFields::new();
    let Ok(selector) = Selector::parse("input") else {
        return fields;
    };
    for input in doc.select(&selector) {
        let name = input.value().attr("name").unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        let value = input.value().attr("value").unwrap_or_default();
        fields.set(name, value);
    }
    fields
}
