use super::value::FreeValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder rendered for any profile attribute the user did not provide.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Sparse, free-form user attributes (gender, weight, height, goal, allergies...).
///
/// Every lookup is total: an absent or blank field renders as a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(BTreeMap<String, FreeValue>);

impl UserProfile {
    pub fn new(fields: BTreeMap<String, FreeValue>) -> Self {
        Self(fields)
    }

    /// Display text for `key`, or `fallback` when missing or blank.
    pub fn field_or(&self, key: &str, fallback: &str) -> String {
        match self.0.get(key) {
            Some(value) if !value.is_blank() => {
                let text = value.to_text();
                if text.trim().is_empty() {
                    fallback.to_string()
                } else {
                    text
                }
            }
            _ => fallback.to_string(),
        }
    }

    /// Display text for `key`, or [`NOT_SPECIFIED`].
    pub fn field(&self, key: &str) -> String {
        self.field_or(key, NOT_SPECIFIED)
    }

    /// Known allergies, from either a list or a single string.
    pub fn allergies(&self) -> Vec<String> {
        self.0
            .get("allergies")
            .map(FreeValue::to_text_list)
            .unwrap_or_default()
    }
}
