//! A small tagged value type for free-form JSON.
//!
//! User profiles and model replies are loosely shaped. Reading them through
//! [`FreeValue`] keeps the "missing means default, wrong shape means text"
//! rules in one place instead of scattering `serde_json::Value` probing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tokens accepted as `true` when a flag arrives as a string.
pub const TRUTHY_TOKENS: [&str; 4] = ["true", "oui", "yes", "1"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FreeValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<FreeValue>),
    Map(BTreeMap<String, FreeValue>),
}

impl FreeValue {
    /// Look up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&FreeValue> {
        match self {
            FreeValue::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Null or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            FreeValue::Null => true,
            FreeValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Flatten to display text: lists are space-joined, maps become compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            FreeValue::Null => String::new(),
            FreeValue::Bool(b) => b.to_string(),
            FreeValue::Number(n) => n.to_string(),
            FreeValue::Text(s) => s.clone(),
            FreeValue::List(items) => items
                .iter()
                .filter(|item| !item.is_blank())
                .map(FreeValue::to_text)
                .collect::<Vec<_>>()
                .join(" "),
            FreeValue::Map(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    /// Read as a list of strings. A lone scalar becomes a one-item list.
    pub fn to_text_list(&self) -> Vec<String> {
        match self {
            FreeValue::List(items) => items
                .iter()
                .filter(|item| !item.is_blank())
                .map(FreeValue::to_text)
                .collect(),
            other if other.is_blank() => Vec::new(),
            other => vec![other.to_text()],
        }
    }

    /// Read as a boolean flag.
    ///
    /// Native booleans are taken as-is, strings must match [`TRUTHY_TOKENS`]
    /// (trimmed, case-insensitive) and numbers are true when non-zero.
    pub fn to_flag(&self) -> bool {
        match self {
            FreeValue::Bool(b) => *b,
            FreeValue::Text(s) => {
                let token = s.trim().to_lowercase();
                TRUTHY_TOKENS.contains(&token.as_str())
            }
            FreeValue::Number(n) => *n != 0.0,
            _ => false,
        }
    }

    /// Read as a number, accepting numeric strings.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            FreeValue::Number(n) => Some(*n),
            FreeValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
