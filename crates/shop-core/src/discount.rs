//! # Discounts
//!
//! Promotional entries shown to shoppers. They are informational only and
//! never change cart totals.

use serde::{Deserialize, Serialize};

/// A promotion listed on the discounts screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Parse the `discounts` node of the store database.
///
/// The node is either a JSON array or an object keyed by push id; entries that
/// do not deserialize are skipped.
pub fn parse_discounts(value: &serde_json::Value) -> Vec<Discount> {
    let entries: Vec<&serde_json::Value> = match value {
        serde_json::Value::Array(items) => items.iter().collect(),
        serde_json::Value::Object(map) => map.values().collect(),
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
        .collect()
}
