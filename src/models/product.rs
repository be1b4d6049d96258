// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Coffee product model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A coffee that can be purchased and rated.
///
/// `average_price_per_kg` and `average_rating` are derived values, rewritten
/// whenever a contribution or vote referencing the product changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub average_price_per_kg: f64,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(with = "firestore::serialize_as_timestamp")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Case-insensitive substring match on the product name.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty() || self.name.to_lowercase().contains(&term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_search() {
        let now = Utc::now();
        let product = Product {
            id: "p1".to_string(),
            name: "Café do Cerrado".to_string(),
            description: None,
            photo_url: None,
            average_price_per_kg: 0.0,
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
        };

        assert!(product.matches_search("cerrado"));
        assert!(product.matches_search("  CAFÉ "));
        assert!(product.matches_search(""));
        assert!(!product.matches_search("sul de minas"));
    }
}
