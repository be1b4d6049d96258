// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Product rating (vote) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const MIN_RATING: f64 = 0.5;
pub const MAX_RATING: f64 = 5.0;

/// A user's star rating for a product. At most one per (user, product).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Vote {
    pub user_id: String,
    pub product_id: String,
    /// 0.5 to 5 in half-star steps
    pub rating: f64,
    #[serde(with = "firestore::serialize_as_timestamp")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl Vote {
    /// Document ID; one document per (user, product) gives upsert semantics.
    ///
    /// `:` is always percent-encoded inside each part, so distinct pairs
    /// never share an ID.
    pub fn doc_id(user_id: &str, product_id: &str) -> String {
        format!(
            "{}:{}",
            urlencoding::encode(user_id),
            urlencoding::encode(product_id)
        )
    }
}

/// Ratings are half stars between 0.5 and 5.
pub fn is_valid_rating(rating: f64) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating) && (rating * 2.0).fract() == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ratings() {
        for rating in [0.5, 1.0, 2.5, 4.5, 5.0] {
            assert!(is_valid_rating(rating), "{rating} should be valid");
        }
    }

    #[test]
    fn test_invalid_ratings() {
        for rating in [0.0, 0.25, 3.3, 5.5, -1.0, f64::NAN] {
            assert!(!is_valid_rating(rating), "{rating} should be invalid");
        }
    }

    #[test]
    fn test_doc_id_encodes_separator() {
        assert_eq!(Vote::doc_id("u1", "p1"), "u1:p1");
        assert_eq!(Vote::doc_id("a/b", "c"), "a%2Fb:c");
        assert_eq!(Vote::doc_id("a:b", "c"), "a%3Ab:c");
    }

    #[test]
    fn test_doc_id_distinguishes_pairs() {
        assert_ne!(Vote::doc_id("a_b", "c"), Vote::doc_id("a", "b_c"));
        assert_ne!(Vote::doc_id("a:b", "c"), Vote::doc_id("a", "b:c"));
    }
}
