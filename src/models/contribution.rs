// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Coffee purchase (contribution) model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A single recorded coffee purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Contribution {
    /// Document ID
    pub id: String,
    /// Buyer (user document ID)
    pub user_id: String,
    pub product_id: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub purchase_date: DateTime<Utc>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub arrival_date: Option<DateTime<Utc>>,
    /// Amount paid (currency units)
    pub value: f64,
    pub quantity_kg: f64,
    /// Photo of the receipt
    #[serde(default)]
    pub purchase_evidence: Option<String>,
    /// Photo of the package on arrival
    #[serde(default)]
    pub arrival_evidence: Option<String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl Contribution {
    /// Price per kilogram, or `None` for a zero quantity.
    pub fn price_per_kg(&self) -> Option<f64> {
        (self.quantity_kg > 0.0).then(|| self.value / self.quantity_kg)
    }

    /// True until both the arrival date and the arrival photo are recorded.
    pub fn is_missing_arrival(&self) -> bool {
        self.arrival_date.is_none()
            || self
                .arrival_evidence
                .as_deref()
                .map_or(true, |e| e.trim().is_empty())
    }
}

/// Check the date invariants of a purchase.
///
/// The purchase cannot be in the future and the arrival, when known,
/// cannot precede the purchase.
pub fn check_dates(
    purchase_date: DateTime<Utc>,
    arrival_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), &'static str> {
    if purchase_date > now {
        return Err("purchaseDate cannot be in the future");
    }
    if arrival_date.is_some_and(|arrival| arrival < purchase_date) {
        return Err("arrivalDate cannot be before purchaseDate");
    }
    Ok(())
}
