//! Dashboard aggregates computed from contributions.
//!
//! These are never stored; the dashboard recomputes them from a fresh
//! snapshot of contributions on every request.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One row of the collaborator ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CollaboratorTotal {
    pub name: String,
    pub total_kg: f64,
}

/// Group-wide indicators over every contribution ever recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Indicators {
    pub total_value: f64,
    pub total_kg: f64,
    pub avg_monthly_kg: f64,
    pub avg_monthly_value: f64,
    pub avg_per_collaborator: f64,
}

/// Lifetime totals for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserTotals {
    pub total_value: f64,
    pub total_kg: f64,
}

/// Totals for one calendar month (timeline chart).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MonthlyTotal {
    /// "YYYY-MM"
    pub month: String,
    pub total_kg: f64,
    pub total_value: f64,
}
