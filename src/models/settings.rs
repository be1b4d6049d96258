// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Admin-editable application settings.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_CALCULATION_BASE_MONTHS: u32 = 6;
pub const MAX_CALCULATION_BASE_MONTHS: u32 = 120;

/// Stored at `configuration/settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Settings {
    /// Length of the trailing window used by the collaborator ranking
    #[serde(default = "default_base_months")]
    pub calculation_base_months: u32,
}

fn default_base_months() -> u32 {
    DEFAULT_CALCULATION_BASE_MONTHS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            calculation_base_months: DEFAULT_CALCULATION_BASE_MONTHS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_uses_default() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.calculation_base_months, 6);
    }
}
