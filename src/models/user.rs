// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User profile model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Name used when neither a display name nor an e-mail is available.
pub const FALLBACK_USER_NAME: &str = "Usuário";

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Google account subject (also used as document ID)
    pub id: String,
    /// Display name
    pub name: String,
    /// Google account e-mail
    pub email: String,
    /// Profile picture URL
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    /// Admins manage users, settings and deletions
    #[serde(default)]
    pub is_admin: bool,
    /// Inactive users can sign in but see no data
    #[serde(default)]
    pub is_active: bool,
    #[serde(with = "firestore::serialize_as_timestamp")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build the profile for a first sign-in.
    ///
    /// The very first user becomes an active admin; everyone after starts
    /// inactive until an admin promotes them.
    pub fn new_first_login(
        id: String,
        email: String,
        display_name: Option<&str>,
        photo_url: Option<String>,
        is_first_user: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let name = resolve_display_name(display_name, &email);
        Self {
            id,
            name,
            email,
            photo_url,
            is_admin: is_first_user,
            is_active: is_first_user,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Display name, falling back to the e-mail local part.
pub fn resolve_display_name(display_name: Option<&str>, email: &str) -> String {
    if let Some(name) = display_name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or(FALLBACK_USER_NAME)
        .to_string()
}
