// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile lookup and first-login provisioning.

use chrono::{DateTime, Utc};

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::User;
use crate::services::google_identity::GoogleIdentity;

/// Load the profile for a signed-in Google account, creating it on first login.
///
/// Existing profiles are returned as stored; edits go through `PUT /api/me`.
/// The first account to sign in while no admin exists becomes an active
/// admin. Later accounts start inactive until an admin enables them.
pub async fn get_or_create_profile(
    db: &FirestoreDb,
    identity: &GoogleIdentity,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    if let Some(user) = db.get_user(&identity.subject).await? {
        return Ok(user);
    }

    let is_first_user = !db.any_admin_exists().await?;
    let user = User::new_first_login(
        identity.subject.clone(),
        identity.email.clone(),
        identity.name.as_deref(),
        identity.picture.clone(),
        is_first_user,
        now,
    );
    db.upsert_user(&user).await?;

    tracing::info!(
        user_id = %user.id,
        is_admin = user.is_admin,
        "Created profile on first login"
    );
    Ok(user)
}

/// Load the caller's profile; a session for a deleted profile is stale.
pub async fn load_profile(db: &FirestoreDb, user_id: &str) -> Result<User, AppError> {
    db.get_user(user_id).await?.ok_or(AppError::InvalidToken)
}
