// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User management and settings routes.

use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::db::fields;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::settings::MAX_CALCULATION_BASE_MONTHS;
use crate::models::{Settings, User};
use crate::routes::{active_profile, admin_profile};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/active", get(list_active_users))
        .route("/api/users/{id}", patch(update_user_flags))
        .route("/api/settings", get(get_settings).put(update_settings))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserFlagsRequest {
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(range(min = 1, max = MAX_CALCULATION_BASE_MONTHS))]
    pub calculation_base_months: u32,
}

// ─── Users ───────────────────────────────────────────────────

/// Every user including inactive ones; admins only.
async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<User>>> {
    admin_profile(&state, &user).await?;
    Ok(Json(state.db.list_users().await?))
}

/// Active users, for picking a buyer on the purchase form.
async fn list_active_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<User>>> {
    active_profile(&state, &user).await?;
    Ok(Json(state.db.list_active_users().await?))
}

/// Grant or revoke admin and active flags.
///
/// Admins cannot change their own flags, so the group always keeps at
/// least the admin making the change.
async fn update_user_flags(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserFlagsRequest>,
) -> Result<Json<User>> {
    if body.is_admin.is_none() && body.is_active.is_none() {
        return Err(AppError::BadRequest(
            "isAdmin or isActive is required".to_string(),
        ));
    }

    let caller = admin_profile(&state, &user).await?;
    if caller.id == id {
        return Err(AppError::Forbidden(
            "admins cannot change their own flags".to_string(),
        ));
    }

    let mut target = state
        .db
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;

    let mut written = vec![fields::UPDATED_AT];
    if let Some(is_admin) = body.is_admin {
        target.is_admin = is_admin;
        written.push(fields::IS_ADMIN);
    }
    if let Some(is_active) = body.is_active {
        target.is_active = is_active;
        written.push(fields::IS_ACTIVE);
    }
    target.updated_at = Utc::now();
    if !state.db.update_user_fields(&target, &written).await? {
        return Err(AppError::NotFound(format!("user {}", id)));
    }

    tracing::info!(
        user_id = %target.id,
        is_admin = target.is_admin,
        is_active = target.is_active,
        changed_by = %caller.id,
        "User flags updated"
    );

    Ok(Json(target))
}

// ─── Settings ────────────────────────────────────────────────

async fn get_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Settings>> {
    active_profile(&state, &user).await?;
    Ok(Json(state.db.get_settings().await?))
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<Settings>> {
    body.validate()?;

    let caller = admin_profile(&state, &user).await?;
    let settings = Settings {
        calculation_base_months: body.calculation_base_months,
    };
    state.db.set_settings(&settings).await?;

    tracing::info!(
        calculation_base_months = settings.calculation_base_months,
        changed_by = %caller.id,
        "Settings updated"
    );
    Ok(Json(settings))
}
