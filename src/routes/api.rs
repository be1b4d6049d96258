// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the signed-in user's profile and the dashboard.

use crate::db::fields;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{CollaboratorTotal, Indicators, MonthlyTotal, User, UserTotals};
use crate::services::drive::{ensure_image_url, resolve_photo};
use crate::services::{aggregation, profile, PhotoKind, PhotoSource};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/dashboard", get(get_dashboard))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub user: User,
    /// Lifetime totals; zero for inactive users
    pub totals: UserTotals,
}

/// Get current user profile.
///
/// Reachable by inactive users so the client can show the pending-approval
/// page.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let mut profile = profile::load_profile(&state.db, &user.user_id).await?;

    let totals = if profile.is_active {
        let contributions = state.db.list_contributions_for_user(&profile.id).await?;
        aggregation::user_totals(&contributions, &profile.id)
    } else {
        UserTotals::default()
    };

    profile.photo_url = profile.photo_url.as_deref().map(ensure_image_url);
    Ok(Json(MeResponse {
        user: profile,
        totals,
    }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub photo: Option<PhotoSource>,
}

/// Update own display name and/or photo.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<User>> {
    body.validate()?;
    let name = body.name.map(|n| n.trim().to_string());
    if name.as_deref() == Some("") {
        return Err(crate::error::AppError::BadRequest(
            "name cannot be blank".to_string(),
        ));
    }

    let mut profile = profile::load_profile(&state.db, &user.user_id).await?;
    let now = chrono::Utc::now();

    let mut written = vec![fields::UPDATED_AT];
    if let Some(name) = name {
        profile.name = name;
        written.push(fields::NAME);
    }
    if let Some(photo) = body.photo {
        let url = resolve_photo(
            state.drive.as_ref(),
            photo,
            PhotoKind::User,
            &profile.id,
            now.timestamp_millis(),
        )
        .await?;
        profile.photo_url = Some(url);
        written.push(fields::PHOTO_URL);
    }
    profile.updated_at = now;

    // Flags are owned by admins; a partial write never reverts them.
    if !state.db.update_user_fields(&profile, &written).await? {
        return Err(crate::error::AppError::InvalidToken);
    }
    let profile = profile::load_profile(&state.db, &user.user_id).await?;
    tracing::info!(user_id = %profile.id, "Profile updated");

    Ok(Json(profile))
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardResponse {
    /// Active collaborators by volume within the base period, largest first
    pub ranking: Vec<CollaboratorTotal>,
    pub indicators: Indicators,
    /// Caller's lifetime totals
    pub user_totals: UserTotals,
    /// Per-month volume and spend, oldest first
    pub monthly: Vec<MonthlyTotal>,
    pub calculation_base_months: u32,
}

/// Aggregate dashboard over a fresh snapshot of contributions and users.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardResponse>> {
    let caller = crate::routes::active_profile(&state, &user).await?;

    let (contributions, active_users, settings) = tokio::try_join!(
        state.db.list_contributions(),
        state.db.list_active_users(),
        state.db.get_settings(),
    )?;

    let base_months = settings.calculation_base_months;
    let now = chrono::Utc::now();

    let mut ranking =
        aggregation::rank_collaborators(&contributions, &active_users, base_months, now);
    aggregation::sort_ranking(&mut ranking);

    let response = DashboardResponse {
        ranking,
        indicators: aggregation::compute_indicators(&contributions, &active_users),
        user_totals: aggregation::user_totals(&contributions, &caller.id),
        monthly: aggregation::monthly_series(&contributions),
        calculation_base_months: base_months,
    };

    tracing::debug!(
        user_id = %caller.id,
        contributions = contributions.len(),
        active_users = active_users.len(),
        base_months,
        "Dashboard computed"
    );

    Ok(Json(response))
}
