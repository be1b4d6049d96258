// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in and session routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::User;
use crate::services::{profile, IdentityError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", post(google_login))
        .route("/auth/logout", post(logout))
}

/// Sign-in request carrying the ID token from Google Identity Services.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    #[validate(length(min = 1, message = "idToken is required"))]
    pub id_token: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    /// Session token; also set as an HttpOnly cookie
    pub token: String,
    pub user: User,
}

/// Exchange a Google ID token for a session.
///
/// First-time accounts get a profile; the session is issued even for
/// inactive users so they can see their pending status.
async fn google_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<GoogleLoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    body.validate()?;

    let identity = state
        .identity_verifier
        .verify_id_token(&body.id_token)
        .await
        .map_err(|e| match e {
            IdentityError::Invalid(reason) => {
                tracing::info!(reason = %reason, "Rejected Google ID token");
                AppError::InvalidToken
            }
            IdentityError::Transient(reason) => {
                AppError::Internal(anyhow::anyhow!("Google identity unavailable: {}", reason))
            }
        })?;

    let user = profile::get_or_create_profile(&state.db, &identity, chrono::Utc::now()).await?;

    let token = create_jwt(&user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(user_id = %user.id, is_active = user.is_active, "User signed in");

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(!is_local_frontend(&state.config.frontend_url))
        .same_site(SameSite::Lax);

    Ok((jar.add(cookie), Json(LoginResponse { token, user })))
}

/// Clear the session cookie. Bearer-token clients drop their copy themselves.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}

fn is_local_frontend(frontend_url: &str) -> bool {
    frontend_url.starts_with("http://localhost") || frontend_url.starts_with("http://127.0.0.1")
}
