// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Photo upload route.
//!
//! Lets the client resolve a photo before saving the record it belongs to,
//! so a slow Drive upload does not hold the form submission.

use axum::{extract::State, routing::post, Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::routes::active_profile;
use crate::services::drive::resolve_photo;
use crate::services::{PhotoKind, PhotoSource};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/uploads", post(upload_photo))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub kind: PhotoKind,
    /// Record the photo belongs to; defaults to the caller
    #[serde(default)]
    pub owner_id: Option<String>,
    pub source: PhotoSource,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UploadResponse {
    /// Direct image URL to store on the record
    pub url: String,
}

async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UploadRequest>,
) -> Result<Json<UploadResponse>> {
    let caller = active_profile(&state, &user).await?;
    let owner_id = body
        .owner_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or(caller.id);

    let url = resolve_photo(
        state.drive.as_ref(),
        body.source,
        body.kind,
        &owner_id,
        Utc::now().timestamp_millis(),
    )
    .await?;

    Ok(Json(UploadResponse { url }))
}
