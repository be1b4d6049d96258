// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Product catalog and rating routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::fields;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::vote::is_valid_rating;
use crate::models::{Product, Vote};
use crate::routes::{active_profile, admin_profile};
use crate::services::drive::{ensure_image_url, resolve_photo};
use crate::services::{catalog, PhotoKind, PhotoSource};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/votes/mine", get(list_my_votes))
        .route("/api/votes/{product_id}", put(cast_vote))
}

#[derive(Debug, Deserialize)]
pub struct ProductSearch {
    #[serde(default)]
    search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub photo: Option<PhotoSource>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub photo: Option<PhotoSource>,
}

fn validate_rating(rating: f64) -> std::result::Result<(), ValidationError> {
    if is_valid_rating(rating) {
        Ok(())
    } else {
        Err(ValidationError::new("rating")
            .with_message("rating must be between 0.5 and 5 in half-star steps".into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct VoteRequest {
    #[validate(custom(function = "validate_rating"))]
    pub rating: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VoteResponse {
    pub vote: Vote,
    /// Product average after this vote
    pub average_rating: f64,
}

fn with_display_url(mut product: Product) -> Product {
    product.photo_url = product.photo_url.as_deref().map(ensure_image_url);
    product
}

fn reject_blank_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be blank".to_string()));
    }
    Ok(())
}

// ─── Products ────────────────────────────────────────────────

/// List products, optionally filtered by a case-insensitive name search.
async fn list_products(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ProductSearch>,
) -> Result<Json<Vec<Product>>> {
    active_profile(&state, &user).await?;
    let term = params.search.unwrap_or_default();

    let products = state.db.list_products().await?;
    Ok(Json(
        products
            .into_iter()
            .filter(|p| p.matches_search(&term))
            .map(with_display_url)
            .collect(),
    ))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    active_profile(&state, &user).await?;
    let product = state
        .db
        .get_product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", id)))?;
    Ok(Json(with_display_url(product)))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    body.validate()?;
    reject_blank_name(&body.name)?;

    let caller = active_profile(&state, &user).await?;
    let now = Utc::now();

    let mut product = catalog::new_product(&body.name, body.description, None, 0.0, now);
    if let Some(photo) = body.photo {
        product.photo_url = Some(
            resolve_photo(
                state.drive.as_ref(),
                photo,
                PhotoKind::Product,
                &product.id,
                now.timestamp_millis(),
            )
            .await?,
        );
    }
    state.db.set_product(&product).await?;

    tracing::info!(product_id = %product.id, name = %product.name, created_by = %caller.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Edit name, description or photo. Averages are derived and not editable.
async fn update_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    body.validate()?;
    if let Some(name) = &body.name {
        reject_blank_name(name)?;
    }

    active_profile(&state, &user).await?;
    let mut product = state
        .db
        .get_product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", id)))?;
    let now = Utc::now();

    let mut written = vec![fields::UPDATED_AT];
    if let Some(name) = body.name {
        product.name = name.trim().to_string();
        written.push(fields::NAME);
    }
    if let Some(description) = body.description {
        let description = description.trim().to_string();
        product.description = (!description.is_empty()).then_some(description);
        written.push(fields::DESCRIPTION);
    }
    if let Some(photo) = body.photo {
        product.photo_url = Some(
            resolve_photo(
                state.drive.as_ref(),
                photo,
                PhotoKind::Product,
                &product.id,
                now.timestamp_millis(),
            )
            .await?,
        );
        written.push(fields::PHOTO_URL);
    }
    product.updated_at = now;
    if !state.db.update_product_fields(&product, &written).await? {
        return Err(AppError::NotFound(format!("product {}", id)));
    }

    // Re-read so averages refreshed meanwhile are returned.
    let product = state.db.get_product(&id).await?.unwrap_or(product);
    Ok(Json(with_display_url(product)))
}

/// Delete a product and its votes; admins only, and only while no purchase
/// refers to it.
async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let caller = admin_profile(&state, &user).await?;
    if state.db.get_product(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {}", id)));
    }

    let referencing = state.db.list_contributions_for_product(&id).await?;
    if !referencing.is_empty() {
        return Err(AppError::Conflict(format!(
            "product has {} contribution(s)",
            referencing.len()
        )));
    }

    let deleted = state.db.delete_product(&id).await?;
    tracing::info!(product_id = %id, deleted, deleted_by = %caller.id, "Product removed");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Votes ───────────────────────────────────────────────────

async fn list_my_votes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Vote>>> {
    let caller = active_profile(&state, &user).await?;
    Ok(Json(state.db.list_votes_for_user(&caller.id).await?))
}

/// Create or replace the caller's rating of a product.
async fn cast_vote(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<String>,
    Json(body): Json<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    body.validate()?;

    let caller = active_profile(&state, &user).await?;
    if state.db.get_product(&product_id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {}", product_id)));
    }

    let now = Utc::now();
    let vote = Vote {
        user_id: caller.id,
        product_id,
        rating: body.rating,
        updated_at: now,
    };
    state.db.upsert_vote(&vote).await?;

    let product = catalog::refresh_average_rating(&state.db, &vote.product_id, now).await?;
    tracing::info!(
        product_id = %vote.product_id,
        user_id = %vote.user_id,
        rating = vote.rating,
        "Vote recorded"
    );

    Ok(Json(VoteResponse {
        vote,
        average_rating: product.average_rating,
    }))
}
