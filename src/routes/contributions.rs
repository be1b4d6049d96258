// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coffee purchase (contribution) routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::contribution::check_dates;
use crate::models::Contribution;
use crate::routes::{active_profile, admin_profile};
use crate::services::drive::{ensure_image_url, resolve_photo};
use crate::services::{access, catalog, PhotoKind, PhotoSource};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/contributions",
            get(list_contributions).post(create_contribution),
        )
        .route("/api/contributions/mine", get(list_my_contributions))
        .route("/api/contributions/missing-arrival", get(list_missing_arrival))
        .route(
            "/api/contributions/{id}",
            get(get_contribution)
                .put(update_contribution)
                .delete(delete_contribution),
        )
}

/// Product created together with a purchase.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProductInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateContributionRequest {
    /// Buyer; defaults to the caller. Only admins may name someone else.
    pub user_id: Option<String>,
    /// Existing product; exclusive with `new_product`
    pub product_id: Option<String>,
    #[validate(nested)]
    pub new_product: Option<NewProductInput>,
    pub purchase_date: DateTime<Utc>,
    pub arrival_date: Option<DateTime<Utc>>,
    #[validate(range(exclusive_min = 0.0))]
    pub value: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub quantity_kg: f64,
    pub purchase_evidence: Option<PhotoSource>,
    pub arrival_evidence: Option<PhotoSource>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContributionRequest {
    pub product_id: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub arrival_date: Option<DateTime<Utc>>,
    #[validate(range(exclusive_min = 0.0))]
    pub value: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub quantity_kg: Option<f64>,
    pub purchase_evidence: Option<PhotoSource>,
    pub arrival_evidence: Option<PhotoSource>,
}

#[derive(Debug)]
enum ProductChoice {
    Existing(String),
    New(NewProductInput),
}

fn product_choice(
    product_id: Option<String>,
    new_product: Option<NewProductInput>,
) -> Result<ProductChoice> {
    let product_id = product_id.filter(|id| !id.trim().is_empty());
    match (product_id, new_product) {
        (Some(id), None) => Ok(ProductChoice::Existing(id)),
        (None, Some(input)) if input.name.trim().is_empty() => Err(AppError::BadRequest(
            "newProduct.name cannot be blank".to_string(),
        )),
        (None, Some(input)) => Ok(ProductChoice::New(input)),
        (Some(_), Some(_)) => Err(AppError::BadRequest(
            "give either productId or newProduct, not both".to_string(),
        )),
        (None, None) => Err(AppError::BadRequest(
            "productId or newProduct is required".to_string(),
        )),
    }
}

fn with_display_urls(mut contribution: Contribution) -> Contribution {
    contribution.purchase_evidence = contribution.purchase_evidence.as_deref().map(ensure_image_url);
    contribution.arrival_evidence = contribution.arrival_evidence.as_deref().map(ensure_image_url);
    contribution
}

async fn resolve_evidence(
    state: &AppState,
    source: Option<PhotoSource>,
    kind: PhotoKind,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    match source {
        Some(source) => resolve_photo(
            state.drive.as_ref(),
            source,
            kind,
            owner_id,
            now.timestamp_millis(),
        )
        .await
        .map(Some),
        None => Ok(None),
    }
}

// ─── Queries ─────────────────────────────────────────────────

/// All contributions, newest purchase first.
async fn list_contributions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Contribution>>> {
    active_profile(&state, &user).await?;
    let contributions = state.db.list_contributions().await?;
    Ok(Json(contributions.into_iter().map(with_display_urls).collect()))
}

async fn list_my_contributions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Contribution>>> {
    let caller = active_profile(&state, &user).await?;
    let contributions = state.db.list_contributions_for_user(&caller.id).await?;
    Ok(Json(contributions.into_iter().map(with_display_urls).collect()))
}

/// The caller's purchases still waiting for an arrival date or photo.
async fn list_missing_arrival(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Contribution>>> {
    let caller = active_profile(&state, &user).await?;
    let contributions = state.db.list_contributions_for_user(&caller.id).await?;
    Ok(Json(
        contributions
            .into_iter()
            .filter(Contribution::is_missing_arrival)
            .map(with_display_urls)
            .collect(),
    ))
}

async fn get_contribution(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Contribution>> {
    active_profile(&state, &user).await?;
    let contribution = state
        .db
        .get_contribution(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("contribution {}", id)))?;
    Ok(Json(with_display_urls(contribution)))
}

// ─── Mutations ───────────────────────────────────────────────

/// Record a purchase, creating its product inline when requested.
async fn create_contribution(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateContributionRequest>,
) -> Result<(StatusCode, Json<Contribution>)> {
    body.validate()?;
    let now = Utc::now();
    let choice = product_choice(body.product_id, body.new_product)?;
    check_dates(body.purchase_date, body.arrival_date, now)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let caller = active_profile(&state, &user).await?;
    let buyer_id = body
        .user_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| caller.id.clone());
    access::ensure_can_record_for(&caller, &buyer_id)?;
    if buyer_id != caller.id && state.db.get_user(&buyer_id).await?.is_none() {
        return Err(AppError::NotFound(format!("user {}", buyer_id)));
    }

    let existing_product = match &choice {
        ProductChoice::Existing(product_id) => Some(
            state
                .db
                .get_product(product_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("product {}", product_id)))?,
        ),
        ProductChoice::New(_) => None,
    };

    let purchase_evidence =
        resolve_evidence(&state, body.purchase_evidence, PhotoKind::Purchase, &buyer_id, now)
            .await?;
    let arrival_evidence =
        resolve_evidence(&state, body.arrival_evidence, PhotoKind::Arrival, &buyer_id, now)
            .await?;

    let product_id = match (existing_product, choice) {
        (Some(product), _) => product.id,
        (None, ProductChoice::New(input)) => {
            let mut product = catalog::new_product(
                &input.name,
                input.description,
                None,
                body.value / body.quantity_kg,
                now,
            );
            catalog::adopt_arrival_photo(&mut product, arrival_evidence.as_deref());
            state.db.set_product(&product).await?;
            tracing::info!(product_id = %product.id, name = %product.name, "Product created with purchase");
            product.id
        }
        (None, ProductChoice::Existing(product_id)) => product_id,
    };

    let contribution = Contribution {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: buyer_id,
        product_id,
        purchase_date: body.purchase_date,
        arrival_date: body.arrival_date,
        value: body.value,
        quantity_kg: body.quantity_kg,
        purchase_evidence,
        arrival_evidence,
        created_at: now,
        updated_at: now,
    };
    state.db.set_contribution(&contribution).await?;

    catalog::refresh_average_price(
        &state.db,
        &contribution.product_id,
        contribution.arrival_evidence.as_deref(),
        now,
    )
    .await?;

    tracing::info!(
        contribution_id = %contribution.id,
        user_id = %contribution.user_id,
        product_id = %contribution.product_id,
        quantity_kg = contribution.quantity_kg,
        recorded_by = %caller.id,
        "Contribution recorded"
    );

    Ok((StatusCode::CREATED, Json(with_display_urls(contribution))))
}

/// Edit a purchase; the buyer or an admin only.
async fn update_contribution(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateContributionRequest>,
) -> Result<Json<Contribution>> {
    body.validate()?;
    let now = Utc::now();
    if let Some(purchase_date) = body.purchase_date {
        check_dates(purchase_date, body.arrival_date, now)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    let caller = active_profile(&state, &user).await?;
    let mut contribution = state
        .db
        .get_contribution(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("contribution {}", id)))?;
    access::ensure_can_edit_contribution(&caller, &contribution)?;

    let previous_product_id = contribution.product_id.clone();
    if let Some(product_id) = body.product_id.filter(|p| *p != previous_product_id) {
        if state.db.get_product(&product_id).await?.is_none() {
            return Err(AppError::NotFound(format!("product {}", product_id)));
        }
        contribution.product_id = product_id;
    }

    if let Some(purchase_date) = body.purchase_date {
        contribution.purchase_date = purchase_date;
    }
    if body.arrival_date.is_some() {
        contribution.arrival_date = body.arrival_date;
    }
    if let Some(value) = body.value {
        contribution.value = value;
    }
    if let Some(quantity_kg) = body.quantity_kg {
        contribution.quantity_kg = quantity_kg;
    }
    check_dates(contribution.purchase_date, contribution.arrival_date, now)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let owner_id = contribution.user_id.clone();
    if let Some(url) =
        resolve_evidence(&state, body.purchase_evidence, PhotoKind::Purchase, &owner_id, now)
            .await?
    {
        contribution.purchase_evidence = Some(url);
    }
    if let Some(url) =
        resolve_evidence(&state, body.arrival_evidence, PhotoKind::Arrival, &owner_id, now)
            .await?
    {
        contribution.arrival_evidence = Some(url);
    }

    contribution.updated_at = now;
    state.db.set_contribution(&contribution).await?;

    if previous_product_id != contribution.product_id {
        catalog::refresh_average_price(&state.db, &previous_product_id, None, now).await?;
    }
    catalog::refresh_average_price(
        &state.db,
        &contribution.product_id,
        contribution.arrival_evidence.as_deref(),
        now,
    )
    .await?;

    tracing::info!(
        contribution_id = %contribution.id,
        edited_by = %caller.id,
        "Contribution updated"
    );

    Ok(Json(with_display_urls(contribution)))
}

/// Delete a purchase; admins only.
async fn delete_contribution(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let caller = admin_profile(&state, &user).await?;
    let contribution = state
        .db
        .get_contribution(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("contribution {}", id)))?;

    state.db.delete_contribution(&id).await?;
    catalog::refresh_average_price(&state.db, &contribution.product_id, None, Utc::now())
        .await?;

    tracing::info!(contribution_id = %id, deleted_by = %caller.id, "Contribution deleted");
    Ok(StatusCode::NO_CONTENT)
}
