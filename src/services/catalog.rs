// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Keeps the cached averages on product documents in step with their
//! contributions and votes.

use chrono::{DateTime, Utc};

use crate::db::{fields, FirestoreDb};
use crate::error::AppError;
use crate::models::Product;
use crate::services::aggregation::{average_price_per_kg, average_rating};

/// Recompute `averagePricePerKg` from every contribution of the product.
///
/// When `arrival_photo` is given and the product has no picture yet, it is
/// adopted in the same write. Only the derived fields are written, so a
/// concurrent rating refresh or rename is kept. A product that no longer
/// exists is skipped.
pub async fn refresh_average_price(
    db: &FirestoreDb,
    product_id: &str,
    arrival_photo: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let Some(mut product) = db.get_product(product_id).await? else {
        tracing::warn!(product_id, "Skipping price refresh for missing product");
        return Ok(());
    };

    let contributions = db.list_contributions_for_product(product_id).await?;
    product.average_price_per_kg = average_price_per_kg(&contributions);
    let adopted_photo = adopt_arrival_photo(&mut product, arrival_photo);
    product.updated_at = now;

    let mut written = vec![fields::AVERAGE_PRICE_PER_KG, fields::UPDATED_AT];
    if adopted_photo {
        written.push(fields::PHOTO_URL);
    }
    if !db.update_product_fields(&product, &written).await? {
        tracing::warn!(product_id, "Product deleted during price refresh");
        return Ok(());
    }

    tracing::debug!(
        product_id,
        contributions = contributions.len(),
        average_price_per_kg = product.average_price_per_kg,
        adopted_photo,
        "Product price refreshed"
    );
    Ok(())
}

/// Recompute `averageRating` from every vote on the product.
pub async fn refresh_average_rating(
    db: &FirestoreDb,
    product_id: &str,
    now: DateTime<Utc>,
) -> Result<Product, AppError> {
    let mut product = db
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", product_id)))?;

    let votes = db.list_votes_for_product(product_id).await?;
    product.average_rating = average_rating(&votes);
    product.updated_at = now;
    let written = [fields::AVERAGE_RATING, fields::UPDATED_AT];
    if !db.update_product_fields(&product, &written).await? {
        return Err(AppError::NotFound(format!("product {}", product_id)));
    }

    tracing::debug!(
        product_id,
        votes = votes.len(),
        average_rating = product.average_rating,
        "Product rating refreshed"
    );
    Ok(product)
}

/// Use an arrival photo as the product picture when the product has none.
///
/// Returns whether the product changed.
pub fn adopt_arrival_photo(product: &mut Product, arrival_evidence: Option<&str>) -> bool {
    let has_photo = product
        .photo_url
        .as_deref()
        .is_some_and(|url| !url.trim().is_empty());
    match arrival_evidence.map(str::trim).filter(|e| !e.is_empty()) {
        Some(evidence) if !has_photo => {
            product.photo_url = Some(evidence.to_string());
            true
        }
        _ => false,
    }
}

/// Build a new catalog entry.
///
/// `initial_price_per_kg` seeds the average when the product is created
/// together with its first purchase.
pub fn new_product(
    name: &str,
    description: Option<String>,
    photo_url: Option<String>,
    initial_price_per_kg: f64,
    now: DateTime<Utc>,
) -> Product {
    Product {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.trim().to_string(),
        description: description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        photo_url,
        average_price_per_kg: initial_price_per_kg,
        average_rating: 0.0,
        created_at: now,
        updated_at: now,
    }
}
