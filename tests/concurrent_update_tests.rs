// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Concurrent writers to the same product or user document.
//!
//! Each writer only touches the fields it owns, so overlapping price and
//! rating refreshes, renames and flag edits must all survive. These tests
//! require the Firestore emulator.

use cafe_grao::db::{fields, FirestoreDb};
use cafe_grao::models::{Contribution, Product, User, Vote};
use cafe_grao::services::catalog;
use chrono::{Duration, Utc};

mod common;
use common::{test_db, unique_id};

const ROUNDS: usize = 10;

async fn seed_priced_and_rated_product(db: &FirestoreDb) -> String {
    let now = Utc::now();
    let product = Product {
        id: unique_id("product"),
        name: "Bourbon Amarelo".to_string(),
        description: None,
        photo_url: None,
        average_price_per_kg: 0.0,
        average_rating: 0.0,
        created_at: now,
        updated_at: now,
    };
    db.set_product(&product).await.unwrap();

    db.set_contribution(&Contribution {
        id: unique_id("contribution"),
        user_id: "buyer".to_string(),
        product_id: product.id.clone(),
        purchase_date: now - Duration::days(1),
        arrival_date: None,
        value: 100.0,
        quantity_kg: 10.0,
        purchase_evidence: None,
        arrival_evidence: None,
        created_at: now,
        updated_at: now,
    })
    .await
    .unwrap();

    db.upsert_vote(&Vote {
        user_id: "voter".to_string(),
        product_id: product.id.clone(),
        rating: 4.0,
        updated_at: now,
    })
    .await
    .unwrap();

    product.id
}

#[tokio::test]
async fn test_concurrent_price_and_rating_refresh_keep_both() {
    require_emulator!();

    let db = test_db().await;

    for round in 0..ROUNDS {
        let product_id = seed_priced_and_rated_product(&db).await;
        let now = Utc::now();

        let (price, rating) = tokio::join!(
            catalog::refresh_average_price(&db, &product_id, None, now),
            catalog::refresh_average_rating(&db, &product_id, now),
        );
        price.expect("price refresh failed");
        rating.expect("rating refresh failed");

        let product = db.get_product(&product_id).await.unwrap().unwrap();
        assert_eq!(product.average_price_per_kg, 10.0, "round {round}: price lost");
        assert_eq!(product.average_rating, 4.0, "round {round}: rating lost");
    }
}

#[tokio::test]
async fn test_rename_during_refresh_keeps_averages() {
    require_emulator!();

    let db = test_db().await;

    for round in 0..ROUNDS {
        let product_id = seed_priced_and_rated_product(&db).await;
        let mut renamed = db.get_product(&product_id).await.unwrap().unwrap();
        renamed.name = format!("Renamed {round}");
        let now = Utc::now();

        let (rename, price, rating) = tokio::join!(
            db.update_product_fields(&renamed, &[fields::NAME, fields::UPDATED_AT]),
            catalog::refresh_average_price(&db, &product_id, None, now),
            catalog::refresh_average_rating(&db, &product_id, now),
        );
        assert!(rename.unwrap());
        price.unwrap();
        rating.unwrap();

        let product = db.get_product(&product_id).await.unwrap().unwrap();
        assert_eq!(product.name, format!("Renamed {round}"));
        assert_eq!(product.average_price_per_kg, 10.0, "round {round}: price lost");
        assert_eq!(product.average_rating, 4.0, "round {round}: rating lost");
    }
}

#[tokio::test]
async fn test_refresh_does_not_recreate_deleted_product() {
    require_emulator!();

    let db = test_db().await;
    let product_id = seed_priced_and_rated_product(&db).await;
    let stale = db.get_product(&product_id).await.unwrap().unwrap();

    db.delete_product(&product_id).await.unwrap();

    catalog::refresh_average_price(&db, &product_id, None, Utc::now())
        .await
        .expect("refresh of a deleted product is skipped");
    assert!(!db
        .update_product_fields(&stale, &[fields::AVERAGE_RATING])
        .await
        .unwrap());
    assert!(db.get_product(&product_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_profile_edit_and_flag_change_do_not_clobber() {
    require_emulator!();

    let db = test_db().await;

    for round in 0..ROUNDS {
        let now = Utc::now();
        let user = User {
            id: unique_id("user"),
            name: "Before".to_string(),
            email: "member@example.com".to_string(),
            photo_url: None,
            is_admin: false,
            is_active: false,
            created_at: now,
            updated_at: now,
        };
        db.upsert_user(&user).await.unwrap();

        let mut edited = user.clone();
        edited.name = format!("After {round}");
        let mut activated = user.clone();
        activated.is_active = true;

        let (edit, flags) = tokio::join!(
            db.update_user_fields(&edited, &[fields::NAME, fields::UPDATED_AT]),
            db.update_user_fields(&activated, &[fields::IS_ACTIVE, fields::UPDATED_AT]),
        );
        assert!(edit.unwrap());
        assert!(flags.unwrap());

        let stored = db.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.name, format!("After {round}"));
        assert!(stored.is_active, "round {round}: activation lost");
        assert!(!stored.is_admin);
    }
}

#[tokio::test]
async fn test_update_fields_of_missing_user_writes_nothing() {
    require_emulator!();

    let db = test_db().await;
    let now = Utc::now();
    let ghost = User {
        id: unique_id("ghost"),
        name: "Ghost".to_string(),
        email: "ghost@example.com".to_string(),
        photo_url: None,
        is_admin: true,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    assert!(!db
        .update_user_fields(&ghost, &[fields::IS_ADMIN])
        .await
        .unwrap());
    assert!(db.get_user(&ghost.id).await.unwrap().is_none());
}
