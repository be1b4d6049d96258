// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Start it with `gcloud emulators firestore start` and export
//! FIRESTORE_EMULATOR_HOST before running `cargo test`.
//!
//! The emulator is shared between tests, so every test works on its own
//! uniquely named documents.

use cafe_grao::db::FirestoreDb;
use cafe_grao::models::{Contribution, Product, Settings, User, Vote};
use cafe_grao::services::{catalog, profile, GoogleIdentity};
use chrono::{DateTime, Duration, TimeZone, Utc};

mod common;
use common::{test_db, unique_id};

fn test_user(id: &str, is_admin: bool, is_active: bool) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        email: format!("{}@example.com", id),
        photo_url: None,
        is_admin,
        is_active,
        created_at: now,
        updated_at: now,
    }
}

fn test_product(id: &str) -> Product {
    let now = Utc::now();
    Product {
        id: id.to_string(),
        name: format!("Product {}", id),
        description: None,
        photo_url: None,
        average_price_per_kg: 0.0,
        average_rating: 0.0,
        created_at: now,
        updated_at: now,
    }
}

fn test_contribution(
    user_id: &str,
    product_id: &str,
    value: f64,
    quantity_kg: f64,
    purchase_date: DateTime<Utc>,
) -> Contribution {
    Contribution {
        id: unique_id("contribution"),
        user_id: user_id.to_string(),
        product_id: product_id.to_string(),
        purchase_date,
        arrival_date: None,
        value,
        quantity_kg,
        purchase_evidence: None,
        arrival_evidence: None,
        created_at: purchase_date,
        updated_at: purchase_date,
    }
}

async fn seed_product(db: &FirestoreDb) -> String {
    let product = test_product(&unique_id("product"));
    db.set_product(&product).await.unwrap();
    product.id
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_user_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let id = unique_id("user");

    assert!(db.get_user(&id).await.unwrap().is_none());

    let mut user = test_user(&id, false, true);
    user.photo_url = Some("https://lh3.googleusercontent.com/d/abc".to_string());
    db.upsert_user(&user).await.unwrap();

    let fetched = db.get_user(&id).await.unwrap().expect("user should exist");
    assert_eq!(fetched.email, user.email);
    assert_eq!(fetched.photo_url, user.photo_url);
    assert!(fetched.is_active);
    assert!(!fetched.is_admin);

    let active = db.list_active_users().await.unwrap();
    assert!(active.iter().any(|u| u.id == id));
}

#[tokio::test]
async fn test_new_login_after_admin_exists_starts_inactive() {
    require_emulator!();

    let db = test_db().await;
    db.upsert_user(&test_user(&unique_id("admin"), true, true))
        .await
        .unwrap();
    assert!(db.any_admin_exists().await.unwrap());

    let identity = GoogleIdentity {
        subject: unique_id("sub"),
        email: "nova@example.com".to_string(),
        name: None,
        picture: None,
    };

    let created = profile::get_or_create_profile(&db, &identity, Utc::now())
        .await
        .unwrap();
    assert_eq!(created.id, identity.subject);
    assert_eq!(created.name, "nova");
    assert!(!created.is_admin);
    assert!(!created.is_active);

    // Second login returns the stored profile unchanged
    let again = profile::get_or_create_profile(&db, &identity, Utc::now())
        .await
        .unwrap();
    assert_eq!(again.created_at, created.created_at);
}

// ═══════════════════════════════════════════════════════════════════════════
// CONTRIBUTION & PRODUCT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_contributions_for_user_newest_first() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id("buyer");
    let product_id = seed_product(&db).await;

    let older = test_contribution(
        &user_id,
        &product_id,
        50.0,
        1.0,
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    );
    let newer = test_contribution(
        &user_id,
        &product_id,
        80.0,
        2.0,
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    );
    db.set_contribution(&older).await.unwrap();
    db.set_contribution(&newer).await.unwrap();

    let mine = db.list_contributions_for_user(&user_id).await.unwrap();
    let ids: Vec<&str> = mine.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);

    db.delete_contribution(&older.id).await.unwrap();
    assert!(db.get_contribution(&older.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_average_price_refresh() {
    require_emulator!();

    let db = test_db().await;
    let product_id = seed_product(&db).await;
    let now = Utc::now();

    for value in [100.0, 150.0] {
        let c = test_contribution("u1", &product_id, value, 10.0, now - Duration::days(1));
        db.set_contribution(&c).await.unwrap();
    }

    catalog::refresh_average_price(&db, &product_id, Some("https://lh3.googleusercontent.com/d/x"), now)
        .await
        .unwrap();

    let product = db.get_product(&product_id).await.unwrap().unwrap();
    assert!((product.average_price_per_kg - 12.5).abs() < 1e-9);
    assert_eq!(
        product.photo_url.as_deref(),
        Some("https://lh3.googleusercontent.com/d/x")
    );
}

#[tokio::test]
async fn test_vote_upsert_replaces_previous_rating() {
    require_emulator!();

    let db = test_db().await;
    let product_id = seed_product(&db).await;
    let now = Utc::now();

    for rating in [2.0, 4.5] {
        db.upsert_vote(&Vote {
            user_id: "voter".to_string(),
            product_id: product_id.clone(),
            rating,
            updated_at: now,
        })
        .await
        .unwrap();
    }
    db.upsert_vote(&Vote {
        user_id: "other".to_string(),
        product_id: product_id.clone(),
        rating: 3.5,
        updated_at: now,
    })
    .await
    .unwrap();

    let votes = db.list_votes_for_product(&product_id).await.unwrap();
    assert_eq!(votes.len(), 2);

    let product = catalog::refresh_average_rating(&db, &product_id, now)
        .await
        .unwrap();
    assert!((product.average_rating - 4.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_delete_product_removes_votes() {
    require_emulator!();

    let db = test_db().await;
    let product_id = seed_product(&db).await;

    db.upsert_vote(&Vote {
        user_id: "voter".to_string(),
        product_id: product_id.clone(),
        rating: 5.0,
        updated_at: Utc::now(),
    })
    .await
    .unwrap();

    let deleted = db.delete_product(&product_id).await.unwrap();
    assert_eq!(deleted, 2);
    assert!(db.get_product(&product_id).await.unwrap().is_none());
    assert!(db
        .list_votes_for_product(&product_id)
        .await
        .unwrap()
        .is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// SETTINGS TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_settings_round_trip() {
    require_emulator!();

    let db = test_db().await;

    db.set_settings(&Settings {
        calculation_base_months: 9,
    })
    .await
    .unwrap();
    assert_eq!(db.get_settings().await.unwrap().calculation_base_months, 9);

    db.set_settings(&Settings::default()).await.unwrap();
    assert_eq!(db.get_settings().await.unwrap(), Settings::default());
}
