// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access gating over real profiles.
//!
//! These tests require the Firestore emulator to be running.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use cafe_grao::models::{Contribution, Product, User};
use chrono::{Duration, Utc};
use tower::ServiceExt;

mod common;
use common::{create_test_app_with_db, create_test_jwt, test_db, unique_id};

async fn seed_user(is_admin: bool, is_active: bool) -> User {
    let db = test_db().await;
    let now = Utc::now();
    let user = User {
        id: unique_id("user"),
        name: unique_id("Name"),
        email: "someone@example.com".to_string(),
        photo_url: None,
        is_admin,
        is_active,
        created_at: now,
        updated_at: now,
    };
    db.upsert_user(&user).await.unwrap();
    user
}

async fn request(user: &User, method: &str, uri: &str) -> axum::http::Response<Body> {
    let (app, state) = create_test_app_with_db(test_db().await);
    let token = create_test_jwt(&user.id, &state.config.jwt_signing_key);

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_inactive_user_sees_only_profile() {
    require_emulator!();

    let user = seed_user(false, false).await;

    let response = request(&user, "GET", "/api/dashboard").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "inactive_user");

    let response = request(&user, "GET", "/api/me").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["user"]["isActive"], false);
    assert_eq!(body["totals"]["totalKg"], 0.0);
}

#[tokio::test]
async fn test_unknown_profile_is_stale_session() {
    require_emulator!();

    let (app, state) = create_test_app_with_db(test_db().await);
    let token = create_test_jwt(&unique_id("ghost"), &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_forbidden_for_members() {
    require_emulator!();

    let member = seed_user(false, true).await;

    let response = request(&member, "GET", "/api/users").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = request(&member, "DELETE", "/api/contributions/any").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = request(&member, "DELETE", "/api/products/any").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dashboard_ranks_recent_buyer() {
    require_emulator!();

    let buyer = seed_user(false, true).await;
    let db = test_db().await;
    let now = Utc::now();

    let contribution = Contribution {
        id: unique_id("contribution"),
        user_id: buyer.id.clone(),
        product_id: unique_id("product"),
        purchase_date: now - Duration::days(10),
        arrival_date: None,
        value: 90.0,
        quantity_kg: 3.0,
        purchase_evidence: None,
        arrival_evidence: None,
        created_at: now,
        updated_at: now,
    };
    db.set_contribution(&contribution).await.unwrap();

    let response = request(&buyer, "GET", "/api/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;

    let entry = body["ranking"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["name"] == buyer.name.as_str())
        .expect("buyer should be ranked");
    assert_eq!(entry["totalKg"], 3.0);
    assert_eq!(body["userTotals"]["totalKg"], 3.0);
    assert_eq!(body["userTotals"]["totalValue"], 90.0);
}

#[tokio::test]
async fn test_referenced_product_cannot_be_deleted() {
    require_emulator!();

    let admin = seed_user(true, true).await;
    let db = test_db().await;
    let now = Utc::now();

    let product = Product {
        id: unique_id("product"),
        name: "Mundo Novo".to_string(),
        description: None,
        photo_url: None,
        average_price_per_kg: 30.0,
        average_rating: 0.0,
        created_at: now,
        updated_at: now,
    };
    db.set_product(&product).await.unwrap();
    db.set_contribution(&Contribution {
        id: unique_id("contribution"),
        user_id: admin.id.clone(),
        product_id: product.id.clone(),
        purchase_date: now - Duration::days(1),
        arrival_date: None,
        value: 30.0,
        quantity_kg: 1.0,
        purchase_evidence: None,
        arrival_evidence: None,
        created_at: now,
        updated_at: now,
    })
    .await
    .unwrap();

    let response = request(&admin, "DELETE", &format!("/api/products/{}", product.id)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
