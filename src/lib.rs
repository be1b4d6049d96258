// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Café Grão: shared coffee purchase tracking.
//!
//! This crate provides the backend API for recording who bought which coffee,
//! at what price, how the group rates each product, and the dashboard
//! aggregates computed over those purchases.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{DriveClient, GoogleIdentityVerifier};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub identity_verifier: Arc<GoogleIdentityVerifier>,
    /// `None` when Drive credentials are not configured.
    pub drive: Option<DriveClient>,
}
