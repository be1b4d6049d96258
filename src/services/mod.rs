// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod access;
pub mod aggregation;
pub mod catalog;
pub mod drive;
pub mod google_identity;
pub mod profile;

pub use drive::{DriveClient, DriveSession, PhotoKind, PhotoSource};
pub use google_identity::{GoogleIdentity, GoogleIdentityVerifier, IdentityError};
