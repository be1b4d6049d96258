// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod contribution;
pub mod product;
pub mod settings;
pub mod stats;
pub mod user;
pub mod vote;

pub use contribution::Contribution;
pub use product::Product;
pub use settings::Settings;
pub use stats::{CollaboratorTotal, Indicators, MonthlyTotal, UserTotals};
pub use user::User;
pub use vote::Vote;
