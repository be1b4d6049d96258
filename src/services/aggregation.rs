// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard aggregation over already-fetched snapshots.
//!
//! Every function here is pure and total: empty inputs give zero-valued
//! results, never an error. Callers fetch contributions, users and settings,
//! then run these once per request.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

use crate::models::{
    CollaboratorTotal, Contribution, Indicators, MonthlyTotal, User, UserTotals, Vote,
};
use crate::time_utils::{month_key, month_of, months_before};

/// Volume bought by each active user within the trailing `base_months`.
///
/// The window is the closed interval `[now - base_months, now]`. Users whose
/// total in the window is zero are left out. The result follows the order of
/// `active_users`; use [`sort_ranking`] for display order.
pub fn rank_collaborators(
    contributions: &[Contribution],
    active_users: &[User],
    base_months: u32,
    now: DateTime<Utc>,
) -> Vec<CollaboratorTotal> {
    let window_start = months_before(now, base_months);
    let in_window = |c: &&Contribution| c.purchase_date >= window_start && c.purchase_date <= now;

    active_users
        .iter()
        .map(|user| CollaboratorTotal {
            name: user.name.clone(),
            total_kg: contributions
                .iter()
                .filter(|c| c.user_id == user.id)
                .filter(in_window)
                .map(|c| c.quantity_kg)
                .sum(),
        })
        .filter(|entry| entry.total_kg != 0.0)
        .collect()
}

/// Sort a ranking by volume, largest first. Ties keep their input order.
pub fn sort_ranking(ranking: &mut [CollaboratorTotal]) {
    ranking.sort_by(|a, b| b.total_kg.total_cmp(&a.total_kg));
}

/// Lifetime totals and monthly averages across all contributions.
///
/// Monthly averages divide by the number of distinct calendar months (UTC)
/// that have at least one purchase, floored at one.
pub fn compute_indicators(contributions: &[Contribution], active_users: &[User]) -> Indicators {
    let total_kg: f64 = contributions.iter().map(|c| c.quantity_kg).sum();
    let total_value: f64 = contributions.iter().map(|c| c.value).sum();

    let months: HashSet<(i32, u32)> = contributions
        .iter()
        .map(|c| month_of(c.purchase_date))
        .collect();
    let months_count = months.len().max(1) as f64;

    let avg_per_collaborator = if active_users.is_empty() {
        0.0
    } else {
        total_value / active_users.len() as f64
    };

    Indicators {
        total_value,
        total_kg,
        avg_monthly_kg: total_kg / months_count,
        avg_monthly_value: total_value / months_count,
        avg_per_collaborator,
    }
}

/// Lifetime totals for a single user.
pub fn user_totals(contributions: &[Contribution], user_id: &str) -> UserTotals {
    contributions
        .iter()
        .filter(|c| c.user_id == user_id)
        .fold(UserTotals::default(), |mut totals, c| {
            totals.total_kg += c.quantity_kg;
            totals.total_value += c.value;
            totals
        })
}

/// Per-month totals, oldest month first.
pub fn monthly_series(contributions: &[Contribution]) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();

    for c in contributions {
        let entry = by_month.entry(month_of(c.purchase_date)).or_default();
        entry.0 += c.quantity_kg;
        entry.1 += c.value;
    }

    by_month
        .into_iter()
        .map(|((year, month), (total_kg, total_value))| MonthlyTotal {
            month: month_key(year, month),
            total_kg,
            total_value,
        })
        .collect()
}

/// Mean of `value / quantity_kg` over a product's contributions.
///
/// Zero when the product has no contributions. Entries with a non-positive
/// quantity carry no price and are skipped.
pub fn average_price_per_kg(contributions: &[Contribution]) -> f64 {
    mean(contributions.iter().filter_map(Contribution::price_per_kg))
}

/// Mean rating over a product's votes, zero when unrated.
pub fn average_rating(votes: &[Vote]) -> f64 {
    mean(votes.iter().map(|v| v.rating))
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
