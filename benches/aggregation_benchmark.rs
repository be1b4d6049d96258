use cafe_grao::models::{Contribution, User};
use cafe_grao::services::aggregation::{compute_indicators, monthly_series, rank_collaborators};
use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

const USERS: usize = 40;
const CONTRIBUTIONS: usize = 5_000;

fn fixture() -> (Vec<Contribution>, Vec<User>) {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

    let users: Vec<User> = (0..USERS)
        .map(|i| User {
            id: format!("user-{i}"),
            name: format!("Collaborator {i}"),
            email: format!("user{i}@example.com"),
            photo_url: None,
            is_admin: i == 0,
            is_active: true,
            created_at: start,
            updated_at: start,
        })
        .collect();

    // Roughly six years of purchases spread over every user.
    let contributions = (0..CONTRIBUTIONS)
        .map(|i| {
            let date = start + Duration::hours(10 * i as i64);
            Contribution {
                id: format!("c-{i}"),
                user_id: format!("user-{}", i % USERS),
                product_id: format!("p-{}", i % 25),
                purchase_date: date,
                arrival_date: Some(date + Duration::days(3)),
                value: 40.0 + (i % 17) as f64,
                quantity_kg: 0.5 + (i % 4) as f64 * 0.5,
                purchase_evidence: None,
                arrival_evidence: None,
                created_at: date,
                updated_at: date,
            }
        })
        .collect();

    (contributions, users)
}

fn benchmark_dashboard(c: &mut Criterion) {
    let (contributions, users) = fixture();
    let now = contributions
        .last()
        .map(|c| c.purchase_date)
        .unwrap_or_else(Utc::now);

    let mut group = c.benchmark_group("dashboard_aggregation");

    group.bench_function("rank_collaborators_6_months", |b| {
        b.iter(|| rank_collaborators(black_box(&contributions), black_box(&users), 6, now))
    });

    group.bench_function("compute_indicators", |b| {
        b.iter(|| compute_indicators(black_box(&contributions), black_box(&users)))
    });

    group.bench_function("monthly_series", |b| {
        b.iter(|| monthly_series(black_box(&contributions)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_dashboard);
criterion_main!(benches);
