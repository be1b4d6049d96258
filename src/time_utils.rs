// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar arithmetic shared by the aggregation code.

use chrono::{DateTime, Datelike, Duration, Months, Utc};

/// Go back `months` calendar months from `date`, keeping the day of month.
///
/// A day past the end of the target month rolls over into the following
/// month (31 Aug minus six months is 2 Mar in a leap year, 3 Mar otherwise).
/// Dates that would fall before the representable range saturate at
/// `DateTime::<Utc>::MIN_UTC`.
pub fn months_before(date: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let day_offset = Duration::days(i64::from(date.day0()));
    date.with_day(1)
        .and_then(|first| first.checked_sub_months(Months::new(months)))
        .and_then(|first| first.checked_add_signed(day_offset))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Calendar `(year, month)` of a timestamp, evaluated in UTC.
pub fn month_of(date: DateTime<Utc>) -> (i32, u32) {
    (date.year(), date.month())
}

/// `YYYY-MM` key for a calendar month.
pub fn month_key(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}
