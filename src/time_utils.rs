// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and day-boundary math.
//!
//! All engagement logic works on UTC calendar days: a streak day is a
//! calendar day with at least one qualifying activity, and day counts are
//! differences between day boundaries, never raw 24-hour intervals.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
///
/// Stored timestamps are normalized through this function so that string
/// comparisons in Firestore queries order the same way the instants do.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp into a UTC instant.
pub fn parse_utc_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Truncate an instant to its UTC calendar day.
pub fn start_of_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Whole calendar days from `earlier` to `later`.
///
/// Negative when `later` precedes `earlier`; callers treat that as clock
/// skew and clamp as appropriate.
pub fn days_between(later: NaiveDate, earlier: NaiveDate) -> i64 {
    later.signed_duration_since(earlier).num_days()
}
