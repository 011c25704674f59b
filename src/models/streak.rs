// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak state and the pure day-transition logic.
//!
//! Stored at: `streak_states/{user_id}`
//!
//! The three counter fields are only ever written together, inside a
//! Firestore transaction, so readers never observe a torn update. The
//! transition itself is a pure function of the stored state and the current
//! UTC calendar day, which keeps the day-boundary reasoning testable without
//! a database.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time_utils::days_between;

/// Per-user streak counters with the single durable day cursor.
///
/// Invariant: `longest >= current` after every transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakState {
    /// Consecutive calendar days with at least one qualifying activity
    #[serde(default)]
    pub current: u32,
    /// Best run ever recorded
    #[serde(default)]
    pub longest: u32,
    /// UTC calendar day of the most recent qualifying activity ("YYYY-MM-DD")
    #[serde(default)]
    pub last_activity_at: Option<NaiveDate>,
    /// Last write timestamp (RFC3339)
    #[serde(default)]
    pub updated_at: String,
}

impl Default for StreakState {
    fn default() -> Self {
        Self {
            current: 0,
            longest: 0,
            last_activity_at: None,
            updated_at: String::new(),
        }
    }
}

/// Result of applying one qualifying activity to a streak.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakUpdate {
    pub current: u32,
    pub longest: u32,
    /// True only when this call actually lengthened the streak
    pub extended: bool,
}

/// Read-only streak view for dashboards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
}

impl StreakState {
    /// Apply one qualifying activity on `today`, mutating the counters.
    ///
    /// Calling this twice on the same calendar day is a no-op on the second
    /// call; that is the idempotence guarantee the duplicate-submit path
    /// relies on.
    pub fn advance(&mut self, today: NaiveDate, now: &str) -> StreakUpdate {
        let update = match self.last_activity_at {
            // First activity ever
            None => {
                self.current = 1;
                self.longest = self.longest.max(1);
                self.last_activity_at = Some(today);
                StreakUpdate {
                    current: self.current,
                    longest: self.longest,
                    extended: true,
                }
            }
            Some(last) => match days_between(today, last) {
                // Already logged today
                0 => StreakUpdate {
                    current: self.current,
                    longest: self.longest,
                    extended: false,
                },
                // Consecutive day - extend
                1 => {
                    self.current += 1;
                    self.longest = self.longest.max(self.current);
                    self.last_activity_at = Some(today);
                    StreakUpdate {
                        current: self.current,
                        longest: self.longest,
                        extended: true,
                    }
                }
                // Streak broken (also covers clock skew where today < last)
                _ => {
                    self.current = 1;
                    self.longest = self.longest.max(1);
                    self.last_activity_at = Some(today);
                    StreakUpdate {
                        current: self.current,
                        longest: self.longest,
                        extended: false,
                    }
                }
            },
        };

        self.updated_at = now.to_string();

        debug_assert!(self.longest >= self.current);
        update
    }

    pub fn summary(&self) -> StreakSummary {
        StreakSummary {
            current: self.current,
            longest: self.longest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(current: u32, longest: u32, last: Option<&str>) -> StreakState {
        StreakState {
            current,
            longest,
            last_activity_at: last.map(|d| d.parse().unwrap()),
            updated_at: String::new(),
        }
    }

    fn day(d: &str) -> NaiveDate {
        d.parse().unwrap()
    }

    #[test]
    fn test_first_activity_starts_at_one() {
        let mut s = state(0, 0, None);
        let update = s.advance(day("2024-01-15"), "now");

        assert_eq!(update.current, 1);
        assert_eq!(update.longest, 1);
        assert!(update.extended);
        assert_eq!(s.last_activity_at, Some(day("2024-01-15")));
    }

    #[test]
    fn test_same_day_is_idempotent() {
        let mut s = state(5, 10, Some("2024-01-15"));
        let update = s.advance(day("2024-01-15"), "now");

        assert_eq!(update.current, 5);
        assert_eq!(update.longest, 10);
        assert!(!update.extended);
    }

    #[test]
    fn test_double_update_same_day_never_double_counts() {
        let mut s = state(4, 9, Some("2024-01-14"));

        let first = s.advance(day("2024-01-15"), "now");
        assert_eq!(first.current, 5);
        assert!(first.extended);

        let second = s.advance(day("2024-01-15"), "now");
        assert_eq!(second.current, 5);
        assert_eq!(second.longest, 9);
        assert!(!second.extended);
    }

    #[test]
    fn test_consecutive_day_extends() {
        let mut s = state(5, 10, Some("2024-01-14"));
        let update = s.advance(day("2024-01-15"), "now");

        assert_eq!(update.current, 6);
        assert_eq!(update.longest, 10);
        assert!(update.extended);
    }

    #[test]
    fn test_longest_bumped_when_current_exceeds_it() {
        let mut s = state(10, 10, Some("2024-01-14"));
        let update = s.advance(day("2024-01-15"), "now");

        assert_eq!(update.current, 11);
        assert_eq!(update.longest, 11);
    }

    #[test]
    fn test_two_missed_days_reset_to_one() {
        let mut s = state(5, 10, Some("2024-01-13"));
        let update = s.advance(day("2024-01-15"), "now");

        assert_eq!(update.current, 1);
        assert_eq!(update.longest, 10);
        assert!(!update.extended);
    }

    #[test]
    fn test_three_missed_days_reset_preserves_longest() {
        let mut s = state(4, 9, Some("2024-01-12"));
        let update = s.advance(day("2024-01-15"), "now");

        assert_eq!(update.current, 1);
        assert_eq!(update.longest, 9);
        assert!(!update.extended);
    }

    #[test]
    fn test_long_absence_resets() {
        let mut s = state(100, 100, Some("2024-01-01"));
        let update = s.advance(day("2024-02-01"), "now");

        assert_eq!(update.current, 1);
        assert_eq!(update.longest, 100);
    }

    #[test]
    fn test_year_boundary_extends() {
        let mut s = state(5, 5, Some("2023-12-31"));
        let update = s.advance(day("2024-01-01"), "now");

        assert_eq!(update.current, 6);
        assert!(update.extended);
    }

    #[test]
    fn test_month_boundary_extends() {
        let mut s = state(3, 3, Some("2024-01-31"));
        let update = s.advance(day("2024-02-01"), "now");

        assert_eq!(update.current, 4);
        assert!(update.extended);
    }

    #[test]
    fn test_longest_never_below_current() {
        let mut s = state(0, 0, None);
        let days = [
            "2024-01-01",
            "2024-01-02",
            "2024-01-03",
            "2024-01-07",
            "2024-01-08",
        ];
        for d in days {
            s.advance(day(d), "now");
            assert!(s.longest >= s.current);
        }
        assert_eq!(s.current, 2);
        assert_eq!(s.longest, 3);
    }
}
