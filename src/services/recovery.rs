// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recovery detection.
//!
//! A pure function of the streak day cursor and the clock: how long has this
//! user been silent, and is that long enough to offer a "welcome back"
//! prompt. Nothing here is persisted; the session-scoped suppression after a
//! dismissal is the arbiter's job, not this module's.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::{days_between, start_of_day};

/// Derived recovery view, recomputed fresh on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecoveryState {
    pub needs_recovery: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub days_since_last_workout: i64,
    /// Messaging block, present only when `needs_recovery`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<RecoveryTier>,
}

/// Copy shown on the recovery prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecoveryTier {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub days_missed: i64,
    pub headline: String,
    pub subheadline: String,
    pub encouragement: String,
}

fn recovery_tier(days_missed: i64) -> RecoveryTier {
    RecoveryTier {
        days_missed,
        headline: "Ready when you are".to_string(),
        subheadline: "Your progress is still here.".to_string(),
        encouragement: "Pick up where you left off, or ease back in with a lighter session."
            .to_string(),
    }
}

/// Recovery detector with the configured inactivity threshold.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryDetector {
    threshold_days: i64,
}

impl RecoveryDetector {
    pub fn new(threshold_days: i64) -> Self {
        Self { threshold_days }
    }

    /// Compute the recovery state for a user.
    ///
    /// `last_activity` is the streak day cursor; a user with no activity yet
    /// is measured from `anchor` (their program's creation day), so brand-new
    /// signups that stall still get the prompt.
    pub fn state(
        &self,
        last_activity: Option<NaiveDate>,
        anchor: NaiveDate,
        now: DateTime<Utc>,
    ) -> RecoveryState {
        let today = start_of_day(now);
        let reference = last_activity.unwrap_or(anchor);
        let days_since_last_workout = days_between(today, reference).max(0);

        let needs_recovery = days_since_last_workout >= self.threshold_days;

        RecoveryState {
            needs_recovery,
            days_since_last_workout,
            tier: needs_recovery.then(|| recovery_tier(days_since_last_workout)),
        }
    }
}
