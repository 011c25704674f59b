// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity ledger records.
//!
//! One record per completed workout or check-in, written by the completion
//! ingest flow and never mutated afterwards. The engagement engine only ever
//! reads this ledger; corrections happen upstream and arrive as new records.

use serde::{Deserialize, Serialize};

/// Kind of qualifying activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityKind {
    Workout,
    CheckIn,
}

impl ActivityKind {
    /// Stable string form, matching the serialized representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Workout => "workout",
            ActivityKind::CheckIn => "check_in",
        }
    }
}

/// Stored activity record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Caller-assigned id (also used as document ID and idempotency key)
    pub activity_id: String,
    /// Owning user
    pub user_id: String,
    /// Program this activity was logged against, if any
    pub program_id: Option<String>,
    /// Workout or check-in
    pub kind: ActivityKind,
    /// When the activity happened (RFC3339 UTC, seconds precision, `Z` suffix)
    pub occurred_at: String,
    /// Display name (e.g. "Upper Body A")
    pub name: Option<String>,
    /// Source: "completion" or "backfill"
    pub source: String,
    /// When this record was written
    pub recorded_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ActivityKind::Workout).unwrap(),
            "\"workout\""
        );
        assert_eq!(
            serde_json::to_string(&ActivityKind::CheckIn).unwrap(),
            "\"check_in\""
        );
    }

    #[test]
    fn test_kind_as_str_matches_serde_form() {
        for kind in [ActivityKind::Workout, ActivityKind::CheckIn] {
            let serialized = serde_json::to_string(&kind).unwrap();
            assert_eq!(serialized.trim_matches('"'), kind.as_str());
        }
    }
}
