// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nudge vocabulary shared by the arbiter, the dismissal store, and the API.

use serde::{Deserialize, Serialize};

/// The behavioral prompts competing for the single dashboard slot.
///
/// The string forms are part of the client contract: the frontend keys its
/// session-scoped markers as `recovery-dismissed-{programId}` and
/// `week2-checkin-dismissed-{programId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NudgeType {
    #[serde(rename = "recovery")]
    Recovery,
    #[serde(rename = "week2-checkin")]
    Week2CheckIn,
    #[serde(rename = "first-workout")]
    FirstWorkout,
}

impl NudgeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NudgeType::Recovery => "recovery",
            NudgeType::Week2CheckIn => "week2-checkin",
            NudgeType::FirstWorkout => "first-workout",
        }
    }
}

impl std::fmt::Display for NudgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifetime boundary over which a dismissal marker remains valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissalScope {
    /// Dies with the browser session (volatile store)
    Session,
    /// Durable, lives alongside the program record
    Program,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nudge_type_matches_client_marker_keys() {
        assert_eq!(
            format!("{}-dismissed-prog_1", NudgeType::Recovery),
            "recovery-dismissed-prog_1"
        );
        assert_eq!(
            format!("{}-dismissed-prog_1", NudgeType::Week2CheckIn),
            "week2-checkin-dismissed-prog_1"
        );
    }

    #[test]
    fn test_nudge_type_serde_matches_as_str() {
        for nudge in [
            NudgeType::Recovery,
            NudgeType::Week2CheckIn,
            NudgeType::FirstWorkout,
        ] {
            let serialized = serde_json::to_string(&nudge).unwrap();
            assert_eq!(serialized.trim_matches('"'), nudge.as_str());
        }
    }
}
