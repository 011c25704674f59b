// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Program model and per-program engagement markers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::NudgeType;

/// Training program stored in Firestore.
///
/// Authored by the program-generation flow (external collaborator); read here
/// for ownership checks and as the recovery fallback anchor when a user has
/// no activity yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Program ID (also used as document ID)
    pub program_id: String,
    /// Owning user
    pub created_by: String,
    /// Display name
    pub name: String,
    /// When the program was created (RFC3339)
    pub created_at: String,
}

/// User's answer to the week-2 check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Week2Option {
    GoingGreat,
    TooHard,
    TooEasy,
    LifeHappened,
}

impl Week2Option {
    /// Confirmation copy shown after the check-in is recorded.
    pub fn response_message(self) -> &'static str {
        match self {
            Week2Option::GoingGreat => "That's awesome! Keep up the great work.",
            Week2Option::TooHard => {
                "No problem—we can adjust your program to match your current level."
            }
            Week2Option::TooEasy => {
                "Great feedback! Consider adding weight or reps as you progress."
            }
            Week2Option::LifeHappened => {
                "Life happens to everyone. You're still here—that's what matters."
            }
        }
    }
}

/// Durable engagement markers for one program.
///
/// Stored at: `program_engagement/{program_id}`
///
/// `week2_shown_at` is terminal: once set, the week-2 check-in can never fire
/// again for this program, even if a logging correction moves the workout
/// count back inside the trigger window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramEngagement {
    #[serde(default)]
    pub program_id: String,
    /// When the week-2 check-in was shown or completed (RFC3339)
    #[serde(default)]
    pub week2_shown_at: Option<String>,
    /// The option the user picked, when they completed rather than dismissed
    #[serde(default)]
    pub week2_option: Option<Week2Option>,
    /// Generic program-scoped dismissal markers: nudge type -> RFC3339 timestamp
    #[serde(default)]
    pub markers: HashMap<String, String>,
    /// Last write timestamp (RFC3339)
    #[serde(default)]
    pub updated_at: String,
}

impl ProgramEngagement {
    /// Whether the given nudge is durably dismissed for this program.
    pub fn is_marked(&self, nudge: NudgeType) -> bool {
        match nudge {
            NudgeType::Week2CheckIn => self.week2_shown_at.is_some(),
            _ => self.markers.contains_key(nudge.as_str()),
        }
    }

    /// Record a durable dismissal for the given nudge.
    pub fn mark(&mut self, nudge: NudgeType, now: &str) {
        match nudge {
            NudgeType::Week2CheckIn => {
                if self.week2_shown_at.is_none() {
                    self.week2_shown_at = Some(now.to_string());
                }
            }
            _ => {
                self.markers
                    .entry(nudge.as_str().to_string())
                    .or_insert_with(|| now.to_string());
            }
        }
        self.updated_at = now.to_string();
    }
}
