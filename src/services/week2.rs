// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Week-2 check-in trigger.
//!
//! A one-shot state machine per program: `pending` until the completed
//! workout count sits inside the configured window and the check-in gets
//! presented or completed, then terminally `shown`. The window test is a
//! point-in-time predicate, not an edge-crossing detector: a count that
//! jumps over the window (bulk import) never fires the trigger.

use serde::{Deserialize, Serialize};

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::Week2Option;
use crate::time_utils::format_utc_rfc3339;

/// Derived week-2 state for one program.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Week2State {
    pub should_show: bool,
    pub already_shown: bool,
    pub completed_workouts: u32,
}

/// Outcome of recording a check-in response.
#[derive(Debug, Clone)]
pub struct Week2Completion {
    /// False when the check-in had already been recorded (idempotent repeat)
    pub newly_recorded: bool,
    pub option: Week2Option,
    pub message: &'static str,
}

#[derive(Clone)]
pub struct Week2Trigger {
    db: FirestoreDb,
    window_min: u32,
    window_max: u32,
}

impl Week2Trigger {
    pub fn new(db: FirestoreDb, window_min: u32, window_max: u32) -> Self {
        Self {
            db,
            window_min,
            window_max,
        }
    }

    /// Pure window predicate, exposed for tests.
    pub fn in_window(&self, completed_workouts: u32) -> bool {
        completed_workouts >= self.window_min && completed_workouts <= self.window_max
    }

    /// Whether the week-2 check-in should be shown for this program.
    pub async fn get_state(&self, program_id: &str) -> Result<Week2State> {
        if self.db.get_program(program_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Program {} not found",
                program_id
            )));
        }

        let completed_workouts = self.db.count_completed_workouts(program_id).await?;
        let engagement = self
            .db
            .get_program_engagement(program_id)
            .await?
            .unwrap_or_default();

        let already_shown = engagement.week2_shown_at.is_some();
        let should_show = self.in_window(completed_workouts) && !already_shown;

        tracing::debug!(
            program_id,
            completed_workouts,
            already_shown,
            should_show,
            "Week-2 check-in state computed"
        );

        Ok(Week2State {
            should_show,
            already_shown,
            completed_workouts,
        })
    }

    /// Record the user's check-in response; the irreversible transition.
    ///
    /// Idempotent: repeated calls after the first are no-ops that return the
    /// originally recorded option's message when available, or echo the
    /// submitted option otherwise.
    pub async fn complete_check_in(
        &self,
        program_id: &str,
        option: Week2Option,
    ) -> Result<Week2Completion> {
        if self.db.get_program(program_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Program {} not found",
                program_id
            )));
        }

        let now = format_utc_rfc3339(chrono::Utc::now());
        let newly_recorded = self
            .db
            .mark_week2_complete(program_id, option, &now)
            .await?;

        let effective_option = if newly_recorded {
            option
        } else {
            // Terminal transition already happened; report what was recorded.
            self.db
                .get_program_engagement(program_id)
                .await?
                .and_then(|e| e.week2_option)
                .unwrap_or(option)
        };

        if newly_recorded {
            tracing::info!(
                program_id,
                option = ?option,
                "Week-2 check-in recorded"
            );
        } else {
            tracing::debug!(program_id, "Week-2 check-in already recorded (idempotent)");
        }

        Ok(Week2Completion {
            newly_recorded,
            option: effective_option,
            message: effective_option.response_message(),
        })
    }
}
