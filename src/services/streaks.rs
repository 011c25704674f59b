// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak calculator service.
//!
//! Thin orchestration over the pure transition in `models::streak`: the
//! update path runs a single transactional read-modify-write keyed by user
//! id, so two near-simultaneous completion submits cannot double-count a
//! day. The read path never writes.

use chrono::Utc;

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{StreakSummary, StreakUpdate};
use crate::time_utils::start_of_day;

#[derive(Clone)]
pub struct StreakService {
    db: FirestoreDb,
}

impl StreakService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Apply one qualifying activity completion to the user's streak.
    ///
    /// Invoked once per completion, not per page view. Unknown users are a
    /// caller error and surface as `NotFound`; storage failures propagate
    /// unmodified with no partial state written.
    pub async fn update_streak(&self, user_id: &str) -> Result<StreakUpdate> {
        if self.db.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let today = start_of_day(Utc::now());
        let update = self.db.update_streak_atomic(user_id, today).await?;

        tracing::info!(
            user_id,
            current = update.current,
            longest = update.longest,
            extended = update.extended,
            "Streak updated"
        );

        Ok(update)
    }

    /// Read-only streak accessor, safe to call on every dashboard render.
    ///
    /// A user with no streak state yet simply reads as zeros; that is not an
    /// error.
    pub async fn get_streak(&self, user_id: &str) -> Result<StreakSummary> {
        match self.db.get_streak_state(user_id).await? {
            Some(state) => Ok(state.summary()),
            None => {
                tracing::debug!(user_id, "No streak state yet, returning zeros");
                Ok(StreakSummary {
                    current: 0,
                    longest: 0,
                })
            }
        }
    }
}
