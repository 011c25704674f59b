// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Baisics Engagement: the engagement lifecycle engine for the BAISICS
//! fitness app.
//!
//! This crate provides the backend API that turns a user's history of
//! completed workouts and check-ins into engagement state: streak counters,
//! the recovery prompt, the one-time week-2 check-in, and the first-workout
//! celebration handoff, arbitrated into at most one nudge per dashboard
//! load.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{AnalyticsSink, RecoveryDetector, ScopedDismissals, StreakService, Week2Trigger};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub streaks: StreakService,
    pub recovery: RecoveryDetector,
    pub week2: Week2Trigger,
    pub dismissals: ScopedDismissals,
    pub analytics: AnalyticsSink,
}

impl AppState {
    /// Wire the engine components from config and a database handle.
    ///
    /// Every component receives its storage handle explicitly; there is no
    /// ambient global client.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let streaks = StreakService::new(db.clone());
        let recovery = RecoveryDetector::new(config.recovery_threshold_days);
        let week2 = Week2Trigger::new(db.clone(), config.week2_window_min, config.week2_window_max);
        let dismissals = ScopedDismissals::new(db.clone());
        let analytics = AnalyticsSink::new(config.analytics_endpoint.clone());

        Self {
            config,
            db,
            streaks,
            recovery,
            week2,
            dismissals,
            analytics,
        }
    }
}
