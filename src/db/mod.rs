// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PROGRAMS: &str = "programs";
    pub const ACTIVITIES: &str = "activities";
    /// Per-user streak counters (keyed by user_id)
    pub const STREAK_STATES: &str = "streak_states";
    /// Durable per-program engagement markers (keyed by program_id)
    pub const PROGRAM_ENGAGEMENT: &str = "program_engagement";
}
