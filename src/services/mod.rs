// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod analytics;
pub mod arbiter;
pub mod dismissals;
pub mod handoff;
pub mod recovery;
pub mod streaks;
pub mod week2;

pub use analytics::{AnalyticsSink, EngagementEvent, NudgeAction};
pub use arbiter::{decide_nudge, ArbiterInputs, NudgeDecision};
pub use dismissals::{DismissalKey, DismissalStore, ScopedDismissals, SessionDismissals};
pub use handoff::{FirstWorkoutPayload, Mailbox, MemoryMailbox, FIRST_WORKOUT_STORAGE_KEY};
pub use recovery::{RecoveryDetector, RecoveryState, RecoveryTier};
pub use streaks::StreakService;
pub use week2::{Week2State, Week2Trigger};
