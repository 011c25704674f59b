// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for storage and API.

pub mod activity;
pub mod nudge;
pub mod program;
pub mod streak;
pub mod user;

pub use activity::{ActivityKind, ActivityRecord};
pub use nudge::{DismissalScope, NudgeType};
pub use program::{Program, ProgramEngagement, Week2Option};
pub use streak::{StreakState, StreakSummary, StreakUpdate};
pub use user::User;
