// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nudge arbitration.
//!
//! Combines the derived engagement states into the single prompt (if any) a
//! dashboard load may render. The precedence is fixed: first-workout
//! celebration, then recovery, then the week-2 check-in. The streak counter
//! is ambient state rendered outside this slot and is never arbitrated.
//!
//! Deciding is side-effect free: presenting a nudge writes no dismissal
//! marker. Only an explicit dismiss or completion does, so abandoning the
//! page leaves the nudge eligible on the next load.

use serde::Serialize;

use crate::services::handoff::FirstWorkoutPayload;
use crate::services::recovery::{RecoveryState, RecoveryTier};
use crate::services::week2::Week2State;

/// The single nudge a dashboard load should render, if any.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum NudgeDecision {
    #[serde(rename = "first-workout")]
    FirstWorkout {
        payload: FirstWorkoutPayload,
    },
    #[serde(rename = "recovery")]
    Recovery {
        #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
        days_missed: i64,
        tier: RecoveryTier,
    },
    #[serde(rename = "week2-checkin")]
    Week2CheckIn,
}

/// Everything the arbiter looks at for one decision.
///
/// `None` for a state field means that sub-computation failed or was skipped;
/// the arbiter treats it as absent, which is deliberately distinct from a
/// computed "no nudge needed".
#[derive(Debug, Default)]
pub struct ArbiterInputs {
    /// Consumed first-workout handoff, when the caller holds the mailbox
    pub first_workout: Option<FirstWorkoutPayload>,
    pub recovery: Option<RecoveryState>,
    pub week2: Option<Week2State>,
    /// Session-scoped dismissal marker for the recovery prompt
    pub recovery_dismissed: bool,
}

/// Pick at most one nudge for the dashboard slot.
pub fn decide_nudge(inputs: ArbiterInputs) -> Option<NudgeDecision> {
    // 1. First-workout celebration wins outright. When the client renders it
    //    from its own storage this input is simply absent here.
    if let Some(payload) = inputs.first_workout {
        return Some(NudgeDecision::FirstWorkout { payload });
    }

    // 2. Recovery prompt, unless dismissed this session.
    if !inputs.recovery_dismissed {
        if let Some(RecoveryState {
            needs_recovery: true,
            days_since_last_workout,
            tier: Some(tier),
        }) = inputs.recovery
        {
            return Some(NudgeDecision::Recovery {
                days_missed: days_since_last_workout,
                tier,
            });
        }
    }

    // 3. Week-2 check-in; recovery occupying the slot already returned above.
    if inputs.week2.is_some_and(|w| w.should_show) {
        return Some(NudgeDecision::Week2CheckIn);
    }

    // 4. No nudge.
    None
}
