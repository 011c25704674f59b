// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Completion ingest route.
//!
//! The workout-completion flow (an external collaborator) posts here once per
//! completed workout or check-in. The body is HMAC-signed with a shared key;
//! ingestion is idempotent by `activity_id`, and the streak advances at most
//! once per calendar day regardless of how many times the same completion is
//! submitted.
//!
//! A first-ever workout additionally yields the celebration payload the
//! client must stash under [`FIRST_WORKOUT_STORAGE_KEY`] for the next
//! dashboard mount to consume.

use crate::error::{AppError, Result};
use crate::models::{ActivityKind, ActivityRecord, NudgeType, StreakUpdate};
use crate::services::analytics::{EngagementEvent, NudgeAction};
use crate::services::handoff::FirstWorkoutPayload;
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded HMAC-SHA256 of the raw request body.
pub const SIGNATURE_HEADER: &str = "x-baisics-signature";

/// Completion ingest routes (authenticated by body signature, not JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/internal/activity-completed", post(activity_completed))
}

/// Event posted by the completion flow.
#[derive(Debug, Deserialize)]
struct CompletionEvent {
    /// Caller-assigned idempotency key
    activity_id: String,
    user_id: String,
    program_id: Option<String>,
    kind: ActivityKind,
    /// RFC3339 instant of the completion
    occurred_at: String,
    name: Option<String>,
    #[serde(default)]
    sets_completed: Option<u32>,
    #[serde(default)]
    total_volume: Option<f64>,
    #[serde(default = "default_source")]
    source: String,
}

fn default_source() -> String {
    "completion".to_string()
}

/// Ingest outcome returned to the completion flow.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletionResponse {
    /// False when this activity_id had already been ingested
    pub recorded: bool,
    pub streak: StreakUpdate,
    /// Present exactly when this was the user's first ever workout; the
    /// client carries it to the next dashboard render.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_workout: Option<FirstWorkoutPayload>,
}

/// Verify the hex HMAC-SHA256 signature over the raw body.
///
/// `Mac::verify_slice` is constant-time, so signature comparison does not
/// leak prefix information.
fn verify_signature(key: &[u8], headers: &HeaderMap, body: &[u8]) -> Result<()> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let provided_bytes = hex::decode(provided).map_err(|_| AppError::InvalidToken)?;

    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    mac.update(body);
    mac.verify_slice(&provided_bytes)
        .map_err(|_| AppError::InvalidToken)?;

    Ok(())
}

/// Sign a body the way the completion flow does. Test helper.
pub fn sign_body(key: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Handle one activity completion.
async fn activity_completed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CompletionResponse>> {
    verify_signature(&state.config.completion_signing_key, &headers, &body)?;

    let event: CompletionEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid completion event: {}", e)))?;

    let occurred_at = parse_utc_rfc3339(&event.occurred_at).ok_or_else(|| {
        AppError::BadRequest("Invalid 'occurred_at': must be RFC3339 datetime".to_string())
    })?;

    tracing::info!(
        activity_id = %event.activity_id,
        user_id = %event.user_id,
        kind = event.kind.as_str(),
        source = %event.source,
        "Processing completion"
    );

    // First-ever detection has to precede the ledger write.
    let first_workout_ever = event.kind == ActivityKind::Workout
        && !state.db.has_workout_activity(&event.user_id).await?;

    let now = format_utc_rfc3339(chrono::Utc::now());
    let record = ActivityRecord {
        activity_id: event.activity_id.clone(),
        user_id: event.user_id.clone(),
        program_id: event.program_id.clone(),
        kind: event.kind,
        occurred_at: format_utc_rfc3339(occurred_at),
        name: event.name.clone(),
        source: event.source.clone(),
        recorded_at: now.clone(),
    };

    let recorded = state.db.record_activity_atomic(&record).await?;

    if !recorded {
        // Duplicate submit: report current counters, produce no payload.
        let streak = state.db.get_streak_state(&event.user_id).await?.unwrap_or_default();
        return Ok(Json(CompletionResponse {
            recorded: false,
            streak: StreakUpdate {
                current: streak.current,
                longest: streak.longest,
                extended: false,
            },
            first_workout: None,
        }));
    }

    // Once per qualifying completion, never per page view.
    let streak = state.streaks.update_streak(&event.user_id).await?;

    let first_workout = first_workout_ever.then(|| FirstWorkoutPayload {
        sets_completed: event.sets_completed.unwrap_or(0),
        total_volume: event.total_volume.unwrap_or(0.0),
        workout_name: event
            .name
            .clone()
            .unwrap_or_else(|| "Your First Workout".to_string()),
    });

    if first_workout.is_some() {
        tracing::info!(user_id = %event.user_id, "First-ever workout, handing off celebration payload");
        state.analytics.emit(EngagementEvent {
            user_id: event.user_id.clone(),
            program_id: event.program_id.clone(),
            nudge: NudgeType::FirstWorkout.as_str().to_string(),
            action: NudgeAction::Presented,
            detail: None,
            emitted_at: now,
        });
    }

    Ok(Json(CompletionResponse {
        recorded: true,
        streak,
        first_workout,
    }))
}
