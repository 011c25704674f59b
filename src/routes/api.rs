// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.
//!
//! The dashboard read is partial-failure tolerant: each engagement
//! sub-computation is isolated, and a failed one renders as `null` for that
//! field only. `null` means "unknown", which the client must keep distinct
//! from a computed "no nudge".

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityKind, NudgeType, StreakSummary, Week2Option};
use crate::services::analytics::{EngagementEvent, NudgeAction};
use crate::services::arbiter::{self, NudgeDecision};
use crate::services::dismissals::{DismissalKey, DismissalStore};
use crate::services::recovery::RecoveryState;
use crate::services::week2::Week2State;
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339, start_of_day};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/streak", get(get_streak))
        .route("/api/activities", get(get_activities))
        .route(
            "/api/programs/{program_id}/dashboard",
            get(get_dashboard),
        )
        .route(
            "/api/programs/{program_id}/recovery/dismiss",
            post(dismiss_recovery),
        )
        .route(
            "/api/programs/{program_id}/week2-checkin",
            post(complete_week2_checkin),
        )
}

// ─── Dashboard ───────────────────────────────────────────────

/// Engagement state for one dashboard load.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardResponse {
    /// Ambient streak counters; null only when the sub-fetch failed
    pub streak: Option<StreakSummary>,
    /// Recovery state; null only when the sub-fetch failed
    pub recovery: Option<RecoveryState>,
    /// Week-2 check-in state; null only when the sub-fetch failed
    pub week2_check_in: Option<Week2State>,
    /// The single nudge to render, after precedence and dismissals
    pub nudge: Option<NudgeDecision>,
}

/// Get the engagement dashboard for a program.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(program_id): Path<String>,
) -> Result<Json<DashboardResponse>> {
    // Ownership is a precondition, not a partial-failure field.
    let program = state
        .db
        .get_program(&program_id)
        .await?
        .filter(|p| p.created_by == user.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Program {} not found", program_id)))?;

    let now = chrono::Utc::now();
    let anchor = parse_utc_rfc3339(&program.created_at)
        .map(start_of_day)
        .unwrap_or_else(|| start_of_day(now));

    let (streak_result, cursor_result, week2_result) = tokio::join!(
        state.streaks.get_streak(&user.user_id),
        state.db.get_streak_state(&user.user_id),
        state.week2.get_state(&program_id),
    );

    // Per-field isolation: a failed sub-computation logs and yields null,
    // never a fabricated zero or false.
    let streak = streak_result
        .map_err(|e| tracing::warn!(error = %e, "Streak sub-fetch failed"))
        .ok();

    let recovery = cursor_result
        .map(|cursor| {
            state
                .recovery
                .state(cursor.and_then(|s| s.last_activity_at), anchor, now)
        })
        .map_err(|e| tracing::warn!(error = %e, "Recovery sub-fetch failed"))
        .ok();

    let week2_check_in = week2_result
        .map_err(|e| tracing::warn!(error = %e, "Week-2 sub-fetch failed"))
        .ok();

    let recovery_dismissed = state
        .dismissals
        .is_dismissed(&DismissalKey::session(
            &user.session_id,
            &program_id,
            NudgeType::Recovery,
        ))
        .await
        .unwrap_or(false);

    // The first-workout celebration is client-local and rendered the instant
    // the client finds its payload; it never reaches this arbitration.
    let nudge = arbiter::decide_nudge(arbiter::ArbiterInputs {
        first_workout: None,
        recovery: recovery.clone(),
        week2: week2_check_in.clone(),
        recovery_dismissed,
    });

    Ok(Json(DashboardResponse {
        streak,
        recovery,
        week2_check_in,
        nudge,
    }))
}

// ─── Streak ──────────────────────────────────────────────────

/// Get current user's streak counters.
async fn get_streak(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StreakSummary>> {
    let summary = state.streaks.get_streak(&user.user_id).await?;
    Ok(Json(summary))
}

// ─── Recovery Dismissal ──────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DismissResponse {
    pub dismissed: bool,
}

/// Dismiss the recovery prompt for the rest of this browser session.
/// Idempotent: repeated calls are no-ops after the first.
async fn dismiss_recovery(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(program_id): Path<String>,
) -> Result<Json<DismissResponse>> {
    if state.db.get_program(&program_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Program {} not found",
            program_id
        )));
    }

    state
        .dismissals
        .mark_dismissed(&DismissalKey::session(
            &user.session_id,
            &program_id,
            NudgeType::Recovery,
        ))
        .await?;

    state.analytics.emit(EngagementEvent {
        user_id: user.user_id.clone(),
        program_id: Some(program_id),
        nudge: NudgeType::Recovery.as_str().to_string(),
        action: NudgeAction::Dismissed,
        detail: None,
        emitted_at: format_utc_rfc3339(chrono::Utc::now()),
    });

    Ok(Json(DismissResponse { dismissed: true }))
}

// ─── Week-2 Check-in ─────────────────────────────────────────

#[derive(Deserialize)]
struct Week2CheckInRequest {
    option: Week2Option,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Week2CheckInResponse {
    pub success: bool,
    pub option: Week2Option,
    pub message: String,
}

/// Record the user's week-2 check-in response.
/// Idempotent: the first call wins; repeats echo the recorded outcome.
async fn complete_week2_checkin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(program_id): Path<String>,
    Json(request): Json<Week2CheckInRequest>,
) -> Result<Json<Week2CheckInResponse>> {
    let completion = state
        .week2
        .complete_check_in(&program_id, request.option)
        .await?;

    if completion.newly_recorded {
        state.analytics.emit(EngagementEvent {
            user_id: user.user_id.clone(),
            program_id: Some(program_id),
            nudge: NudgeType::Week2CheckIn.as_str().to_string(),
            action: NudgeAction::Completed,
            detail: serde_json::to_value(completion.option).ok(),
            emitted_at: format_utc_rfc3339(chrono::Utc::now()),
        });
    }

    Ok(Json(Week2CheckInResponse {
        success: true,
        option: completion.option,
        message: completion.message.to_string(),
    }))
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ActivitiesQuery {
    /// Cursor for forward pagination (opaque token).
    cursor: Option<String>,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    50
}

const MAX_PER_PAGE: u32 = 100;

fn parse_cursor(cursor: Option<&str>) -> Result<Option<String>> {
    cursor
        .map(|raw| {
            let invalid_cursor =
                || AppError::BadRequest("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str =
                String::from_utf8(decoded).map_err(|_| invalid_cursor())?;

            // The cursor is a normalized RFC3339 timestamp.
            parse_utc_rfc3339(&decoded_str).ok_or_else(invalid_cursor)?;

            Ok(decoded_str)
        })
        .transpose()
}

fn encode_cursor(occurred_at: &str) -> String {
    URL_SAFE_NO_PAD.encode(occurred_at)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivitySummary>,
    pub per_page: u32,
    pub next_cursor: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitySummary {
    pub id: String,
    pub kind: ActivityKind,
    pub name: Option<String>,
    pub program_id: Option<String>,
    pub occurred_at: String,
}

/// Get the user's activity ledger, newest first.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ActivitiesQuery>,
) -> Result<Json<ActivitiesResponse>> {
    let limit = params.per_page.min(MAX_PER_PAGE).max(1);
    let cursor = parse_cursor(params.cursor.as_deref())?;

    tracing::debug!(
        user_id = %user.user_id,
        cursor = ?cursor,
        limit,
        "Fetching activities"
    );

    // Fetch one extra item to determine if another page is available.
    let fetch_limit = limit.saturating_add(1);
    let mut records = state
        .db
        .get_activities_for_user(&user.user_id, cursor.as_deref(), fetch_limit)
        .await?;

    let has_more = records.len() > limit as usize;
    if has_more {
        records.truncate(limit as usize);
    }

    let next_cursor = if has_more {
        records.last().map(|a| encode_cursor(&a.occurred_at))
    } else {
        None
    };

    let activities: Vec<ActivitySummary> = records
        .into_iter()
        .map(|a| ActivitySummary {
            id: a.activity_id,
            kind: a.kind,
            name: a.name,
            program_id: a.program_id,
            occurred_at: a.occurred_at,
        })
        .collect();

    Ok(Json(ActivitiesResponse {
        activities,
        per_page: limit,
        next_cursor,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let encoded = encode_cursor("2024-01-15T10:30:00Z");
        let decoded = parse_cursor(Some(&encoded)).unwrap().unwrap();
        assert_eq!(decoded, "2024-01-15T10:30:00Z");
    }

    #[test]
    fn test_cursor_rejects_invalid_base64() {
        let err = parse_cursor(Some("!!not-base64!!")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_cursor_rejects_non_timestamp_payload() {
        let bogus = URL_SAFE_NO_PAD.encode("not a timestamp");
        let err = parse_cursor(Some(&bogus)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
