// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard arbitration tests against the Firestore emulator.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use baisics_engagement::models::{Program, StreakState, User};
use baisics_engagement::time_utils::format_utc_rfc3339;
use chrono::{Days, Utc};
use tower::ServiceExt;

mod common;

async fn seed_user_and_program(
    state: &baisics_engagement::AppState,
    user_id: &str,
    program_id: &str,
) {
    let now = format_utc_rfc3339(Utc::now());
    state
        .db
        .upsert_user(&User {
            user_id: user_id.to_string(),
            email: None,
            first_name: "Dash".to_string(),
            created_at: now.clone(),
            last_active: now.clone(),
        })
        .await
        .unwrap();
    state
        .db
        .upsert_program(&Program {
            program_id: program_id.to_string(),
            created_by: user_id.to_string(),
            name: "Dash Block".to_string(),
            created_at: now,
        })
        .await
        .unwrap();
}

async fn fetch_dashboard(
    app: axum::Router,
    token: &str,
    program_id: &str,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/programs/{}/dashboard", program_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, parsed)
}

#[tokio::test]
async fn test_fresh_program_has_no_nudge() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let user_id = &common::unique_id("dash_fresh_user");
    let program_id = &common::unique_id("dash_fresh_program");
    seed_user_and_program(&state, user_id, program_id).await;

    let token = common::create_test_jwt(user_id, "sid_1", &state.config.jwt_signing_key);
    let (status, body) = fetch_dashboard(app, &token, program_id).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["streak"]["current"], 0);
    assert_eq!(body["recovery"]["needs_recovery"], false);
    assert_eq!(body["week2_check_in"]["should_show"], false);
    assert!(body["nudge"].is_null());
}

#[tokio::test]
async fn test_dashboard_unknown_program_is_not_found() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let token = common::create_test_jwt("someone", "sid_1", &state.config.jwt_signing_key);

    let (status, _body) = fetch_dashboard(app, &token, "no_such_program").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_foreign_program_is_not_found() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    seed_user_and_program(&state, "owner_user", "owned_program").await;

    let token = common::create_test_jwt("other_user", "sid_1", &state.config.jwt_signing_key);
    let (status, _body) = fetch_dashboard(app, &token, "owned_program").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recovery_nudge_and_session_dismissal() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let user_id = &common::unique_id("dash_recovery_user");
    let program_id = &common::unique_id("dash_recovery_program");
    seed_user_and_program(&state, user_id, program_id).await;

    // 5 silent days: well past the default threshold of 3.
    let five_days_ago = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(5))
        .unwrap();
    state
        .db
        .set_streak_state(
            user_id,
            &StreakState {
                current: 4,
                longest: 9,
                last_activity_at: Some(five_days_ago),
                updated_at: format_utc_rfc3339(Utc::now()),
            },
        )
        .await
        .unwrap();

    let token = common::create_test_jwt(user_id, "sid_abc", &state.config.jwt_signing_key);

    let (status, body) = fetch_dashboard(app.clone(), &token, program_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recovery"]["needs_recovery"], true);
    assert_eq!(body["recovery"]["days_since_last_workout"], 5);
    assert_eq!(body["nudge"]["type"], "recovery");
    assert_eq!(body["nudge"]["days_missed"], 5);

    // Reload without interacting: the nudge is still eligible.
    let (_status, body) = fetch_dashboard(app.clone(), &token, program_id).await;
    assert_eq!(body["nudge"]["type"], "recovery");

    // Explicit dismissal.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/programs/{}/recovery/dismiss", program_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Recovery state is still true, but the nudge is gone for this session.
    let (_status, body) = fetch_dashboard(app.clone(), &token, program_id).await;
    assert_eq!(body["recovery"]["needs_recovery"], true);
    assert!(body["nudge"].is_null());

    // A new browser session sees the nudge again.
    let other_session =
        common::create_test_jwt(user_id, "sid_other", &state.config.jwt_signing_key);
    let (_status, body) = fetch_dashboard(app, &other_session, program_id).await;
    assert_eq!(body["nudge"]["type"], "recovery");
}

#[tokio::test]
async fn test_dismiss_is_idempotent() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let user_id = &common::unique_id("dash_dismiss_user");
    let program_id = &common::unique_id("dash_dismiss_program");
    seed_user_and_program(&state, user_id, program_id).await;

    let token = common::create_test_jwt(user_id, "sid_1", &state.config.jwt_signing_key);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/programs/{}/recovery/dismiss", program_id))
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
