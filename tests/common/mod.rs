// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use baisics_engagement::config::Config;
use baisics_engagement::db::FirestoreDb;
use baisics_engagement::middleware::auth::create_jwt;
use baisics_engagement::routes::create_router;
use baisics_engagement::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db_offline();
    let state = Arc::new(AppState::new(config, db));
    (create_router(state.clone()), state)
}

/// Create a test app backed by the Firestore emulator.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db().await;
    let state = Arc::new(AppState::new(config, db));
    (create_router(state.clone()), state)
}

/// Unique document id so emulator re-runs never collide with stale state.
#[allow(dead_code)]
pub fn unique_id(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{}_{}", prefix, nanos)
}

/// Create a signed session JWT for tests.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, session_id: &str, signing_key: &[u8]) -> String {
    create_jwt(user_id, session_id, signing_key).expect("Failed to create test JWT")
}
