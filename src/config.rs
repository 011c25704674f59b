// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by the deployment (Cloud Run
//! secret bindings); the engagement thresholds are product parameters with
//! documented defaults so staging can tune them without a rebuild.

use std::env;

/// Days of inactivity before the recovery prompt becomes eligible.
const DEFAULT_RECOVERY_THRESHOLD_DAYS: i64 = 3;
/// Completed-workout window in which the week-2 check-in may fire.
const DEFAULT_WEEK2_WINDOW_MIN: u32 = 5;
const DEFAULT_WEEK2_WINDOW_MAX: u32 = 8;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Analytics collector endpoint; absent disables emission
    pub analytics_endpoint: Option<String>,

    // --- Engagement product parameters ---
    /// Days without a workout before the recovery prompt is eligible
    pub recovery_threshold_days: i64,
    /// Inclusive completed-workout window for the week-2 check-in
    pub week2_window_min: u32,
    pub week2_window_max: u32,

    // --- Secrets (injected as env vars) ---
    /// JWT verification key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key the workout-completion flow signs ingest bodies with
    pub completion_signing_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            analytics_endpoint: None,
            recovery_threshold_days: DEFAULT_RECOVERY_THRESHOLD_DAYS,
            week2_window_min: DEFAULT_WEEK2_WINDOW_MIN,
            week2_window_max: DEFAULT_WEEK2_WINDOW_MAX,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            completion_signing_key: b"test_completion_key".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            analytics_endpoint: env::var("ANALYTICS_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            recovery_threshold_days: parse_env_or(
                "RECOVERY_THRESHOLD_DAYS",
                DEFAULT_RECOVERY_THRESHOLD_DAYS,
            ),
            week2_window_min: parse_env_or("WEEK2_WINDOW_MIN", DEFAULT_WEEK2_WINDOW_MIN),
            week2_window_max: parse_env_or("WEEK2_WINDOW_MAX", DEFAULT_WEEK2_WINDOW_MAX),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            completion_signing_key: env::var("COMPLETION_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("COMPLETION_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

fn parse_env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("COMPLETION_SIGNING_KEY", "test_completion_key");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert_eq!(config.week2_window_min, 5);
        assert_eq!(config.week2_window_max, 8);
    }

    #[test]
    fn test_parse_env_or_falls_back_on_garbage() {
        env::set_var("WEEK2_WINDOW_MIN_TEST_GARBAGE", "not-a-number");
        let parsed: u32 = parse_env_or("WEEK2_WINDOW_MIN_TEST_GARBAGE", 5);
        assert_eq!(parsed, 5);
    }
}
