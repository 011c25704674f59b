// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fire-and-forget engagement analytics emission.
//!
//! Events are posted to an external collector off the request path. Emission
//! failures are logged and swallowed; they must never surface to the user or
//! change an arbitration outcome. With no endpoint configured the sink logs
//! at debug and drops the event, which is also the test-mode behavior.

use serde::Serialize;

/// What happened to a nudge.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeAction {
    Presented,
    Dismissed,
    Completed,
}

/// One engagement event.
#[derive(Debug, Clone, Serialize)]
pub struct EngagementEvent {
    pub user_id: String,
    pub program_id: Option<String>,
    /// Nudge type string form ("recovery", "week2-checkin", ...)
    pub nudge: String,
    pub action: NudgeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
    pub emitted_at: String,
}

/// Analytics sink handle, cheap to clone into handlers.
#[derive(Clone)]
pub struct AnalyticsSink {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl AnalyticsSink {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Sink that drops every event (tests, local dev).
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Emit an event without blocking the caller.
    ///
    /// Returns immediately; delivery happens on a spawned task and any
    /// failure is logged at warn.
    pub fn emit(&self, event: EngagementEvent) {
        let Some(endpoint) = self.endpoint.clone() else {
            tracing::debug!(
                nudge = %event.nudge,
                action = ?event.action,
                "Analytics disabled, dropping event"
            );
            return;
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&endpoint).json(&event).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(nudge = %event.nudge, "Analytics event delivered");
                }
                Ok(response) => {
                    tracing::warn!(
                        status = %response.status(),
                        nudge = %event.nudge,
                        "Analytics collector rejected event"
                    );
                }
                Err(err) => {
                    tracing::warn!(error = %err, nudge = %event.nudge, "Analytics emission failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_sink_never_panics() {
        let sink = AnalyticsSink::disabled();
        sink.emit(EngagementEvent {
            user_id: "user_1".to_string(),
            program_id: Some("prog_1".to_string()),
            nudge: "recovery".to_string(),
            action: NudgeAction::Dismissed,
            detail: None,
            emitted_at: "2024-01-15T10:00:00Z".to_string(),
        });
    }
}
