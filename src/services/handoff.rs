// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! First-workout celebration handoff.
//!
//! The completion flow produces a small payload the instant a user's first
//! ever workout completes; the client carries it to the next dashboard mount
//! under a fixed storage key, where it is consumed exactly once. The mailbox
//! is delete-on-read: the slot is cleared before parsing is attempted, so a
//! malformed payload can never be re-presented. Loss is acceptable,
//! duplication is not.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Client storage key the completion flow writes the payload under.
/// The exact name is a contract with the frontend.
pub const FIRST_WORKOUT_STORAGE_KEY: &str = "baisics_first_workout_celebration";

/// Celebration stats captured at first-workout completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FirstWorkoutPayload {
    pub sets_completed: u32,
    pub total_volume: f64,
    pub workout_name: String,
}

impl FirstWorkoutPayload {
    /// Neutral stand-in when the carried payload fails to parse.
    /// Celebrating with placeholder numbers beats silently dropping the
    /// moment.
    pub fn fallback() -> Self {
        Self {
            sets_completed: 0,
            total_volume: 0.0,
            workout_name: "Your First Workout".to_string(),
        }
    }
}

/// Single-consumer, delete-on-read key-value slot.
///
/// In production the slot is the browser's local storage; this trait lets the
/// arbiter and tests run the same consumption discipline against an in-memory
/// backing.
pub trait Mailbox {
    /// Remove and return the raw value, if any. The removal happens even if
    /// the caller later fails to parse the value.
    fn take(&self, key: &str) -> Option<String>;
    /// Store a raw value, replacing any previous one.
    fn put(&self, key: &str, value: String);
    /// Non-destructive presence check.
    fn contains(&self, key: &str) -> bool;
}

/// In-memory mailbox backing.
#[derive(Default)]
pub struct MemoryMailbox {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mailbox for MemoryMailbox {
    fn take(&self, key: &str) -> Option<String> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key)
    }

    fn put(&self, key: &str, value: String) {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value);
    }

    fn contains(&self, key: &str) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(key)
    }
}

/// Consume the first-workout payload from the mailbox, if present.
///
/// - Present and well-formed: the real payload.
/// - Present but malformed: logged, replaced by [`FirstWorkoutPayload::fallback`].
/// - Absent: `None` (no celebration).
///
/// The slot is cleared in every present case before the parse result is
/// inspected.
pub fn consume_first_workout(mailbox: &impl Mailbox) -> Option<FirstWorkoutPayload> {
    let raw = mailbox.take(FIRST_WORKOUT_STORAGE_KEY)?;

    match serde_json::from_str::<FirstWorkoutPayload>(&raw) {
        Ok(payload) => Some(payload),
        Err(err) => {
            tracing::warn!(
                error = %err,
                "Malformed first-workout payload, celebrating with fallback values"
            );
            Some(FirstWorkoutPayload::fallback())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_payload_is_consumed_once() {
        let mailbox = MemoryMailbox::new();
        mailbox.put(
            FIRST_WORKOUT_STORAGE_KEY,
            r#"{"sets_completed":12,"total_volume":5400.5,"workout_name":"Upper Body A"}"#
                .to_string(),
        );

        let payload = consume_first_workout(&mailbox).expect("payload should be present");
        assert_eq!(payload.sets_completed, 12);
        assert_eq!(payload.total_volume, 5400.5);
        assert_eq!(payload.workout_name, "Upper Body A");

        // Gone after consumption; a reload shows nothing.
        assert!(!mailbox.contains(FIRST_WORKOUT_STORAGE_KEY));
        assert!(consume_first_workout(&mailbox).is_none());
    }

    #[test]
    fn test_malformed_payload_celebrates_with_fallback() {
        let mailbox = MemoryMailbox::new();
        // sets_completed as a string is the classic corruption case
        mailbox.put(
            FIRST_WORKOUT_STORAGE_KEY,
            r#"{"sets_completed":"twelve","total_volume":5400,"workout_name":"Upper"}"#.to_string(),
        );

        let payload = consume_first_workout(&mailbox).expect("fallback should be produced");
        assert_eq!(payload, FirstWorkoutPayload::fallback());
        assert_eq!(payload.sets_completed, 0);
        assert_eq!(payload.total_volume, 0.0);
        assert_eq!(payload.workout_name, "Your First Workout");

        // Deleted despite the parse failure.
        assert!(!mailbox.contains(FIRST_WORKOUT_STORAGE_KEY));
    }

    #[test]
    fn test_garbage_payload_is_still_deleted() {
        let mailbox = MemoryMailbox::new();
        mailbox.put(FIRST_WORKOUT_STORAGE_KEY, "not json at all".to_string());

        let payload = consume_first_workout(&mailbox).unwrap();
        assert_eq!(payload, FirstWorkoutPayload::fallback());
        assert!(!mailbox.contains(FIRST_WORKOUT_STORAGE_KEY));
    }

    #[test]
    fn test_absent_payload_means_no_celebration() {
        let mailbox = MemoryMailbox::new();
        assert!(consume_first_workout(&mailbox).is_none());
    }

    #[test]
    fn test_unrelated_keys_are_untouched() {
        let mailbox = MemoryMailbox::new();
        mailbox.put("disclaimer-acknowledged", "true".to_string());
        assert!(consume_first_workout(&mailbox).is_none());
        assert!(mailbox.contains("disclaimer-acknowledged"));
    }
}
