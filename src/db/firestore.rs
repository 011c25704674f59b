// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and programs (profile reads, precondition checks)
//! - Activities (the append-only engagement ledger)
//! - Streak states (transactional read-modify-write)
//! - Program engagement markers (terminal week-2 transition, durable dismissals)

use chrono::NaiveDate;

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    ActivityKind, ActivityRecord, NudgeType, Program, ProgramEngagement, StreakState,
    StreakUpdate, User, Week2Option,
};
use crate::time_utils::format_utc_rfc3339;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by their product user ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Program Operations ──────────────────────────────────────

    /// Get a program by ID.
    pub async fn get_program(&self, program_id: &str) -> Result<Option<Program>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROGRAMS)
            .obj()
            .one(program_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a program.
    pub async fn upsert_program(&self, program: &Program) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PROGRAMS)
            .document_id(&program.program_id)
            .object(program)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Activity Ledger Operations ──────────────────────────────

    /// Get an activity by its caller-assigned ID.
    pub async fn get_activity(
        &self,
        activity_id: &str,
    ) -> Result<Option<ActivityRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(activity_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get activities for a user, newest first, with cursor pagination.
    ///
    /// `before` is an exclusive upper bound on `occurred_at` (the cursor);
    /// timestamps are normalized RFC3339 `Z` strings, so lexicographic order
    /// matches chronological order.
    pub async fn get_activities_for_user(
        &self,
        user_id: &str,
        before: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let user_id = user_id.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES);

        let query = if let Some(cursor) = before {
            let cursor = cursor.to_string();
            query.filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("occurred_at").less_than(cursor.clone()),
                ])
            })
        } else {
            query.filter(move |q| q.field("user_id").eq(user_id.clone()))
        };

        query
            .order_by([(
                "occurred_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count completed workouts logged against a program.
    ///
    /// The per-program ledger is small (a training block is tens of
    /// workouts), so fetching and counting client-side is fine.
    pub async fn count_completed_workouts(&self, program_id: &str) -> Result<u32, AppError> {
        let program_id = program_id.to_string();
        let records: Vec<ActivityRecord> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| {
                q.for_all([
                    q.field("program_id").eq(program_id.clone()),
                    q.field("kind").eq(ActivityKind::Workout.as_str()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(records.len() as u32)
    }

    /// Whether the user has any workout activity on the ledger.
    pub async fn has_workout_activity(&self, user_id: &str) -> Result<bool, AppError> {
        let user_id = user_id.to_string();
        let records: Vec<ActivityRecord> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("kind").eq(ActivityKind::Workout.as_str()),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(!records.is_empty())
    }

    /// Atomically record an activity and touch the user's `last_active`.
    ///
    /// Returns `true` if the activity was newly recorded, `false` if a record
    /// with this ID already exists (idempotent duplicate).
    pub async fn record_activity_atomic(
        &self,
        activity: &ActivityRecord,
    ) -> Result<bool, AppError> {
        let existing = self.get_activity(&activity.activity_id).await?;
        if existing.is_some() {
            tracing::debug!(
                activity_id = %activity.activity_id,
                "Activity already recorded (idempotent skip)"
            );
            return Ok(false);
        }

        let mut user = match self.get_user(&activity.user_id).await? {
            Some(user) => user,
            None => {
                return Err(AppError::NotFound(format!(
                    "User {} not found",
                    activity.user_id
                )))
            }
        };
        user.last_active = activity.recorded_at.clone();

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(&activity.activity_id)
            .object(activity)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add activity to transaction: {}", e))
            })?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            activity_id = %activity.activity_id,
            user_id = %activity.user_id,
            kind = activity.kind.as_str(),
            "Activity recorded"
        );

        Ok(true)
    }

    // ─── Streak State Operations ─────────────────────────────────

    /// Get a user's streak state.
    pub async fn get_streak_state(&self, user_id: &str) -> Result<Option<StreakState>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::STREAK_STATES)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a user's streak state.
    pub async fn set_streak_state(
        &self,
        user_id: &str,
        state: &StreakState,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::STREAK_STATES)
            .document_id(user_id)
            .object(state)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Atomically advance a user's streak for `today`.
    ///
    /// The read, the pure transition, and the write of all three counter
    /// fields happen inside one Firestore transaction. If a concurrent
    /// duplicate submit commits first, Firestore retries this transaction
    /// against the fresh state, whose same-day branch makes the retry a
    /// no-op instead of a double count.
    pub async fn update_streak_atomic(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<StreakUpdate, AppError> {
        let now = format_utc_rfc3339(chrono::Utc::now());

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Read current state within the transaction window; this registers
        // the document for conflict detection.
        let current: Option<StreakState> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::STREAK_STATES)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read streak in transaction: {}", e))
            })?;

        let mut state = current.unwrap_or_default();
        let update = state.advance(today, &now);

        // Single atomic write of all three fields.
        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::STREAK_STATES)
            .document_id(user_id)
            .object(&state)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add streak to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(update)
    }

    // ─── Program Engagement Operations ───────────────────────────

    /// Get durable engagement markers for a program.
    pub async fn get_program_engagement(
        &self,
        program_id: &str,
    ) -> Result<Option<ProgramEngagement>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROGRAM_ENGAGEMENT)
            .obj()
            .one(program_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record the week-2 check-in response; the terminal transition.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// check-in was already recorded (idempotent duplicate). The
    /// read-check-write runs inside a transaction so two concurrent
    /// completions cannot both win.
    pub async fn mark_week2_complete(
        &self,
        program_id: &str,
        option: Week2Option,
        now: &str,
    ) -> Result<bool, AppError> {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<ProgramEngagement> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROGRAM_ENGAGEMENT)
            .obj()
            .one(program_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read engagement in transaction: {}", e))
            })?;

        let mut engagement = current.unwrap_or_default();
        engagement.program_id = program_id.to_string();

        if engagement.week2_shown_at.is_some() {
            // Terminal state already reached; nothing to write.
            let _ = transaction.rollback().await;
            return Ok(false);
        }

        engagement.week2_shown_at = Some(now.to_string());
        engagement.week2_option = Some(option);
        engagement.updated_at = now.to_string();

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::PROGRAM_ENGAGEMENT)
            .document_id(program_id)
            .object(&engagement)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add engagement to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(true)
    }

    /// Record a durable program-scoped dismissal marker.
    pub async fn mark_program_dismissal(
        &self,
        program_id: &str,
        nudge: NudgeType,
        now: &str,
    ) -> Result<(), AppError> {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<ProgramEngagement> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROGRAM_ENGAGEMENT)
            .obj()
            .one(program_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read engagement in transaction: {}", e))
            })?;

        let mut engagement = current.unwrap_or_default();
        engagement.program_id = program_id.to_string();
        engagement.mark(nudge, now);

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::PROGRAM_ENGAGEMENT)
            .document_id(program_id)
            .object(&engagement)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add engagement to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }
}
