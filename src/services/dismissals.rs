// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scoped dismissal markers.
//!
//! One interface over two backings: session-scoped markers live in a
//! volatile in-process map keyed by the caller's browser session id and die
//! with the scope; program-scoped markers are durable and live alongside the
//! program record. The arbiter consults this store before every
//! presentation decision and writes to it only on explicit dismiss or
//! completion, never on mere presentation.

use std::sync::Arc;

use dashmap::DashMap;

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{DismissalScope, NudgeType};
use crate::time_utils::format_utc_rfc3339;

/// Fully-qualified dismissal marker key.
#[derive(Debug, Clone)]
pub struct DismissalKey {
    pub scope: DismissalScope,
    /// Browser session id (JWT `sid` claim); ignored for program scope
    pub session_id: String,
    /// Program id the marker applies to
    pub scope_id: String,
    pub nudge: NudgeType,
}

impl DismissalKey {
    pub fn session(session_id: &str, scope_id: &str, nudge: NudgeType) -> Self {
        Self {
            scope: DismissalScope::Session,
            session_id: session_id.to_string(),
            scope_id: scope_id.to_string(),
            nudge,
        }
    }

    pub fn program(scope_id: &str, nudge: NudgeType) -> Self {
        Self {
            scope: DismissalScope::Program,
            session_id: String::new(),
            scope_id: scope_id.to_string(),
            nudge,
        }
    }
}

/// Scoped key-value store abstraction both backings satisfy.
pub trait DismissalStore {
    fn is_dismissed(&self, key: &DismissalKey) -> impl std::future::Future<Output = Result<bool>> + Send;
    fn mark_dismissed(&self, key: &DismissalKey) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Volatile session-scoped backing.
///
/// Entries are keyed `sid/programId/nudge`; they vanish on process restart,
/// which matches the session scope's natural lifetime closely enough for a
/// single-instance deployment and errs toward re-showing, never
/// over-suppressing.
#[derive(Clone, Default)]
pub struct SessionDismissals {
    entries: Arc<DashMap<String, String>>,
}

impl SessionDismissals {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_key(key: &DismissalKey) -> String {
        format!("{}/{}/{}", key.session_id, key.scope_id, key.nudge)
    }
}

impl DismissalStore for SessionDismissals {
    async fn is_dismissed(&self, key: &DismissalKey) -> Result<bool> {
        Ok(self.entries.contains_key(&Self::entry_key(key)))
    }

    async fn mark_dismissed(&self, key: &DismissalKey) -> Result<()> {
        self.entries
            .entry(Self::entry_key(key))
            .or_insert_with(|| format_utc_rfc3339(chrono::Utc::now()));
        Ok(())
    }
}

/// Durable program-scoped backing, stored in `program_engagement`.
#[derive(Clone)]
pub struct ProgramDismissals {
    db: FirestoreDb,
}

impl ProgramDismissals {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }
}

impl DismissalStore for ProgramDismissals {
    async fn is_dismissed(&self, key: &DismissalKey) -> Result<bool> {
        let engagement = self.db.get_program_engagement(&key.scope_id).await?;
        Ok(engagement.is_some_and(|e| e.is_marked(key.nudge)))
    }

    async fn mark_dismissed(&self, key: &DismissalKey) -> Result<()> {
        let now = format_utc_rfc3339(chrono::Utc::now());
        self.db
            .mark_program_dismissal(&key.scope_id, key.nudge, &now)
            .await
    }
}

/// Routing front over both backings.
#[derive(Clone)]
pub struct ScopedDismissals {
    session: SessionDismissals,
    program: ProgramDismissals,
}

impl ScopedDismissals {
    pub fn new(db: FirestoreDb) -> Self {
        Self {
            session: SessionDismissals::new(),
            program: ProgramDismissals::new(db),
        }
    }
}

impl DismissalStore for ScopedDismissals {
    async fn is_dismissed(&self, key: &DismissalKey) -> Result<bool> {
        match key.scope {
            DismissalScope::Session => self.session.is_dismissed(key).await,
            DismissalScope::Program => self.program.is_dismissed(key).await,
        }
    }

    async fn mark_dismissed(&self, key: &DismissalKey) -> Result<()> {
        match key.scope {
            DismissalScope::Session => self.session.mark_dismissed(key).await,
            DismissalScope::Program => self.program.mark_dismissed(key).await,
        }
    }
}
