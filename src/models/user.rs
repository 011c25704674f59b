// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
///
/// Created by the signup flow (external collaborator); the engagement engine
/// reads it for precondition checks and refreshes `last_active` on ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Product user ID (also used as document ID)
    pub user_id: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// First name
    pub first_name: String,
    /// When the account was created
    pub created_at: String,
    /// Last activity timestamp
    pub last_active: String,
}
