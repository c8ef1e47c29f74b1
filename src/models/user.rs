// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User account model.
//!
//! Accounts are stored alongside analyses but no route authenticates
//! against them yet.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Stored user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Unique across the store
    pub username: String,
    /// Opaque credential, never sent back to clients
    #[serde(skip_serializing)]
    pub password: String,
}

/// Fields needed to create a [`User`].
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}
