// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-memory implementation of [`AnalysisStore`].

use crate::db::AnalysisStore;
use crate::error::AppError;
use crate::models::{FoodAnalysis, NewFoodAnalysis, NewUser, User};
use crate::time_utils::now_millis;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;
use validator::Validate;

/// In-memory store. Cloning shares the same underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    analyses: std::sync::Arc<DashMap<String, FoodAnalysis>>,
    users: std::sync::Arc<DashMap<String, User>>,
    /// username -> user id
    usernames: std::sync::Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored analyses.
    pub fn analysis_count(&self) -> usize {
        self.analyses.len()
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn create_analysis(&self, analysis: NewFoodAnalysis) -> Result<FoodAnalysis, AppError> {
        let id = Uuid::new_v4().to_string();
        let record = analysis.into_record(id.clone(), now_millis());
        self.analyses.insert(id, record.clone());
        tracing::debug!(id = %record.id, food = %record.detected_food, "Stored food analysis");
        Ok(record)
    }

    async fn get_analysis(&self, id: &str) -> Result<Option<FoodAnalysis>, AppError> {
        Ok(self.analyses.get(id).map(|r| r.value().clone()))
    }

    async fn list_analyses(&self, owner: Option<&str>) -> Result<Vec<FoodAnalysis>, AppError> {
        Ok(self
            .analyses
            .iter()
            .filter(|r| owner.is_none() || r.user_id.as_deref() == owner)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        user.validate().map_err(|_| {
            AppError::Validation(
                "Username must be 1-64 characters and password must not be empty".to_string(),
            )
        })?;

        // Claim the username first so two concurrent creates cannot both win.
        let id = match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!(
                    "Username {} is already taken",
                    user.username
                )))
            }
            Entry::Vacant(slot) => {
                let id = Uuid::new_v4().to_string();
                slot.insert(id.clone());
                id
            }
        };

        let stored = User {
            id: id.clone(),
            username: user.username,
            password: user.password,
        };
        self.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let Some(id) = self.usernames.get(username).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        self.get_user(&id).await
    }
}
