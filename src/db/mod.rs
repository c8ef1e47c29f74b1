//! Record store for analyses and user accounts.
//!
//! The pipeline and routes only see [`AnalysisStore`]; the in-memory
//! [`MemoryStore`] is the only backend today.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{FoodAnalysis, NewFoodAnalysis, NewUser, User};
use async_trait::async_trait;

/// Keyed repository of analysis results and user accounts.
///
/// There is no update or delete: records are immutable once
/// created.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Store a new analysis, assigning a fresh id and creation timestamp.
    async fn create_analysis(&self, analysis: NewFoodAnalysis) -> Result<FoodAnalysis, AppError>;

    async fn get_analysis(&self, id: &str) -> Result<Option<FoodAnalysis>, AppError>;

    /// All analyses, optionally restricted to one owner. Order is unspecified.
    async fn list_analyses(&self, owner: Option<&str>) -> Result<Vec<FoodAnalysis>, AppError>;

    /// Create a user. Fails with [`AppError::Conflict`] if the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
}
