// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Food analysis routes: submit a photo, browse results.

use crate::error::{AppError, Result};
use crate::models::FoodAnalysis;
use crate::AppState;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{PathRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Analysis routes.
///
/// The upload endpoints have no framework body limit: the body is streamed,
/// fields other than the image are skipped without buffering, and the image
/// size is enforced by [`crate::services::UploadHandler`].
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analyze", post(analyze_food))
        // Legacy paths kept for older web clients
        .route("/api/analyze-food", post(analyze_food))
        .layer(DefaultBodyLimit::disable())
        .route("/analyses", get(list_analyses))
        .route("/analyses/{id}", get(get_analysis))
        .route("/api/food-analyses", get(list_analyses))
        .route("/api/food-analyses/{id}", get(get_analysis))
}

#[derive(Debug, Deserialize, Validate)]
struct OwnerQuery {
    /// Owner (user id) to attach or filter by
    #[validate(length(min = 1, max = 128))]
    owner: Option<String>,
}

impl OwnerQuery {
    fn into_owner(
        query: std::result::Result<Query<Self>, QueryRejection>,
    ) -> Result<Option<String>> {
        let Query(query) = query.map_err(|e| {
            AppError::Validation(format!("Invalid query string: {}", e.body_text()))
        })?;
        query.validate().map_err(|_| {
            AppError::Validation("Invalid 'owner' parameter: must be 1-128 characters".to_string())
        })?;
        Ok(query.owner)
    }
}

/// Upload a meal photo (`image` multipart field) and return the stored analysis.
async fn analyze_food(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<OwnerQuery>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<FoodAnalysis>> {
    let owner = OwnerQuery::into_owner(query)?;
    let multipart = multipart.map_err(|e| {
        AppError::Validation(format!(
            "Expected a multipart/form-data upload: {}",
            e.body_text()
        ))
    })?;

    let record = state.pipeline.analyze_upload(multipart, owner).await?;
    Ok(Json(record))
}

/// List analyses, newest first, optionally for one owner.
async fn list_analyses(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<Json<Vec<FoodAnalysis>>> {
    let owner = OwnerQuery::into_owner(query)?;
    tracing::debug!(owner = ?owner, "Listing food analyses");

    let mut analyses = state.store.list_analyses(owner.as_deref()).await?;
    analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(analyses))
}

/// Fetch a single analysis.
async fn get_analysis(
    State(state): State<Arc<AppState>>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<FoodAnalysis>> {
    let Path(id) = path
        .map_err(|e| AppError::Validation(format!("Invalid analysis id: {}", e.body_text())))?;
    state
        .store
        .get_analysis(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("food analysis {id}")))
}
