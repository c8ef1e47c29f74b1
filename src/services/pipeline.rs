// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Food analysis pipeline.
//!
//! Runs one upload through: validate → model call → normalize → persist.
//! The staged image is deleted exactly once, after persistence or at the
//! point of failure, and never before the model call has returned.

use crate::db::AnalysisStore;
use crate::error::{AppError, Result};
use crate::models::FoodAnalysis;
use crate::services::normalize::normalize;
use crate::services::upload::{StagedImage, UploadHandler};
use crate::services::vision::{ImageInput, VisionAnalyzer};
use axum::extract::Multipart;
use std::fmt;
use std::sync::Arc;

/// Where a run is (or where it stopped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    ModelInvoked,
    Normalized,
    Persisted,
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::ModelInvoked => "model_invoked",
            Stage::Normalized => "normalized",
            Stage::Persisted => "persisted",
            Stage::Responded => "responded",
        })
    }
}

/// Orchestrates uploads, the vision model and the record store.
#[derive(Clone)]
pub struct AnalysisPipeline {
    uploads: UploadHandler,
    analyzer: Arc<dyn VisionAnalyzer>,
    store: Arc<dyn AnalysisStore>,
}

impl AnalysisPipeline {
    pub fn new(
        uploads: UploadHandler,
        analyzer: Arc<dyn VisionAnalyzer>,
        store: Arc<dyn AnalysisStore>,
    ) -> Self {
        Self {
            uploads,
            analyzer,
            store,
        }
    }

    pub fn uploads(&self) -> &UploadHandler {
        &self.uploads
    }

    /// Validate and stage the multipart upload, then run it.
    ///
    /// Upload validation failures return before any model call.
    pub async fn analyze_upload(
        &self,
        multipart: Multipart,
        owner: Option<String>,
    ) -> Result<FoodAnalysis> {
        let staged = self.uploads.accept(multipart).await.inspect_err(|e| {
            tracing::info!(stage = %Stage::Received, error = %e, "Upload rejected");
        })?;
        self.run(staged, owner).await
    }

    /// Analyze an already staged image. Consumes and always cleans up `staged`.
    pub async fn run(&self, staged: StagedImage, owner: Option<String>) -> Result<FoodAnalysis> {
        let mut stage = Stage::Validated;
        tracing::debug!(
            stage = %stage,
            file_name = staged.file_name().unwrap_or("<none>"),
            bytes = staged.size(),
            content_type = %staged.content_type(),
            "Analyzing upload"
        );
        let outcome = self.process(&staged, owner, &mut stage).await;

        let path = staged.path().display().to_string();
        if let Err(e) = staged.cleanup() {
            tracing::warn!(path = %path, error = %e, "Failed to remove staged upload");
        }

        match &outcome {
            Ok(record) => tracing::info!(
                stage = %Stage::Responded,
                id = %record.id,
                provider = self.analyzer.name(),
                food = %record.detected_food,
                calories = record.total_calories,
                "Food analysis complete"
            ),
            Err(e) => tracing::warn!(
                failed_after = %stage,
                provider = self.analyzer.name(),
                error = %e,
                "Food analysis failed"
            ),
        }

        outcome
    }

    async fn process(
        &self,
        staged: &StagedImage,
        owner: Option<String>,
        stage: &mut Stage,
    ) -> Result<FoodAnalysis> {
        let bytes = staged.read().await?;
        let image = ImageInput {
            bytes: &bytes,
            mime_type: staged.content_type(),
        };

        let raw = self.analyzer.analyze(&image).await.map_err(AppError::from)?;
        *stage = Stage::ModelInvoked;
        tracing::debug!(stage = %stage, provider = self.analyzer.name(), "Model responded");

        let normalized = normalize(raw, staged.path().display().to_string(), owner)?;
        *stage = Stage::Normalized;
        tracing::debug!(stage = %stage, food = %normalized.analysis.detected_food, "Estimate normalized");
        if !normalized.defaulted.is_empty() {
            tracing::warn!(
                fields = ?normalized.defaulted,
                "Model response missing fields; defaults applied"
            );
        }

        let record = self.store.create_analysis(normalized.analysis).await?;
        *stage = Stage::Persisted;
        tracing::debug!(stage = %stage, id = %record.id, "Analysis stored");

        Ok(record)
    }
}
