// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Food Analyzer: AI nutrition estimates from meal photos
//!
//! This crate provides the backend API that accepts a meal photo, asks a
//! hosted vision model for a nutritional breakdown, and keeps the results.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::AnalysisStore;
use services::{AnalysisPipeline, UploadHandler, VisionAnalyzer};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn AnalysisStore>,
    pub pipeline: AnalysisPipeline,
}

impl AppState {
    /// Wire the pipeline from its collaborators.
    pub fn new(
        config: Config,
        store: Arc<dyn AnalysisStore>,
        analyzer: Arc<dyn VisionAnalyzer>,
    ) -> Self {
        let uploads = UploadHandler::new(config.upload_dir.clone(), config.max_upload_bytes);
        let pipeline = AnalysisPipeline::new(uploads, analyzer, store.clone());
        Self {
            config,
            store,
            pipeline,
        }
    }
}
