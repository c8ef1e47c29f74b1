// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Food Analyzer API Server
//!
//! Accepts meal photos, asks a hosted vision model for a nutritional
//! estimate, and serves the stored results.

use food_analyzer::{
    config::Config, db::MemoryStore, services::analyzer_from_config, AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        provider = ?config.vision_provider,
        "Starting Food Analyzer API"
    );

    if config.active_api_key().is_none() {
        tracing::warn!(
            provider = ?config.vision_provider,
            "No API key configured for vision provider; analysis requests will fail"
        );
    }

    let store = Arc::new(MemoryStore::new());
    let analyzer = analyzer_from_config(&config);
    tracing::info!(analyzer = analyzer.name(), "Vision analyzer initialized");

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), store, analyzer));

    state.pipeline.uploads().ensure_upload_dir().await?;
    tracing::info!(
        path = %state.pipeline.uploads().upload_dir().display(),
        max_bytes = state.pipeline.uploads().max_bytes(),
        "Upload directory ready"
    );

    // Build router
    let app = food_analyzer::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("food_analyzer=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
