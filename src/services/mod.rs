// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod gemini;
pub mod normalize;
pub mod openai;
pub mod pipeline;
pub mod upload;
pub mod vision;

pub use gemini::GeminiVisionAnalyzer;
pub use openai::OpenAiVisionAnalyzer;
pub use pipeline::{AnalysisPipeline, Stage};
pub use upload::{StagedImage, UploadHandler};
pub use vision::{analyzer_from_config, AnalyzerError, ImageInput, VisionAnalyzer};
