// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Boundary to the hosted vision model.
//!
//! Providers implement [`VisionAnalyzer`] and hand back whatever JSON object
//! the model produced. Nothing here trusts that JSON: normalization and
//! schema checks happen in the pipeline.

use crate::config::{Config, VisionProvider};
use crate::error::AppError;
use crate::services::gemini::GeminiVisionAnalyzer;
use crate::services::openai::OpenAiVisionAnalyzer;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

/// Instructions sent with every image.
pub const SYSTEM_PROMPT: &str = "You are a nutrition expert AI that analyzes food images. \
Analyze the food in the image and provide detailed nutritional information. \
Respond with JSON in this exact format: { 'detectedFood': string, 'confidence': number (0-1), \
'totalCalories': number, 'protein': number, 'carbs': number, 'fats': number, 'fiber': number, \
'sugar': number, 'sodium': number, 'cholesterol': number, 'ingredients': string[], \
'portionSize': string }";

/// User turn accompanying the image.
pub const USER_PROMPT: &str = "Analyze this food image and provide detailed nutritional \
information. Be as accurate as possible with portion size estimation and nutritional values.";

/// Longest provider error body echoed back in error messages.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Image handed to a provider.
#[derive(Debug, Clone, Copy)]
pub struct ImageInput<'a> {
    pub bytes: &'a [u8],
    pub mime_type: &'a str,
}

impl ImageInput<'_> {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.bytes)
    }

    /// `data:` URL form used by chat-completion APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// Errors from a vision provider. All of them surface as
/// [`AppError::ExternalService`].
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("{0} is not configured")]
    MissingCredential(&'static str),

    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned HTTP {status}: {body}")]
    Provider {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned a malformed response: {message}")]
    MalformedResponse {
        provider: &'static str,
        message: String,
    },
}

impl AnalyzerError {
    pub(crate) fn provider_status(provider: &'static str, status: u16, body: &str) -> Self {
        Self::Provider {
            provider,
            status,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }
}

impl From<AnalyzerError> for AppError {
    fn from(err: AnalyzerError) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

/// A hosted multimodal model that estimates nutrition from a photo.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Short provider name for logs and errors.
    fn name(&self) -> &'static str;

    /// Send the image with the fixed prompt and return the model's JSON object.
    async fn analyze(&self, image: &ImageInput<'_>) -> Result<serde_json::Value, AnalyzerError>;
}

/// Parse the text a model produced into JSON.
///
/// An empty reply is treated as `{}` so normalization can fill in defaults.
pub(crate) fn parse_model_json(
    provider: &'static str,
    text: Option<&str>,
) -> Result<serde_json::Value, AnalyzerError> {
    let text = text.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("{}");
    serde_json::from_str(text).map_err(|e| AnalyzerError::MalformedResponse {
        provider,
        message: format!("model output is not JSON: {e}"),
    })
}

/// Build the analyzer selected by configuration.
pub fn analyzer_from_config(config: &Config) -> Arc<dyn VisionAnalyzer> {
    match config.vision_provider {
        VisionProvider::OpenAi => Arc::new(
            OpenAiVisionAnalyzer::new(config.openai_api_key.clone())
                .with_base_url(&config.openai_base_url)
                .with_model(&config.openai_model),
        ),
        VisionProvider::Gemini => Arc::new(
            GeminiVisionAnalyzer::new(config.gemini_api_key.clone())
                .with_base_url(&config.gemini_base_url)
                .with_model(&config.gemini_model),
        ),
    }
}
