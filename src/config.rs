// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Provider credentials are optional: a missing key is logged at startup and
//! every analysis request fails at call time instead.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default upload size limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which hosted vision model backs the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisionProvider {
    /// Chat-completion model with image input.
    #[default]
    OpenAi,
    /// Structured-schema generation model.
    Gemini,
}

impl FromStr for VisionProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            other => Err(ConfigError::Invalid {
                name: "VISION_PROVIDER",
                value: other.to_string(),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Directory where uploads are staged while being analyzed
    pub upload_dir: PathBuf,
    /// Largest accepted image, in bytes
    pub max_upload_bytes: usize,

    pub vision_provider: VisionProvider,

    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,

    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("frontend_url", &self.frontend_url)
            .field("upload_dir", &self.upload_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("vision_provider", &self.vision_provider)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .finish()
    }
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            upload_dir: env::temp_dir().join("food-analyzer-uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            vision_provider: VisionProvider::OpenAi,
            openai_api_key: None,
            openai_model: crate::services::openai::DEFAULT_MODEL.to_string(),
            openai_base_url: crate::services::openai::DEFAULT_BASE_URL.to_string(),
            gemini_api_key: None,
            gemini_model: crate::services::gemini::DEFAULT_MODEL.to_string(),
            gemini_base_url: crate::services::gemini::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let vision_provider = match env::var("VISION_PROVIDER") {
            Ok(v) => v.parse()?,
            Err(_) => VisionProvider::default(),
        };

        let max_upload_bytes = match env::var("MAX_UPLOAD_BYTES") {
            Ok(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "MAX_UPLOAD_BYTES",
                value: v,
            })?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            max_upload_bytes,
            vision_provider,

            openai_api_key: secret("OPENAI_API_KEY").or_else(|| secret("VITE_OPENAI_API_KEY")),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| crate::services::openai::DEFAULT_MODEL.to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| crate::services::openai::DEFAULT_BASE_URL.to_string()),

            gemini_api_key: secret("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| crate::services::gemini::DEFAULT_MODEL.to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| crate::services::gemini::DEFAULT_BASE_URL.to_string()),
        })
    }

    /// Credential for the selected provider, if configured.
    pub fn active_api_key(&self) -> Option<&str> {
        match self.vision_provider {
            VisionProvider::OpenAi => self.openai_api_key.as_deref(),
            VisionProvider::Gemini => self.gemini_api_key.as_deref(),
        }
    }
}

/// Read a secret, treating blank values as unset.
fn secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
