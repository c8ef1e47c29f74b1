// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gemini `generateContent` adapter using a response schema.
//!
//! Unlike the chat-completion adapter, the output shape is enforced by the
//! provider through `generationConfig.responseSchema`.

use crate::services::vision::{
    parse_model_json, AnalyzerError, ImageInput, VisionAnalyzer, SYSTEM_PROMPT, USER_PROMPT,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER: &str = "gemini";

/// Vision analyzer backed by Gemini structured output.
#[derive(Clone)]
pub struct GeminiVisionAnalyzer {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for GeminiVisionAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiVisionAnalyzer")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl GeminiVisionAnalyzer {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn build_request(image: &ImageInput<'_>) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.to_string(),
                            data: image.to_base64(),
                        },
                    },
                    Part::Text {
                        text: USER_PROMPT.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: nutrition_schema(),
            },
        }
    }
}

/// OpenAPI-subset schema describing the nutrition object.
fn nutrition_schema() -> serde_json::Value {
    let number = json!({ "type": "NUMBER" });
    json!({
        "type": "OBJECT",
        "properties": {
            "detectedFood": { "type": "STRING" },
            "confidence": { "type": "NUMBER", "minimum": 0, "maximum": 1 },
            "totalCalories": number,
            "protein": number,
            "carbs": number,
            "fats": number,
            "fiber": number,
            "sugar": number,
            "sodium": number,
            "cholesterol": number,
            "ingredients": { "type": "ARRAY", "items": { "type": "STRING" } },
            "portionSize": { "type": "STRING" }
        },
        "required": [
            "detectedFood", "confidence", "totalCalories",
            "protein", "carbs", "fats", "portionSize"
        ]
    })
}

#[async_trait]
impl VisionAnalyzer for GeminiVisionAnalyzer {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn analyze(&self, image: &ImageInput<'_>) -> Result<serde_json::Value, AnalyzerError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AnalyzerError::MissingCredential("GEMINI_API_KEY"))?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        tracing::debug!(model = %self.model, bytes = image.bytes.len(), "Sending image to Gemini");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&Self::build_request(image))
            .send()
            .await
            .map_err(|e| AnalyzerError::Transport {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AnalyzerError::Transport {
            provider: PROVIDER,
            message: format!("failed to read response: {e}"),
        })?;

        if !status.is_success() {
            tracing::warn!(status = %status, "Gemini API error");
            return Err(AnalyzerError::provider_status(PROVIDER, status.as_u16(), &body));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| AnalyzerError::MalformedResponse {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .ok_or_else(|| AnalyzerError::MalformedResponse {
                provider: PROVIDER,
                message: "no candidates in response".to_string(),
            })?;

        parse_model_json(PROVIDER, Some(&text))
    }
}

// ─── Wire Types ──────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
