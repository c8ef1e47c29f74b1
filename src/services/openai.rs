// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OpenAI chat-completions adapter (vision input, JSON object output).

use crate::services::vision::{
    parse_model_json, AnalyzerError, ImageInput, VisionAnalyzer, SYSTEM_PROMPT, USER_PROMPT,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-5";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "openai";
const MAX_COMPLETION_TOKENS: u32 = 2048;

/// Vision analyzer backed by a chat-completion model.
#[derive(Clone)]
pub struct OpenAiVisionAnalyzer {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiVisionAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiVisionAnalyzer")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl OpenAiVisionAnalyzer {
    /// A missing key is accepted here; calls fail until one is configured.
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

    fn build_request<'a>(&'a self, image: &ImageInput<'_>) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(SYSTEM_PROMPT),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text { text: USER_PROMPT },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image.data_url(),
                            },
                        },
                    ]),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            max_completion_tokens: MAX_COMPLETION_TOKENS,
        }
    }
}

#[async_trait]
impl VisionAnalyzer for OpenAiVisionAnalyzer {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn analyze(&self, image: &ImageInput<'_>) -> Result<serde_json::Value, AnalyzerError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AnalyzerError::MissingCredential("OPENAI_API_KEY"))?;

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, bytes = image.bytes.len(), "Sending image to OpenAI");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.build_request(image))
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
            tracing::warn!(status = %status, "OpenAI API error");
            return Err(AnalyzerError::provider_status(PROVIDER, status.as_u16(), &body));
        }

        let completion: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|e| AnalyzerError::MalformedResponse {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AnalyzerError::MalformedResponse {
                provider: PROVIDER,
                message: "no choices in response".to_string(),
            })?;

        parse_model_json(PROVIDER, choice.message.content.as_deref())
    }
}

// ─── Wire Types ──────────────────────────────────────────────

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    max_completion_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(&'static str),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: &'static str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
