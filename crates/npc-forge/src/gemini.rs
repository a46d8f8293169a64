//! Google Gemini text generation over the `generateContent` REST endpoint.

use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::GeminiSettings;

/// Header carrying the API key, so it never ends up in a logged URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Requested shape of the model's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Free-form text
    #[default]
    Text,
    /// Ask the service to reply with a JSON object (`application/json`)
    Json,
}

/// Errors from a generation request. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Gemini client not configured: {reason}")]
    Configuration { reason: String },

    #[error("Gemini request failed: {reason}")]
    Transport { reason: String },

    #[error("Gemini returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode Gemini response: {reason}")]
    Decode { reason: String },

    #[error("Gemini returned no text: {reason}")]
    EmptyResponse { reason: String },
}

/// Something that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send `prompt` and return the raw text of the first reply.
    async fn generate(&self, prompt: &str, format: ResponseFormat) -> Result<String, GenerationError>;
}

/// Gemini client configured once from [`GeminiSettings`].
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Validate the credential and build the HTTP client.
    pub fn configure(settings: &GeminiSettings) -> Result<Self, GenerationError> {
        let api_key = settings.api_key.trim();
        if api_key.is_empty() {
            return Err(GenerationError::Configuration {
                reason: "an API key is required".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GenerationError::Configuration {
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            endpoint: generate_endpoint(&settings.base_url, &settings.model),
            model: settings.model.clone(),
            api_key: api_key.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, format: ResponseFormat) -> Result<String, GenerationError> {
        tracing::debug!("Generating content with Gemini model {}", self.model);

        let response = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&build_request(prompt, format))
            .send()
            .await
            .map_err(|e| GenerationError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| GenerationError::Transport {
            reason: format!("failed to read response body: {}", e),
        })?;

        let text = interpret_response(status, &body)?;
        tracing::debug!("Gemini returned {} bytes", text.len());
        Ok(text)
    }
}

/// Map an HTTP status and body to the reply text or a [`GenerationError`].
fn interpret_response(status: StatusCode, body: &str) -> Result<String, GenerationError> {
    if !status.is_success() {
        return Err(GenerationError::Api {
            status: status.as_u16(),
            message: api_error_message(body),
        });
    }

    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Decode {
            reason: e.to_string(),
        })?;

    first_candidate_text(parsed)
}

/// `{base}v1beta/models/{model}:generateContent`, tolerating a base without trailing slash.
fn generate_endpoint(base_url: &str, model: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{}/v1beta/models/{}:generateContent", base, model)
}

fn build_request(prompt: &str, format: ResponseFormat) -> GenerateContentRequest {
    let generation_config = match format {
        ResponseFormat::Json => Some(GenerationConfig {
            response_mime_type: "application/json".to_string(),
        }),
        ResponseFormat::Text => None,
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(prompt.to_string()),
            }],
        }],
        generation_config,
    }
}

/// Concatenate the text parts of the first candidate.
fn first_candidate_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked ({})", r))
            .unwrap_or_else(|| "no candidates in response".to_string());
        return Err(GenerationError::EmptyResponse { reason });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .map(|r| format!("candidate has no text (finish reason {})", r))
            .unwrap_or_else(|| "candidate has no text".to_string());
        return Err(GenerationError::EmptyResponse { reason });
    }

    Ok(text)
}

/// Pull `error.message` out of an error body, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}
