//! Reasoning backend seam and the Gemini HTTP adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("response body unreadable: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("rate limited by backend")]
    RateLimited,
    #[error("backend rejected credentials")]
    Unauthorized,
    #[error("backend error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("backend returned no candidates")]
    EmptyResponse,
    #[error("unrecoverable response shape: {0}")]
    Malformed(String),
    #[error("run cancelled")]
    Cancelled,
}

impl EngineError {
    /// Whether a retry could plausibly succeed. Credential failures and
    /// other 4xx rejections will fail identically; cancellation must not
    /// be retried at all.
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::Http(_)
            | EngineError::Serde(_)
            | EngineError::RateLimited
            | EngineError::EmptyResponse
            | EngineError::Malformed(_) => true,
            EngineError::Api { status, .. } => *status >= 500,
            EngineError::Unauthorized | EngineError::Cancelled => false,
        }
    }
}

/// LLM collaborator: one prompt in, one text completion out. Retry and
/// response recovery live above this seam.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    async fn complete(&self, prompt: &str, max_output_tokens: u32)
        -> Result<String, EngineError>;

    fn model_id(&self) -> &str;
}

// ── Gemini generateContent wire types ──────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
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
    #[serde(default)]
    text: String,
}

// ── Gemini adapter ─────────────────────────────────────────────────────

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Adapter over the Gemini `generateContent` REST endpoint. Low
/// temperature keeps the JSON contract honored across calls.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key, model, base_url: DEFAULT_BASE_URL.to_string() })
    }

    /// Point the adapter at a different host, for tests and proxies.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ReasoningBackend for GeminiBackend {
    async fn complete(
        &self,
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<String, EngineError> {
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
            generation_config: GenerationConfig {
                max_output_tokens,
                temperature: 0.1,
                top_p: 0.8,
                top_k: 40,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => EngineError::RateLimited,
                401 | 403 => EngineError::Unauthorized,
                code => EngineError::Api { status: code, message: truncate(&message, 200) },
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&response.text().await?)?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(EngineError::EmptyResponse);
        }
        debug!(model = %self.model, chars = text.len(), "completion received");
        Ok(text)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}
