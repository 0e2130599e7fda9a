//! Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::sources::{HttpTimeouts, build_http_client};

use super::Generator;

/// Default Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when neither config nor environment names one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the model.
pub const MODEL_ENV: &str = "RACECAL_MODEL";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const GENERATION_TIMEOUT_SECS: u64 = 180;

// ==================== Gemini API Types ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.95,
            max_output_tokens: 8192,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

// ==================== GeminiGenerator ====================

/// [`Generator`] backed by the Gemini REST API.
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiGenerator {
    /// Creates a generator for `model` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Configuration`] when the key is blank or the
    /// HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ExtractError> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Creates a generator against a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Configuration`] when the key is blank or the
    /// HTTP client cannot be built.
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ExtractError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(missing_key());
        }
        let timeouts = HttpTimeouts::from_secs(CONNECT_TIMEOUT_SECS, GENERATION_TIMEOUT_SECS);
        Ok(Self {
            client: build_http_client(timeouts, true)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    /// Creates a generator from `GEMINI_API_KEY`, with the model from
    /// `RACECAL_MODEL`, else `fallback_model`, else the default.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Configuration`] when the key is not set.
    pub fn from_env(fallback_model: Option<&str>) -> Result<Self, ExtractError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| missing_key())?;
        let model = std::env::var(MODEL_ENV)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| fallback_model.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self::new(api_key, model)
    }

    /// The model this generator calls.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

fn missing_key() -> ExtractError {
    ExtractError::configuration(
        "Gemini API key is not set",
        "Export GEMINI_API_KEY to enable the generative fallback tiers",
    )
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, ExtractError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig::default(),
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| ExtractError::unreachable(&url, error))?;

        let status = response.status();
        if !status.is_success() {
            let reason = match status.as_u16() {
                401 | 403 => "Gemini rejected the API key".to_string(),
                429 => "Gemini rate limit exceeded".to_string(),
                s if s >= 500 => "Gemini API unavailable".to_string(),
                s => format!("Gemini API returned HTTP {s}"),
            };
            warn!(status = status.as_u16(), %reason, "Gemini request failed");
            return Err(ExtractError::unreachable(&url, reason));
        }

        let body = response
            .json::<GenerateResponse>()
            .await
            .map_err(|error| ExtractError::invalid_output(format!("unexpected Gemini response: {error}")))?;
        let text = body
            .text()
            .ok_or_else(|| ExtractError::invalid_output("Gemini returned no text"))?;
        debug!(reply_chars = text.len(), "Gemini reply received");
        Ok(text)
    }
}
