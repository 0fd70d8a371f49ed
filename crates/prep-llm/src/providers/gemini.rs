//! Google Gemini provider implementation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::protocol::gemini::{GeminiRequest, GeminiResponse};
use crate::provider::{GenerativeModel, LLMError, ModelId, Result};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Larger model used for bulk question generation.
pub const DEFAULT_QUESTION_MODEL: &str = "gemini-2.0-flash";

/// Smaller, cheaper model used for single explanations.
pub const DEFAULT_EXPLANATION_MODEL: &str = "gemini-2.0-flash-lite";

/// Google Gemini API provider.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (e.g., for proxies or alternative endpoints).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client (connection pool, proxy, TLS settings).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn endpoint(&self, model: &ModelId) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiProvider {
    async fn generate(&self, model: &ModelId, prompt: &str) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(LLMError::Config(
                "Gemini API key is not configured".to_string(),
            ));
        }

        let url = self.endpoint(model);
        log::debug!("Gemini generateContent: model='{}', url='{}'", model, url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GeminiRequest::from_prompt(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(LLMError::Auth(format!(
                    "Gemini authentication failed: {}. Please check your API key.",
                    text
                )));
            }

            return Err(LLMError::Api(format!(
                "Gemini API error: HTTP {}: {}",
                status, text
            )));
        }

        let raw = response.text().await?;
        let body: GeminiResponse = serde_json::from_str(&raw)?;
        if let Some(reason) = body.block_reason() {
            log::warn!("Gemini blocked prompt for model '{}': {}", model, reason);
        }

        let text = body.text();
        log::debug!(
            "Gemini response for model '{}': {} characters",
            model,
            text.len()
        );
        Ok(text)
    }
}
