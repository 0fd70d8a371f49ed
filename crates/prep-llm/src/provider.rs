use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LLMError>;

/// Identifier of a hosted model, e.g. `gemini-2.0-flash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A remote text generator.
///
/// Implementations are untrusted and non-deterministic: the returned text may
/// be empty, fenced, or not JSON at all. The model is always chosen by the
/// caller so that each call site decides its own cost/latency trade-off.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generate a completion for a single-turn prompt.
    ///
    /// Returns the concatenated candidate text, which is empty when the
    /// service answered without any text parts.
    async fn generate(&self, model: &ModelId, prompt: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_id_displays_raw_identifier() {
        let id = ModelId::new("gemini-2.0-flash");
        assert_eq!(id.to_string(), "gemini-2.0-flash");
        assert_eq!(id.as_str(), "gemini-2.0-flash");
        assert_eq!(ModelId::from("gemini-2.0-flash"), id);
    }

    #[test]
    fn model_id_serializes_transparently() {
        let id = ModelId::new("gemini-2.0-flash-lite");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"gemini-2.0-flash-lite\""
        );
    }
}
