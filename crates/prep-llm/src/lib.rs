pub mod protocol;
pub mod provider;
pub mod providers;

pub use provider::{GenerativeModel, LLMError, ModelId, Result};
pub use providers::gemini::{
    GeminiProvider, DEFAULT_EXPLANATION_MODEL, DEFAULT_GEMINI_BASE_URL, DEFAULT_QUESTION_MODEL,
};
