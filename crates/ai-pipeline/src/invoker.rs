use std::sync::Arc;
use std::time::Duration;

use prep_llm::{GenerativeModel, ModelId};
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, UpstreamFailure};

/// Single call to the generative model with optional deadline and
/// caller-driven cancellation.
#[derive(Clone)]
pub struct ModelInvoker {
    model: Arc<dyn GenerativeModel>,
    timeout: Option<Duration>,
}

impl ModelInvoker {
    pub fn new(model: Arc<dyn GenerativeModel>, timeout: Option<Duration>) -> Self {
        Self { model, timeout }
    }

    /// Returns the raw model text. Blank text is reported as
    /// [`PipelineError::EmptyResponse`] so nothing downstream tries to parse it.
    pub async fn invoke(
        &self,
        model: &ModelId,
        prompt: &str,
        cancel_token: &CancellationToken,
    ) -> Result<String, PipelineError> {
        if cancel_token.is_cancelled() {
            return Err(UpstreamFailure::Cancelled.into());
        }

        let call = async {
            match self.timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.model.generate(model, prompt)).await {
                        Ok(result) => result.map_err(UpstreamFailure::from),
                        Err(_) => Err(UpstreamFailure::Timeout(limit)),
                    }
                }
                None => self
                    .model
                    .generate(model, prompt)
                    .await
                    .map_err(UpstreamFailure::from),
            }
        };

        let text = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return Err(UpstreamFailure::Cancelled.into()),
            result = call => result?,
        };

        if text.trim().is_empty() {
            return Err(PipelineError::EmptyResponse);
        }
        Ok(text)
    }
}
