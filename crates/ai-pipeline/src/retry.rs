use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use prep_core::{ExplanationRequest, QuestionRequest};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, UpstreamFailure};
use crate::pipeline::GenerationService;

/// Bounded re-run of a whole generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; zero behaves like one.
    pub max_attempts: u32,
    /// Delay before the second attempt, growing linearly afterwards.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    fn should_retry(&self, attempt: u32, err: &PipelineError) -> bool {
        attempt < self.max_attempts.max(1) && err.kind().is_transient() && !err.was_cancelled()
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

/// Wraps a [`GenerationService`] and repeats failed runs whose error kind is
/// transient. Shape mismatches and cancellations are returned immediately.
pub struct RetryingPipeline<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: GenerationService> RetryingPipeline<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    #[cfg(test)]
    fn inner(&self) -> &S {
        &self.inner
    }

    async fn with_retry<T, F, Fut>(
        &self,
        cancel_token: &CancellationToken,
        mut attempt_once: F,
    ) -> Result<T, PipelineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let mut attempt = 1;
        loop {
            let err = match attempt_once().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !self.policy.should_retry(attempt, &err) {
                return Err(err);
            }

            let delay = self.policy.delay(attempt);
            tracing::warn!(
                attempt,
                max_attempts = self.policy.max_attempts,
                error_kind = err.kind().as_str(),
                "AI generation attempt failed, retrying in {delay:?}"
            );
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => return Err(UpstreamFailure::Cancelled.into()),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

#[async_trait]
impl<S: GenerationService> GenerationService for RetryingPipeline<S> {
    async fn try_generate_questions(
        &self,
        request: &QuestionRequest,
        cancel_token: &CancellationToken,
    ) -> Result<Vec<Value>, PipelineError> {
        self.with_retry(cancel_token, || {
            self.inner.try_generate_questions(request, cancel_token)
        })
        .await
    }

    async fn try_explain_concept(
        &self,
        request: &ExplanationRequest,
        cancel_token: &CancellationToken,
    ) -> Result<Value, PipelineError> {
        self.with_retry(cancel_token, || {
            self.inner.try_explain_concept(request, cancel_token)
        })
        .await
    }
}
