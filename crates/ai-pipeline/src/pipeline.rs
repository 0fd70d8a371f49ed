use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prep_core::{ExplanationRequest, QuestionRequest};
use prep_llm::{GenerativeModel, ModelId, DEFAULT_EXPLANATION_MODEL, DEFAULT_QUESTION_MODEL};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::{PipelineError, Stage};
use crate::invoker::ModelInvoker;
use crate::normalize::normalize;
use crate::prompt::{concept_explain_prompt, question_answer_prompt};
use crate::response::{map_result, GenerationKind, GenerationOutcome};
use crate::validate::{validate_explanation, validate_questions, QuestionShapePolicy};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Which model serves each generation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub questions: ModelId,
    pub explanation: ModelId,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            questions: ModelId::new(DEFAULT_QUESTION_MODEL),
            explanation: ModelId::new(DEFAULT_EXPLANATION_MODEL),
        }
    }
}

impl ModelSelection {
    pub fn for_kind(&self, kind: GenerationKind) -> &ModelId {
        match kind {
            GenerationKind::Questions => &self.questions,
            GenerationKind::Explanation => &self.explanation,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub models: ModelSelection,
    /// `None` waits for the model indefinitely.
    pub timeout: Option<Duration>,
    pub question_policy: QuestionShapePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            models: ModelSelection::default(),
            timeout: Some(DEFAULT_TIMEOUT),
            question_policy: QuestionShapePolicy::default(),
        }
    }
}

/// Something that can turn generation requests into validated payloads.
///
/// Implementors provide the fallible `try_*` methods; the outcome methods map
/// their result into the client-facing form and log failures.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn try_generate_questions(
        &self,
        request: &QuestionRequest,
        cancel_token: &CancellationToken,
    ) -> Result<Vec<Value>, PipelineError>;

    async fn try_explain_concept(
        &self,
        request: &ExplanationRequest,
        cancel_token: &CancellationToken,
    ) -> Result<Value, PipelineError>;

    async fn generate_questions(
        &self,
        request: &QuestionRequest,
        cancel_token: &CancellationToken,
    ) -> GenerationOutcome<Vec<Value>> {
        let result = self.try_generate_questions(request, cancel_token).await;
        map_result(GenerationKind::Questions, result)
    }

    async fn explain_concept(
        &self,
        request: &ExplanationRequest,
        cancel_token: &CancellationToken,
    ) -> GenerationOutcome<Value> {
        let result = self.try_explain_concept(request, cancel_token).await;
        map_result(GenerationKind::Explanation, result)
    }
}

/// Prompt, invoke, normalize and validate, once per call.
#[derive(Clone)]
pub struct Pipeline {
    invoker: ModelInvoker,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(model: Arc<dyn GenerativeModel>, config: PipelineConfig) -> Self {
        Self {
            invoker: ModelInvoker::new(model, config.timeout),
            config,
        }
    }

    async fn run<T, B, V>(
        &self,
        kind: GenerationKind,
        cancel_token: &CancellationToken,
        build_prompt: B,
        validate: V,
    ) -> Result<T, PipelineError>
    where
        B: FnOnce() -> String,
        V: FnOnce(&str) -> Result<T, PipelineError>,
    {
        let model = self.config.models.for_kind(kind);
        let span = tracing::info_span!("ai_generation", generation = kind.as_str(), model = %model);

        async move {
            enter(Stage::Prompting);
            let prompt = build_prompt();

            enter(Stage::Invoking);
            let raw = self
                .invoker
                .invoke(model, &prompt, cancel_token)
                .await
                .inspect_err(|_| enter(Stage::Failed))?;

            enter(Stage::Normalizing);
            let candidate = normalize(&raw);

            enter(Stage::Validating);
            let payload = validate(candidate).inspect_err(|_| enter(Stage::Failed))?;

            enter(Stage::Succeeded);
            Ok(payload)
        }
        .instrument(span)
        .await
    }
}

fn enter(stage: Stage) {
    tracing::debug!(stage = ?stage, "pipeline stage");
}

#[async_trait]
impl GenerationService for Pipeline {
    async fn try_generate_questions(
        &self,
        request: &QuestionRequest,
        cancel_token: &CancellationToken,
    ) -> Result<Vec<Value>, PipelineError> {
        let policy = self.config.question_policy;
        self.run(
            GenerationKind::Questions,
            cancel_token,
            || question_answer_prompt(request),
            |candidate| validate_questions(candidate, policy),
        )
        .await
    }

    async fn try_explain_concept(
        &self,
        request: &ExplanationRequest,
        cancel_token: &CancellationToken,
    ) -> Result<Value, PipelineError> {
        self.run(
            GenerationKind::Explanation,
            cancel_token,
            || concept_explain_prompt(request),
            validate_explanation,
        )
        .await
    }
}
