//! AI content ingestion: prompt construction, model invocation, recovery of
//! JSON from untrusted model text, structural validation and the mapping of
//! every outcome into a client-safe result.
//!
//! Each call flows one way through
//! `prompt -> invoker -> normalize -> validate -> response` and holds no state
//! between calls. Retrying is opt-in via [`RetryingPipeline`].

pub mod error;
pub mod invoker;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod response;
pub mod retry;
pub mod validate;

pub use error::{ErrorKind, PipelineError, Stage, UpstreamFailure};
pub use invoker::ModelInvoker;
pub use normalize::normalize;
pub use pipeline::{GenerationService, ModelSelection, Pipeline, PipelineConfig, DEFAULT_TIMEOUT};
pub use prompt::{concept_explain_prompt, question_answer_prompt};
pub use response::{map_result, ApiEnvelope, GenerationKind, GenerationOutcome};
pub use retry::{RetryPolicy, RetryingPipeline};
pub use validate::{
    parse_candidate, validate_explanation, validate_questions, QuestionShapePolicy,
};
