use std::time::Duration;

use prep_llm::LLMError;
use serde::Serialize;
use thiserror::Error;

/// Category of a failed generation, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    ModelUnavailable,
    EmptyResponse,
    #[serde(rename = "MalformedJSON")]
    MalformedJson,
    UnexpectedShape,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ModelUnavailable => "ModelUnavailable",
            Self::EmptyResponse => "EmptyResponse",
            Self::MalformedJson => "MalformedJSON",
            Self::UnexpectedShape => "UnexpectedShape",
        }
    }

    /// Whether a fresh attempt can reasonably produce a different result.
    /// A shape mismatch points at the prompt contract rather than at chance.
    pub fn is_transient(self) -> bool {
        !matches!(self, Self::UnexpectedShape)
    }
}

/// Position of one invocation in its linear lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Prompting,
    Invoking,
    Normalizing,
    Validating,
    Succeeded,
    Failed,
}

/// Why the upstream call produced nothing usable.
#[derive(Debug, Error)]
pub enum UpstreamFailure {
    #[error(transparent)]
    Model(#[from] LLMError),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("model call cancelled by caller")]
    Cancelled,
}

/// Internal failure of a pipeline run.
///
/// `Display` output is diagnostic and may quote model text; it belongs in
/// logs only. Client-facing wording comes from the response mapper.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(#[from] UpstreamFailure),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("model output is not valid JSON: {source}")]
    MalformedJson {
        candidate: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model output has unexpected shape: {detail}")]
    UnexpectedShape { candidate: String, detail: String },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            Self::EmptyResponse => ErrorKind::EmptyResponse,
            Self::MalformedJson { .. } => ErrorKind::MalformedJson,
            Self::UnexpectedShape { .. } => ErrorKind::UnexpectedShape,
        }
    }

    /// Stage that was active when the run failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::ModelUnavailable(_) | Self::EmptyResponse => Stage::Invoking,
            Self::MalformedJson { .. } | Self::UnexpectedShape { .. } => Stage::Validating,
        }
    }

    /// The normalized text that failed validation, if any.
    pub fn candidate(&self) -> Option<&str> {
        match self {
            Self::MalformedJson { candidate, .. } | Self::UnexpectedShape { candidate, .. } => {
                Some(candidate)
            }
            _ => None,
        }
    }

    pub fn was_cancelled(&self) -> bool {
        matches!(self, Self::ModelUnavailable(UpstreamFailure::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_with_public_names() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::MalformedJson).unwrap(),
            "\"MalformedJSON\""
        );
        assert_eq!(ErrorKind::MalformedJson.as_str(), "MalformedJSON");
        assert_eq!(
            serde_json::to_string(&ErrorKind::UnexpectedShape).unwrap(),
            "\"UnexpectedShape\""
        );
    }

    #[test]
    fn only_shape_mismatch_is_not_transient() {
        assert!(ErrorKind::ModelUnavailable.is_transient());
        assert!(ErrorKind::EmptyResponse.is_transient());
        assert!(ErrorKind::MalformedJson.is_transient());
        assert!(!ErrorKind::UnexpectedShape.is_transient());
    }

    #[test]
    fn invocation_failures_carry_no_candidate() {
        let err = PipelineError::from(UpstreamFailure::Timeout(Duration::from_secs(1)));
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
        assert_eq!(err.stage(), Stage::Invoking);
        assert!(err.candidate().is_none());
        assert!(!err.was_cancelled());

        let cancelled = PipelineError::from(UpstreamFailure::Cancelled);
        assert!(cancelled.was_cancelled());
    }

    #[test]
    fn shape_failures_keep_candidate_for_diagnostics() {
        let err = PipelineError::UnexpectedShape {
            candidate: "{}".to_string(),
            detail: "expected array".to_string(),
        };
        assert_eq!(err.stage(), Stage::Validating);
        assert_eq!(err.candidate(), Some("{}"));
    }
}
