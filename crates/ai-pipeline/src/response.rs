//! Conversion of a pipeline result into what the HTTP layer sends back.

use serde::Serialize;

use crate::error::{ErrorKind, PipelineError};

const PREVIEW_CHARS: usize = 200;

/// Which generation path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Questions,
    Explanation,
}

impl GenerationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Questions => "questions",
            Self::Explanation => "explanation",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Self::Questions => "Questions generated successfully",
            Self::Explanation => "Explanation generated successfully",
        }
    }

    /// Client-facing message for a failure. Never includes model text.
    pub fn failure_message(self, kind: ErrorKind) -> &'static str {
        match kind {
            ErrorKind::EmptyResponse => "Failed to generate response from AI service",
            ErrorKind::MalformedJson => "Invalid response format from AI service",
            ErrorKind::UnexpectedShape => "Invalid data structure from AI service",
            ErrorKind::ModelUnavailable => match self {
                Self::Questions => "Failed to generate questions",
                Self::Explanation => "Failed to generate explanation",
            },
        }
    }
}

/// Outcome of one generation, with exactly one variant populated.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome<T> {
    Success { message: &'static str, data: T },
    Failure { kind: ErrorKind, message: &'static str },
}

impl<T> GenerationOutcome<T> {
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn into_envelope(self) -> ApiEnvelope<T> {
        match self {
            Self::Success { message, data } => ApiEnvelope {
                success: true,
                message,
                data: Some(data),
            },
            Self::Failure { message, .. } => ApiEnvelope {
                success: false,
                message,
                data: None,
            },
        }
    }
}

/// Response body shared by every AI endpoint.
#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Map a pipeline result to an outcome, logging the diagnostic detail of
/// failures.
pub fn map_result<T>(
    kind: GenerationKind,
    result: Result<T, PipelineError>,
) -> GenerationOutcome<T> {
    match result {
        Ok(data) => GenerationOutcome::Success {
            message: kind.success_message(),
            data,
        },
        Err(err) => {
            log_failure(kind, &err);
            GenerationOutcome::Failure {
                kind: err.kind(),
                message: kind.failure_message(err.kind()),
            }
        }
    }
}

fn log_failure(kind: GenerationKind, err: &PipelineError) {
    let preview = err.candidate().map(preview).unwrap_or_default();
    match err.kind() {
        // Usually a prompt/contract drift rather than a flaky call.
        ErrorKind::UnexpectedShape => tracing::warn!(
            generation = kind.as_str(),
            error_kind = err.kind().as_str(),
            stage = ?err.stage(),
            candidate = %preview,
            "AI response failed shape validation: {err}"
        ),
        _ => tracing::error!(
            generation = kind.as_str(),
            error_kind = err.kind().as_str(),
            stage = ?err.stage(),
            candidate = %preview,
            "AI generation failed: {err}"
        ),
    }
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamFailure;
    use serde_json::json;

    #[test]
    fn success_carries_payload_unchanged() {
        let data = vec![json!({"question": "Q1", "answer": "A1"})];
        let outcome = map_result(GenerationKind::Questions, Ok(data.clone()));
        assert_eq!(
            outcome,
            GenerationOutcome::Success {
                message: "Questions generated successfully",
                data
            }
        );
    }

    #[test]
    fn failures_use_opaque_messages() {
        let cases = [
            (
                PipelineError::EmptyResponse,
                "Failed to generate response from AI service",
            ),
            (
                PipelineError::UnexpectedShape {
                    candidate: "{\"secret\":1}".to_string(),
                    detail: "expected array".to_string(),
                },
                "Invalid data structure from AI service",
            ),
            (
                PipelineError::from(UpstreamFailure::Cancelled),
                "Failed to generate questions",
            ),
        ];

        for (err, expected) in cases {
            let kind = err.kind();
            let outcome = map_result::<Vec<serde_json::Value>>(GenerationKind::Questions, Err(err));
            assert_eq!(outcome.error_kind(), Some(kind));
            let body = serde_json::to_value(outcome.into_envelope()).unwrap();
            assert_eq!(body, json!({ "success": false, "message": expected }));
        }
    }

    #[test]
    fn malformed_json_message_hides_candidate() {
        let source = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let outcome = map_result::<serde_json::Value>(
            GenerationKind::Explanation,
            Err(PipelineError::MalformedJson {
                candidate: "nope".to_string(),
                source,
            }),
        );
        let body = serde_json::to_string(&outcome.into_envelope()).unwrap();
        assert!(body.contains("Invalid response format from AI service"));
        assert!(!body.contains("nope"));
    }

    #[test]
    fn unavailable_message_depends_on_path() {
        assert_eq!(
            GenerationKind::Explanation.failure_message(ErrorKind::ModelUnavailable),
            "Failed to generate explanation"
        );
        assert_eq!(
            GenerationKind::Questions.failure_message(ErrorKind::ModelUnavailable),
            "Failed to generate questions"
        );
    }

    #[test]
    fn success_envelope_includes_data() {
        let outcome = map_result(
            GenerationKind::Explanation,
            Ok(json!({"title": "T", "explanation": "E"})),
        );
        let body = serde_json::to_value(outcome.into_envelope()).unwrap();
        assert_eq!(
            body,
            json!({
                "success": true,
                "message": "Explanation generated successfully",
                "data": {"title": "T", "explanation": "E"}
            })
        );
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let text = "é".repeat(300);
        assert_eq!(preview(&text).chars().count(), PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }
}
