//! Structural checks on a normalized candidate.
//!
//! Only structural type and field presence are checked. Values are returned
//! exactly as parsed so the caller sees what the model produced.

use serde::Deserialize;
use serde_json::Value;

use crate::error::PipelineError;

pub const QUESTION_FIELD: &str = "question";
pub const ANSWER_FIELD: &str = "answer";
pub const TITLE_FIELD: &str = "title";
pub const EXPLANATION_FIELD: &str = "explanation";

/// How deeply a generated question list is inspected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionShapePolicy {
    /// The top-level value must be an array; elements are not inspected.
    #[default]
    Shallow,
    /// Every element must also be an object with non-empty string
    /// `question` and `answer` fields.
    Strict,
}

impl QuestionShapePolicy {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            Self::Strict
        } else {
            Self::Shallow
        }
    }
}

/// Parse `candidate` as JSON, keeping the text for diagnostics on failure.
pub fn parse_candidate(candidate: &str) -> Result<Value, PipelineError> {
    serde_json::from_str(candidate).map_err(|source| PipelineError::MalformedJson {
        candidate: candidate.to_string(),
        source,
    })
}

/// Validate a question/answer list.
pub fn validate_questions(
    candidate: &str,
    policy: QuestionShapePolicy,
) -> Result<Vec<Value>, PipelineError> {
    let items = match parse_candidate(candidate)? {
        Value::Array(items) => items,
        other => {
            return Err(shape_error(
                candidate,
                format!("expected array, got {}", json_type(&other)),
            ))
        }
    };

    if policy == QuestionShapePolicy::Strict {
        for (index, item) in items.iter().enumerate() {
            let Value::Object(fields) = item else {
                return Err(shape_error(
                    candidate,
                    format!("item {index} is {}, expected object", json_type(item)),
                ));
            };
            for field in [QUESTION_FIELD, ANSWER_FIELD] {
                if !is_non_empty_string(fields.get(field)) {
                    return Err(shape_error(
                        candidate,
                        format!("item {index} has no non-empty string \"{field}\""),
                    ));
                }
            }
        }
    }

    Ok(items)
}

/// Validate a single explanation object.
pub fn validate_explanation(candidate: &str) -> Result<Value, PipelineError> {
    let value = parse_candidate(candidate)?;
    let Value::Object(fields) = &value else {
        return Err(shape_error(
            candidate,
            format!("expected object, got {}", json_type(&value)),
        ));
    };

    for field in [TITLE_FIELD, EXPLANATION_FIELD] {
        if !is_non_empty_string(fields.get(field)) {
            return Err(shape_error(
                candidate,
                format!("missing or empty string \"{field}\""),
            ));
        }
    }

    Ok(value)
}

fn is_non_empty_string(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.trim().is_empty())
}

fn shape_error(candidate: &str, detail: String) -> PipelineError {
    PipelineError::UnexpectedShape {
        candidate: candidate.to_string(),
        detail,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
