//! Bridge between untyped JSON bodies and `validator` rules.
//!
//! Bodies are cleaned before they are deserialized: strings are trimmed,
//! `null` counts as absent and numeric strings become numbers for fields that
//! ask for it. Every rule runs, and each violation becomes one message.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("validation failed: {}", .0.join("; "))]
    Fields(Vec<String>),
}

impl ValidationError {
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::NotAnObject => vec!["request body must be a JSON object".to_string()],
            Self::Fields(messages) => messages.clone(),
        }
    }
}

/// A request type built from an untyped JSON body.
pub trait RequestBody: DeserializeOwned + Validate {
    /// Top-level fields checked exactly as sent.
    const UNTRIMMED: &'static [&'static str] = &[];
    /// Top-level fields that accept a numeric string.
    const NUMERIC: &'static [&'static str] = &[];

    fn from_body(body: &Value) -> Result<Self, ValidationError> {
        let Value::Object(object) = body else {
            return Err(ValidationError::NotAnObject);
        };
        let cleaned = Value::Object(clean_object(object, Self::UNTRIMMED, Self::NUMERIC));

        let request = Self::deserialize(&cleaned)
            .map_err(|error| ValidationError::Fields(vec![error.to_string()]))?;
        match request.validate() {
            Ok(()) => Ok(request),
            Err(errors) => Err(ValidationError::Fields(messages(&errors, &cleaned))),
        }
    }
}

fn clean_object(
    object: &Map<String, Value>,
    untrimmed: &[&str],
    numeric: &[&str],
) -> Map<String, Value> {
    object
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let value = match value {
                Value::String(_) if untrimmed.contains(&key.as_str()) => value.clone(),
                Value::String(raw) if numeric.contains(&key.as_str()) => number_from(raw),
                other => clean(other),
            };
            (key.clone(), value)
        })
        .collect()
}

fn clean(value: &Value) -> Value {
    match value {
        Value::String(raw) => Value::String(raw.trim().to_string()),
        Value::Array(items) => Value::Array(items.iter().map(clean).collect()),
        Value::Object(object) => Value::Object(clean_object(object, &[], &[])),
        other => other.clone(),
    }
}

fn number_from(raw: &str) -> Value {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(number) => Value::from(number),
        Err(_) => Value::String(trimmed.to_string()),
    }
}

/// Flattens rule violations into messages, ordered by field path.
fn messages(errors: &ValidationErrors, body: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect(errors, None, Some(body), &mut found);
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found.into_iter().map(|(_, message)| message).collect()
}

fn collect(
    errors: &ValidationErrors,
    prefix: Option<&str>,
    body: Option<&Value>,
    found: &mut Vec<(String, String)>,
) {
    let join = |field: &str| match prefix {
        Some(prefix) => format!("{prefix}.{field}"),
        None => field.to_string(),
    };

    for (field, kind) in errors.errors() {
        let field: &str = field.as_ref();
        let value = body.and_then(|body| body.get(field));
        match kind {
            ValidationErrorsKind::Field(violations) => {
                for violation in violations {
                    // Struct-level rules name the field they cover.
                    let (path, value) = match violation.params.get("field").and_then(Value::as_str) {
                        Some(named) => (join(named), body.and_then(|body| body.get(named))),
                        None => (join(field), value),
                    };
                    let message = describe(&path, violation, value);
                    found.push((path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, Some(&join(field)), value, found),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    let path = format!("{}[{index}]", join(field));
                    collect(inner, Some(&path), value.and_then(|list| list.get(*index)), found);
                }
            }
        }
    }
}

fn bound(violation: &validator::ValidationError, name: &str) -> Option<i64> {
    violation
        .params
        .get(name)
        .and_then(Value::as_f64)
        .map(|number| number as i64)
}

fn describe(path: &str, violation: &validator::ValidationError, value: Option<&Value>) -> String {
    if let Some(message) = &violation.message {
        return message.to_string();
    }

    let label = format!("\"{path}\"");
    let min = bound(violation, "min");
    let max = bound(violation, "max");
    match (&*violation.code, value) {
        (_, None) => format!("{label} is required"),
        (_, Some(Value::String(text))) if text.is_empty() => {
            format!("{label} is not allowed to be empty")
        }
        ("length", Some(Value::Array(items))) => match min {
            Some(min) if (items.len() as i64) < min => {
                format!("{label} must contain at least {min} items")
            }
            _ => format!(
                "{label} must contain less than or equal to {} items",
                max.unwrap_or_default()
            ),
        },
        ("length", Some(Value::String(text))) => match min {
            Some(min) if (text.chars().count() as i64) < min => {
                format!("{label} length must be at least {min} characters long")
            }
            _ => format!(
                "{label} length must be less than or equal to {} characters long",
                max.unwrap_or_default()
            ),
        },
        ("range", Some(number)) => match (min, number.as_f64()) {
            (Some(min), Some(actual)) if actual < min as f64 => {
                format!("{label} must be greater than or equal to {min}")
            }
            _ => format!(
                "{label} must be less than or equal to {}",
                max.unwrap_or_default()
            ),
        },
        ("email", _) => format!("{label} must be a valid email"),
        ("url", _) => format!("{label} must be a valid uri"),
        (code, _) => format!("{label} failed the {code} rule"),
    }
}
