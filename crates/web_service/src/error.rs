use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use ai_pipeline::ErrorKind;
use prep_core::ValidationError;
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::services::uploads::UploadError;
use crate::storage::StoreError;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

pub const INVALID_REQUEST_FORMAT: &str = "Invalid request format";
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("rate limit exceeded")]
    RateLimited { retry_after_minutes: u64 },

    #[error("{message} ({kind:?})")]
    Generation {
        kind: ErrorKind,
        message: &'static str,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::NotAnObject => Self::BadRequest(INVALID_REQUEST_FORMAT.to_string()),
            ValidationError::Fields(messages) => Self::Validation(messages),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidToken => Self::Unauthorized("Invalid token"),
            AuthError::TokenExpired => Self::Unauthorized("Token expired"),
            other => Self::InternalError(other.into()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::Io(io) => Self::InternalError(io.into()),
            rejected => Self::BadRequest(rejected.to_string()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonError<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    r#type: Option<&'static str>,
}

impl JsonError<'_> {
    fn message(message: &str) -> JsonError<'_> {
        JsonError {
            success: false,
            message,
            errors: None,
            retry_after: None,
            r#type: None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Generation { .. }
            | AppError::Storage(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::BadRequest(message) => JsonError::message(message),
            AppError::Validation(errors) => JsonError {
                errors: Some(errors.as_slice()),
                ..JsonError::message("Validation error")
            },
            AppError::Unauthorized(message)
            | AppError::Forbidden(message)
            | AppError::NotFound(message) => JsonError::message(message),
            AppError::RateLimited {
                retry_after_minutes,
            } => JsonError {
                retry_after: Some(*retry_after_minutes),
                r#type: Some("RATE_LIMIT_EXCEEDED"),
                ..JsonError::message(RATE_LIMIT_MESSAGE)
            },
            // already logged with full detail by the pipeline
            AppError::Generation { message, .. } => JsonError::message(message),
            AppError::Storage(_) | AppError::InternalError(_) => {
                tracing::error!("Request failed: {}", self);
                JsonError::message("Server error")
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::{json, Value};

    async fn body_of(error: AppError) -> (StatusCode, Value) {
        let response = error.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn validation_errors_list_every_message() {
        let (status, body) = body_of(AppError::from(ValidationError::Fields(vec![
            "\"role\" is required".to_string(),
            "\"experience\" is required".to_string(),
        ])))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "Validation error",
                "errors": ["\"role\" is required", "\"experience\" is required"]
            })
        );
    }

    #[actix_web::test]
    async fn non_object_body_is_invalid_format() {
        let (status, body) = body_of(ValidationError::NotAnObject.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request format");
    }

    #[actix_web::test]
    async fn rate_limit_body_reports_window() {
        let (status, body) = body_of(AppError::RateLimited {
            retry_after_minutes: 15,
        })
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "Too many requests, please try again later.",
                "retryAfter": 15,
                "type": "RATE_LIMIT_EXCEEDED"
            })
        );
    }

    #[actix_web::test]
    async fn internal_detail_is_not_exposed() {
        let (status, body) =
            body_of(AppError::InternalError(anyhow::anyhow!("disk on fire"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "success": false, "message": "Server error" }));
    }

    #[actix_web::test]
    async fn generation_failure_is_opaque_500() {
        let (status, body) = body_of(AppError::Generation {
            kind: ErrorKind::MalformedJson,
            message: "Invalid response format from AI service",
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "success": false, "message": "Invalid response format from AI service" })
        );
    }

    #[test]
    fn auth_errors_map_to_401_messages() {
        assert_eq!(
            AppError::from(AuthError::TokenExpired).to_string(),
            "Token expired"
        );
        assert_eq!(
            AppError::from(AuthError::InvalidToken).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
