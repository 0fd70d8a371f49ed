use std::ops::Deref;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use prep_core::RequestBody;
use serde_json::Value;

use crate::error::{AppError, INVALID_REQUEST_FORMAT};

/// Request body parsed as JSON and checked against `T`'s rules.
///
/// Unparsable bodies are rejected as an invalid request format; an empty
/// body is treated as `{}` so that optional-only payloads can be omitted.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Parse a raw body into an untyped JSON value.
pub fn parse_body(bytes: &[u8]) -> Result<Value, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(bytes).map_err(|_| AppError::BadRequest(INVALID_REQUEST_FORMAT.to_string()))
}

impl<T: RequestBody + 'static> FromRequest for ValidatedJson<T> {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let body = web::Bytes::from_request(req, payload);
        Box::pin(async move {
            let bytes = body.await?;
            let value = parse_body(&bytes)?;
            let validated = T::from_body(&value).map_err(AppError::from)?;
            Ok(ValidatedJson(validated))
        })
    }
}

/// Body kept as raw JSON for handlers that check key presence before
/// validating.
#[derive(Debug)]
pub struct JsonBody(pub Value);

impl FromRequest for JsonBody {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let body = web::Bytes::from_request(req, payload);
        Box::pin(async move {
            let bytes = body.await?;
            Ok(JsonBody(parse_body(&bytes)?))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_is_empty_object() {
        assert_eq!(parse_body(b"").unwrap(), json!({}));
        assert_eq!(parse_body(b"  \n").unwrap(), json!({}));
    }

    #[test]
    fn broken_json_is_invalid_format() {
        let err = parse_body(b"{\"role\":").unwrap_err();
        assert_eq!(err.to_string(), "Invalid request format");
    }

    #[test]
    fn arrays_parse_and_are_left_to_validation() {
        assert_eq!(parse_body(b"[1]").unwrap(), json!([1]));
    }
}
