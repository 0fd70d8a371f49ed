pub mod ai_controller;
pub mod auth_controller;
pub mod health_controller;
pub mod question_controller;
pub mod session_controller;
pub mod upload_controller;

use uuid::Uuid;

use crate::error::AppError;

pub const ROUTE_NOT_FOUND: &str = "Route not found";

/// Ids that do not parse cannot name a stored record, so they are reported
/// the same way as unknown ones.
pub(crate) fn parse_id(raw: &str, not_found: &'static str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(not_found))
}
