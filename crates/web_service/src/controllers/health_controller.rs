use actix_web::{web, HttpResponse};
use chrono::{SecondsFormat, Utc};

use super::ROUTE_NOT_FOUND;
use crate::dto::HealthResponse;
use crate::error::{AppError, Result};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        success: true,
        message: "Server is running",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Fallback for every unmatched route.
pub async fn route_not_found() -> Result<HttpResponse> {
    Err(AppError::NotFound(ROUTE_NOT_FOUND))
}
