use actix_web::{web, HttpResponse};
use prep_core::CreateSessionRequest;
use tracing::info;

use super::parse_id;
use crate::auth::AuthenticatedUser;
use crate::dto::{MessageResponse, SessionListResponse, SessionResponse};
use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::server::AppState;
use crate::storage::QuestionOrder;

const SESSION_NOT_FOUND: &str = "Session not found";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/sessions")
            .route("/create", web::post().to(create_session))
            .route("/my-sessions", web::get().to(my_sessions))
            .route("/{id}", web::get().to(get_session))
            .route("/{id}", web::delete().to(delete_session)),
    );
}

/// POST /api/sessions/create
async fn create_session(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: ValidatedJson<CreateSessionRequest>,
) -> Result<HttpResponse> {
    let session = state
        .store
        .create_session(user.user().id, body.into_inner())
        .await?;
    info!(
        session_id = %session.id,
        questions = session.questions.len(),
        "Created session"
    );

    Ok(HttpResponse::Created().json(SessionResponse {
        success: true,
        message: "Session created successfully",
        session,
    }))
}

/// GET /api/sessions/my-sessions
async fn my_sessions(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let sessions = state.store.sessions_for_user(user.user().id).await?;
    Ok(HttpResponse::Ok().json(SessionListResponse {
        success: true,
        message: "Sessions retrieved successfully",
        sessions,
    }))
}

/// GET /api/sessions/{id}
async fn get_session(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_id(&path, SESSION_NOT_FOUND)?;
    let session = state
        .store
        .find_session(id, QuestionOrder::PinnedThenNewest)
        .await?
        .ok_or(AppError::NotFound(SESSION_NOT_FOUND))?;

    if session.user != user.user().id {
        return Err(AppError::Forbidden("Not authorized to view this session"));
    }

    Ok(HttpResponse::Ok().json(SessionResponse {
        success: true,
        message: "Session retrieved successfully",
        session,
    }))
}

/// DELETE /api/sessions/{id}
async fn delete_session(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_id(&path, SESSION_NOT_FOUND)?;
    let session = state
        .store
        .find_session(id, QuestionOrder::Inserted)
        .await?
        .ok_or(AppError::NotFound(SESSION_NOT_FOUND))?;

    if session.user != user.user().id {
        return Err(AppError::Forbidden("Not authorized to delete this session"));
    }

    if !state.store.delete_session(id).await? {
        return Err(AppError::NotFound(SESSION_NOT_FOUND));
    }
    info!(session_id = %id, "Deleted session");
    Ok(HttpResponse::Ok().json(MessageResponse::ok("Session deleted successfully")))
}
