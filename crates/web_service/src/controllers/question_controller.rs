use actix_web::{web, HttpResponse};
use prep_core::{AddQuestionsRequest, RequestBody, UpdateNoteRequest};
use uuid::Uuid;

use super::parse_id;
use crate::auth::AuthenticatedUser;
use crate::dto::{QuestionListResponse, QuestionResponse};
use crate::error::{AppError, Result};
use crate::extract::{JsonBody, ValidatedJson};
use crate::server::AppState;
use crate::storage::QuestionOrder;

const QUESTION_NOT_FOUND: &str = "Question not found";
const SESSION_NOT_FOUND: &str = "Session not found";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/questions")
            .route("/add", web::post().to(add_questions))
            .route("/{id}/pin", web::post().to(toggle_pin))
            .route("/{id}/note", web::post().to(update_note)),
    );
}

/// Resolve a question id the caller is allowed to modify.
async fn owned_question(state: &AppState, raw_id: &str, caller: Uuid) -> Result<Uuid> {
    let id = parse_id(raw_id, QUESTION_NOT_FOUND)?;
    let question = state
        .store
        .find_question(id)
        .await?
        .ok_or(AppError::NotFound(QUESTION_NOT_FOUND))?;
    let session = state
        .store
        .find_session(question.session, QuestionOrder::Inserted)
        .await?
        .ok_or(AppError::NotFound(QUESTION_NOT_FOUND))?;

    if session.user != caller {
        return Err(AppError::Forbidden("Not authorized to modify this question"));
    }
    Ok(id)
}

/// POST /api/questions/add
async fn add_questions(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: JsonBody,
) -> Result<HttpResponse> {
    if !AddQuestionsRequest::has_required_keys(&body.0) {
        return Err(AppError::BadRequest(
            "Session ID and questions are required".to_string(),
        ));
    }
    let request = AddQuestionsRequest::from_body(&body.0)?;

    let session_id = parse_id(&request.session_id, SESSION_NOT_FOUND)?;
    let session = state
        .store
        .find_session(session_id, QuestionOrder::Inserted)
        .await?
        .ok_or(AppError::NotFound(SESSION_NOT_FOUND))?;
    if session.user != user.user().id {
        return Err(AppError::Forbidden("Not authorized to modify this session"));
    }

    let questions = state
        .store
        .add_questions(session_id, request.questions)
        .await?;
    tracing::info!(session_id = %session_id, added = questions.len(), "Added questions");

    Ok(HttpResponse::Created().json(QuestionListResponse {
        success: true,
        message: "Questions added successfully",
        questions,
    }))
}

/// POST /api/questions/{id}/pin
async fn toggle_pin(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = owned_question(&state, &path, user.user().id).await?;
    let question = state
        .store
        .toggle_pin(id)
        .await?
        .ok_or(AppError::NotFound(QUESTION_NOT_FOUND))?;

    let message = if question.is_pinned {
        "Question pinned successfully"
    } else {
        "Question unpinned successfully"
    };
    Ok(HttpResponse::Ok().json(QuestionResponse {
        success: true,
        message,
        question,
    }))
}

/// POST /api/questions/{id}/note
async fn update_note(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: ValidatedJson<UpdateNoteRequest>,
) -> Result<HttpResponse> {
    let id = owned_question(&state, &path, user.user().id).await?;
    let question = state
        .store
        .update_note(id, body.into_inner().note)
        .await?
        .ok_or(AppError::NotFound(QUESTION_NOT_FOUND))?;

    Ok(HttpResponse::Ok().json(QuestionResponse {
        success: true,
        message: "Note updated successfully",
        question,
    }))
}
