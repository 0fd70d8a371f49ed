use actix_web::{web, HttpResponse};
use ai_pipeline::GenerationOutcome;
use prep_core::{ExplanationRequest, QuestionRequest};
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::RateLimiters;
use crate::server::AppState;

pub fn config(cfg: &mut web::ServiceConfig, limits: &RateLimiters) {
    cfg.service(
        web::scope("/api/ai")
            .wrap(limits.ai.clone())
            .route("/generate-questions", web::post().to(generate_questions))
            .route("/generate-explanations", web::post().to(generate_explanation)),
    );
}

fn respond<T: Serialize>(outcome: GenerationOutcome<T>) -> Result<HttpResponse> {
    match outcome {
        GenerationOutcome::Failure { kind, message } => Err(AppError::Generation { kind, message }),
        success => Ok(HttpResponse::Ok().json(success.into_envelope())),
    }
}

/// POST /api/ai/generate-questions
async fn generate_questions(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: ValidatedJson<QuestionRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    info!(
        user_id = %user.user().id,
        requested = request.number_of_questions,
        "Generating interview questions"
    );

    let cancel_token = state.shutdown.child_token();
    let outcome = state
        .generator
        .generate_questions(&request, &cancel_token)
        .await;

    if let GenerationOutcome::Success { data, .. } = &outcome {
        if data.is_empty() {
            warn!("Model returned an empty question list");
        }
    }
    respond(outcome)
}

/// POST /api/ai/generate-explanations
async fn generate_explanation(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: ValidatedJson<ExplanationRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    info!(user_id = %user.user().id, "Generating concept explanation");

    let cancel_token = state.shutdown.child_token();
    let outcome = state
        .generator
        .explain_concept(&request, &cancel_token)
        .await;
    respond(outcome)
}
