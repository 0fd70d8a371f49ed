use actix_web::{web, HttpResponse};
use prep_core::{LoginRequest, RegisterRequest};
use tracing::info;

use crate::auth::{hash_password, verify_password, AuthenticatedUser};
use crate::dto::{AuthData, DataResponse};
use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::RateLimiters;
use crate::server::AppState;
use crate::storage::{NewUser, StoreError};

const USER_EXISTS: &str = "User already exists";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub fn config(cfg: &mut web::ServiceConfig, limits: &RateLimiters) {
    cfg.service(
        web::resource("/api/auth/register")
            .wrap(limits.auth.clone())
            .route(web::post().to(register)),
    )
    .service(
        web::resource("/api/auth/login")
            .wrap(limits.auth.clone())
            .route(web::post().to(login)),
    )
    .service(web::resource("/api/auth/profile").route(web::get().to(profile)));
}

/// POST /api/auth/register
async fn register(
    state: web::Data<AppState>,
    body: ValidatedJson<RegisterRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    if state.store.find_user_by_email(&request.email).await?.is_some() {
        return Err(AppError::BadRequest(USER_EXISTS.to_string()));
    }

    let password_hash = hash_password(request.password, state.bcrypt_cost).await?;
    let created = state
        .store
        .create_user(NewUser {
            name: request.name,
            email: request.email,
            password_hash,
            profile_image_url: request.profile_image_url,
        })
        .await;
    let user = match created {
        Ok(user) => user,
        // lost a race with a concurrent registration
        Err(StoreError::DuplicateEmail) => {
            return Err(AppError::BadRequest(USER_EXISTS.to_string()))
        }
        Err(err) => return Err(err.into()),
    };

    let token = state.tokens.issue(user.id)?;
    info!(user_id = %user.id, "Registered user");
    Ok(HttpResponse::Created().json(DataResponse::ok(
        "User registered successfully",
        AuthData::new(&user, token),
    )))
}

/// POST /api/auth/login
async fn login(
    state: web::Data<AppState>,
    body: ValidatedJson<LoginRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    let user = state
        .store
        .find_user_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(request.password, user.password_hash.clone()).await? {
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.tokens.issue(user.id)?;
    Ok(HttpResponse::Ok().json(DataResponse::ok(
        "Login successful",
        AuthData::new(&user, token),
    )))
}

/// GET /api/auth/profile
async fn profile(user: AuthenticatedUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(DataResponse::ok(
        "Profile retrieved successfully",
        user.user().profile(),
    )))
}
