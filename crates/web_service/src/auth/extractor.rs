use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use prep_core::User;

use crate::error::AppError;
use crate::server::AppState;

/// The account behind a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn user(&self) -> &User {
        &self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let token = token.ok_or(AppError::Unauthorized("Not authorized, no token"))?;
            let state = state.ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!("application state is not registered"))
            })?;

            let user_id = state.tokens.verify(&token).map_err(AppError::from)?;
            let user = state
                .store
                .find_user(user_id)
                .await
                .map_err(AppError::from)?
                .ok_or(AppError::Unauthorized("User not found"))?;

            Ok(AuthenticatedUser(user))
        })
    }
}
