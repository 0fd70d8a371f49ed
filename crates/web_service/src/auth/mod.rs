//! Account credentials and bearer-token authentication.

mod extractor;
pub mod jwt;
pub mod password;

use thiserror::Error;

pub use extractor::AuthenticatedUser;
pub use jwt::{Claims, TokenIssuer};
pub use password::{hash_password, verify_password};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password task join error: {0}")]
    Task(String),
}
