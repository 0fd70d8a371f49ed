//! Persistence for users, sessions and questions.

mod sqlite;

use async_trait::async_trait;
use prep_core::{CreateSessionRequest, QAItem, Question, Session, User};
use thiserror::Error;
use uuid::Uuid;

pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("time parse error: {0}")]
    Chrono(#[from] chrono::ParseError),

    #[error("id parse error: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage task join error: {0}")]
    Task(String),

    #[error("email is already registered")]
    DuplicateEmail,
}

/// Fields needed to create an account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image_url: Option<String>,
}

/// Order in which a session's questions are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionOrder {
    Inserted,
    /// Pinned questions first, then newest first.
    PinnedThenNewest,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn init(&self) -> StoreResult<()>;

    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Creates the session and all of its questions in one transaction.
    async fn create_session(
        &self,
        owner: Uuid,
        request: CreateSessionRequest,
    ) -> StoreResult<Session>;
    /// Newest first, questions in insertion order.
    async fn sessions_for_user(&self, owner: Uuid) -> StoreResult<Vec<Session>>;
    async fn find_session(&self, id: Uuid, order: QuestionOrder) -> StoreResult<Option<Session>>;
    /// Returns false when no session had that id. Questions go with it.
    async fn delete_session(&self, id: Uuid) -> StoreResult<bool>;

    async fn add_questions(&self, session: Uuid, items: Vec<QAItem>) -> StoreResult<Vec<Question>>;
    async fn find_question(&self, id: Uuid) -> StoreResult<Option<Question>>;
    /// Flips `is_pinned` and returns the updated question.
    async fn toggle_pin(&self, id: Uuid) -> StoreResult<Option<Question>>;
    async fn update_note(&self, id: Uuid, note: String) -> StoreResult<Option<Question>>;
}
