pub mod models;
pub mod requests;
pub mod validation;

pub use models::{ExplanationItem, QAItem, Question, Session, User, UserProfile};
pub use requests::{
    AddQuestionsRequest, CreateSessionRequest, ExplanationRequest, LoginRequest, QuestionRequest,
    RegisterRequest, UpdateNoteRequest, MAX_QUESTIONS_PER_REQUEST,
};
pub use validation::{RequestBody, ValidationError};
