//! Typed request bodies and the rules that produce them.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::models::QAItem;
use crate::validation::RequestBody;

/// Upper bound on questions generated by one AI request.
pub const MAX_QUESTIONS_PER_REQUEST: u8 = 20;

const MAX_QUESTIONS_PER_SESSION: usize = 50;

const PASSWORD_SPECIALS: &str = "!@#$%^&*";

const WEAK_PASSWORD: &str = "Password must contain at least one lowercase letter, one uppercase letter, one number and one special character";

fn strong_password(password: &str) -> Result<(), ValidationError> {
    // Short passwords are left to the length rule.
    if password.chars().count() < 8
        || (password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_uppercase())
            && password.chars().any(|c| c.is_ascii_digit())
            && password.chars().any(|c| PASSWORD_SPECIALS.contains(c)))
    {
        return Ok(());
    }
    let mut error = ValidationError::new("password_strength");
    error.message = Some(Cow::Borrowed(WEAK_PASSWORD));
    Err(error)
}

/// Item count for a question list. Kept at struct level since `nested`
/// owns the field's own error slot.
fn question_count(questions: &[QAItem]) -> Result<(), ValidationError> {
    if (1..=MAX_QUESTIONS_PER_SESSION).contains(&questions.len()) {
        return Ok(());
    }
    let mut error = ValidationError::new("length");
    error.add_param(Cow::Borrowed("field"), &"questions");
    error.add_param(Cow::Borrowed("min"), &1);
    error.add_param(Cow::Borrowed("max"), &MAX_QUESTIONS_PER_SESSION);
    Err(error)
}

fn lowercase<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|text| text.to_lowercase())
}

fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(deserializer).map(|text| text.filter(|text| !text.is_empty()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 50))]
    pub name: String,
    #[serde(deserialize_with = "lowercase")]
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8), custom(function = "strong_password"))]
    pub password: String,
    #[serde(deserialize_with = "blank_as_none")]
    #[validate(url)]
    pub profile_image_url: Option<String>,
}

impl RequestBody for RegisterRequest {
    const UNTRIMMED: &'static [&'static str] = &["password"];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[serde(deserialize_with = "lowercase")]
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

impl RequestBody for LoginRequest {
    const UNTRIMMED: &'static [&'static str] = &["password"];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
#[validate(schema(function = "session_question_count", skip_on_field_errors = false))]
pub struct CreateSessionRequest {
    #[validate(length(min = 2, max = 100))]
    pub role: String,
    #[validate(length(min = 1, max = 50))]
    pub experience: String,
    #[validate(length(min = 2, max = 200))]
    pub topic_to_focus: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(nested)]
    pub questions: Vec<QAItem>,
}

fn session_question_count(request: &CreateSessionRequest) -> Result<(), ValidationError> {
    question_count(&request.questions)
}

impl RequestBody for CreateSessionRequest {}

/// Parameters for generating a batch of interview questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionRequest {
    #[validate(length(min = 2, max = 100))]
    pub role: String,
    #[validate(length(min = 1, max = 50))]
    pub experience: String,
    #[validate(length(min = 2, max = 200))]
    pub topic_to_focus: String,
    #[validate(range(min = 1, max = 20))]
    pub number_of_questions: u8,
}

impl RequestBody for QuestionRequest {
    const NUMERIC: &'static [&'static str] = &["numberOfQuestions"];
}

/// A single interview question to explain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ExplanationRequest {
    #[validate(length(min = 5, max = 1000))]
    pub question: String,
}

impl RequestBody for ExplanationRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
#[validate(schema(function = "added_question_count", skip_on_field_errors = false))]
pub struct AddQuestionsRequest {
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,
    #[validate(nested)]
    pub questions: Vec<QAItem>,
}

fn added_question_count(request: &AddQuestionsRequest) -> Result<(), ValidationError> {
    question_count(&request.questions)
}

impl AddQuestionsRequest {
    /// False when either required key is absent; callers report that case with
    /// their own message rather than a field list.
    pub fn has_required_keys(body: &serde_json::Value) -> bool {
        let present = |key: &str| body.get(key).is_some_and(|value| !value.is_null());
        present("sessionId") && present("questions")
    }
}

impl RequestBody for AddQuestionsRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateNoteRequest {
    #[validate(length(max = 5000))]
    pub note: String,
}

impl RequestBody for UpdateNoteRequest {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_normalizes_email_and_trims_name() {
        let request = RegisterRequest::from_body(&json!({
            "name": "  Grace Hopper ",
            "email": " Grace@Example.COM ",
            "password": "Sup3r!secret",
            "profileImageUrl": ""
        }))
        .unwrap();

        assert_eq!(request.name, "Grace Hopper");
        assert_eq!(request.email, "grace@example.com");
        assert_eq!(request.profile_image_url, None);
    }

    #[test]
    fn register_rejects_weak_password_and_bad_url() {
        let errors = RegisterRequest::from_body(&json!({
            "name": "Grace",
            "email": "grace@example.com",
            "password": "alllowercase",
            "profileImageUrl": "not a url"
        }))
        .unwrap_err()
        .messages();

        assert_eq!(
            errors,
            vec![
                WEAK_PASSWORD.to_string(),
                "\"profileImageUrl\" must be a valid uri".to_string(),
            ]
        );
    }

    #[test]
    fn short_password_reports_length_only() {
        let errors = RegisterRequest::from_body(&json!({
            "name": "Grace",
            "email": "grace@example.com",
            "password": "aB1!"
        }))
        .unwrap_err()
        .messages();

        assert_eq!(
            errors,
            vec!["\"password\" length must be at least 8 characters long".to_string()]
        );
    }

    #[test]
    fn register_collects_every_error() {
        let errors = RegisterRequest::from_body(&json!({ "email": "nope" }))
            .unwrap_err()
            .messages();
        assert_eq!(
            errors,
            vec![
                "\"email\" must be a valid email".to_string(),
                "\"name\" is required".to_string(),
                "\"password\" is required".to_string(),
            ]
        );
    }

    #[test]
    fn password_is_checked_as_sent() {
        let request = LoginRequest::from_body(&json!({
            "email": "a@example.com",
            "password": " spaced "
        }))
        .unwrap();
        assert_eq!(request.password, " spaced ");
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = LoginRequest::from_body(&json!({})).unwrap_err().messages();
        assert_eq!(
            errors,
            vec![
                "\"email\" is required".to_string(),
                "\"password\" is required".to_string(),
            ]
        );
    }

    #[test]
    fn session_creation_validates_nested_questions() {
        let errors = CreateSessionRequest::from_body(&json!({
            "role": "Backend Engineer",
            "experience": "3",
            "topicToFocus": "Rust, async",
            "questions": [
                { "question": "What is a future?", "answer": "A value that may not be ready." },
                { "question": "Why", "answer": "Because" }
            ]
        }))
        .unwrap_err()
        .messages();

        assert_eq!(
            errors,
            vec!["\"questions[1].question\" length must be at least 5 characters long".to_string()]
        );
    }

    #[test]
    fn session_creation_bounds_question_count() {
        let base = json!({
            "role": "Backend Engineer",
            "experience": "3",
            "topicToFocus": "Rust"
        });

        let mut empty = base.clone();
        empty["questions"] = json!([]);
        let errors = CreateSessionRequest::from_body(&empty).unwrap_err().messages();
        assert_eq!(errors, vec!["\"questions\" must contain at least 1 items".to_string()]);

        let errors = CreateSessionRequest::from_body(&base).unwrap_err().messages();
        assert_eq!(errors, vec!["\"questions\" is required".to_string()]);

        let mut crowded = base;
        let item = json!({ "question": "What is ownership?", "answer": "Who frees it." });
        crowded["questions"] = json!(vec![item; 51]);
        crowded["questions"][3]["answer"] = json!("no");
        let errors = CreateSessionRequest::from_body(&crowded).unwrap_err().messages();
        assert_eq!(
            errors,
            vec![
                "\"questions\" must contain less than or equal to 50 items".to_string(),
                "\"questions[3].answer\" length must be at least 5 characters long".to_string(),
            ]
        );
    }

    #[test]
    fn question_request_accepts_numeric_string_count() {
        let request = QuestionRequest::from_body(&json!({
            "role": "SRE",
            "experience": "5 years",
            "topicToFocus": "Kubernetes",
            "numberOfQuestions": "10",
            "extra": "ignored"
        }))
        .unwrap();

        assert_eq!(request.number_of_questions, 10);
        assert_eq!(request.topic_to_focus, "Kubernetes");
    }

    #[test]
    fn question_request_bounds_count() {
        for count in [0, MAX_QUESTIONS_PER_REQUEST + 1] {
            let result = QuestionRequest::from_body(&json!({
                "role": "SRE",
                "experience": "5",
                "topicToFocus": "Linux",
                "numberOfQuestions": count
            }));
            assert!(result.is_err(), "count {count} should be rejected");
        }
    }

    #[test]
    fn explanation_request_trims_question() {
        let request = ExplanationRequest::from_body(&json!({
            "question": "   What is a closure?   "
        }))
        .unwrap();
        assert_eq!(request.question, "What is a closure?");
    }

    #[test]
    fn add_questions_detects_missing_keys() {
        assert!(!AddQuestionsRequest::has_required_keys(&json!({ "sessionId": "x" })));
        assert!(!AddQuestionsRequest::has_required_keys(
            &json!({ "sessionId": null, "questions": [] })
        ));
        assert!(AddQuestionsRequest::has_required_keys(
            &json!({ "sessionId": "x", "questions": [] })
        ));
    }

    #[test]
    fn note_defaults_to_empty() {
        let request = UpdateNoteRequest::from_body(&json!({})).unwrap();
        assert_eq!(request.note, "");
        let request = UpdateNoteRequest::from_body(&json!({ "note": null })).unwrap();
        assert_eq!(request.note, "");
    }

    #[test]
    fn email_rule_accepts_common_addresses() {
        let login = |email: &str| {
            LoginRequest::from_body(&json!({ "email": email, "password": "x" })).is_ok()
        };
        assert!(login("a.b+tag@sub.example.org"));
        assert!(!login("spaces in@example.com"));
        assert!(!login("missing-at.example.com"));
    }
}
