//! Persistent domain records and the JSON shapes they are rendered as.
//!
//! Field names on the wire follow the document-store conventions the web
//! client already consumes: `_id`, camelCase keys, and `user`/`session`
//! back-references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A registered account. Never serialized directly because it carries the
/// password hash; use [`UserProfile`] for responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            profile_image_url: self.profile_image_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An interview-prep session owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
    pub role: String,
    pub experience: String,
    pub topic_to_focus: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub session: Uuid,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A question paired with its model-authored answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QAItem {
    #[validate(length(min = 5, max = 1000))]
    pub question: String,
    #[validate(length(min = 5, max = 5000))]
    pub answer: String,
}

/// A concept title paired with its model-authored explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationItem {
    pub title: String,
    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            profile_image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn profile_omits_password_hash() {
        let user = sample_user();
        let value = serde_json::to_value(user.profile()).unwrap();

        assert_eq!(value["_id"], json!(user.id.to_string()));
        assert_eq!(value["email"], json!("ada@example.com"));
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert!(value.get("profileImageUrl").is_some());
    }

    #[test]
    fn question_serializes_with_camel_case_keys() {
        let now = Utc::now();
        let question = Question {
            id: Uuid::new_v4(),
            session: Uuid::new_v4(),
            question: "What is ownership?".to_string(),
            answer: "A set of rules.".to_string(),
            note: String::new(),
            is_pinned: true,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["isPinned"], json!(true));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("_id").is_some());
    }
}
