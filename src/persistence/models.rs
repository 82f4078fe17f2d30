//! Records kept by the document store

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::Schema;

/// The signed-in user a request acts for. Passed explicitly to every
/// operation that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub email: String,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}

/// A form saved to a user's profile
#[derive(Debug, Clone, PartialEq)]
pub struct StoredForm {
    /// Unique identifier (UUID)
    pub id: String,
    pub user_id: String,
    pub schema: Schema,
    pub created_at: DateTime<Utc>,
}

/// Free-text product feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Unique identifier (UUID)
    pub id: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            user_email: None,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn from_user(mut self, user: &UserIdentity) -> Self {
        self.user_id = Some(user.id.clone());
        self.user_email = Some(user.email.clone());
        self
    }
}

/// Fixed-width RFC 3339 text, so stored timestamps sort lexically
pub(crate) fn timestamp_text(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_text_is_fixed_width() {
        let whole = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let text = timestamp_text(&whole);
        assert_eq!(text, "2024-05-01T10:00:00.000000Z");
        assert_eq!(parse_timestamp(&text), Some(whole));
    }

    #[test]
    fn test_feedback_from_user() {
        let user = UserIdentity::new("u1", "a@b.com");
        let feedback = Feedback::new("Great tool").from_user(&user);
        assert_eq!(feedback.user_email.as_deref(), Some("a@b.com"));
        assert!(!feedback.id.is_empty());
    }
}
