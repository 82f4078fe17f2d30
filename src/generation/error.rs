//! Error types for form generation

use thiserror::Error;

use crate::error::SchemaError;
use crate::persistence::PersistenceError;

/// Errors from the completion endpoint
#[derive(Debug, Error)]
pub enum LlmError {
    /// API error
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited
    #[error("Rate limited by completion endpoint")]
    RateLimited,

    /// Authentication error
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// The response carried no message content
    #[error("Completion returned no content")]
    EmptyResponse,

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::Network(format!("Connection error: {}", err))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

/// Result type alias for completion calls
pub type LlmResult<T> = Result<T, LlmError>;

/// Wizard input that cannot be turned into a prompt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Form type must not be empty")]
    EmptyFormType,

    #[error("Number of fields must be between {min} and {max}, got {actual}")]
    FieldCount { actual: u32, min: u32, max: u32 },

    #[error("Description must be at least {min} characters, got {actual}")]
    DescriptionTooShort { actual: usize, min: usize },
}

/// Errors surfaced by [`FormGenerator`](super::FormGenerator)
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("Generation limit reached: {used} of {limit} used")]
    UsageLimitReached { used: u32, limit: u32 },

    #[error("Completion failed: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Storage error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl GenerationError {
    /// Message safe to show next to the wizard
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest(e) => e.to_string(),
            Self::UsageLimitReached { .. } => {
                "You have used all of your form generations.".to_string()
            }
            Self::Llm(_) => "The form could not be generated, please try again.".to_string(),
            Self::Schema(e) => e.user_message().to_string(),
            Self::Persistence(_) => "Your form could not be saved, please try again.".to_string(),
        }
    }
}
