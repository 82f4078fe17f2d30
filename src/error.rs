//! Error types for the form engine

use thiserror::Error;

/// Errors raised while turning generated text into a canonical [`Schema`](crate::schema::Schema)
/// or while binding a Schema to a [`FormRuntime`](crate::form::FormRuntime).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The payload did not parse as JSON
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    /// The payload parsed but had no field mapping
    #[error("Schema has no properties mapping")]
    MissingProperties,

    /// A Schema broke one of its own invariants
    #[error("Schema invariant violated: {0}")]
    InvariantViolation(String),
}

impl SchemaError {
    /// Message safe to show to the person using the form builder.
    ///
    /// Invariant violations are programming errors, so their detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MalformedJson(_) | Self::MissingProperties => {
                "Generated content is not valid, please try again."
            }
            Self::InvariantViolation(_) => "Something went wrong while preparing the form.",
        }
    }
}

/// Errors raised by [`FormRuntime`](crate::form::FormRuntime) operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Unknown field key: {0}")]
    UnknownFieldKey(String),
}

/// Errors raised by structural Schema edits that cannot be applied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The target key is already used by another field
    #[error("Field key already exists: {0}")]
    DuplicateKey(String),

    /// Field keys must not be empty
    #[error("Field key must not be empty")]
    EmptyKey,
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::MalformedJson(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_share_user_message() {
        let malformed = SchemaError::MalformedJson("expected value".to_string());
        assert_eq!(malformed.user_message(), SchemaError::MissingProperties.user_message());
    }

    #[test]
    fn test_invariant_detail_not_in_user_message() {
        let err = SchemaError::InvariantViolation("required key 'x' missing".to_string());
        assert!(!err.user_message().contains("'x'"));
        assert!(err.to_string().contains("'x'"));
    }
}
