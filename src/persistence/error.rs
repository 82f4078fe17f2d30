//! Persistence layer error types

use thiserror::Error;

use crate::error::SchemaError;

/// Errors that can occur in the document store
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Database connection error
    #[error("Database connection error: {0}")]
    Connection(String),

    /// URL scheme names no supported SQL backend
    #[error("Unsupported database URL scheme '{0}'. Expected sqlite, postgres, or mysql")]
    UnsupportedBackend(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored form no longer normalizes
    #[error("Stored form '{id}' is unreadable: {source}")]
    CorruptForm {
        id: String,
        #[source]
        source: SchemaError,
    },

    /// A stored timestamp is not RFC 3339
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Database error from SQLx
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
