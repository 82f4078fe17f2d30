//! Document store port and its SQL implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::persistence::error::PersistenceError;
use crate::persistence::models::{
    parse_timestamp, timestamp_text, Feedback, StoredForm, UserIdentity,
};
use crate::persistence::pool::StorePool;
use crate::schema::{normalize, Schema};

/// Per-user document store: generation counters, saved forms and feedback
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Number of generations the user has made; zero for unknown users
    async fn get_usage_count(&self, user_id: &str) -> Result<u32, PersistenceError>;

    /// Bump the user's counter, creating it at 1 when absent. Returns the new count.
    async fn increment_usage_count(&self, user: &UserIdentity) -> Result<u32, PersistenceError>;

    /// Save a form to the user's profile and return its id
    async fn save_form(&self, schema: &Schema, user: &UserIdentity) -> Result<String, PersistenceError>;

    /// The user's saved forms, newest first
    async fn list_forms(&self, user_id: &str) -> Result<Vec<StoredForm>, PersistenceError>;

    async fn save_feedback(&self, feedback: &Feedback) -> Result<(), PersistenceError>;
}

/// SQLx-based implementation of FormStore
#[derive(Clone)]
pub struct SqlxFormStore {
    pool: StorePool,
}

impl SqlxFormStore {
    pub fn new(pool: StorePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &StorePool {
        &self.pool
    }

    fn sql(&self, query: &str) -> String {
        self.pool.sql(query)
    }

    fn parse_form(row: &sqlx::any::AnyRow) -> Result<StoredForm, PersistenceError> {
        let id: String = row.try_get("id")?;
        let schema_text: String = row.try_get("schema_text")?;
        let created_at: String = row.try_get("created_at")?;

        // Rows hold canonical text; loading re-normalizes it
        let schema = normalize(&schema_text).map_err(|source| PersistenceError::CorruptForm {
            id: id.clone(),
            source,
        })?;
        let created_at = parse_timestamp(&created_at)
            .ok_or(PersistenceError::InvalidTimestamp(created_at))?;

        Ok(StoredForm {
            id,
            user_id: row.try_get("user_id")?,
            schema,
            created_at,
        })
    }
}

#[async_trait]
impl FormStore for SqlxFormStore {
    async fn get_usage_count(&self, user_id: &str) -> Result<u32, PersistenceError> {
        let row = sqlx::query(&self.sql("SELECT api_call_count FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(self.pool.inner())
            .await?;

        match row {
            Some(row) => {
                let count: i64 = row.try_get("api_call_count")?;
                Ok(clamp_count(count))
            }
            None => Ok(0),
        }
    }

    async fn increment_usage_count(&self, user: &UserIdentity) -> Result<u32, PersistenceError> {
        let now = timestamp_text(&Utc::now());
        let mut tx = self.pool.inner().begin().await?;

        let row = sqlx::query(&self.sql("SELECT api_call_count FROM users WHERE id = ?"))
            .bind(&user.id)
            .fetch_optional(&mut *tx)
            .await?;

        let count = match row {
            Some(row) => {
                let current: i64 = row.try_get("api_call_count")?;
                let next = current + 1;
                sqlx::query(&self.sql(
                    "UPDATE users SET api_call_count = ?, email = ?, updated_at = ? WHERE id = ?",
                ))
                .bind(next)
                .bind(&user.email)
                .bind(&now)
                .bind(&user.id)
                .execute(&mut *tx)
                .await?;
                next
            }
            None => {
                sqlx::query(&self.sql(
                    "INSERT INTO users (id, email, api_call_count, updated_at) VALUES (?, ?, 1, ?)",
                ))
                .bind(&user.id)
                .bind(&user.email)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
                1
            }
        };

        tx.commit().await?;
        tracing::info!(user_id = %user.id, count, "Incremented generation count");
        Ok(clamp_count(count))
    }

    async fn save_form(&self, schema: &Schema, user: &UserIdentity) -> Result<String, PersistenceError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_text(&Utc::now());

        sqlx::query(&self.sql(
            "INSERT INTO forms (id, user_id, user_email, title, schema_text, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        ))
        .bind(&id)
        .bind(&user.id)
        .bind(&user.email)
        .bind(schema.title.clone())
        .bind(schema.to_text())
        .bind(&now)
        .execute(self.pool.inner())
        .await?;

        tracing::info!(form_id = %id, user_id = %user.id, fields = schema.len(), "Saved form");
        Ok(id)
    }

    async fn list_forms(&self, user_id: &str) -> Result<Vec<StoredForm>, PersistenceError> {
        let rows = sqlx::query(&self.sql(
            "SELECT id, user_id, schema_text, created_at FROM forms WHERE user_id = ? ORDER BY created_at DESC",
        ))
        .bind(user_id)
        .fetch_all(self.pool.inner())
        .await?;

        rows.iter().map(Self::parse_form).collect()
    }

    async fn save_feedback(&self, feedback: &Feedback) -> Result<(), PersistenceError> {
        sqlx::query(&self.sql(
            "INSERT INTO feedback (id, user_id, user_email, message, created_at) VALUES (?, ?, ?, ?, ?)",
        ))
        .bind(&feedback.id)
        .bind(feedback.user_id.clone())
        .bind(feedback.user_email.clone())
        .bind(&feedback.message)
        .bind(timestamp_text(&feedback.created_at))
        .execute(self.pool.inner())
        .await?;

        tracing::debug!(feedback_id = %feedback.id, "Saved feedback");
        Ok(())
    }
}

fn clamp_count(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}
