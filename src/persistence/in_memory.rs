//! In-memory document store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::error::PersistenceError;
use super::models::{Feedback, StoredForm, UserIdentity};
use super::repository::FormStore;
use crate::schema::{normalize, Schema};

/// A saved form as the SQL `forms` table holds it
#[derive(Clone, Debug)]
struct FormRow {
    id: String,
    user_id: String,
    schema_text: String,
    created_at: DateTime<Utc>,
}

/// In-memory FormStore for tests and single-process use
#[derive(Clone, Default)]
pub struct InMemoryFormStore {
    usage: Arc<RwLock<HashMap<String, u32>>>,
    /// Insertion order, oldest first
    forms: Arc<RwLock<Vec<FormRow>>>,
    feedback: Arc<RwLock<Vec<Feedback>>>,
}

impl InMemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn feedback(&self) -> Vec<Feedback> {
        self.feedback.read().await.clone()
    }
}

#[async_trait]
impl FormStore for InMemoryFormStore {
    async fn get_usage_count(&self, user_id: &str) -> Result<u32, PersistenceError> {
        let usage = self.usage.read().await;
        Ok(usage.get(user_id).copied().unwrap_or(0))
    }

    async fn increment_usage_count(&self, user: &UserIdentity) -> Result<u32, PersistenceError> {
        let mut usage = self.usage.write().await;
        let count = usage.entry(user.id.clone()).or_insert(0);
        *count = count.saturating_add(1);
        Ok(*count)
    }

    async fn save_form(&self, schema: &Schema, user: &UserIdentity) -> Result<String, PersistenceError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.forms.write().await.push(FormRow {
            id: id.clone(),
            user_id: user.id.clone(),
            schema_text: schema.to_text(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_forms(&self, user_id: &str) -> Result<Vec<StoredForm>, PersistenceError> {
        let forms = self.forms.read().await;
        forms
            .iter()
            .rev()
            .filter(|row| row.user_id == user_id)
            .map(|row| {
                let schema =
                    normalize(&row.schema_text).map_err(|source| PersistenceError::CorruptForm {
                        id: row.id.clone(),
                        source,
                    })?;
                Ok(StoredForm {
                    id: row.id.clone(),
                    user_id: row.user_id.clone(),
                    schema,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn save_feedback(&self, feedback: &Feedback) -> Result<(), PersistenceError> {
        self.feedback.write().await.push(feedback.clone());
        Ok(())
    }
}
