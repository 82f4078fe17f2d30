use std::sync::Arc;

use super::client::CompletionClient;
use super::error::GenerationError;
use super::prompt::{build_prompt, FormRequest, SYSTEM_PROMPT};
use crate::persistence::{Feedback, FormStore, StoredForm, UserIdentity};
use crate::schema::{normalize, Schema};

/// Turns wizard requests into Schemas and keeps per-user usage in the store
pub struct FormGenerator {
    client: Arc<dyn CompletionClient>,
    store: Arc<dyn FormStore>,
    usage_limit: Option<u32>,
}

impl FormGenerator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn FormStore>,
        usage_limit: Option<u32>,
    ) -> Self {
        Self {
            client,
            store,
            usage_limit,
        }
    }

    /// Generate a Schema for `request` on behalf of `user`.
    ///
    /// Makes at most one completion call. A successful response counts
    /// against the user's limit even when its text fails to normalize.
    pub async fn generate(
        &self,
        user: &UserIdentity,
        request: &FormRequest,
    ) -> Result<Schema, GenerationError> {
        request.validate()?;

        if let Some(limit) = self.usage_limit {
            let used = self.store.get_usage_count(&user.id).await?;
            if used >= limit {
                tracing::warn!(user_id = %user.id, used, limit, "Generation limit reached");
                return Err(GenerationError::UsageLimitReached { used, limit });
            }
        }

        let prompt = build_prompt(request);
        tracing::info!(
            user_id = %user.id,
            form_type = %request.form_type,
            num_fields = request.num_fields,
            "Requesting form generation"
        );

        let raw = self.client.generate(SYSTEM_PROMPT, &prompt).await?;
        let used = self.store.increment_usage_count(user).await?;
        tracing::info!(user_id = %user.id, used, "Generation completed");

        normalize(&raw).map_err(|e| {
            tracing::warn!(error = %e, "Generated content did not normalize");
            GenerationError::from(e)
        })
    }

    /// Generations left for the user, or `None` when unlimited
    pub async fn remaining(&self, user_id: &str) -> Result<Option<u32>, GenerationError> {
        let Some(limit) = self.usage_limit else {
            return Ok(None);
        };
        let used = self.store.get_usage_count(user_id).await?;
        Ok(Some(limit.saturating_sub(used)))
    }

    pub async fn save(&self, user: &UserIdentity, schema: &Schema) -> Result<String, GenerationError> {
        schema.check_invariants()?;
        Ok(self.store.save_form(schema, user).await?)
    }

    pub async fn saved_forms(&self, user_id: &str) -> Result<Vec<StoredForm>, GenerationError> {
        Ok(self.store.list_forms(user_id).await?)
    }

    pub async fn submit_feedback(&self, feedback: &Feedback) -> Result<(), GenerationError> {
        Ok(self.store.save_feedback(feedback).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::generation::error::{LlmError, LlmResult, RequestError};
    use crate::persistence::InMemoryFormStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeClient {
        reply: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl FakeClient {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for FakeClient {
        async fn generate(&self, system: &str, prompt: &str) -> LlmResult<String> {
            assert_eq!(system, SYSTEM_PROMPT);
            assert!(prompt.contains("Survey"));
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|_| LlmError::Timeout)
        }
    }

    const REPLY: &str = r#"{"title":"Survey","properties":{"q":{"type":"text"}},"required":["q"]}"#;

    fn user() -> UserIdentity {
        UserIdentity::new("u1", "ada@example.com")
    }

    fn request() -> FormRequest {
        FormRequest::new("Survey", 3, "A short survey about the office coffee.")
    }

    #[tokio::test]
    async fn test_generate_counts_usage_and_normalizes() {
        let client = FakeClient::replying(REPLY);
        let store = Arc::new(InMemoryFormStore::new());
        let generator = FormGenerator::new(client.clone(), store.clone(), Some(5));

        let schema = generator.generate(&user(), &request()).await.unwrap();
        assert_eq!(schema.title.as_deref(), Some("Survey"));
        assert!(schema.is_required("q"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_usage_count("u1").await.unwrap(), 1);
        assert_eq!(generator.remaining("u1").await.unwrap(), Some(4));
    }

    #[tokio::test]
    async fn test_invalid_request_makes_no_call() {
        let client = FakeClient::replying(REPLY);
        let generator =
            FormGenerator::new(client.clone(), Arc::new(InMemoryFormStore::new()), None);
        let bad = FormRequest::new("Survey", 3, "short");
        let err = generator.generate(&user(), &bad).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::InvalidRequest(RequestError::DescriptionTooShort { .. })
        ));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_limit_blocks_before_calling() {
        let client = FakeClient::replying(REPLY);
        let store = Arc::new(InMemoryFormStore::new());
        let generator = FormGenerator::new(client.clone(), store.clone(), Some(1));

        generator.generate(&user(), &request()).await.unwrap();
        let err = generator.generate(&user(), &request()).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::UsageLimitReached { used: 1, limit: 1 }
        ));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_counted_and_reported() {
        let store = Arc::new(InMemoryFormStore::new());
        let generator = FormGenerator::new(FakeClient::replying("not json"), store.clone(), None);
        let err = generator.generate(&user(), &request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Schema(SchemaError::MalformedJson(_))));
        assert_eq!(store.get_usage_count("u1").await.unwrap(), 1);
        assert_eq!(generator.remaining("u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_call_is_not_counted() {
        let store = Arc::new(InMemoryFormStore::new());
        let generator = FormGenerator::new(FakeClient::failing(), store.clone(), Some(5));
        let err = generator.generate(&user(), &request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Llm(LlmError::Timeout)));
        assert_eq!(store.get_usage_count("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let store = Arc::new(InMemoryFormStore::new());
        let generator = FormGenerator::new(FakeClient::replying(REPLY), store, None);
        let schema = generator.generate(&user(), &request()).await.unwrap();

        let id = generator.save(&user(), &schema).await.unwrap();
        let saved = generator.saved_forms("u1").await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, id);
        assert_eq!(saved[0].schema, schema);

        generator
            .submit_feedback(&Feedback::new("Handy").from_user(&user()))
            .await
            .unwrap();
    }
}
