//! Form generation through a chat completion endpoint
//!
//! The wizard collects a [`FormRequest`], the [`FormGenerator`] checks the
//! user's remaining quota, sends exactly one completion request and hands the
//! reply to the normalizer.

pub mod client;
pub mod error;
pub mod prompt;
mod service;

pub use client::{CompletionClient, OpenAiCompletionClient};
pub use error::{GenerationError, LlmError, LlmResult, RequestError};
pub use prompt::{
    build_prompt, default_templates, search_templates, FormRequest, FormTemplate,
    PREDEFINED_FORM_TYPES, SYSTEM_PROMPT,
};
pub use service::FormGenerator;
