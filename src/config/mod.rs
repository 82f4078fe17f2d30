use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

pub mod validator;

use crate::export::DEFAULT_FALLBACK_FILENAME;
use crate::generation::{default_templates, FormTemplate};
use crate::persistence::PersistenceConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub usage: UsageConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// Templates offered by the wizard
    #[serde(default = "default_templates")]
    pub templates: Vec<FormTemplate>,
}

/// Chat completion endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompletionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            max_tokens: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UsageConfig {
    /// Generations allowed per user; `None` disables the limit
    #[serde(default = "default_max_generations")]
    pub max_generations_per_user: Option<u32>,
}

fn default_max_generations() -> Option<u32> {
    Some(5)
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            max_generations_per_user: default_max_generations(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    /// Download name used when a form has no title
    #[serde(default = "default_fallback_filename")]
    pub fallback_filename: String,
}

fn default_fallback_filename() -> String {
    DEFAULT_FALLBACK_FILENAME.to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fallback_filename: default_fallback_filename(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            completion: CompletionConfig::default(),
            persistence: PersistenceConfig::default(),
            usage: UsageConfig::default(),
            export: ExportConfig::default(),
            templates: default_templates(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Load `<root>/formwright.{toml,yaml,json}` if present, then apply
    /// `FORMWRIGHT__SECTION__KEY` environment overrides
    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let config_path = std::path::Path::new(root).join("formwright");
        let s = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(Environment::with_prefix("FORMWRIGHT").separator("__"))
            .set_default("completion.model", default_model())?
            .set_default("export.fallback_filename", DEFAULT_FALLBACK_FILENAME)?
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        validator::ConfigValidator::validate(&settings).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;

        tracing::debug!(
            model = %settings.completion.model,
            templates = settings.templates.len(),
            "Loaded settings"
        );

        Ok(settings)
    }
}
