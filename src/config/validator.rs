use std::collections::HashSet;
use thiserror::Error;

use crate::config::{CompletionConfig, ExportConfig, Settings};
use crate::generation::FormTemplate;
use crate::persistence::{DatabaseBackend, PersistenceConfig};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}

pub struct ConfigValidator;

impl ConfigValidator {
    /// Collect every problem at once instead of stopping at the first
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        Self::validate_completion(&settings.completion, &mut errors);
        Self::validate_persistence(&settings.persistence, &mut errors);
        Self::validate_export(&settings.export, &mut errors);
        Self::validate_templates(&settings.templates, &mut errors);

        if settings.usage.max_generations_per_user == Some(0) {
            errors.push(invalid(
                "usage.max_generations_per_user",
                "Limit must be greater than 0, or omitted for no limit",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_completion(completion: &CompletionConfig, errors: &mut Vec<ValidationError>) {
        if completion.base_url.is_empty() {
            errors.push(ValidationError::MissingField("completion.base_url".to_string()));
        } else if !completion.base_url.starts_with("http://")
            && !completion.base_url.starts_with("https://")
        {
            errors.push(invalid("completion.base_url", "Must be an http(s) URL"));
        }

        if completion.model.trim().is_empty() {
            errors.push(ValidationError::MissingField("completion.model".to_string()));
        }

        if completion.api_key_env.trim().is_empty() {
            errors.push(ValidationError::MissingField("completion.api_key_env".to_string()));
        }

        if !(0.0..=2.0).contains(&completion.temperature) {
            errors.push(invalid(
                "completion.temperature",
                "Temperature must be between 0 and 2",
            ));
        }

        if completion.timeout_seconds == 0 {
            errors.push(invalid(
                "completion.timeout_seconds",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_persistence(persistence: &PersistenceConfig, errors: &mut Vec<ValidationError>) {
        if let Err(e) = DatabaseBackend::from_url(&persistence.url) {
            errors.push(invalid("persistence.url", e.to_string()));
        }

        if persistence.max_connections == 0 {
            errors.push(invalid(
                "persistence.max_connections",
                "Pool needs at least one connection",
            ));
        }
    }

    fn validate_export(export: &ExportConfig, errors: &mut Vec<ValidationError>) {
        let name = export.fallback_filename.as_str();
        if name.is_empty() {
            errors.push(ValidationError::MissingField("export.fallback_filename".to_string()));
        } else if !name.ends_with(".csv") || name.contains(['/', '\\']) {
            errors.push(invalid(
                "export.fallback_filename",
                "Must be a plain file name ending in .csv",
            ));
        }
    }

    fn validate_templates(templates: &[FormTemplate], errors: &mut Vec<ValidationError>) {
        let mut seen = HashSet::new();
        for template in templates {
            if !seen.insert(template.form_type.to_lowercase()) {
                errors.push(ValidationError::Duplicate(format!(
                    "template '{}'",
                    template.form_type
                )));
            }
            if let Err(e) = template.to_request().validate() {
                errors.push(invalid(format!("templates.{}", template.form_type), e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigValidator::validate(&Settings::default()).is_ok());
    }

    #[test]
    fn test_all_errors_reported() {
        let mut settings = Settings::default();
        settings.completion.base_url = "ftp://example.com".to_string();
        settings.completion.timeout_seconds = 0;
        settings.persistence.url = "redis://localhost".to_string();
        settings.usage.max_generations_per_user = Some(0);
        settings.export.fallback_filename = "out.txt".to_string();

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_template_problems() {
        let mut settings = Settings::default();
        let mut bad = settings.templates[0].clone();
        bad.num_fields = 30;
        settings.templates.push(bad);

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Duplicate(_))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidValue { field, .. } if field.starts_with("templates."))));
    }
}
