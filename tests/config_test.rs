use formwright::config::Settings;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_defaults_without_config_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path().to_str().unwrap_or(".");

    let settings = Settings::from_root(root)?;

    assert_eq!(settings.completion.model, "gpt-3.5-turbo");
    assert_eq!(settings.completion.base_url, "https://api.openai.com/v1");
    assert_eq!(settings.completion.temperature, 0.0);
    assert_eq!(settings.usage.max_generations_per_user, Some(5));
    assert_eq!(settings.export.fallback_filename, "form-data.csv");
    assert!(!settings.templates.is_empty());
    Ok(())
}

#[test]
fn test_load_toml_config() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    let formwright_toml = r#"
[completion]
base_url = "http://localhost:8080/v1"
model = "gpt-4o-mini"
max_tokens = 1200

[persistence]
url = "sqlite::memory:"
max_connections = 1

[usage]
max_generations_per_user = 20

[export]
fallback_filename = "answers.csv"

[[templates]]
form_type = "Poll"
num_fields = 2
form_description = "Quick poll about the team lunch venue."
"#;
    fs::write(root.join("formwright.toml"), formwright_toml)?;

    let settings = Settings::from_root(root.to_str().unwrap_or("."))?;

    assert_eq!(settings.completion.model, "gpt-4o-mini");
    assert_eq!(settings.completion.max_tokens, Some(1200));
    assert_eq!(settings.completion.api_key_env, "OPENAI_API_KEY");
    assert_eq!(settings.persistence.max_connections, 1);
    assert!(settings.persistence.auto_migrate);
    assert_eq!(settings.usage.max_generations_per_user, Some(20));
    assert_eq!(settings.export.fallback_filename, "answers.csv");
    assert_eq!(settings.templates.len(), 1);
    assert_eq!(settings.templates[0].form_type, "Poll");
    Ok(())
}

#[test]
fn test_invalid_config_lists_every_problem() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    let formwright_toml = r#"
[completion]
base_url = "localhost"
timeout_seconds = 0

[persistence]
url = "redis://localhost"
"#;
    fs::write(root.join("formwright.toml"), formwright_toml)?;

    let err = Settings::from_root(root.to_str().unwrap_or(".")).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Configuration validation failed"));
    assert!(message.contains("completion.base_url"));
    assert!(message.contains("completion.timeout_seconds"));
    assert!(message.contains("persistence.url"));
    Ok(())
}
