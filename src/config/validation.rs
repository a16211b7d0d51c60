//! Configuration validation
//!
//! Validates a gh2yt configuration before anything talks to GitHub or YouTrack:
//! - Required fields are set
//! - URLs are http(s)
//! - Project short code fits YouTrack's limits
//! - Server and import settings are usable

use super::sync_config::SyncConfig;
use crate::SyncError;

/// Validation error details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a gh2yt configuration, collecting every problem
pub fn validate_config(config: &SyncConfig) -> ValidationResult {
    let mut errors = Vec::new();

    let required = [
        ("repo_owner", &config.repo_owner),
        ("repo_name", &config.repo_name),
        ("destination_base_url", &config.destination_base_url),
        ("destination_token", &config.destination_token),
        ("webhook_target_url", &config.webhook_target_url),
        ("webhook_secret", &config.webhook_secret),
        ("correlation_field", &config.correlation_field),
        ("project.leader", &config.project.leader),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "Must be set"));
        }
    }

    let urls = [
        ("destination_base_url", &config.destination_base_url),
        ("webhook_target_url", &config.webhook_target_url),
        ("github_api_url", &config.github_api_url),
    ];
    for (field, value) in urls {
        if !value.is_empty() && !is_http_url(value) {
            errors.push(ValidationError::new(
                field,
                format!("Invalid URL (expected http:// or https://): {}", value),
            ));
        }
    }

    let short_code = config.project_short_code();
    if !(3..=10).contains(&short_code.len()) {
        errors.push(ValidationError::new(
            "project.short_code",
            format!("Short code '{}' must be 3-10 characters", short_code),
        ));
    } else if !short_code.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push(ValidationError::new(
            "project.short_code",
            format!("Short code '{}' must be alphanumeric", short_code),
        ));
    }

    if !config.server.webhook_path.starts_with('/') {
        errors.push(ValidationError::new(
            "server.webhook_path",
            "Path must start with '/'",
        ));
    }

    if config.server.max_body_size == 0 {
        errors.push(ValidationError::new(
            "server.max_body_size",
            "Body size limit must be greater than 0",
        ));
    }

    if config.import.concurrency == 0 {
        errors.push(ValidationError::new(
            "import.concurrency",
            "Concurrency must be at least 1",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate and convert to a crate error
pub fn validate_config_result(config: &SyncConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        SyncError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/'))
}
