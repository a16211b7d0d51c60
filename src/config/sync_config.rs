//! gh2yt configuration file handling
//!
//! Loads ~/.config/gh2yt/config.yaml (or an explicit path) and layers the
//! GITHUB_* / YOUTRACK_* environment variables on top of it.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variables recognized as overrides, mapped to their fields
pub const ENV_REPO_OWNER: &str = "GITHUB_OWNER";
pub const ENV_REPO_NAME: &str = "GITHUB_REPO";
pub const ENV_DESTINATION_URL: &str = "YOUTRACK_URL";
pub const ENV_DESTINATION_TOKEN: &str = "YOUTRACK_TOKEN";
pub const ENV_WEBHOOK_URL: &str = "WEBHOOK_URL";
pub const ENV_WEBHOOK_SECRET: &str = "GITHUB_WEBHOOK_SECRET";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Destination project settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Project display name (defaults to the repository name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Project short code, 3-10 characters (derived from the name if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_code: Option<String>,

    /// Login of the project leader
    #[serde(default = "default_leader")]
    pub leader: String,
}

fn default_leader() -> String {
    "admin".to_string()
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            name: None,
            short_code: None,
            leader: default_leader(),
        }
    }
}

/// Webhook server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to bind
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Route GitHub delivers issue events to
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Request body size limit in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_webhook_path() -> String {
    "/issue-updated".to_string()
}

fn default_max_body_size() -> usize {
    5 * 1024 * 1024
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            webhook_path: default_webhook_path(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Bulk import settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Maximum number of issue creations in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    8
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// Complete mirror configuration
///
/// Passed explicitly to the provisioning engine, sync engine, signature
/// guard and server at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// GitHub organization or user owning the repository
    #[serde(default)]
    pub repo_owner: String,

    /// GitHub repository name
    #[serde(default)]
    pub repo_name: String,

    /// YouTrack REST base URL (e.g. https://example.youtrack.cloud/api)
    #[serde(default)]
    pub destination_base_url: String,

    /// YouTrack permanent token
    #[serde(default)]
    pub destination_token: String,

    /// Public URL GitHub delivers webhooks to
    #[serde(default)]
    pub webhook_target_url: String,

    /// Shared secret for webhook signatures
    #[serde(default)]
    pub webhook_secret: String,

    /// GitHub REST API base URL
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// GitHub token (falls back to GITHUB_TOKEN)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,

    /// Name of the YouTrack field holding the GitHub issue id
    #[serde(default = "default_correlation_field")]
    pub correlation_field: String,

    #[serde(default)]
    pub project: ProjectSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub import: ImportSettings,
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_correlation_field() -> String {
    "GitHubId".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncConfig {
    /// Create a configuration with every option at its default
    pub fn new() -> Self {
        Self {
            repo_owner: String::new(),
            repo_name: String::new(),
            destination_base_url: String::new(),
            destination_token: String::new(),
            webhook_target_url: String::new(),
            webhook_secret: String::new(),
            github_api_url: default_github_api_url(),
            github_token: None,
            correlation_field: default_correlation_field(),
            project: ProjectSettings::default(),
            server: ServerSettings::default(),
            import: ImportSettings::default(),
        }
    }

    /// Build a configuration from the process environment alone
    pub fn from_env() -> Self {
        let mut config = Self::new();
        config.apply_env_overrides();
        config
    }

    /// Load configuration from the default path (~/.config/gh2yt/config.yaml)
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::SyncError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading gh2yt configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            repo = %config.repo_slug(),
            project = %config.project_name(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Resolve the effective configuration for a CLI run
    ///
    /// An explicit path must exist. Without one, the default file is used
    /// when present. Environment variables override file values either way.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::load(&default_path)?
                } else {
                    tracing::debug!("No config file found, using environment only");
                    Self::new()
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving gh2yt configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/gh2yt/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("gh2yt");
        path.push("config.yaml");
        path
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty(ENV_REPO_OWNER) {
            self.repo_owner = v;
        }
        if let Some(v) = non_empty(ENV_REPO_NAME) {
            self.repo_name = v;
        }
        if let Some(v) = non_empty(ENV_DESTINATION_URL) {
            self.destination_base_url = v;
        }
        if let Some(v) = non_empty(ENV_DESTINATION_TOKEN) {
            self.destination_token = v;
        }
        if let Some(v) = non_empty(ENV_WEBHOOK_URL) {
            self.webhook_target_url = v;
        }
        if let Some(v) = non_empty(ENV_WEBHOOK_SECRET) {
            self.webhook_secret = v;
        }
        if let Some(v) = non_empty(ENV_GITHUB_TOKEN) {
            self.github_token = Some(v);
        }
    }

    /// `owner/name` form of the repository
    pub fn repo_slug(&self) -> String {
        format!("{}/{}", self.repo_owner, self.repo_name)
    }

    /// Display name of the destination project
    pub fn project_name(&self) -> &str {
        self.project
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(self.repo_name.as_str())
    }

    /// Short code of the destination project
    pub fn project_short_code(&self) -> String {
        match self.project.short_code.as_deref() {
            Some(code) if !code.trim().is_empty() => code.to_string(),
            _ => derive_short_code(self.project_name()),
        }
    }
}

/// Derive a 3-10 character project short code from a display name
///
/// Keeps ASCII alphanumerics, uppercased, truncated to 10 and padded with
/// `X` up to 3.
pub fn derive_short_code(name: &str) -> String {
    let mut code: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .take(10)
        .collect();
    while code.len() < 3 {
        code.push('X');
    }
    code
}
