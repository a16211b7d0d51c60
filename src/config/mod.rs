//! Configuration system
//!
//! Loads ~/.config/gh2yt/config.yaml with support for:
//! - Source repository (owner, name, GitHub API URL and token)
//! - Destination YouTrack instance, project settings and correlation field
//! - Webhook target URL, shared secret and server settings
//! - Environment overrides using the GITHUB_* / YOUTRACK_* variables

mod sync_config;
pub mod validation;

pub use sync_config::{
    derive_short_code, ImportSettings, ProjectSettings, ServerSettings, SyncConfig,
};
pub use validation::{validate_config, validate_config_result, ValidationError};
