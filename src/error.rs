//! Error types for gh2yt
//!
//! One error enum covers every failure mode of the mirror. Destination
//! failures keep a structured reason so callers can tell benign
//! "already exists" collisions apart from real provisioning errors.

use crate::model::SourceId;
use std::fmt;
use thiserror::Error;

/// Result type alias for gh2yt operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Machine-readable reason attached to a failed YouTrack call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The entity (project, custom field) already exists
    AlreadyExists,
    /// The custom field is already attached to the project
    AlreadyAttached,
    NotFound,
    Unauthorized,
    Forbidden,
    /// Request understood but refused (validation, duplicate short name, ...)
    Rejected,
    /// 5xx or anything unexpected
    Server,
}

impl FailureReason {
    /// Classify a YouTrack error response
    ///
    /// YouTrack reports collisions as a 400 with a human-readable
    /// `error_description`; this is the only place that text is inspected.
    pub fn classify(status: u16, error: Option<&str>, description: Option<&str>) -> Self {
        let description = description.unwrap_or_default().to_lowercase();
        let error = error.unwrap_or_default().to_lowercase();

        match status {
            401 => FailureReason::Unauthorized,
            403 => FailureReason::Forbidden,
            404 => FailureReason::NotFound,
            400 | 409 if description.contains("already attached") => {
                FailureReason::AlreadyAttached
            }
            400 | 409
                if description.contains("already exists") || error.contains("duplicate") =>
            {
                FailureReason::AlreadyExists
            }
            400..=499 => FailureReason::Rejected,
            _ => FailureReason::Server,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureReason::AlreadyExists => "already exists",
            FailureReason::AlreadyAttached => "already attached",
            FailureReason::NotFound => "not found",
            FailureReason::Unauthorized => "unauthorized",
            FailureReason::Forbidden => "forbidden",
            FailureReason::Rejected => "rejected",
            FailureReason::Server => "server error",
        };
        f.write_str(s)
    }
}

/// Structured failure returned by the YouTrack transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationFailure {
    pub status: u16,
    pub reason: FailureReason,
    pub error: Option<String>,
    pub description: Option<String>,
}

impl DestinationFailure {
    pub fn new(status: u16, error: Option<String>, description: Option<String>) -> Self {
        let reason = FailureReason::classify(status, error.as_deref(), description.as_deref());
        Self {
            status,
            reason,
            error,
            description,
        }
    }

    /// Failure with an explicit reason (used by in-memory trackers)
    pub fn with_reason(status: u16, reason: FailureReason, description: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            error: None,
            description: Some(description.into()),
        }
    }
}

impl fmt::Display for DestinationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} ({})", self.status, self.reason)?;
        if let Some(ref description) = self.description {
            write!(f, ": {}", description)?;
        } else if let Some(ref error) = self.error {
            write!(f, ": {}", error)?;
        }
        Ok(())
    }
}

/// Comprehensive error type for gh2yt operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// YouTrack rejected a call
    #[error("YouTrack error: {0}")]
    Destination(DestinationFailure),

    /// GitHub rejected a call
    #[error("GitHub error: {0}")]
    Source(String),

    /// Sync requested for a repository whose project was never provisioned
    #[error("No YouTrack project named '{0}'; run bootstrap first")]
    ProjectNotProvisioned(String),

    /// Source issue cannot be mapped to a destination record
    #[error("Cannot translate issue {id}: {reason}")]
    Translation { id: SourceId, reason: String },

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Integration errors that are neither source nor destination specific
    #[error("Integration error: {0}")]
    Integration(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SyncError {
    /// Reason of a destination failure, if this is one
    pub fn destination_reason(&self) -> Option<FailureReason> {
        match self {
            SyncError::Destination(failure) => Some(failure.reason),
            _ => None,
        }
    }
}

impl From<DestinationFailure> for SyncError {
    fn from(failure: DestinationFailure) -> Self {
        SyncError::Destination(failure)
    }
}
