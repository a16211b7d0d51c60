//! External Integrations
//!
//! Transports for the two trackers the mirror talks to.
//!
//! # Overview
//!
//! The sync core only sees the [`SourceTracker`] and [`DestinationTracker`]
//! traits. The REST adapters implement them for GitHub and YouTrack; tests
//! substitute in-memory trackers.
//!
//! # Built-in Integrations
//!
//! - **GitHub**: REST adapter for listing issues and managing repository webhooks
//! - **YouTrack**: REST adapter for projects, custom fields and issues

pub mod github;
pub mod youtrack;

use crate::model::{
    CustomField, DestinationIssue, DestinationIssuePayload, DestinationIssueRef,
    DestinationProject, FieldId, IssueUpdate, NewProject, SourceIssue, WebhookRef,
};
use crate::Result;
use async_trait::async_trait;

pub use github::GitHubAdapter;
pub use youtrack::YouTrackAdapter;

/// Read access to the source tracker plus webhook registration
#[async_trait]
pub trait SourceTracker: Send + Sync {
    /// All issues of a repository, pull requests excluded
    async fn list_issues(&self, repo: &str, owner: &str) -> Result<Vec<SourceIssue>>;

    /// Existing webhook delivering to `target_url`, if any
    async fn find_webhook(
        &self,
        repo: &str,
        owner: &str,
        target_url: &str,
    ) -> Result<Option<WebhookRef>>;

    /// Register a webhook for issue events only
    async fn create_webhook(
        &self,
        repo: &str,
        owner: &str,
        target_url: &str,
        secret: &str,
    ) -> Result<WebhookRef>;
}

/// Create/read/update access to the destination tracker
///
/// Failures the destination reports are returned as
/// [`SyncError::Destination`](crate::SyncError::Destination) carrying a
/// [`FailureReason`](crate::error::FailureReason).
#[async_trait]
pub trait DestinationTracker: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<DestinationProject>>;

    async fn create_project(&self, project: &NewProject) -> Result<DestinationProject>;

    /// Create a destination-wide string custom field
    async fn create_custom_field(&self, name: &str) -> Result<CustomField>;

    async fn list_custom_fields(&self) -> Result<Vec<CustomField>>;

    /// Attach a custom field to a project
    async fn attach_field(&self, project_id: &str, field_id: &FieldId) -> Result<()>;

    /// Issues whose custom field `field` holds `value`
    async fn find_issues_by_field(&self, field: &str, value: &str)
        -> Result<Vec<DestinationIssue>>;

    async fn create_issue(&self, payload: &DestinationIssuePayload) -> Result<DestinationIssueRef>;

    async fn update_issue(&self, issue_id: &str, update: &IssueUpdate)
        -> Result<DestinationIssueRef>;
}
