//! Issue tracker data model
//!
//! - **source**: GitHub issues, webhook events and webhook registrations
//! - **destination**: YouTrack projects, custom fields and issue payloads

pub mod destination;
pub mod source;

pub use destination::{
    CustomField, DestinationIssue, DestinationIssuePayload, DestinationIssueRef,
    DestinationProject, FieldId, FieldValue, IssueCustomField, IssueFieldSnapshot, IssueState,
    IssueUpdate, NewProject, ProjectRef,
};
pub use source::{IssueEvent, SourceId, SourceIssue, SourceLabel, SourceUser, WebhookRef};
