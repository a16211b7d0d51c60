//! GitHub issue → YouTrack record translation

use crate::model::{
    DestinationIssuePayload, IssueCustomField, IssueState, IssueUpdate, ProjectRef, SourceIssue,
};
use crate::{Result, SyncError};

/// Description used when the GitHub issue has no body
pub const DEFAULT_DESCRIPTION: &str = "No description provided";

/// Issue type every mirrored issue gets
pub const DEFAULT_ISSUE_TYPE: &str = "Task";

const STATE_FIELD: &str = "State";
const TYPE_FIELD: &str = "Type";

/// Pure mapping from GitHub issues to YouTrack payloads
#[derive(Debug, Clone)]
pub struct IssueTranslator {
    correlation_field: String,
}

impl IssueTranslator {
    pub fn new(correlation_field: impl Into<String>) -> Self {
        Self {
            correlation_field: correlation_field.into(),
        }
    }

    /// Full creation payload for `issue` under `project_id`
    pub fn to_destination_record(
        &self,
        project_id: &str,
        issue: &SourceIssue,
    ) -> Result<DestinationIssuePayload> {
        let summary = summary_of(issue)?;

        Ok(DestinationIssuePayload {
            project: ProjectRef {
                id: project_id.to_string(),
            },
            summary,
            description: description_of(issue),
            custom_fields: vec![
                IssueCustomField::state(STATE_FIELD, state_of(issue)),
                IssueCustomField::single_enum(TYPE_FIELD, DEFAULT_ISSUE_TYPE),
                IssueCustomField::simple(self.correlation_field.as_str(), issue.id.as_str()),
            ],
        })
    }

    /// Attributes that follow the GitHub issue after it is linked
    pub fn to_destination_update(&self, issue: &SourceIssue) -> Result<IssueUpdate> {
        Ok(IssueUpdate {
            summary: summary_of(issue)?,
            description: description_of(issue),
            custom_fields: vec![IssueCustomField::state(STATE_FIELD, state_of(issue))],
        })
    }
}

fn summary_of(issue: &SourceIssue) -> Result<String> {
    if issue.title.trim().is_empty() {
        return Err(SyncError::Translation {
            id: issue.id.clone(),
            reason: "missing title".to_string(),
        });
    }
    Ok(issue.title.clone())
}

fn description_of(issue: &SourceIssue) -> String {
    match issue.body.as_deref() {
        Some(body) if !body.is_empty() => body.to_string(),
        _ => DEFAULT_DESCRIPTION.to_string(),
    }
}

fn state_of(issue: &SourceIssue) -> IssueState {
    if issue.is_closed() {
        IssueState::Fixed
    } else {
        IssueState::Open
    }
}
