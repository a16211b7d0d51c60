//! Correlation lookups against the destination tracker
//!
//! A GitHub issue is linked to at most one YouTrack issue through the
//! correlation custom field, whose value is the GitHub id as a string.

use crate::integrations::DestinationTracker;
use crate::model::{DestinationIssue, DestinationProject, SourceId};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Read-only view over the destination used to resolve links and projects
#[derive(Clone)]
pub struct CorrelationStore {
    destination: Arc<dyn DestinationTracker>,
    field: String,
}

impl CorrelationStore {
    pub fn new(destination: Arc<dyn DestinationTracker>, field: impl Into<String>) -> Self {
        Self {
            destination,
            field: field.into(),
        }
    }

    /// Name of the correlation custom field
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Destination issue linked to `source_id`, if one exists
    ///
    /// Records whose projected correlation value differs from `source_id`
    /// are discarded; a record without the field in its projection is
    /// accepted as the query's own match.
    pub async fn find_destination_issue_by_source_id(
        &self,
        source_id: &SourceId,
    ) -> Result<Option<DestinationIssue>> {
        let candidates = self
            .destination
            .find_issues_by_field(&self.field, source_id.as_str())
            .await?;

        let total = candidates.len();
        let found = candidates.into_iter().find(|issue| {
            match issue.field_text(&self.field) {
                Some(value) => value == source_id.as_str(),
                None => !issue.custom_fields.iter().any(|f| f.name == self.field),
            }
        });

        match found {
            Some(ref issue) => {
                debug!(source_id = %source_id, issue = %issue.to_ref().display_id(), "Found linked issue");
            }
            None if total > 0 => {
                warn!(
                    source_id = %source_id,
                    candidates = total,
                    "Correlation query returned only non-matching issues"
                );
            }
            None => {
                debug!(source_id = %source_id, "No linked issue");
            }
        }

        Ok(found)
    }

    /// Project whose display name matches `name`, ignoring case
    pub async fn find_project_by_name(&self, name: &str) -> Result<Option<DestinationProject>> {
        let projects = self.destination.list_projects().await?;
        Ok(projects
            .into_iter()
            .find(|project| project.name.to_lowercase() == name.to_lowercase()))
    }
}
