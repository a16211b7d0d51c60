//! Sync decision engine
//!
//! Decides per GitHub issue whether to create a YouTrack issue or update the
//! linked one, and runs the one-shot bulk import.

use super::correlation::CorrelationStore;
use super::locks::SourceLocks;
use super::report::{ImportFailure, ImportReport, ImportedIssue};
use super::translator::IssueTranslator;
use crate::config::SyncConfig;
use crate::integrations::DestinationTracker;
use crate::model::{DestinationIssueRef, DestinationProject, SourceIssue};
use crate::{Result, SyncError};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a single sync did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No linked issue existed; one was created
    Created(DestinationIssueRef),
    /// The linked issue was overwritten
    Updated(DestinationIssueRef),
}

impl SyncOutcome {
    pub fn issue(&self) -> &DestinationIssueRef {
        match self {
            SyncOutcome::Created(issue) | SyncOutcome::Updated(issue) => issue,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, SyncOutcome::Created(_))
    }
}

pub struct SyncEngine {
    destination: Arc<dyn DestinationTracker>,
    store: CorrelationStore,
    translator: IssueTranslator,
    locks: SourceLocks,
    import_concurrency: usize,
}

impl SyncEngine {
    pub fn new(config: &SyncConfig, destination: Arc<dyn DestinationTracker>) -> Self {
        Self {
            store: CorrelationStore::new(destination.clone(), config.correlation_field.clone()),
            translator: IssueTranslator::new(config.correlation_field.clone()),
            destination,
            locks: SourceLocks::new(),
            import_concurrency: config.import.concurrency.max(1),
        }
    }

    pub fn store(&self) -> &CorrelationStore {
        &self.store
    }

    /// Mirror one GitHub issue snapshot into the project named `project_name`
    ///
    /// Replays converge: the first call for an id creates, later calls
    /// overwrite summary, description and State. Calls for the same id are
    /// serialized.
    pub async fn sync_issue(&self, issue: &SourceIssue, project_name: &str) -> Result<SyncOutcome> {
        let _guard = self.locks.acquire(&issue.id).await;

        let linked = self.store.find_destination_issue_by_source_id(&issue.id).await?;

        let project = self
            .store
            .find_project_by_name(project_name)
            .await?
            .ok_or_else(|| SyncError::ProjectNotProvisioned(project_name.to_string()))?;

        match linked {
            None => {
                let payload = self.translator.to_destination_record(&project.id, issue)?;
                let created = self.destination.create_issue(&payload).await?;
                info!(
                    source_id = %issue.id,
                    issue = %created.display_id(),
                    project = %project.name,
                    "Created linked issue"
                );
                Ok(SyncOutcome::Created(created))
            }
            Some(existing) => {
                let update = self.translator.to_destination_update(issue)?;
                let updated = self.destination.update_issue(&existing.id, &update).await?;
                info!(
                    source_id = %issue.id,
                    issue = %updated.display_id(),
                    state = %issue.state,
                    "Updated linked issue"
                );
                Ok(SyncOutcome::Updated(updated))
            }
        }
    }

    /// Create one issue per GitHub issue under `project`
    ///
    /// Runs only the create path, so it must be used before any links
    /// exist. Failures are collected per item and never abort the batch.
    pub async fn bulk_import(
        &self,
        project: &DestinationProject,
        issues: Vec<SourceIssue>,
    ) -> ImportReport {
        let started_at = Utc::now();
        let total = issues.len();
        let project_id = project.id.as_str();

        info!(
            project = %project.name,
            total = total,
            concurrency = self.import_concurrency,
            "Starting bulk import"
        );

        let results: Vec<(SourceIssue, Result<DestinationIssueRef>)> = stream::iter(issues)
            .map(|issue| async move {
                let result = self.create_linked(project_id, &issue).await;
                (issue, result)
            })
            .buffer_unordered(self.import_concurrency)
            .collect()
            .await;

        let mut created = Vec::new();
        let mut failures = Vec::new();
        for (issue, result) in results {
            match result {
                Ok(destination) => created.push(ImportedIssue {
                    source_id: issue.id,
                    destination,
                }),
                Err(e) => {
                    warn!(source_id = %issue.id, title = %issue.title, error = %e, "Import failed for issue");
                    failures.push(ImportFailure {
                        source_id: issue.id,
                        title: issue.title,
                        error: e.to_string(),
                    });
                }
            }
        }
        created.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        failures.sort_by(|a, b| a.source_id.cmp(&b.source_id));

        let report = ImportReport {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            total,
            created,
            failures,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            project = %report.project_name,
            created = report.created_count(),
            failed = report.failed_count(),
            "Bulk import complete"
        );
        report
    }

    async fn create_linked(&self, project_id: &str, issue: &SourceIssue) -> Result<DestinationIssueRef> {
        let payload = self.translator.to_destination_record(project_id, issue)?;
        let created = self.destination.create_issue(&payload).await?;
        debug!(source_id = %issue.id, issue = %created.display_id(), "Imported issue");
        Ok(created)
    }
}
