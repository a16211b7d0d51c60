//! Bulk import results

use crate::model::{DestinationIssueRef, SourceId};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Issue created during an import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedIssue {
    pub source_id: SourceId,
    pub destination: DestinationIssueRef,
}

/// Issue that could not be imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub source_id: SourceId,
    pub title: String,
    pub error: String,
}

/// Result of a bulk import
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub project_id: String,
    pub project_name: String,
    /// Number of GitHub issues offered for import
    pub total: usize,
    pub created: Vec<ImportedIssue>,
    pub failures: Vec<ImportFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ImportReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// True when every issue was imported
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }

    /// One-line summary for CLI output
    pub fn summary(&self) -> String {
        format!(
            "Imported {}/{} issues into '{}' ({} failed) in {}ms",
            self.created_count(),
            self.total,
            self.project_name,
            self.failed_count(),
            self.duration().num_milliseconds()
        )
    }
}
