//! One-time startup work
//!
//! Registers (or reuses) the GitHub webhook, then imports the repository's
//! issues into a freshly provisioned project. When the project already
//! exists the import is skipped, since links may already be in place, but
//! the correlation field is still ensured.
//!
//! [`Bootstrap::run`] executes at most once per process; later calls return
//! the first successful summary.

use super::engine::SyncEngine;
use super::provisioning::Provisioner;
use super::report::ImportReport;
use crate::config::SyncConfig;
use crate::integrations::{DestinationTracker, SourceTracker};
use crate::model::{DestinationProject, FieldId, WebhookRef};
use crate::{Result, SyncError};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Outcome of webhook registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookRegistration {
    /// A hook with the same target URL was already registered
    Reused(WebhookRef),
    Created(WebhookRef),
}

impl WebhookRegistration {
    pub fn webhook(&self) -> &WebhookRef {
        match self {
            WebhookRegistration::Reused(hook) | WebhookRegistration::Created(hook) => hook,
        }
    }
}

/// Outcome of the import step
#[derive(Debug, Clone)]
pub enum ImportOutcome {
    /// Project was created and the issues imported into it
    Imported {
        field_id: FieldId,
        report: ImportReport,
    },
    /// Project already existed; nothing was imported
    Skipped {
        project: DestinationProject,
        field_id: FieldId,
    },
}

#[derive(Debug, Clone)]
pub struct BootstrapSummary {
    pub webhook: WebhookRegistration,
    pub import: ImportOutcome,
}

pub struct Bootstrap {
    config: SyncConfig,
    source: Arc<dyn SourceTracker>,
    provisioner: Provisioner,
    engine: Arc<SyncEngine>,
    summary: OnceCell<BootstrapSummary>,
}

impl Bootstrap {
    pub fn new(
        config: &SyncConfig,
        source: Arc<dyn SourceTracker>,
        destination: Arc<dyn DestinationTracker>,
        engine: Arc<SyncEngine>,
    ) -> Self {
        Self {
            config: config.clone(),
            source,
            provisioner: Provisioner::new(config, destination),
            engine,
            summary: OnceCell::new(),
        }
    }

    /// Register the webhook and import, once per process
    pub async fn run(&self) -> Result<&BootstrapSummary> {
        self.summary
            .get_or_try_init(|| async {
                let webhook = self.ensure_webhook().await?;
                let import = self.import_or_skip().await?;
                Ok::<_, SyncError>(BootstrapSummary { webhook, import })
            })
            .await
    }

    /// Summary of a completed run, if any
    pub fn summary(&self) -> Option<&BootstrapSummary> {
        self.summary.get()
    }

    /// Reuse the webhook pointing at the configured target, or create it
    pub async fn ensure_webhook(&self) -> Result<WebhookRegistration> {
        let (owner, repo) = (&self.config.repo_owner, &self.config.repo_name);
        let target = &self.config.webhook_target_url;

        if let Some(hook) = self.source.find_webhook(repo, owner, target).await? {
            info!(id = hook.id, target = %target, "Reusing existing webhook");
            return Ok(WebhookRegistration::Reused(hook));
        }

        let hook = self
            .source
            .create_webhook(repo, owner, target, &self.config.webhook_secret)
            .await?;
        info!(id = hook.id, target = %target, "Webhook registered");
        Ok(WebhookRegistration::Created(hook))
    }

    /// Provision and import, unless the project already exists
    pub async fn import_or_skip(&self) -> Result<ImportOutcome> {
        let name = self.config.project_name();

        if let Some(project) = self.provisioner.store().find_project_by_name(name).await? {
            let field_id = self.provisioner.ensure_correlation_field(&project.id).await?;
            info!(project = %project.name, "Project exists, skipping import");
            return Ok(ImportOutcome::Skipped { project, field_id });
        }

        let project = self
            .provisioner
            .ensure_project(name, &self.config.project_short_code())
            .await?;
        let field_id = self.provisioner.ensure_correlation_field(&project.id).await?;

        let issues = self
            .source
            .list_issues(&self.config.repo_name, &self.config.repo_owner)
            .await?;
        let report = self.engine.bulk_import(&project, issues).await;

        Ok(ImportOutcome::Imported { field_id, report })
    }
}
