//! Destination provisioning
//!
//! Creates the YouTrack project for a repository and makes sure the
//! correlation field exists and is attached to it. Both steps are safe to
//! repeat: "already exists" and "already attached" collisions count as
//! success, every other failure is propagated.

use super::correlation::CorrelationStore;
use crate::config::SyncConfig;
use crate::error::FailureReason;
use crate::integrations::DestinationTracker;
use crate::model::{DestinationProject, FieldId, NewProject};
use crate::{Result, SyncError};
use std::sync::Arc;
use tracing::{debug, info};

pub struct Provisioner {
    destination: Arc<dyn DestinationTracker>,
    store: CorrelationStore,
    leader: String,
}

impl Provisioner {
    pub fn new(config: &SyncConfig, destination: Arc<dyn DestinationTracker>) -> Self {
        Self {
            store: CorrelationStore::new(destination.clone(), config.correlation_field.clone()),
            destination,
            leader: config.project.leader.clone(),
        }
    }

    pub fn store(&self) -> &CorrelationStore {
        &self.store
    }

    /// Existing project named `name`, or a newly created one
    pub async fn ensure_project(&self, name: &str, short_code: &str) -> Result<DestinationProject> {
        if let Some(project) = self.store.find_project_by_name(name).await? {
            debug!(project = %project.name, id = %project.id, "Project already exists");
            return Ok(project);
        }

        let project = self
            .destination
            .create_project(&NewProject::new(name, short_code, self.leader.as_str()))
            .await?;

        info!(
            project = %project.name,
            id = %project.id,
            short_name = %project.short_name,
            "Project created"
        );
        Ok(project)
    }

    /// Make sure the correlation field exists and is attached to `project_id`
    pub async fn ensure_correlation_field(&self, project_id: &str) -> Result<FieldId> {
        let name = self.store.field();

        let field_id = match self.destination.create_custom_field(name).await {
            Ok(field) => field.id,
            Err(e) if e.destination_reason() == Some(FailureReason::AlreadyExists) => {
                debug!(field = %name, "Custom field already exists, looking it up");
                self.existing_field_id(name).await?
            }
            Err(e) => return Err(e),
        };

        match self.destination.attach_field(project_id, &field_id).await {
            Ok(()) => {}
            Err(e) if e.destination_reason() == Some(FailureReason::AlreadyAttached) => {
                debug!(field = %name, project = %project_id, "Custom field already attached");
            }
            Err(e) => return Err(e),
        }

        info!(field = %name, id = %field_id, project = %project_id, "Correlation field ready");
        Ok(field_id)
    }

    async fn existing_field_id(&self, name: &str) -> Result<FieldId> {
        self.destination
            .list_custom_fields()
            .await?
            .into_iter()
            .find(|field| field.name == name)
            .map(|field| field.id)
            .ok_or_else(|| {
                SyncError::Integration(format!(
                    "Custom field '{}' reported as existing but not found",
                    name
                ))
            })
    }
}
