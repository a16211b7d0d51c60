//! In-memory trackers for unit tests
//!
//! `MemoryDestination` behaves like a small YouTrack: projects, one global
//! namespace of custom fields, per-project attachments and issues. It
//! reports collisions with the same structured reasons the REST adapter
//! produces, and refuses issues carrying a custom field that is not
//! attached to the target project.

use crate::config::SyncConfig;
use crate::error::{DestinationFailure, FailureReason};
use crate::integrations::{DestinationTracker, SourceTracker};
use crate::model::destination::ProjectName;
use crate::model::{
    CustomField, DestinationIssue, DestinationIssuePayload, DestinationIssueRef,
    DestinationProject, FieldId, FieldValue, IssueFieldSnapshot, IssueUpdate, NewProject,
    SourceIssue, WebhookRef,
};
use crate::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn test_config() -> SyncConfig {
    SyncConfig {
        repo_owner: "acme".to_string(),
        repo_name: "widgets".to_string(),
        destination_base_url: "https://acme.youtrack.cloud/api".to_string(),
        destination_token: "perm:test".to_string(),
        webhook_target_url: "https://hooks.acme.dev/issue-updated".to_string(),
        webhook_secret: "s3cret".to_string(),
        ..SyncConfig::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListProjects,
    CreateProject,
    CreateCustomField,
    ListCustomFields,
    AttachField,
    FindIssues,
    CreateIssue,
    UpdateIssue,
}

#[derive(Debug, Clone)]
pub struct StoredIssue {
    pub id: String,
    pub id_readable: String,
    pub project_id: String,
    pub summary: String,
    pub description: String,
    pub fields: Vec<(String, String)>,
}

impl StoredIssue {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_field(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }
}

#[derive(Default)]
struct State {
    projects: Vec<DestinationProject>,
    fields: Vec<CustomField>,
    attachments: HashSet<(String, FieldId)>,
    issues: Vec<StoredIssue>,
    next_id: u32,
    calls: HashMap<Operation, usize>,
    failures: HashMap<Operation, DestinationFailure>,
    rejected_summaries: HashSet<String>,
    search_override: Option<Vec<DestinationIssue>>,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, op: Operation) -> Result<()> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.remove(&op) {
            Some(failure) => Err(failure.into()),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryDestination {
    state: Mutex<State>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_project(&self, name: &str, short_name: &str) -> DestinationProject {
        let mut state = self.state();
        let id = format!("0-{}", state.next_id());
        let project = DestinationProject {
            id,
            name: name.to_string(),
            short_name: short_name.to_string(),
        };
        state.projects.push(project.clone());
        project
    }

    /// Fail the next call of `op` with `failure`
    pub fn fail_next(&self, op: Operation, failure: DestinationFailure) {
        self.state().failures.insert(op, failure);
    }

    /// Refuse issue creation for this exact summary
    pub fn reject_summary(&self, summary: &str) {
        self.state().rejected_summaries.insert(summary.to_string());
    }

    /// Return these records from every issue search
    pub fn set_search_override(&self, issues: Vec<DestinationIssue>) {
        self.state().search_override = Some(issues);
    }

    pub fn calls(&self, op: Operation) -> usize {
        self.state().calls.get(&op).copied().unwrap_or_default()
    }

    pub fn field_count(&self) -> usize {
        self.state().fields.len()
    }

    pub fn is_attached(&self, project_id: &str, field_name: &str) -> bool {
        let state = self.state();
        state
            .fields
            .iter()
            .find(|f| f.name == field_name)
            .is_some_and(|f| {
                state
                    .attachments
                    .contains(&(project_id.to_string(), f.id.clone()))
            })
    }

    pub fn issues(&self) -> Vec<StoredIssue> {
        self.state().issues.clone()
    }

    pub fn issues_with_field(&self, name: &str, value: &str) -> Vec<StoredIssue> {
        self.issues()
            .into_iter()
            .filter(|issue| issue.field(name) == Some(value))
            .collect()
    }

    fn snapshot(state: &State, issue: &StoredIssue) -> DestinationIssue {
        let project = state
            .projects
            .iter()
            .find(|p| p.id == issue.project_id)
            .map(|p| ProjectName {
                name: p.name.clone(),
            });
        DestinationIssue {
            id: issue.id.clone(),
            id_readable: Some(issue.id_readable.clone()),
            summary: Some(issue.summary.clone()),
            description: Some(issue.description.clone()),
            project,
            custom_fields: issue
                .fields
                .iter()
                .map(|(name, value)| IssueFieldSnapshot {
                    name: name.clone(),
                    value: Some(FieldValue::Text(value.clone())),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl DestinationTracker for MemoryDestination {
    async fn list_projects(&self) -> Result<Vec<DestinationProject>> {
        let mut state = self.state();
        state.record(Operation::ListProjects)?;
        Ok(state.projects.clone())
    }

    async fn create_project(&self, project: &NewProject) -> Result<DestinationProject> {
        let mut state = self.state();
        state.record(Operation::CreateProject)?;
        if state.projects.iter().any(|p| p.short_name == project.short_name) {
            return Err(DestinationFailure::new(
                400,
                Some("Bad Request".to_string()),
                Some(format!("Project with short name {} already exists", project.short_name)),
            )
            .into());
        }
        let id = format!("0-{}", state.next_id());
        let created = DestinationProject {
            id,
            name: project.name.clone(),
            short_name: project.short_name.clone(),
        };
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn create_custom_field(&self, name: &str) -> Result<CustomField> {
        let mut state = self.state();
        state.record(Operation::CreateCustomField)?;
        if state.fields.iter().any(|f| f.name == name) {
            return Err(DestinationFailure::with_reason(
                400,
                FailureReason::AlreadyExists,
                format!("Custom field {} already exists", name),
            )
            .into());
        }
        let field = CustomField {
            id: FieldId::new(format!("58-{}", state.next_id())),
            name: name.to_string(),
        };
        state.fields.push(field.clone());
        Ok(field)
    }

    async fn list_custom_fields(&self) -> Result<Vec<CustomField>> {
        let mut state = self.state();
        state.record(Operation::ListCustomFields)?;
        Ok(state.fields.clone())
    }

    async fn attach_field(&self, project_id: &str, field_id: &FieldId) -> Result<()> {
        let mut state = self.state();
        state.record(Operation::AttachField)?;
        if !state.projects.iter().any(|p| p.id == project_id) {
            return Err(DestinationFailure::with_reason(404, FailureReason::NotFound, "No project").into());
        }
        if !state.attachments.insert((project_id.to_string(), field_id.clone())) {
            return Err(DestinationFailure::with_reason(
                400,
                FailureReason::AlreadyAttached,
                "Field is already attached to project",
            )
            .into());
        }
        Ok(())
    }

    async fn find_issues_by_field(&self, field: &str, value: &str) -> Result<Vec<DestinationIssue>> {
        let found = {
            let mut state = self.state();
            state.record(Operation::FindIssues)?;
            match state.search_override {
                Some(ref issues) => issues.clone(),
                None => state
                    .issues
                    .iter()
                    .filter(|issue| issue.field(field) == Some(value))
                    .map(|issue| Self::snapshot(&state, issue))
                    .collect(),
            }
        };
        // Let concurrent syncs interleave between lookup and write
        tokio::task::yield_now().await;
        Ok(found)
    }

    async fn create_issue(&self, payload: &DestinationIssuePayload) -> Result<DestinationIssueRef> {
        let mut state = self.state();
        state.record(Operation::CreateIssue)?;

        if state.rejected_summaries.contains(&payload.summary) {
            return Err(DestinationFailure::new(400, None, Some("Issue rejected".to_string())).into());
        }

        let project = state
            .projects
            .iter()
            .find(|p| p.id == payload.project.id)
            .cloned()
            .ok_or_else(|| DestinationFailure::with_reason(404, FailureReason::NotFound, "No project"))?;

        for field in &payload.custom_fields {
            if let crate::model::IssueCustomField::Simple { name, .. } = field {
                let attached = state
                    .fields
                    .iter()
                    .find(|f| &f.name == name)
                    .is_some_and(|f| state.attachments.contains(&(project.id.clone(), f.id.clone())));
                if !attached {
                    return Err(DestinationFailure::new(
                        400,
                        None,
                        Some(format!("Unknown custom field {}", name)),
                    )
                    .into());
                }
            }
        }

        let n = state.next_id();
        let issue = StoredIssue {
            id: format!("2-{}", n),
            id_readable: format!("{}-{}", project.short_name, n),
            project_id: project.id.clone(),
            summary: payload.summary.clone(),
            description: payload.description.clone(),
            fields: payload
                .custom_fields
                .iter()
                .map(|f| (f.name().to_string(), f.value_str().to_string()))
                .collect(),
        };
        let created = DestinationIssueRef {
            id: issue.id.clone(),
            id_readable: Some(issue.id_readable.clone()),
        };
        state.issues.push(issue);
        Ok(created)
    }

    async fn update_issue(&self, issue_id: &str, update: &IssueUpdate) -> Result<DestinationIssueRef> {
        let mut state = self.state();
        state.record(Operation::UpdateIssue)?;

        let issue = state
            .issues
            .iter_mut()
            .find(|i| i.id == issue_id)
            .ok_or_else(|| DestinationFailure::with_reason(404, FailureReason::NotFound, "No issue"))?;

        issue.summary = update.summary.clone();
        issue.description = update.description.clone();
        for field in &update.custom_fields {
            issue.set_field(field.name(), field.value_str());
        }

        Ok(DestinationIssueRef {
            id: issue.id.clone(),
            id_readable: Some(issue.id_readable.clone()),
        })
    }
}

/// GitHub stand-in holding a fixed issue list and registered hooks
#[derive(Default)]
pub struct MemorySource {
    issues: Vec<SourceIssue>,
    hooks: Mutex<Vec<WebhookRef>>,
    list_calls: Mutex<usize>,
}

impl MemorySource {
    pub fn new(issues: Vec<SourceIssue>) -> Self {
        Self {
            issues,
            ..Self::default()
        }
    }

    pub fn hooks(&self) -> Vec<WebhookRef> {
        self.hooks.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }
}

#[async_trait]
impl SourceTracker for MemorySource {
    async fn list_issues(&self, _repo: &str, _owner: &str) -> Result<Vec<SourceIssue>> {
        *self.list_calls.lock().unwrap() += 1;
        Ok(self
            .issues
            .iter()
            .filter(|i| !i.is_pull_request())
            .cloned()
            .collect())
    }

    async fn find_webhook(
        &self,
        _repo: &str,
        _owner: &str,
        target_url: &str,
    ) -> Result<Option<WebhookRef>> {
        Ok(self
            .hooks
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.url == target_url)
            .cloned())
    }

    async fn create_webhook(
        &self,
        _repo: &str,
        _owner: &str,
        target_url: &str,
        _secret: &str,
    ) -> Result<WebhookRef> {
        let mut hooks = self.hooks.lock().unwrap();
        let hook = WebhookRef {
            id: hooks.len() as u64 + 1,
            url: target_url.to_string(),
            events: vec!["issues".to_string()],
            active: true,
        };
        hooks.push(hook.clone());
        Ok(hook)
    }
}
