//! YouTrack Integration Adapter
//!
//! Project, custom field and issue operations over the YouTrack REST API.
//! Non-success responses are parsed into a [`DestinationFailure`] so the
//! provisioning code can branch on the failure reason instead of status
//! text.

use super::DestinationTracker;
use crate::config::SyncConfig;
use crate::error::DestinationFailure;
use crate::model::{
    CustomField, DestinationIssue, DestinationIssuePayload, DestinationIssueRef,
    DestinationProject, FieldId, IssueUpdate, NewProject,
};
use crate::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Query operation timeout
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Single-entity listing timeout
const GET_TIMEOUT: Duration = Duration::from_secs(10);
/// Create/update operation timeout
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

const PROJECT_FIELDS: &str = "id,name,shortName";
const CUSTOM_FIELD_FIELDS: &str = "id,name";
const ISSUE_REF_FIELDS: &str = "id,idReadable";
/// Projection used by correlation lookups
pub const ISSUE_FIELDS: &str =
    "id,idReadable,summary,description,project(name),customFields(name,value(name))";

/// YouTrack API client
pub struct YouTrackAdapter {
    client: Client,
    base_url: String,
}

/// Error body YouTrack returns on failed requests
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Serialize)]
struct FieldTypeRef {
    id: &'static str,
}

/// Destination-wide custom field creation request
#[derive(Debug, Serialize)]
struct NewCustomField<'a> {
    name: &'a str,
    #[serde(rename = "fieldType")]
    field_type: FieldTypeRef,
}

#[derive(Debug, Serialize)]
struct FieldRef<'a> {
    id: &'a str,
}

/// Attach request for a project custom field
#[derive(Debug, Serialize)]
struct AttachField<'a> {
    #[serde(rename = "$type")]
    kind: &'static str,
    field: FieldRef<'a>,
}

impl YouTrackAdapter {
    /// Create a new YouTrack adapter
    ///
    /// Returns an error if the token is not a valid header value or the
    /// HTTP client cannot be created.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let mut auth = header::HeaderValue::from_str(&format!(
            "Bearer {}",
            config.destination_token
        ))
        .map_err(|e| SyncError::Config(format!("Invalid YouTrack token: {}", e)))?;
        auth.set_sensitive(true);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(header::AUTHORIZATION, auth);
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/json"),
                );
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static("gh2yt/0.3"),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            base_url: config.destination_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Turn a failed response into a structured destination error
    async fn failure(operation: &str, response: reqwest::Response) -> SyncError {
        let status = response.status();
        let error_body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&error_body).unwrap_or_default();

        let description = parsed
            .error_description
            .or_else(|| (!error_body.trim().is_empty()).then(|| error_body.clone()));
        let failure = DestinationFailure::new(status.as_u16(), parsed.error, description);

        debug!(
            operation = operation,
            status = status.as_u16(),
            reason = %failure.reason,
            "YouTrack request failed"
        );
        SyncError::Destination(failure)
    }
}

/// YouTrack query matching issues whose `field` holds exactly `value`
///
/// Values containing whitespace or query syntax are wrapped in braces, which
/// is how YouTrack quotes a literal field value.
pub fn correlation_query(field: &str, value: &str) -> String {
    let needs_braces = |s: &str| {
        s.chars()
            .any(|c| c.is_whitespace() || matches!(c, ':' | '{' | '}' | '#' | '-' | ','))
    };
    let quote = |s: &str| {
        if needs_braces(s) {
            format!("{{{}}}", s)
        } else {
            s.to_string()
        }
    };
    format!("{}: {}", quote(field), quote(value))
}

#[async_trait]
impl DestinationTracker for YouTrackAdapter {
    async fn list_projects(&self) -> Result<Vec<DestinationProject>> {
        let response = self
            .client
            .get(self.url("admin/projects"))
            .query(&[("fields", PROJECT_FIELDS), ("$top", "-1")])
            .timeout(GET_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let projects: Vec<DestinationProject> = response.json().await?;
                debug!(count = projects.len(), "Listed YouTrack projects");
                Ok(projects)
            }
            _ => Err(Self::failure("list projects", response).await),
        }
    }

    async fn create_project(&self, project: &NewProject) -> Result<DestinationProject> {
        info!(
            name = %project.name,
            short_name = %project.short_name,
            leader = %project.leader.login,
            "Creating YouTrack project"
        );

        let response = self
            .client
            .post(self.url("admin/projects"))
            .query(&[("fields", PROJECT_FIELDS)])
            .json(project)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(response.json().await?),
            _ => Err(Self::failure("create project", response).await),
        }
    }

    async fn create_custom_field(&self, name: &str) -> Result<CustomField> {
        let body = NewCustomField {
            name,
            field_type: FieldTypeRef { id: "string" },
        };

        let response = self
            .client
            .post(self.url("admin/customFieldSettings/customFields"))
            .query(&[("fields", CUSTOM_FIELD_FIELDS)])
            .json(&body)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let field: CustomField = response.json().await?;
                info!(name = %field.name, id = %field.id, "Created YouTrack custom field");
                Ok(field)
            }
            _ => Err(Self::failure("create custom field", response).await),
        }
    }

    async fn list_custom_fields(&self) -> Result<Vec<CustomField>> {
        let response = self
            .client
            .get(self.url("admin/customFieldSettings/customFields"))
            .query(&[("fields", CUSTOM_FIELD_FIELDS), ("$top", "-1")])
            .timeout(GET_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            _ => Err(Self::failure("list custom fields", response).await),
        }
    }

    async fn attach_field(&self, project_id: &str, field_id: &FieldId) -> Result<()> {
        let body = AttachField {
            kind: "SimpleProjectCustomField",
            field: FieldRef {
                id: field_id.as_str(),
            },
        };
        let path = format!(
            "admin/projects/{}/customFields",
            urlencoding::encode(project_id)
        );

        let response = self
            .client
            .post(self.url(&path))
            .query(&[("fields", "id")])
            .json(&body)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                info!(project = %project_id, field = %field_id, "Attached custom field to project");
                Ok(())
            }
            _ => Err(Self::failure("attach custom field", response).await),
        }
    }

    async fn find_issues_by_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<DestinationIssue>> {
        let query = correlation_query(field, value);
        debug!(query = %query, "Searching YouTrack issues");

        let response = self
            .client
            .get(self.url("issues"))
            .query(&[("query", query.as_str()), ("fields", ISSUE_FIELDS)])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            _ => Err(Self::failure("search issues", response).await),
        }
    }

    async fn create_issue(&self, payload: &DestinationIssuePayload) -> Result<DestinationIssueRef> {
        let response = self
            .client
            .post(self.url("issues"))
            .query(&[("fields", ISSUE_REF_FIELDS)])
            .json(payload)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let created: DestinationIssueRef = response.json().await?;
                debug!(issue = %created.display_id(), "Created YouTrack issue");
                Ok(created)
            }
            _ => Err(Self::failure("create issue", response).await),
        }
    }

    async fn update_issue(
        &self,
        issue_id: &str,
        update: &IssueUpdate,
    ) -> Result<DestinationIssueRef> {
        let path = format!("issues/{}", urlencoding::encode(issue_id));

        let response = self
            .client
            .post(self.url(&path))
            .query(&[("fields", ISSUE_REF_FIELDS)])
            .json(update)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::NOT_FOUND => {
                warn!(issue = %issue_id, "YouTrack issue vanished before update");
                Err(Self::failure("update issue", response).await)
            }
            _ => Err(Self::failure("update issue", response).await),
        }
    }
}
