//! GitHub Issues Integration Adapter
//!
//! Read-only issue listing and webhook registration over the GitHub REST API.

use super::SourceTracker;
use crate::config::SyncConfig;
use crate::model::{SourceIssue, WebhookRef};
use crate::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Per-request timeout for paginated listing
const LIST_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-request timeout for create operations
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);
/// GitHub's maximum page size
const PAGE_SIZE: usize = 100;

/// GitHub API client
pub struct GitHubAdapter {
    client: Client,
    rest_base_url: String,
    auth_token: Option<String>,
}

/// Hook as returned by `GET /repos/{owner}/{repo}/hooks`
#[derive(Debug, Clone, Deserialize)]
struct HookResponse {
    id: u64,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    events: Vec<String>,
    config: HookConfigResponse,
}

#[derive(Debug, Clone, Deserialize)]
struct HookConfigResponse {
    #[serde(default)]
    url: Option<String>,
}

impl HookResponse {
    fn into_ref(self) -> WebhookRef {
        WebhookRef {
            id: self.id,
            url: self.config.url.unwrap_or_default(),
            events: self.events,
            active: self.active,
        }
    }
}

/// Webhook creation request
#[derive(Debug, Clone, Serialize)]
struct CreateHookRequest<'a> {
    name: &'static str,
    active: bool,
    events: [&'static str; 1],
    config: CreateHookConfig<'a>,
}

#[derive(Debug, Clone, Serialize)]
struct CreateHookConfig<'a> {
    url: &'a str,
    content_type: &'static str,
    secret: &'a str,
    insecure_ssl: &'static str,
}

impl<'a> CreateHookRequest<'a> {
    fn issues_only(target_url: &'a str, secret: &'a str) -> Self {
        Self {
            name: "web",
            active: true,
            events: ["issues"],
            config: CreateHookConfig {
                url: target_url,
                content_type: "json",
                secret,
                insecure_ssl: "0",
            },
        }
    }
}

impl GitHubAdapter {
    /// Create a new GitHub adapter
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static("gh2yt/0.3"),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/vnd.github+json"),
                );
                headers.insert(
                    "X-GitHub-Api-Version",
                    header::HeaderValue::from_static("2022-11-28"),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            rest_base_url: config.github_api_url.trim_end_matches('/').to_string(),
            auth_token: config.github_token.clone(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    fn repo_url(&self, owner: &str, repo: &str, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.rest_base_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo),
            path
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn error_for(operation: &str, response: reqwest::Response) -> SyncError {
        let status = response.status();
        let error_body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED => {
                SyncError::Auth(format!("GitHub authentication failed during {}", operation))
            }
            _ => SyncError::Source(format!(
                "GitHub {} failed: HTTP {}: {}",
                operation, status, error_body
            )),
        }
    }

    async fn list_hooks(&self, repo: &str, owner: &str) -> Result<Vec<HookResponse>> {
        let url = self.repo_url(owner, repo, "hooks");
        let request = self
            .client
            .get(&url)
            .query(&[("per_page", PAGE_SIZE.to_string())]);

        let response = self.authorize(request).timeout(LIST_TIMEOUT).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            _ => Err(Self::error_for("list hooks", response).await),
        }
    }
}

/// Drop pull requests from an issue listing page
fn retain_issues(page: Vec<SourceIssue>) -> Vec<SourceIssue> {
    page.into_iter().filter(|i| !i.is_pull_request()).collect()
}

#[async_trait]
impl SourceTracker for GitHubAdapter {
    async fn list_issues(&self, repo: &str, owner: &str) -> Result<Vec<SourceIssue>> {
        let url = self.repo_url(owner, repo, "issues");
        let mut issues = Vec::new();
        let mut page = 1u32;

        loop {
            debug!(owner = %owner, repo = %repo, page = page, "Fetching GitHub issues page");

            let request = self.client.get(&url).query(&[
                ("state", "all".to_string()),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ]);

            let response = self.authorize(request).timeout(LIST_TIMEOUT).send().await?;

            let batch: Vec<SourceIssue> = match response.status() {
                StatusCode::OK => response.json().await?,
                _ => return Err(Self::error_for("list issues", response).await),
            };

            let fetched = batch.len();
            issues.extend(retain_issues(batch));

            if fetched < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        info!(owner = %owner, repo = %repo, count = issues.len(), "GitHub issues listed");
        Ok(issues)
    }

    async fn find_webhook(
        &self,
        repo: &str,
        owner: &str,
        target_url: &str,
    ) -> Result<Option<WebhookRef>> {
        let hooks = self.list_hooks(repo, owner).await?;
        debug!(count = hooks.len(), "Fetched repository webhooks");

        Ok(hooks
            .into_iter()
            .find(|h| h.config.url.as_deref() == Some(target_url))
            .map(HookResponse::into_ref))
    }

    async fn create_webhook(
        &self,
        repo: &str,
        owner: &str,
        target_url: &str,
        secret: &str,
    ) -> Result<WebhookRef> {
        let url = self.repo_url(owner, repo, "hooks");
        let body = CreateHookRequest::issues_only(target_url, secret);

        info!(owner = %owner, repo = %repo, target = %target_url, "Creating GitHub webhook");

        let request = self.client.post(&url).json(&body);
        let response = self.authorize(request).timeout(WRITE_TIMEOUT).send().await?;

        match response.status() {
            StatusCode::CREATED => {
                let hook: HookResponse = response.json().await?;
                info!(id = hook.id, "GitHub webhook created");
                Ok(hook.into_ref())
            }
            _ => Err(Self::error_for("create hook", response).await),
        }
    }
}
