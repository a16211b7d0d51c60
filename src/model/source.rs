//! GitHub-side issue shapes
//!
//! These mirror the subset of the GitHub REST issue object that the mirror
//! reads. Webhook deliveries and the issue listing API share the same shape.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stable GitHub issue identifier
///
/// GitHub sends numeric ids, but the correlation value stored in YouTrack is
/// a string, so the id is normalized to its string form on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for SourceId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SourceId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => SourceId::from(n),
            RawId::Text(s) => SourceId(s),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUser {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLabel {
    pub name: String,
}

/// GitHub issue snapshot as delivered at event time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceIssue {
    pub id: SourceId,
    /// Repository-local issue number (`#12`)
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    /// `open` or `closed` as reported by GitHub
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default)]
    pub assignee: Option<SourceUser>,
    #[serde(default)]
    pub labels: Vec<SourceLabel>,
    /// Present only when the item is a pull request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

fn default_state() -> String {
    "open".to_string()
}

impl SourceIssue {
    pub fn new(id: impl Into<SourceId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: None,
            title: title.into(),
            body: None,
            state: default_state(),
            assignee: None,
            labels: Vec::new(),
            pull_request: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn with_number(mut self, number: u64) -> Self {
        self.number = Some(number);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.state == "closed"
    }

    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Registered repository webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRef {
    pub id: u64,
    /// Delivery URL the hook posts to
    pub url: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub active: bool,
}

/// Body of an `issues` webhook delivery
#[derive(Debug, Clone, Deserialize)]
pub struct IssueEvent {
    pub action: String,
    pub issue: SourceIssue,
}

impl IssueEvent {
    /// Actions that leave nothing to mirror on the destination side
    pub fn is_terminal_removal(&self) -> bool {
        matches!(self.action.as_str(), "deleted" | "transferred")
    }
}
