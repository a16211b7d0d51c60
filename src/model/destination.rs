//! YouTrack-side shapes
//!
//! Outbound payloads serialize directly to the YouTrack REST format, including
//! the `$type` discriminators on custom fields. Inbound records are read
//! leniently since the projection decides which attributes come back.

use serde::{Deserialize, Serialize};
use std::fmt;

/// YouTrack project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationProject {
    pub id: String,
    pub name: String,
    #[serde(rename = "shortName", default)]
    pub short_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectLeader {
    pub login: String,
}

/// Project creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProject {
    pub name: String,
    #[serde(rename = "shortName")]
    pub short_name: String,
    pub leader: ProjectLeader,
}

impl NewProject {
    pub fn new(
        name: impl Into<String>,
        short_name: impl Into<String>,
        leader: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
            leader: ProjectLeader {
                login: leader.into(),
            },
        }
    }
}

/// Id of a destination-wide custom field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: FieldId,
    pub name: String,
}

/// Destination issue state as written by the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Fixed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "Open",
            IssueState::Fixed => "Fixed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type")]
pub struct StateBundleElement {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type")]
pub struct EnumBundleElement {
    pub name: String,
}

/// Custom field value on an outbound issue payload
///
/// Each variant serializes with the `$type` YouTrack expects for that kind
/// of field, and carries only the value shape that kind accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type")]
pub enum IssueCustomField {
    #[serde(rename = "StateIssueCustomField")]
    State {
        name: String,
        value: StateBundleElement,
    },
    #[serde(rename = "SingleEnumIssueCustomField")]
    SingleEnum {
        name: String,
        value: EnumBundleElement,
    },
    #[serde(rename = "SimpleIssueCustomField")]
    Simple { name: String, value: String },
}

impl IssueCustomField {
    pub fn state(name: impl Into<String>, state: IssueState) -> Self {
        IssueCustomField::State {
            name: name.into(),
            value: StateBundleElement {
                name: state.as_str().to_string(),
            },
        }
    }

    pub fn single_enum(name: impl Into<String>, value: impl Into<String>) -> Self {
        IssueCustomField::SingleEnum {
            name: name.into(),
            value: EnumBundleElement { name: value.into() },
        }
    }

    pub fn simple(name: impl Into<String>, value: impl Into<String>) -> Self {
        IssueCustomField::Simple {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            IssueCustomField::State { name, .. }
            | IssueCustomField::SingleEnum { name, .. }
            | IssueCustomField::Simple { name, .. } => name,
        }
    }

    /// Plain value regardless of field kind
    pub fn value_str(&self) -> &str {
        match self {
            IssueCustomField::State { value, .. } => &value.name,
            IssueCustomField::SingleEnum { value, .. } => &value.name,
            IssueCustomField::Simple { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRef {
    pub id: String,
}

/// Issue creation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationIssuePayload {
    pub project: ProjectRef,
    pub summary: String,
    pub description: String,
    #[serde(rename = "customFields")]
    pub custom_fields: Vec<IssueCustomField>,
}

impl DestinationIssuePayload {
    pub fn field(&self, name: &str) -> Option<&IssueCustomField> {
        self.custom_fields.iter().find(|f| f.name() == name)
    }
}

/// Update payload: only the attributes that follow the source issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueUpdate {
    pub summary: String,
    pub description: String,
    #[serde(rename = "customFields")]
    pub custom_fields: Vec<IssueCustomField>,
}

impl IssueUpdate {
    pub fn field(&self, name: &str) -> Option<&IssueCustomField> {
        self.custom_fields.iter().find(|f| f.name() == name)
    }
}

/// Id pair returned by create/update calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationIssueRef {
    pub id: String,
    #[serde(rename = "idReadable", default)]
    pub id_readable: Option<String>,
}

impl DestinationIssueRef {
    /// Human-readable id when known (`WID-12`), otherwise the internal id
    pub fn display_id(&self) -> &str {
        self.id_readable.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectName {
    pub name: String,
}

/// Custom field value as read back from YouTrack
///
/// Enum and state values come back as objects, simple fields as plain
/// strings; anything else is kept raw.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Named { name: String },
    Text(String),
    Raw(serde_json::Value),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Named { name } => Some(name),
            FieldValue::Text(text) => Some(text),
            FieldValue::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IssueFieldSnapshot {
    pub name: String,
    #[serde(default)]
    pub value: Option<FieldValue>,
}

/// Issue record returned by a YouTrack issue query
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DestinationIssue {
    pub id: String,
    #[serde(rename = "idReadable", default)]
    pub id_readable: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project: Option<ProjectName>,
    #[serde(rename = "customFields", default)]
    pub custom_fields: Vec<IssueFieldSnapshot>,
}

impl DestinationIssue {
    /// Text value of a custom field, if it is part of the projection
    pub fn field_text(&self, name: &str) -> Option<&str> {
        self.custom_fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.value.as_ref())
            .and_then(FieldValue::as_text)
    }

    pub fn to_ref(&self) -> DestinationIssueRef {
        DestinationIssueRef {
            id: self.id.clone(),
            id_readable: self.id_readable.clone(),
        }
    }
}
