//! Canonical record types.
//!
//! Every record carries its store key in `id` and, once it has been read back
//! from or stamped by the store, its revision token in `rev`. Fields the
//! canonical schema does not name are preserved in `extra`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Saved-request flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RequestType {
    #[default]
    Saved,
    History,
    GoogleDrive,
}

impl RequestType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::History => "history",
            Self::GoogleDrive => "google-drive",
        }
    }

    /// Parse a source-file type tag. Unknown tags are treated as saved.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "history" => Self::History,
            "google-drive" | "drive" => Self::GoogleDrive,
            _ => Self::Saved,
        }
    }
}

/// One `{name, value, enabled}` row of a headers/query/url-encoded model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParamItem {
    pub name: String,
    pub value: String,
    pub enabled: bool,
}

/// One multipart form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MultipartItem {
    pub name: String,
    pub value: String,
    pub enabled: bool,
    pub is_file: bool,
}

/// A saved request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub name: String,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: String,
    #[serde(default)]
    pub payload: String,
    pub created: i64,
    pub updated: i64,
    #[serde(rename = "type", default)]
    pub request_type: RequestType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers_model: Option<Vec<ParamItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_model: Option<Vec<ParamItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_encoded_model: Option<Vec<ParamItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multipart: Option<Vec<MultipartItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestRecord {
    /// A saved request with canonical defaults for everything but the key.
    #[must_use]
    pub fn new(id: impl Into<String>, now: i64) -> Self {
        Self {
            id: id.into(),
            rev: None,
            name: DEFAULT_NAME.to_string(),
            url: DEFAULT_URL.to_string(),
            method: DEFAULT_METHOD.to_string(),
            headers: String::new(),
            payload: String::new(),
            created: now,
            updated: now,
            request_type: RequestType::Saved,
            projects: Vec::new(),
            headers_model: None,
            query_model: None,
            url_encoded_model: None,
            multipart: None,
            description: None,
            drive_id: None,
            extra: Map::new(),
        }
    }
}

/// A project (folder of saved requests).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created: i64,
    pub updated: i64,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub requests: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: i64) -> Self {
        Self {
            id: id.into(),
            rev: None,
            name: name.into(),
            description: None,
            created: now,
            updated: now,
            order: 0,
            requests: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// A history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HistoryRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: String,
    #[serde(default)]
    pub payload: String,
    pub created: i64,
    pub updated: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An environment variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VariableRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub environment: String,
    pub variable: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named block of headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HeaderSetRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub name: String,
    #[serde(default)]
    pub headers: String,
    pub created: i64,
    pub updated: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Key/value shaped entity (cookie, URL history, auth data, host rule).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SimpleRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Environment name derived from imported variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnvironmentRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub name: String,
    pub created: i64,
}

pub const DEFAULT_NAME: &str = "unnamed";
pub const DEFAULT_URL: &str = "http://";
pub const DEFAULT_METHOD: &str = "GET";
