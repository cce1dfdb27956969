//! The canonical import bundle.

use crate::model::records::{
    HeaderSetRecord, HistoryRecord, ProjectRecord, RequestRecord, SimpleRecord, VariableRecord,
};
use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker carried by every normalized bundle.
pub const IMPORT_KIND: &str = "ARC#Import";

/// Normalized output of every source format.
///
/// Empty collections are omitted on serialization, so a serialized bundle
/// never contains an empty array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub version: String,
    /// Source asked to open the contents in the workspace instead of storing.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub load_to_workspace: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<RequestRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<ProjectRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<SimpleRecord>,
    #[serde(
        rename = "url-history",
        alias = "urlHistory",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub url_history: Vec<SimpleRecord>,
    #[serde(
        rename = "websocket-url-history",
        alias = "websocketUrlHistory",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub websocket_url_history: Vec<SimpleRecord>,
    #[serde(
        rename = "headers-sets",
        alias = "headerSets",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub header_sets: Vec<HeaderSetRecord>,
    #[serde(
        rename = "auth-data",
        alias = "authData",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub auth_data: Vec<SimpleRecord>,
    #[serde(
        rename = "host-rules",
        alias = "hostRules",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub host_rules: Vec<SimpleRecord>,
}

impl ImportBundle {
    /// Empty bundle stamped with the import marker and the given version tag.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            kind: Some(IMPORT_KIND.to_string()),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Whether the bundle carries the import marker.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.kind.as_deref() == Some(IMPORT_KIND)
    }

    pub fn mark_ready(&mut self) {
        self.kind = Some(IMPORT_KIND.to_string());
        if self.created_at.is_empty() {
            self.created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        }
    }

    /// Exactly one request and nothing but (possibly empty) projects/history.
    #[must_use]
    pub fn is_single_request(&self) -> bool {
        self.requests.len() == 1 && self.projects.is_empty() && self.history.is_empty()
    }

    /// Whether the contents should be opened in the workspace rather than
    /// presented for inspection before storing.
    #[must_use]
    pub fn opens_in_workspace(&self) -> bool {
        self.load_to_workspace || self.is_single_request()
    }

    /// Record counts keyed by bundle key, omitting empty collections.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        [
            ("requests", self.requests.len()),
            ("projects", self.projects.len()),
            ("history", self.history.len()),
            ("variables", self.variables.len()),
            ("cookies", self.cookies.len()),
            ("url-history", self.url_history.len()),
            ("websocket-url-history", self.websocket_url_history.len()),
            ("headers-sets", self.header_sets.len()),
            ("auth-data", self.auth_data.len()),
            ("host-rules", self.host_rules.len()),
        ]
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts().is_empty()
    }

    /// Stamp a Drive file id onto every request.
    pub fn set_drive_id(&mut self, drive_id: &str) {
        for request in &mut self.requests {
            request.drive_id = Some(drive_id.to_string());
        }
    }
}
