//! Source format detection.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Discriminator prefix of every native export.
pub const NATIVE_KIND_PREFIX: &str = "ARC#";

const POSTMAN_V2_SCHEMAS: [&str; 2] = [
    "https://schema.getpostman.com/json/collection/v2.0.0/collection.json",
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json",
];

/// Top-level keys any native export may carry.
const NATIVE_KEYS: [&str; 9] = [
    "projects",
    "requests",
    "history",
    "url-history",
    "websocket-url-history",
    "variables",
    "headers-sets",
    "auth-data",
    "cookies",
];

const SNAPSHOT_KINDS: [&str; 8] = [
    "ARC#SavedHistoryDataExport",
    "ARC#AllDataExport",
    "ARC#SavedDataExport",
    "ARC#HistoryDataExport",
    "ARC#Project",
    "ARC#ProjectExport",
    "ARC#SessionCookies",
    "ARC#HostRules",
];

const TABULAR_KIND: &str = "ARC#requestsDataExport";

/// Recognized source schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    /// Postman environment export.
    Environment,
    /// Postman full backup.
    Backup,
    CollectionV1,
    CollectionV2,
    /// Native export of the document-store generation.
    Snapshot,
    /// Native export of the intermediate table-store generation.
    Tabular,
    /// Oldest native shape: one bare request object.
    LegacySingle,
    /// Oldest native shape: `projects` + `requests` lists.
    LegacyMulti,
}

impl SourceFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::Backup => "backup",
            Self::CollectionV1 => "collection-v1",
            Self::CollectionV2 => "collection-v2",
            Self::Snapshot => "snapshot",
            Self::Tabular => "tabular",
            Self::LegacySingle => "legacy-single",
            Self::LegacyMulti => "legacy-multi",
        }
    }

    /// Whether the source was produced by the native application.
    #[must_use]
    pub const fn is_native(self) -> bool {
        matches!(
            self,
            Self::Snapshot | Self::Tabular | Self::LegacySingle | Self::LegacyMulti
        )
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify parsed input. `None` means the input is not recognized.
///
/// Rules are tried in order and the first match wins: Postman environment,
/// Postman backup, Postman v1 collection, Postman v2 collection, then the
/// native predicate.
#[must_use]
pub fn detect(data: &Value) -> Option<SourceFormat> {
    let obj = data.as_object()?;

    if obj.contains_key("_postman_variable_scope") {
        return Some(SourceFormat::Environment);
    }
    let has_version = obj
        .get("version")
        .is_some_and(|v| v.as_str().is_some_and(|s| !s.is_empty()) || v.is_number());
    if has_version && obj.get("collections").is_some_and(Value::is_array) {
        return Some(SourceFormat::Backup);
    }
    if !obj.contains_key("info") && obj.contains_key("name") && obj.contains_key("folders") {
        return Some(SourceFormat::CollectionV1);
    }
    let schema = data
        .get("info")
        .and_then(|info| info.get("schema"))
        .and_then(Value::as_str);
    if schema.is_some_and(|s| POSTMAN_V2_SCHEMAS.contains(&s)) {
        return Some(SourceFormat::CollectionV2);
    }

    if !is_native(data) {
        return None;
    }
    let kind = obj.get("kind").and_then(Value::as_str).unwrap_or_default();
    if SNAPSHOT_KINDS.contains(&kind) {
        Some(SourceFormat::Snapshot)
    } else if kind == TABULAR_KIND {
        Some(SourceFormat::Tabular)
    } else if obj.contains_key("requests") || obj.contains_key("projects") {
        Some(SourceFormat::LegacyMulti)
    } else {
        Some(SourceFormat::LegacySingle)
    }
}

/// Native export predicate: namespaced `kind`, a known collection key, or
/// the bare single-request shape.
#[must_use]
pub fn is_native(data: &Value) -> bool {
    let Some(obj) = data.as_object() else {
        return false;
    };
    if obj
        .get("kind")
        .and_then(Value::as_str)
        .is_some_and(|k| k.starts_with(NATIVE_KIND_PREFIX))
    {
        return true;
    }
    if NATIVE_KEYS.iter().any(|key| obj.contains_key(*key)) {
        return true;
    }
    is_bare_request(data)
}

fn is_bare_request(data: &Value) -> bool {
    let Some(obj) = data.as_object() else {
        return false;
    };
    let has_lists = ["projects", "requests", "history"]
        .iter()
        .any(|key| obj.get(*key).is_some_and(|v| !v.is_null()));
    !has_lists && ["headers", "url", "method"].iter().all(|key| obj.contains_key(*key))
}
