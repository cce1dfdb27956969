//! Revisioned document storage.
//!
//! The persistence engine talks to the store only through [`DocumentStore`],
//! which models a set of named collections of JSON documents. Every document
//! carries a revision token that must match on update; a mismatch is a
//! per-item conflict, not an error of the whole call. Deleted documents stay
//! behind as tombstones, still addressable by id.
//!
//! # Submodules
//!
//! - [`memory`] - in-process store, used by tests and dry runs
//! - [`schema`] - `SQLite` schema definitions
//! - [`sqlite`] - `SQLite`-backed store used by the CLI

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::{MemoryStore, StoreCalls};
pub use sqlite::SqliteStore;

use crate::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A named store collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    SavedRequests,
    LegacyProjects,
    HistoryRequests,
    WebsocketUrlHistory,
    UrlHistory,
    Cookies,
    AuthData,
    HeadersSets,
    Variables,
    VariablesEnvironments,
    HostRules,
}

impl Collection {
    /// Every collection, in the order an import writes them.
    pub const IMPORT_ORDER: [Self; 11] = [
        Self::SavedRequests,
        Self::LegacyProjects,
        Self::HistoryRequests,
        Self::WebsocketUrlHistory,
        Self::UrlHistory,
        Self::Cookies,
        Self::AuthData,
        Self::HeadersSets,
        Self::Variables,
        Self::VariablesEnvironments,
        Self::HostRules,
    ];

    /// Name of the backing store.
    #[must_use]
    pub const fn store_name(self) -> &'static str {
        match self {
            Self::SavedRequests => "saved-requests",
            Self::LegacyProjects => "legacy-projects",
            Self::HistoryRequests => "history-requests",
            Self::WebsocketUrlHistory => "websocket-url-history",
            Self::UrlHistory => "url-history",
            Self::Cookies => "cookies",
            Self::AuthData => "auth-data",
            Self::HeadersSets => "headers-sets",
            Self::Variables => "variables",
            Self::VariablesEnvironments => "variables-environments",
            Self::HostRules => "host-rules",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.store_name())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::IMPORT_ORDER
            .into_iter()
            .find(|c| c.store_name() == s)
            .ok_or_else(|| format!("unknown collection: {s}"))
    }
}

/// A stored document.
///
/// On write, `rev` is the revision the writer believes is current (`None` for
/// a new document). On read it is the stored revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    pub body: Map<String, Value>,
}

impl Document {
    /// Build a document from a serialized record. The record's `id` and
    /// `rev` fields move onto the document; everything else is the body.
    #[must_use]
    pub fn from_record(mut body: Map<String, Value>) -> Self {
        let id = match body.remove("id") {
            Some(Value::String(id)) => id,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let rev = match body.remove("rev") {
            Some(Value::String(rev)) => Some(rev),
            _ => None,
        };
        Self {
            id,
            rev,
            deleted: false,
            body,
        }
    }

    /// Body with `id`/`rev` folded back in, as a record would serialize.
    #[must_use]
    pub fn to_record(&self) -> Map<String, Value> {
        let mut map = Map::with_capacity(self.body.len() + 2);
        map.insert("id".to_string(), Value::String(self.id.clone()));
        if let Some(rev) = &self.rev {
            map.insert("rev".to_string(), Value::String(rev.clone()));
        }
        map.extend(self.body.iter().map(|(k, v)| (k.clone(), v.clone())));
        map
    }
}

/// Per-item result of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// Stored under the given new revision.
    Ok { rev: String },
    /// The expected revision did not match the stored one.
    Conflict,
    /// Any other failure of this one item.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub id: String,
    pub status: WriteStatus,
}

impl WriteOutcome {
    #[must_use]
    pub fn ok(id: impl Into<String>, rev: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: WriteStatus::Ok { rev: rev.into() },
        }
    }

    #[must_use]
    pub fn conflict(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: WriteStatus::Conflict,
        }
    }

    #[must_use]
    pub fn failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: WriteStatus::Failed(message.into()),
        }
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self.status, WriteStatus::Ok { .. })
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.status, WriteStatus::Conflict)
    }

    /// Human-readable message for a failed item.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match &self.status {
            WriteStatus::Ok { .. } => None,
            WriteStatus::Conflict => Some(format!("Document update conflict: {}", self.id)),
            WriteStatus::Failed(message) => Some(format!("{}: {message}", self.id)),
        }
    }
}

/// Current state of a key as reported by [`DocumentStore::read_by_keys`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyState {
    pub id: String,
    pub rev: String,
    pub deleted: bool,
}

/// A revisioned document store with named collections.
///
/// Implementations use interior mutability so one handle can be shared by
/// the persistence engine and the caller.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Insert or update documents. Returns one outcome per input, in order.
    async fn bulk_write(
        &self,
        collection: Collection,
        docs: Vec<Document>,
    ) -> Result<Vec<WriteOutcome>>;

    /// Current revision and tombstone flag for each known key. Unknown keys
    /// are left out.
    async fn read_by_keys(&self, collection: Collection, ids: &[String]) -> Result<Vec<KeyState>>;

    /// Read one document at a specific revision, tombstones included.
    async fn get(&self, collection: Collection, id: &str, rev: &str) -> Result<Option<Document>>;

    /// Write a single document, clearing or setting its tombstone flag.
    async fn put(&self, collection: Collection, doc: Document) -> Result<WriteOutcome>;

    /// Every live (non-deleted) document of a collection.
    async fn read_all(&self, collection: Collection) -> Result<Vec<Document>>;

    /// Mark a document deleted, leaving a tombstone.
    async fn delete(&self, collection: Collection, id: &str, rev: &str) -> Result<WriteOutcome>;
}

/// Whether a write expecting `expected` may replace a document currently at
/// `current`. New documents (no current revision) are always accepted; an
/// existing document, tombstones included, requires the exact revision.
#[must_use]
pub fn revision_matches(current: Option<&str>, expected: Option<&str>) -> bool {
    current.is_none_or(|cur| expected == Some(cur))
}

/// Revision token following `previous`, derived from the new body.
///
/// Tokens have the form `{generation}-{digest}` where the digest is the first
/// 16 hex characters of the SHA-256 of the serialized body and tombstone flag.
#[must_use]
pub fn next_rev(previous: Option<&str>, body: &Map<String, Value>, deleted: bool) -> String {
    let generation = previous
        .and_then(|rev| rev.split_once('-'))
        .and_then(|(n, _)| n.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(body).unwrap_or_default());
    hasher.update([u8::from(deleted)]);
    let digest = format!("{:x}", hasher.finalize());
    format!("{generation}-{}", &digest[..16])
}
