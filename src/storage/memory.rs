//! In-process revisioned store.
//!
//! Keeps every revision of every document so reads at an older revision work
//! the same way they do against a persistent store. Call counters and fault
//! injection make it usable as a test double for the persistence engine.

use crate::error::{ImportError, Result};
use crate::storage::{
    Collection, Document, DocumentStore, KeyState, WriteOutcome, next_rev, revision_matches,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Number of calls made against the store, per operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub bulk_writes: usize,
    pub key_reads: usize,
    pub gets: usize,
    pub puts: usize,
    /// Write attempts per document id, across bulk writes and puts.
    pub attempts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
struct Revision {
    body: Map<String, Value>,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct Stored {
    rev: String,
    deleted: bool,
    body: Map<String, Value>,
    revisions: HashMap<String, Revision>,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<Collection, BTreeMap<String, Stored>>,
    calls: StoreCalls,
    failing: HashSet<String>,
    conflicting: HashSet<String>,
}

impl Inner {
    fn write(&mut self, collection: Collection, doc: Document) -> WriteOutcome {
        *self.calls.attempts.entry(doc.id.clone()).or_default() += 1;
        if doc.id.is_empty() {
            return WriteOutcome::failed("", "Document id is required");
        }
        if self.failing.contains(&doc.id) {
            return WriteOutcome::failed(doc.id, "Injected write failure");
        }
        if self.conflicting.contains(&doc.id) {
            return WriteOutcome::conflict(doc.id);
        }
        let docs = self.collections.entry(collection).or_default();
        let current = docs.get(&doc.id);
        if !revision_matches(current.map(|s| s.rev.as_str()), doc.rev.as_deref()) {
            return WriteOutcome::conflict(doc.id);
        }
        let rev = next_rev(current.map(|s| s.rev.as_str()), &doc.body, doc.deleted);
        let revision = Revision {
            body: doc.body.clone(),
            deleted: doc.deleted,
        };
        let stored = docs.entry(doc.id.clone()).or_insert_with(|| Stored {
            rev: String::new(),
            deleted: false,
            body: Map::new(),
            revisions: HashMap::new(),
        });
        stored.rev.clone_from(&rev);
        stored.deleted = doc.deleted;
        stored.body = doc.body;
        stored.revisions.insert(rev.clone(), revision);
        WriteOutcome::ok(doc.id, rev)
    }
}

/// Revisioned store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ImportError::Storage("memory store lock poisoned".to_string()))
    }

    /// Make every future write of `id` fail with a non-conflict error.
    pub fn fail_on(&self, id: &str) -> Result<()> {
        self.lock()?.failing.insert(id.to_string());
        Ok(())
    }

    /// Make every future write of `id` report a conflict.
    pub fn conflict_on(&self, id: &str) -> Result<()> {
        self.lock()?.conflicting.insert(id.to_string());
        Ok(())
    }

    /// Counters of calls made so far.
    pub fn calls(&self) -> Result<StoreCalls> {
        Ok(self.lock()?.calls.clone())
    }

    pub fn reset_calls(&self) -> Result<()> {
        self.lock()?.calls = StoreCalls::default();
        Ok(())
    }

    /// Live documents in `collection`.
    pub fn count(&self, collection: Collection) -> Result<usize> {
        Ok(self
            .lock()?
            .collections
            .get(&collection)
            .map_or(0, |docs| docs.values().filter(|d| !d.deleted).count()))
    }

    /// Current state of one document, tombstones included.
    pub fn current(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        Ok(self
            .lock()?
            .collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .map(|stored| Document {
                id: id.to_string(),
                rev: Some(stored.rev.clone()),
                deleted: stored.deleted,
                body: stored.body.clone(),
            }))
    }
}

impl DocumentStore for MemoryStore {
    async fn bulk_write(
        &self,
        collection: Collection,
        docs: Vec<Document>,
    ) -> Result<Vec<WriteOutcome>> {
        let mut inner = self.lock()?;
        inner.calls.bulk_writes += 1;
        Ok(docs
            .into_iter()
            .map(|doc| inner.write(collection, doc))
            .collect())
    }

    async fn read_by_keys(&self, collection: Collection, ids: &[String]) -> Result<Vec<KeyState>> {
        let mut inner = self.lock()?;
        inner.calls.key_reads += 1;
        let Some(docs) = inner.collections.get(&collection) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| {
                docs.get(id).map(|stored| KeyState {
                    id: id.clone(),
                    rev: stored.rev.clone(),
                    deleted: stored.deleted,
                })
            })
            .collect())
    }

    async fn get(&self, collection: Collection, id: &str, rev: &str) -> Result<Option<Document>> {
        let mut inner = self.lock()?;
        inner.calls.gets += 1;
        Ok(inner
            .collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .and_then(|stored| stored.revisions.get(rev))
            .map(|revision| Document {
                id: id.to_string(),
                rev: Some(rev.to_string()),
                deleted: revision.deleted,
                body: revision.body.clone(),
            }))
    }

    async fn put(&self, collection: Collection, doc: Document) -> Result<WriteOutcome> {
        let mut inner = self.lock()?;
        inner.calls.puts += 1;
        Ok(inner.write(collection, doc))
    }

    async fn read_all(&self, collection: Collection) -> Result<Vec<Document>> {
        let inner = self.lock()?;
        Ok(inner
            .collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, stored)| !stored.deleted)
                    .map(|(id, stored)| Document {
                        id: id.clone(),
                        rev: Some(stored.rev.clone()),
                        deleted: false,
                        body: stored.body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, collection: Collection, id: &str, rev: &str) -> Result<WriteOutcome> {
        let mut inner = self.lock()?;
        let body = inner
            .collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .map(|stored| stored.body.clone())
            .unwrap_or_default();
        Ok(inner.write(
            collection,
            Document {
                id: id.to_string(),
                rev: Some(rev.to_string()),
                deleted: true,
                body,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, rev: Option<&str>, body: Value) -> Document {
        Document {
            id: id.to_string(),
            rev: rev.map(str::to_string),
            deleted: false,
            body: body.as_object().cloned().unwrap(),
        }
    }

    fn rev_of(outcome: &WriteOutcome) -> String {
        match &outcome.status {
            crate::storage::WriteStatus::Ok { rev } => rev.clone(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_then_conflict_then_update() {
        let store = MemoryStore::new();
        let c = Collection::Cookies;
        let first = store.bulk_write(c, vec![doc("a", None, json!({"v": 1}))]).await.unwrap();
        let rev = rev_of(&first[0]);

        let again = store.bulk_write(c, vec![doc("a", None, json!({"v": 2}))]).await.unwrap();
        assert!(again[0].is_conflict());

        let updated = store
            .bulk_write(c, vec![doc("a", Some(&rev), json!({"v": 2}))])
            .await
            .unwrap();
        assert!(updated[0].is_ok());
        assert!(rev_of(&updated[0]).starts_with("2-"));
        assert_eq!(store.count(c).unwrap(), 1);
        assert_eq!(store.calls().unwrap().attempts["a"], 3);
    }

    #[tokio::test]
    async fn tombstones_are_readable_and_hidden() {
        let store = MemoryStore::new();
        let c = Collection::Variables;
        let out = store.bulk_write(c, vec![doc("v", None, json!({"x": 1}))]).await.unwrap();
        let deleted = store.delete(c, "v", &rev_of(&out[0])).await.unwrap();
        let tomb_rev = rev_of(&deleted);

        assert_eq!(store.count(c).unwrap(), 0);
        assert!(store.read_all(c).await.unwrap().is_empty());
        let state = store.read_by_keys(c, &["v".to_string(), "x".to_string()]).await.unwrap();
        assert_eq!(state.len(), 1);
        assert!(state[0].deleted);

        let tomb = store.get(c, "v", &tomb_rev).await.unwrap().unwrap();
        assert!(tomb.deleted);
        assert_eq!(tomb.body["x"], 1);
    }

    #[tokio::test]
    async fn injected_faults() {
        let store = MemoryStore::new();
        store.fail_on("bad").unwrap();
        store.conflict_on("busy").unwrap();
        let out = store
            .bulk_write(
                Collection::HostRules,
                vec![doc("bad", None, json!({})), doc("busy", None, json!({})), doc("ok", None, json!({}))],
            )
            .await
            .unwrap();
        assert!(matches!(out[0].status, crate::storage::WriteStatus::Failed(_)));
        assert!(out[1].is_conflict());
        assert!(out[2].is_ok());
    }
}
