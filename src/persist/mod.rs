//! Conflict-aware persistence of an [`ImportBundle`].
//!
//! Collections are written one at a time in [`Collection::IMPORT_ORDER`].
//! Each write is classified per item:
//!
//! 1. stored: counted, and indexed when the collection feeds the URL index
//! 2. failed: message collected, never retried
//! 3. conflict: current revision re-read, tombstones resurrected, then one
//!    retry of the whole conflicted batch
//!
//! Item failures never abort the import. Only a store failing a whole call
//! (or a bundle without the import marker) raises an error.

pub mod router;

pub use router::{Batch, UrlIndexEntry, index_entry, index_type, route};

use crate::error::{ImportError, Result};
use crate::model::ImportBundle;
use crate::storage::{Collection, Document, DocumentStore, WriteOutcome, WriteStatus};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// What one persistence run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PersistReport {
    /// Item error messages, in collection-processing order.
    pub errors: Vec<String>,
    /// URL index entries for stored saved requests.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub saved_index: Vec<UrlIndexEntry>,
    /// URL index entries for stored history requests.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history_index: Vec<UrlIndexEntry>,
    /// Documents stored per collection.
    pub written: BTreeMap<Collection, usize>,
}

impl PersistReport {
    /// `None` when every item of every collection was stored.
    #[must_use]
    pub fn errors(&self) -> Option<&[String]> {
        (!self.errors.is_empty()).then_some(self.errors.as_slice())
    }

    /// Saved and history index entries together.
    #[must_use]
    pub fn url_index(&self) -> Vec<UrlIndexEntry> {
        self.saved_index
            .iter()
            .chain(&self.history_index)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn total_written(&self) -> usize {
        self.written.values().sum()
    }

    fn absorb(&mut self, collection: Collection, result: CollectionResult) {
        *self.written.entry(collection).or_default() += result.stored.len();
        let index = result
            .stored
            .iter()
            .filter_map(|doc| index_entry(collection, doc));
        match collection {
            Collection::SavedRequests => self.saved_index.extend(index),
            Collection::HistoryRequests => self.history_index.extend(index),
            _ => {}
        }
        self.errors.extend(result.errors);
    }
}

#[derive(Debug, Default)]
struct CollectionResult {
    stored: Vec<Document>,
    errors: Vec<String>,
}

/// Writes bundles into a [`DocumentStore`].
#[derive(Debug)]
pub struct PersistenceEngine<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> PersistenceEngine<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Persist every populated collection of `bundle`.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::NotNormalized`] before touching the store when
    /// the bundle lacks the import marker, or any error the store raises for
    /// a whole call.
    pub async fn import_bundle(&self, bundle: &ImportBundle) -> Result<PersistReport> {
        if !bundle.is_ready() {
            return Err(ImportError::NotNormalized);
        }

        let mut batches: HashMap<Collection, Vec<Document>> = route(bundle)?
            .into_iter()
            .map(|batch| (batch.collection, batch.docs))
            .collect();

        let mut report = PersistReport::default();
        for collection in Collection::IMPORT_ORDER {
            let docs = if collection == Collection::VariablesEnvironments {
                self.derived_environments(bundle).await?
            } else {
                batches.remove(&collection).unwrap_or_default()
            };
            if docs.is_empty() {
                continue;
            }
            let count = docs.len();
            let result = self.write_collection(collection, docs).await?;
            info!(
                %collection,
                count,
                stored = result.stored.len(),
                errors = result.errors.len(),
                "wrote collection"
            );
            report.absorb(collection, result);
        }
        Ok(report)
    }

    /// Environments named by the bundle's variables that the store does not
    /// know yet.
    async fn derived_environments(&self, bundle: &ImportBundle) -> Result<Vec<Document>> {
        let wanted = router::user_environments(&bundle.variables);
        if wanted.is_empty() {
            return Ok(Vec::new());
        }
        let existing = self
            .store
            .read_all(Collection::VariablesEnvironments)
            .await?;
        router::new_environments(wanted, &existing)
    }

    async fn write_collection(
        &self,
        collection: Collection,
        docs: Vec<Document>,
    ) -> Result<CollectionResult> {
        let outcomes = self.store.bulk_write(collection, docs.clone()).await?;
        let mut result = CollectionResult::default();
        let mut conflicted = Vec::new();

        for (doc, outcome) in paired(collection, docs, outcomes) {
            match outcome.status {
                WriteStatus::Ok { .. } => result.stored.push(doc),
                WriteStatus::Conflict => conflicted.push(doc),
                WriteStatus::Failed(_) => {
                    let message = outcome.message().unwrap_or_default();
                    warn!(%collection, id = %outcome.id, %message, "document not stored");
                    result.errors.push(message);
                }
            }
        }

        if !conflicted.is_empty() {
            self.resolve_conflicts(collection, conflicted, &mut result)
                .await?;
        }
        Ok(result)
    }

    /// Re-read the conflicted keys, take over their current revisions
    /// (resurrecting tombstones), and retry once. Anything still failing is
    /// reported.
    async fn resolve_conflicts(
        &self,
        collection: Collection,
        conflicted: Vec<Document>,
        result: &mut CollectionResult,
    ) -> Result<()> {
        debug!(%collection, count = conflicted.len(), "resolving conflicts");
        let keys: Vec<String> = conflicted.iter().map(|doc| doc.id.clone()).collect();
        let states: HashMap<String, _> = self
            .store
            .read_by_keys(collection, &keys)
            .await?
            .into_iter()
            .map(|state| (state.id.clone(), state))
            .collect();

        let mut retry = Vec::with_capacity(conflicted.len());
        for mut doc in conflicted {
            let Some(state) = states.get(&doc.id) else {
                retry.push(doc);
                continue;
            };
            if !state.deleted {
                doc.rev = Some(state.rev.clone());
                retry.push(doc);
                continue;
            }
            match self.resurrect(collection, &doc.id, &state.rev).await? {
                Ok(rev) => {
                    doc.rev = Some(rev);
                    retry.push(doc);
                }
                Err(message) => {
                    warn!(%collection, id = %doc.id, %message, "tombstone not restored");
                    result.errors.push(message);
                }
            }
        }
        if retry.is_empty() {
            return Ok(());
        }

        let outcomes = self.store.bulk_write(collection, retry.clone()).await?;
        for (doc, outcome) in paired(collection, retry, outcomes) {
            if outcome.is_ok() {
                result.stored.push(doc);
            } else {
                let message = outcome.message().unwrap_or_default();
                warn!(%collection, id = %outcome.id, %message, "retry failed");
                result.errors.push(message);
            }
        }
        Ok(())
    }

    /// Clear the delete flag of a tombstone. Returns the new revision, or
    /// the item error message when the store refused.
    async fn resurrect(
        &self,
        collection: Collection,
        id: &str,
        rev: &str,
    ) -> Result<std::result::Result<String, String>> {
        let Some(mut tombstone) = self.store.get(collection, id, rev).await? else {
            return Ok(Err(format!("{id}: tombstone revision {rev} not found")));
        };
        tombstone.deleted = false;
        let outcome = self.store.put(collection, tombstone).await?;
        debug!(%collection, %id, ok = outcome.is_ok(), "resurrected tombstone");
        Ok(match outcome.status {
            WriteStatus::Ok { rev } => Ok(rev),
            _ => Err(outcome.message().unwrap_or_default()),
        })
    }
}

/// Match each document with its write outcome. Documents the store gave no
/// outcome for become failed items.
fn paired(
    collection: Collection,
    docs: Vec<Document>,
    outcomes: Vec<WriteOutcome>,
) -> Vec<(Document, WriteOutcome)> {
    if outcomes.len() != docs.len() {
        warn!(
            %collection,
            sent = docs.len(),
            answered = outcomes.len(),
            "store returned a mismatched outcome count"
        );
    }
    let mut outcomes = outcomes.into_iter();
    docs.into_iter()
        .map(|doc| {
            let outcome = outcomes
                .next()
                .unwrap_or_else(|| WriteOutcome::failed(doc.id.clone(), "No write result returned"));
            (doc, outcome)
        })
        .collect()
}

/// Persist `bundle` into `store`.
///
/// # Errors
///
/// See [`PersistenceEngine::import_bundle`].
pub async fn import_bundle<S: DocumentStore>(
    store: &S,
    bundle: &ImportBundle,
) -> Result<PersistReport> {
    PersistenceEngine::new(store).import_bundle(bundle).await
}
