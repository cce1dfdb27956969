//! `SQLite` storage implementation.
//!
//! rusqlite calls block, so every trait method runs on tokio's blocking pool
//! against a shared connection.

use crate::error::{ImportError, Result};
use crate::storage::schema::apply_schema;
use crate::storage::{
    Collection, Document, DocumentStore, KeyState, WriteOutcome, next_rev, revision_matches,
};
use rusqlite::{Connection, OptionalExtension, Transaction};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

/// SQLite-based revisioned document store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        apply_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        lock(&self.conn)
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut guard)
        })
        .await
        .map_err(|err| ImportError::Storage(format!("sqlite task failed: {err}")))?
    }

    /// Run `f` inside an immediate transaction, committing on success.
    async fn mutate<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.blocking(move |conn| {
            let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            let result = f(&tx)?;
            tx.commit()?;
            Ok(result)
        })
        .await
    }

    /// Number of live documents in one collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self, collection: Collection) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM documents WHERE collection = ? AND deleted = 0",
            [collection.store_name()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Live and tombstoned document counts for every collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn counts(&self) -> Result<BTreeMap<Collection, (usize, usize)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT collection, sum(deleted = 0), sum(deleted = 1)
             FROM documents GROUP BY collection",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut counts: BTreeMap<Collection, (usize, usize)> = Collection::IMPORT_ORDER
            .into_iter()
            .map(|c| (c, (0, 0)))
            .collect();
        for row in rows {
            let (name, live, deleted) = row?;
            if let Ok(collection) = name.parse::<Collection>() {
                counts.insert(
                    collection,
                    (
                        usize::try_from(live).unwrap_or(0),
                        usize::try_from(deleted).unwrap_or(0),
                    ),
                );
            }
        }
        Ok(counts)
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| ImportError::Storage("sqlite connection lock poisoned".to_string()))
}

fn parse_body(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(ImportError::Storage(format!("stored body is not an object: {text}"))),
    }
}

/// Write one document inside an open transaction.
///
/// Only database failures are raised; conflicts come back as outcomes.
fn write_document(tx: &Transaction, collection: Collection, doc: Document) -> Result<WriteOutcome> {
    if doc.id.is_empty() {
        return Ok(WriteOutcome::failed("", "Document id is required"));
    }
    let current: Option<String> = tx
        .query_row(
            "SELECT rev FROM documents WHERE collection = ? AND id = ?",
            [collection.store_name(), doc.id.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    if !revision_matches(current.as_deref(), doc.rev.as_deref()) {
        return Ok(WriteOutcome::conflict(doc.id));
    }

    let rev = next_rev(current.as_deref(), &doc.body, doc.deleted);
    let body = serde_json::to_string(&doc.body)?;
    tx.execute(
        "INSERT INTO documents (collection, id, rev, deleted, body, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, CURRENT_TIMESTAMP)
         ON CONFLICT(collection, id) DO UPDATE SET
            rev = excluded.rev,
            deleted = excluded.deleted,
            body = excluded.body,
            updated_at = excluded.updated_at",
        rusqlite::params![collection.store_name(), doc.id, rev, doc.deleted, body],
    )?;
    tx.execute(
        "INSERT OR REPLACE INTO revisions (collection, id, rev, deleted, body)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![collection.store_name(), doc.id, rev, doc.deleted, body],
    )?;
    trace!(%collection, id = %doc.id, %rev, "stored document");
    Ok(WriteOutcome::ok(doc.id, rev))
}

impl DocumentStore for SqliteStore {
    async fn bulk_write(
        &self,
        collection: Collection,
        docs: Vec<Document>,
    ) -> Result<Vec<WriteOutcome>> {
        self.mutate(move |tx| {
            docs.into_iter()
                .map(|doc| write_document(tx, collection, doc))
                .collect()
        })
        .await
    }

    async fn read_by_keys(&self, collection: Collection, ids: &[String]) -> Result<Vec<KeyState>> {
        let ids = ids.to_vec();
        self.blocking(move |conn| {
            let mut stmt = conn
                .prepare("SELECT rev, deleted FROM documents WHERE collection = ? AND id = ?")?;
            let mut states = Vec::with_capacity(ids.len());
            for id in ids {
                let state = stmt
                    .query_row([collection.store_name(), id.as_str()], |row| {
                        Ok(KeyState {
                            id: id.clone(),
                            rev: row.get(0)?,
                            deleted: row.get(1)?,
                        })
                    })
                    .optional()?;
                states.extend(state);
            }
            Ok(states)
        })
        .await
    }

    async fn get(&self, collection: Collection, id: &str, rev: &str) -> Result<Option<Document>> {
        let (id, rev) = (id.to_string(), rev.to_string());
        self.blocking(move |conn| {
            let row: Option<(bool, String)> = conn
                .query_row(
                    "SELECT deleted, body FROM revisions WHERE collection = ? AND id = ? AND rev = ?",
                    [collection.store_name(), id.as_str(), rev.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            row.map(|(deleted, body)| {
                Ok(Document {
                    id,
                    rev: Some(rev),
                    deleted,
                    body: parse_body(&body)?,
                })
            })
            .transpose()
        })
        .await
    }

    async fn put(&self, collection: Collection, doc: Document) -> Result<WriteOutcome> {
        self.mutate(move |tx| write_document(tx, collection, doc)).await
    }

    async fn read_all(&self, collection: Collection) -> Result<Vec<Document>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, rev, body FROM documents
                 WHERE collection = ? AND deleted = 0 ORDER BY id",
            )?;
            let rows = stmt.query_map([collection.store_name()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;
            let mut docs = Vec::new();
            for row in rows {
                let (id, rev, body) = row?;
                docs.push(Document {
                    id,
                    rev: Some(rev),
                    deleted: false,
                    body: parse_body(&body)?,
                });
            }
            Ok(docs)
        })
        .await
    }

    async fn delete(&self, collection: Collection, id: &str, rev: &str) -> Result<WriteOutcome> {
        let (id, rev) = (id.to_string(), rev.to_string());
        self.mutate(move |tx| {
            let body: Option<String> = tx
                .query_row(
                    "SELECT body FROM documents WHERE collection = ? AND id = ?",
                    [collection.store_name(), id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            let body = body.as_deref().map(parse_body).transpose()?.unwrap_or_default();
            write_document(
                tx,
                collection,
                Document {
                    id,
                    rev: Some(rev),
                    deleted: true,
                    body,
                },
            )
        })
        .await
    }
}
