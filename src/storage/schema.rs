//! Database schema definitions and migration logic.

use rusqlite::{Connection, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the document store.
pub const SCHEMA_SQL: &str = r"
    -- Current state of every document, tombstones included.
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        rev TEXT NOT NULL,
        deleted INTEGER NOT NULL DEFAULT 0,
        body TEXT NOT NULL DEFAULT '{}',
        updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (collection, id)
    );

    CREATE INDEX IF NOT EXISTS idx_documents_live ON documents(collection) WHERE deleted = 0;

    -- Every revision ever written, so a document can be read at a given rev.
    CREATE TABLE IF NOT EXISTS revisions (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        rev TEXT NOT NULL,
        deleted INTEGER NOT NULL DEFAULT 0,
        body TEXT NOT NULL DEFAULT '{}',
        PRIMARY KEY (collection, id, rev),
        FOREIGN KEY (collection, id) REFERENCES documents(collection, id) ON DELETE CASCADE
    );
";

/// Create tables and indexes, then set connection pragmas.
///
/// Databases already at [`CURRENT_SCHEMA_VERSION`] skip the DDL.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version < CURRENT_SCHEMA_VERSION || !table_exists(conn, "documents") {
        conn.execute_batch(SCHEMA_SQL)?;
    }

    // WAL keeps readers (stats) from blocking an import in progress.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "cache_size", "-8000")?;
    conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> bool {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?",
        [table],
        |_| Ok(()),
    )
    .is_ok()
}
