#![allow(dead_code)]

use arc_import::storage::{MemoryStore, SqliteStore};
use std::sync::Once;
use tempfile::TempDir;

pub mod cli;
pub mod fixtures;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        arc_import::logging::init_test_logging();
    });
}

pub fn memory_store() -> MemoryStore {
    init_test_logging();
    MemoryStore::new()
}

pub fn test_db_with_dir() -> (SqliteStore, TempDir) {
    init_test_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::open(&dir.path().join("arc-data.db")).expect("Failed to create test database");
    (store, dir)
}
