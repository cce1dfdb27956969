//! Stats command implementation.
//!
//! Shows live and deleted document counts for every collection of the store.

use crate::config::{self, CliOverrides};
use crate::error::Result;
use crate::format::{CollectionCount, OutputContext, StoreStats, render_stats};
use crate::storage::SqliteStore;
use tracing::{debug, info};

/// Execute the stats command.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or queried.
pub fn execute(overrides: &CliOverrides, ctx: &OutputContext) -> Result<()> {
    let settings = config::load_config(overrides)?;
    info!(database = %settings.database.display(), "Computing store statistics");
    let store = SqliteStore::open(&settings.database)?;
    let stats = compute_stats(&store, &settings.database.display().to_string())?;
    debug!(total = stats.total, "Loaded document counts");
    ctx.emit(&stats, render_stats)
}

fn compute_stats(store: &SqliteStore, database: &str) -> Result<StoreStats> {
    let collections: Vec<CollectionCount> = store
        .counts()?
        .into_iter()
        .map(|(collection, (live, deleted))| CollectionCount {
            collection: collection.to_string(),
            live,
            deleted,
        })
        .collect();
    let total = collections.iter().map(|c| c.live).sum();
    Ok(StoreStats {
        database: database.to_string(),
        collections,
        total,
    })
}
