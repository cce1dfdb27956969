//! Import command implementation.
//!
//! Normalizes one file and persists it into the SQLite document store. Item
//! errors do not fail the command; they are listed in the summary.

use super::load_file;
use super::normalize::summarize;
use crate::cli::ImportArgs;
use crate::config::{self, CliOverrides};
use crate::error::{ImportError, Result};
use crate::events::EventBus;
use crate::format::{OutputContext, render_summary};
use crate::importer::{DataImporter, ImportOptions, Processed};
use crate::normalize::Normalizer;
use crate::storage::SqliteStore;
use tracing::{info, warn};

/// Execute the import command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or normalized, or the store
/// cannot be opened.
pub async fn execute(args: &ImportArgs, overrides: &CliOverrides, ctx: &OutputContext) -> Result<()> {
    let settings = config::load_config(overrides)?;
    let file = load_file(&args.input)?;
    let options = ImportOptions {
        drive_id: args.drive_id.clone(),
    };

    // The database is opened only once the file has normalized.
    let pipeline = DataImporter::new(())
        .with_normalizer(Normalizer::new(settings.chunk_size))
        .with_events(EventBus::new(settings.event_capacity));

    let normalized = match pipeline.process_file(&file, &options).await? {
        Processed::Data(normalized) => normalized,
        Processed::ApiModel(_) => {
            return Err(ImportError::UnavailableCollaborator(
                "API processor not available".to_string(),
            ));
        }
    };

    let store = if settings.dry_run {
        SqliteStore::open_memory()?
    } else {
        SqliteStore::open(&settings.database)?
    };
    let importer = pipeline.with_store(store);
    let format = normalized.format;
    let route = importer.route(normalized.bundle);
    let mut summary = summarize(&file.name, format, &route, settings.dry_run);

    if settings.dry_run {
        info!(file = %file.name, "dry run, nothing stored");
    } else {
        info!(
            file = %file.name,
            database = %settings.database.display(),
            route = route.label(),
            "storing import"
        );
        let report = importer.store_data(route.bundle()).await?;
        if let Some(errors) = report.errors() {
            warn!(count = errors.len(), "import finished with item errors");
        }
        summary.apply_report(&report);
    }

    ctx.emit(&summary, render_summary)
}
