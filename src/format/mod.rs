//! Output formatting for `arc_import`.
//!
//! Supports both human-readable text output and machine-parseable JSON.
//!
//! # JSON Output Types
//!
//! - [`ImportSummary`] - result of `import` / `normalize --summary`
//! - [`StoreStats`] - document counts (`stats`)
//! - [`ErrorEnvelope`] - error shape printed in `--json` mode

mod context;

pub use context::{OutputContext, OutputMode};

use crate::error::ImportError;
use crate::persist::PersistReport;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Outcome of importing one file.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub file: String,
    /// Detected source format tag.
    pub format: String,
    /// Bundle version tag.
    pub version: String,
    /// `workspace` or `inspect`.
    pub route: String,
    pub dry_run: bool,
    /// Normalized records per bundle key.
    pub counts: BTreeMap<String, usize>,
    /// Stored documents per collection (empty for dry runs).
    pub written: BTreeMap<String, usize>,
    /// Item errors collected while storing.
    pub errors: Vec<String>,
    /// Number of URL index entries produced.
    pub url_index: usize,
}

impl ImportSummary {
    /// Fill in the storage half from a persistence report.
    pub fn apply_report(&mut self, report: &PersistReport) {
        self.written = report
            .written
            .iter()
            .map(|(collection, n)| (collection.to_string(), *n))
            .collect();
        self.errors.clone_from(&report.errors);
        self.url_index = report.saved_index.len() + report.history_index.len();
    }
}

/// Document counts of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct CollectionCount {
    pub collection: String,
    pub live: usize,
    pub deleted: usize,
}

/// Document counts of the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct StoreStats {
    pub database: String,
    pub collections: Vec<CollectionCount>,
    pub total: usize,
}

/// Error shape printed in JSON mode.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorBody {
    /// Machine-readable error code (SCREAMING_SNAKE_CASE)
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl From<&ImportError> for ErrorEnvelope {
    fn from(err: &ImportError) -> Self {
        Self {
            error: ErrorBody {
                code: err.code().to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Text rendering of an import summary.
#[must_use]
pub fn render_summary(summary: &ImportSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Imported {} ({}, {})", summary.file, summary.format, summary.version);
    let _ = writeln!(out, "  Route:     {}", summary.route);
    for (key, n) in &summary.counts {
        let _ = writeln!(out, "  {key:<22} {n}");
    }
    if summary.dry_run {
        out.push_str("  Dry run: nothing stored.\n");
        return out;
    }
    let stored: usize = summary.written.values().sum();
    let _ = writeln!(out, "  Stored:    {stored} documents");
    for (collection, n) in &summary.written {
        let _ = writeln!(out, "    {collection:<24} {n}");
    }
    if summary.url_index > 0 {
        let _ = writeln!(out, "  URL index: {} entries", summary.url_index);
    }
    if !summary.errors.is_empty() {
        let _ = writeln!(out, "  Errors:    {}", summary.errors.len());
        for error in &summary.errors {
            let _ = writeln!(out, "    - {error}");
        }
    }
    out
}

/// Text rendering of store statistics.
#[must_use]
pub fn render_stats(stats: &StoreStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Document store: {}\n", stats.database);
    for count in &stats.collections {
        if count.deleted > 0 {
            let _ = writeln!(
                out,
                "  {:<24} {:>6}  ({} deleted)",
                count.collection, count.live, count.deleted
            );
        } else {
            let _ = writeln!(out, "  {:<24} {:>6}", count.collection, count.live);
        }
    }
    let _ = writeln!(out, "\n  {:<24} {:>6}", "Total", stats.total);
    out
}
