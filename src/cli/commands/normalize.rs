//! Normalize command implementation.
//!
//! Prints the import bundle as JSON. The bundle is the output, so it is
//! printed as JSON with or without `--json`; `--summary` switches to the
//! summary instead.

use super::read_data;
use crate::cli::NormalizeArgs;
use crate::config::{self, CliOverrides};
use crate::error::Result;
use crate::format::{ImportSummary, OutputContext, render_summary};
use crate::importer::Route;
use crate::normalize::{Normalizer, SourceFormat};
use std::collections::BTreeMap;

pub async fn execute(
    args: &NormalizeArgs,
    overrides: &CliOverrides,
    ctx: &OutputContext,
) -> Result<()> {
    let settings = config::load_config(overrides)?;
    let data = read_data(&args.input)?;
    let normalized = Normalizer::new(settings.chunk_size).normalize(data).await?;

    if ctx.is_quiet() {
        return Ok(());
    }
    if args.summary {
        let file = args.input.file.display().to_string();
        let summary = summarize(&file, normalized.format, &Route::for_bundle(normalized.bundle), true);
        return ctx.emit(&summary, render_summary);
    }
    ctx.json_pretty(&normalized.bundle)
}

/// Summary of a normalization run, before anything is stored.
pub(crate) fn summarize(
    file: &str,
    format: SourceFormat,
    route: &Route,
    dry_run: bool,
) -> ImportSummary {
    let bundle = route.bundle();
    ImportSummary {
        file: file.to_string(),
        format: format.to_string(),
        version: bundle.version.clone(),
        route: route.label().to_string(),
        dry_run,
        counts: bundle
            .counts()
            .into_iter()
            .map(|(key, n)| (key.to_string(), n))
            .collect(),
        written: BTreeMap::new(),
        errors: Vec::new(),
        url_index: 0,
    }
}
