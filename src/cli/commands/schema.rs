//! Schema command implementation.
//!
//! Emits JSON Schema documents for the import bundle and for the CLI's
//! machine-readable outputs. Schemas are JSON whether or not `--json` is set.

use crate::cli::{SchemaArgs, SchemaTarget};
use crate::error::Result;
use crate::format::{ErrorEnvelope, ImportSummary, OutputContext, StoreStats};
use crate::model::ImportBundle;
use chrono::{DateTime, Utc};
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
struct SchemaOutput {
    tool: &'static str,
    generated_at: DateTime<Utc>,
    schemas: BTreeMap<&'static str, RootSchema>,
}

pub fn execute(args: &SchemaArgs, ctx: &OutputContext) -> Result<()> {
    if ctx.is_quiet() {
        return Ok(());
    }
    let payload = SchemaOutput {
        tool: "arc-import",
        generated_at: Utc::now(),
        schemas: build_schemas(args.target),
    };
    ctx.json_pretty(&payload)
}

fn build_schemas(target: SchemaTarget) -> BTreeMap<&'static str, RootSchema> {
    let mut schemas = BTreeMap::new();

    match target {
        SchemaTarget::All => {
            schemas.insert("ImportBundle", schema_for!(ImportBundle));
            schemas.insert("ImportSummary", schema_for!(ImportSummary));
            schemas.insert("StoreStats", schema_for!(StoreStats));
            schemas.insert("ErrorEnvelope", schema_for!(ErrorEnvelope));
        }
        SchemaTarget::Bundle => {
            schemas.insert("ImportBundle", schema_for!(ImportBundle));
        }
        SchemaTarget::Summary => {
            schemas.insert("ImportSummary", schema_for!(ImportSummary));
        }
        SchemaTarget::Stats => {
            schemas.insert("StoreStats", schema_for!(StoreStats));
        }
        SchemaTarget::Error => {
            schemas.insert("ErrorEnvelope", schema_for!(ErrorEnvelope));
        }
    }

    schemas
}
