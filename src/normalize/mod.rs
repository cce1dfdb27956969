//! Normalization engine.
//!
//! Raw input is classified by [`detect`], handed to exactly one
//! [`Transformer`], and comes out as an [`ImportBundle`] that already carries
//! deterministic ids and consistent project/request cross-references.

pub mod base;
pub mod chunked;
pub mod detect;
pub mod legacy;
pub mod postman;
pub mod snapshot;
pub mod tabular;

pub use base::{add_project_reference, add_request_reference, link};
pub use chunked::{ChunkedTraversal, DEFAULT_CHUNK_SIZE};
pub use detect::{SourceFormat, detect, is_native};

use crate::error::{ImportError, Result};
use crate::model::ImportBundle;
use crate::util::now_millis;
use serde_json::Value;
use tracing::{debug, info};

/// One transformer per source schema, holding the parsed input.
#[derive(Debug, Clone)]
pub enum Transformer {
    LegacySingle(Value),
    LegacyMulti(Value),
    Tabular(Value),
    Snapshot(Value),
    Backup(Value),
    CollectionV1(Value),
    CollectionV2(Value),
    Environment(Value),
}

impl Transformer {
    /// Pick the transformer for `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::UnrecognizedFormat`] when no schema matches.
    pub fn select(data: Value) -> Result<Self> {
        let format = detect(&data).ok_or(ImportError::UnrecognizedFormat)?;
        Ok(Self::for_format(format, data))
    }

    #[must_use]
    pub fn for_format(format: SourceFormat, data: Value) -> Self {
        match format {
            SourceFormat::LegacySingle => Self::LegacySingle(data),
            SourceFormat::LegacyMulti => Self::LegacyMulti(data),
            SourceFormat::Tabular => Self::Tabular(data),
            SourceFormat::Snapshot => Self::Snapshot(data),
            SourceFormat::Backup => Self::Backup(data),
            SourceFormat::CollectionV1 => Self::CollectionV1(data),
            SourceFormat::CollectionV2 => Self::CollectionV2(data),
            SourceFormat::Environment => Self::Environment(data),
        }
    }

    #[must_use]
    pub const fn format(&self) -> SourceFormat {
        match self {
            Self::LegacySingle(_) => SourceFormat::LegacySingle,
            Self::LegacyMulti(_) => SourceFormat::LegacyMulti,
            Self::Tabular(_) => SourceFormat::Tabular,
            Self::Snapshot(_) => SourceFormat::Snapshot,
            Self::Backup(_) => SourceFormat::Backup,
            Self::CollectionV1(_) => SourceFormat::CollectionV1,
            Self::CollectionV2(_) => SourceFormat::CollectionV2,
            Self::Environment(_) => SourceFormat::Environment,
        }
    }

    /// Produce the canonical bundle. Malformed but well-typed input never
    /// fails; missing fields take their defaults.
    pub async fn transform(self, traversal: &mut ChunkedTraversal) -> ImportBundle {
        let now = now_millis();
        let mut bundle = match self {
            Self::LegacySingle(data) => legacy::transform_single(&data, now),
            Self::LegacyMulti(data) => legacy::transform_multi(&data, now),
            Self::Tabular(data) => tabular::transform(&data, traversal, now).await,
            Self::Snapshot(data) => snapshot::transform(data, now),
            Self::Backup(data) => postman::backup::transform(&data, now),
            Self::CollectionV1(data) => postman::v1::transform(&data, now),
            Self::CollectionV2(data) => postman::v2::transform(&data, traversal, now).await,
            Self::Environment(data) => postman::environment::transform(&data),
        };
        bundle.mark_ready();
        bundle
    }
}

/// Result of one normalization run.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub format: SourceFormat,
    pub bundle: ImportBundle,
    /// Times the traversal handed control back to the scheduler.
    pub yields: usize,
}

/// Entry point of the normalization engine.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    chunk_size: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl Normalizer {
    #[must_use]
    pub const fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Parse JSON text into a value.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Parse`] when the text is not JSON.
    pub fn parse(text: &str) -> Result<Value> {
        serde_json::from_str(text.trim_start_matches('\u{feff}'))
            .map_err(|e| ImportError::Parse(format!("Unable to read the file. Not a JSON: {e}")))
    }

    /// Normalize JSON text.
    ///
    /// # Errors
    ///
    /// Fails with [`ImportError::Parse`] for invalid JSON and
    /// [`ImportError::UnrecognizedFormat`] for unknown schemas.
    pub async fn normalize_str(&self, text: &str) -> Result<Normalized> {
        let data = Self::parse(text)?;
        self.normalize(data).await
    }

    /// Normalize an already parsed value.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::UnrecognizedFormat`] for unknown schemas.
    pub async fn normalize(&self, data: Value) -> Result<Normalized> {
        let transformer = Transformer::select(data)?;
        let format = transformer.format();
        debug!(%format, "selected transformer");

        let mut traversal = ChunkedTraversal::new(self.chunk_size);
        let bundle = transformer.transform(&mut traversal).await;
        info!(
            %format,
            version = %bundle.version,
            counts = ?bundle.counts(),
            "normalized import data"
        );
        Ok(Normalized {
            format,
            bundle,
            yields: traversal.yields(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn rejects_invalid_json() {
        let err = Normalizer::default().normalize_str("{nope").await.unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_shapes() {
        let err = Normalizer::default()
            .normalize(json!({"hello": "world"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::UnrecognizedFormat));
        let err = Normalizer::default().normalize(json!([1])).await.unwrap_err();
        assert!(matches!(err, ImportError::UnrecognizedFormat));
    }

    #[tokio::test]
    async fn every_result_is_ready() {
        let inputs = [
            json!({"headers": "", "url": "u", "method": "GET"}),
            json!({"requests": []}),
            json!({"kind": "ARC#requestsDataExport", "requests": []}),
            json!({"kind": "ARC#AllDataExport", "loadToWorkspace": true}),
            json!({"version": "1", "collections": []}),
            json!({"name": "c", "folders": []}),
            json!({"info": {"schema": "https://schema.getpostman.com/json/collection/v2.0.0/collection.json"}}),
            json!({"_postman_variable_scope": "environment"}),
        ];
        for input in inputs {
            let out = Normalizer::default().normalize(input).await.unwrap();
            assert!(out.bundle.is_ready(), "{} not ready", out.format);
        }
    }

    #[tokio::test]
    async fn reports_yields() {
        let requests: Vec<_> = (0..450)
            .map(|i| json!({"type": "history", "url": format!("http://h/{i}"), "method": "GET"}))
            .collect();
        let data = json!({"kind": "ARC#requestsDataExport", "requests": requests});
        let out = Normalizer::new(200).normalize(data).await.unwrap();
        assert_eq!(out.format, SourceFormat::Tabular);
        assert_eq!(out.yields, 2);
        assert_eq!(out.bundle.history.len(), 450);
    }

    #[tokio::test]
    async fn strips_byte_order_mark() {
        let out = Normalizer::default()
            .normalize_str("\u{feff}{\"_postman_variable_scope\":\"environment\"}")
            .await
            .unwrap();
        assert_eq!(out.format, SourceFormat::Environment);
    }
}
