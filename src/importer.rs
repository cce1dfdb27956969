//! `DataImporter`: intake, normalization, persistence and notification
//! behind one handle.

use crate::error::Result;
use crate::events::{EventBus, ImportEvent};
use crate::intake::{FileContent, FileIntake, ImportFile};
use crate::model::ImportBundle;
use crate::normalize::{Normalized, Normalizer};
use crate::persist::{PersistReport, PersistenceEngine};
use crate::storage::DocumentStore;
use serde_json::Value;
use tracing::info;

/// Per-file import options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Drive file id the data was opened from; stamped onto every request.
    pub drive_id: Option<String>,
}

/// Where a normalized bundle should go next.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Open directly in the request workspace.
    Workspace(ImportBundle),
    /// Show to the user for review before storing.
    Inspect(ImportBundle),
}

impl Route {
    #[must_use]
    pub fn for_bundle(bundle: ImportBundle) -> Self {
        if bundle.opens_in_workspace() {
            Self::Workspace(bundle)
        } else {
            Self::Inspect(bundle)
        }
    }

    #[must_use]
    pub const fn bundle(&self) -> &ImportBundle {
        match self {
            Self::Workspace(bundle) | Self::Inspect(bundle) => bundle,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Workspace(_) => "workspace",
            Self::Inspect(_) => "inspect",
        }
    }
}

/// Result of processing one file.
#[derive(Debug, Clone)]
pub enum Processed {
    Data(Normalized),
    ApiModel(Value),
}

/// Ties the import pipeline to one document store.
#[derive(Debug)]
pub struct DataImporter<S> {
    store: S,
    normalizer: Normalizer,
    intake: FileIntake,
    events: EventBus,
}

impl<S> DataImporter<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            normalizer: Normalizer::default(),
            intake: FileIntake::default(),
            events: EventBus::default(),
        }
    }

    #[must_use]
    pub const fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    #[must_use]
    pub fn with_intake(mut self, intake: FileIntake) -> Self {
        self.intake = intake;
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Move the configured pipeline onto another store.
    #[must_use]
    pub fn with_store<T>(self, store: T) -> DataImporter<T> {
        DataImporter {
            store,
            normalizer: self.normalizer,
            intake: self.intake,
            events: self.events,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Read a file and normalize it, unless it is an API specification.
    ///
    /// # Errors
    ///
    /// Any intake or normalization error.
    pub async fn process_file(&self, file: &ImportFile, options: &ImportOptions) -> Result<Processed> {
        match self.intake.read(file)? {
            FileContent::ApiModel(model) => Ok(Processed::ApiModel(model)),
            FileContent::Data(data) => {
                let mut normalized = self.normalizer.normalize(data).await?;
                if let Some(drive_id) = &options.drive_id {
                    normalized.bundle.set_drive_id(drive_id);
                }
                Ok(Processed::Data(normalized))
            }
        }
    }

    /// Decide whether a normalized bundle opens in the workspace or goes to
    /// review.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn route(&self, bundle: ImportBundle) -> Route {
        Route::for_bundle(bundle)
    }

    /// Normalize JSON text.
    ///
    /// # Errors
    ///
    /// Parse or unrecognized-format errors.
    pub async fn normalize_str(&self, text: &str) -> Result<Normalized> {
        self.normalizer.normalize_str(text).await
    }
}

impl<S: DocumentStore> DataImporter<S> {
    /// Persist a bundle, then notify listeners.
    ///
    /// # Errors
    ///
    /// See [`PersistenceEngine::import_bundle`]. Item errors are returned in
    /// the report instead.
    pub async fn store_data(&self, bundle: &ImportBundle) -> Result<PersistReport> {
        let report = PersistenceEngine::new(&self.store)
            .import_bundle(bundle)
            .await?;
        info!(
            written = report.total_written(),
            errors = report.errors.len(),
            "import stored"
        );
        self.events.emit(ImportEvent::DataImported);
        let index = report.url_index();
        if !index.is_empty() {
            self.events.emit(ImportEvent::UrlIndexUpdate(index));
        }
        Ok(report)
    }
}
