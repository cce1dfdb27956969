//! `arc_import` - import pipeline for request-tool export files
//!
//! Reads export files of several generations of the native tool and of
//! Postman, normalizes them into one [`model::ImportBundle`], and persists
//! the bundle into a revisioned document store, resolving write conflicts.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`intake`] - Raw file intake (encryption envelope, API-spec sniffing)
//! - [`normalize`] - Format detection and per-format transformers
//! - [`model`] - Import bundle and record types
//! - [`persist`] - Conflict-aware persistence and collection routing
//! - [`storage`] - Revisioned document stores (in-memory, `SQLite`)
//! - [`events`] - Import notifications
//! - [`importer`] - `DataImporter` facade over the whole pipeline
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Layered settings
//! - [`error`] - Error types and handling
//! - [`format`] - Output formatting (text, JSON)
//! - [`util`] - Utility functions (ids, time)

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod importer;
pub mod intake;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod persist;
pub mod storage;
pub mod util;

pub use error::{ImportError, Result};
pub use importer::{DataImporter, ImportOptions, Route};
pub use model::ImportBundle;
pub use normalize::{Normalized, Normalizer, SourceFormat};
