//! Configuration management for `arc_import`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`ARC_IMPORT_*`)
//! 3. YAML config file (`--config`, else `./arc-import.yaml`)
//! 4. Defaults

use crate::error::{ImportError, Result};
use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::normalize::DEFAULT_CHUNK_SIZE;
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default database filename.
pub const DEFAULT_DB_FILENAME: &str = "arc-data.db";
/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILENAME: &str = "arc-import.yaml";
/// Prefix of recognized environment variables.
pub const ENV_PREFIX: &str = "ARC_IMPORT_";

const KEY_DATABASE: &str = "database";
const KEY_CHUNK_SIZE: &str = "chunk-size";
const KEY_EVENT_CAPACITY: &str = "event-capacity";
const KEY_DRY_RUN: &str = "dry-run";

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSettings {
    pub database: PathBuf,
    pub chunk_size: usize,
    pub event_capacity: usize,
    pub dry_run: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DB_FILENAME),
            chunk_size: DEFAULT_CHUNK_SIZE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            dry_run: false,
        }
    }
}

impl ImportSettings {
    /// Parse settings out of a merged layer. Missing keys keep their default.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Config`] for values that do not parse or are
    /// out of range.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(path) = layer.get(KEY_DATABASE) {
            if path.trim().is_empty() {
                return Err(ImportError::Config("database path is empty".to_string()));
            }
            settings.database = PathBuf::from(path);
        }
        if let Some(size) = parse_positive(layer, KEY_CHUNK_SIZE)? {
            settings.chunk_size = size;
        }
        if let Some(capacity) = parse_positive(layer, KEY_EVENT_CAPACITY)? {
            settings.event_capacity = capacity;
        }
        if let Some(value) = layer.get(KEY_DRY_RUN) {
            settings.dry_run = parse_bool(value).ok_or_else(|| {
                ImportError::Config(format!("{KEY_DRY_RUN}: expected a boolean, got {value:?}"))
            })?;
        }
        Ok(settings)
    }
}

/// A flat configuration layer of normalized keys to raw string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)
            .map_err(|e| ImportError::Config(format!("{}: {e}", path.display())))?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Build a layer from `ARC_IMPORT_*` pairs; other names are ignored.
    #[must_use]
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            }
        }
        layer
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub dry_run: Option<bool>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.database {
            layer.insert(KEY_DATABASE, path.to_string_lossy());
        }
        if let Some(size) = self.chunk_size {
            layer.insert(KEY_CHUNK_SIZE, size.to_string());
        }
        if let Some(dry_run) = self.dry_run {
            layer.insert(KEY_DRY_RUN, dry_run.to_string());
        }

        layer
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let defaults = ImportSettings::default();
    let mut layer = ConfigLayer::default();
    layer.insert(KEY_DATABASE, defaults.database.to_string_lossy());
    layer.insert(KEY_CHUNK_SIZE, defaults.chunk_size.to_string());
    layer.insert(KEY_EVENT_CAPACITY, defaults.event_capacity.to_string());
    layer.insert(KEY_DRY_RUN, defaults.dry_run.to_string());
    layer
}

/// Load settings with the documented precedence order.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or if a
/// merged value is invalid. An explicitly given config file must exist.
pub fn load_config(cli: &CliOverrides) -> Result<ImportSettings> {
    load_config_with(cli, ConfigLayer::from_env())
}

fn load_config_with(cli: &CliOverrides, env_layer: ConfigLayer) -> Result<ImportSettings> {
    let file_layer = match &cli.config {
        Some(path) if !path.exists() => {
            return Err(ImportError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Some(path) => ConfigLayer::from_yaml(path)?,
        None => ConfigLayer::from_yaml(Path::new(DEFAULT_CONFIG_FILENAME))?,
    };
    let merged =
        ConfigLayer::merge_layers(&[default_config_layer(), file_layer, env_layer, cli.as_layer()]);
    ImportSettings::from_layer(&merged)
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn parse_positive(layer: &ConfigLayer, key: &str) -> Result<Option<usize>> {
    let Some(value) = layer.get(key) else {
        return Ok(None);
    };
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ImportError::Config(format!(
            "{key}: expected a positive integer, got {value:?}"
        ))),
    }
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.insert(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
