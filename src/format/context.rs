//! Output context and mode detection.
//!
//! # Mode Selection Logic
//!
//! 1. `--json` flag → JSON mode (machine-readable)
//! 2. `--quiet` flag → Quiet mode (errors only)
//! 3. Otherwise → Text mode

use crate::error::Result;
use serde::Serialize;

/// Output mode determining formatting strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable text.
    #[default]
    Text,

    /// JSON output for machine consumption.
    Json,

    /// Nothing on stdout; errors still go to stderr.
    Quiet,
}

impl OutputMode {
    /// Returns true if this mode produces structured data (JSON).
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Json)
    }

    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        matches!(self, Self::Quiet)
    }
}

/// Where and how command output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputContext {
    mode: OutputMode,
}

impl Default for OutputContext {
    fn default() -> Self {
        Self::from_flags(false, false)
    }
}

impl OutputContext {
    /// Create context from CLI flags. `json` wins over `quiet`.
    #[must_use]
    pub const fn from_flags(json: bool, quiet: bool) -> Self {
        let mode = if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Text
        };
        Self { mode }
    }

    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.mode.is_structured()
    }

    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        self.mode.is_quiet()
    }

    /// Print `value` as pretty JSON on stdout unless quiet.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be serialized.
    pub fn json_pretty<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        if self.is_quiet() {
            return Ok(());
        }
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print text unless quiet.
    pub fn text(&self, text: &str) {
        if !self.is_quiet() {
            println!("{}", text.trim_end_matches('\n'));
        }
    }

    /// Print `value` as JSON in JSON mode, otherwise `render(value)` as text.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn emit<T, F>(&self, value: &T, render: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> String,
    {
        match self.mode {
            OutputMode::Json => self.json_pretty(value),
            OutputMode::Text => {
                self.text(&render(value));
                Ok(())
            }
            OutputMode::Quiet => Ok(()),
        }
    }
}
