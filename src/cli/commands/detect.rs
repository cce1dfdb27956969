//! Detect command implementation.

use super::read_data;
use crate::cli::FileArgs;
use crate::error::{ImportError, Result};
use crate::format::OutputContext;
use crate::normalize::detect;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct DetectOutput {
    file: String,
    format: &'static str,
    native: bool,
}

/// Print the source format of a file.
///
/// # Errors
///
/// Returns [`ImportError::UnrecognizedFormat`] when no transformer matches.
pub fn execute(args: &FileArgs, ctx: &OutputContext) -> Result<()> {
    let data = read_data(args)?;
    let format = detect(&data).ok_or(ImportError::UnrecognizedFormat)?;
    let output = DetectOutput {
        file: args.file.display().to_string(),
        format: format.as_str(),
        native: format.is_native(),
    };
    ctx.emit(&output, |o| o.format.to_string())
}
