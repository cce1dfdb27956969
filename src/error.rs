//! Error types for `arc_import`.
//!
//! Whole-operation failures are raised as [`ImportError`]. Per-item store
//! failures are never raised: the persistence engine collects them as data
//! (see [`crate::storage::WriteOutcome`]).

use thiserror::Error;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Errors that abort an import operation.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Input is not valid JSON or not a JSON object.
    #[error("{0}")]
    Parse(String),

    /// No transformer recognized the input.
    #[error("File not recognized")]
    UnrecognizedFormat,

    /// Persistence was attempted on a bundle without the import marker.
    #[error("Import data is not normalized (missing ARC#Import marker)")]
    NotNormalized,

    /// A collaborator (decoder, API parser) is not installed.
    #[error("{0}")]
    UnavailableCollaborator(String),

    /// A collaborator was present but failed.
    #[error("{0}")]
    Collaborator(String),

    /// The document store failed a whole call.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl ImportError {
    /// Stable machine-readable code for CLI output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "PARSE_ERROR",
            Self::UnrecognizedFormat => "UNRECOGNIZED_FORMAT",
            Self::NotNormalized => "NOT_NORMALIZED",
            Self::UnavailableCollaborator(_) => "UNAVAILABLE_COLLABORATOR",
            Self::Collaborator(_) => "COLLABORATOR_FAILED",
            Self::Storage(_) | Self::Database(_) => "STORAGE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Process exit code used by the CLI.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Parse(_) | Self::UnrecognizedFormat | Self::NotNormalized => 2,
            Self::UnavailableCollaborator(_) | Self::Collaborator(_) => 3,
            Self::Config(_) => 4,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_message_matches_user_facing_text() {
        assert_eq!(ImportError::UnrecognizedFormat.to_string(), "File not recognized");
    }

    #[test]
    fn codes_are_screaming_snake_case() {
        let errors = [
            ImportError::Parse("x".into()),
            ImportError::UnrecognizedFormat,
            ImportError::NotNormalized,
            ImportError::UnavailableCollaborator("x".into()),
            ImportError::Storage("x".into()),
        ];
        for err in errors {
            let code = err.code();
            assert!(
                code.chars().all(|c| c.is_ascii_uppercase() || c == '_'),
                "bad code {code}"
            );
        }
    }
}
