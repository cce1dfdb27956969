//! Raw file intake.
//!
//! Decides what a file is before normalization sees it: an API specification
//! (handed to an [`ApiParser`]), an encrypted export (unwrapped by a
//! [`Decoder`]), or plain JSON import data.

use crate::error::{ImportError, Result};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// MIME types always treated as API specifications.
pub const API_MIME_TYPES: [&str; 6] = [
    "application/zip",
    "application/yaml",
    "application/x-yaml",
    "application/raml",
    "application/x-raml",
    "application/x-zip-compressed",
];

/// File extensions always treated as API specifications.
pub const API_EXTENSIONS: [&str; 4] = ["raml", "yaml", "yml", "zip"];

/// First line of an encrypted export.
pub const ENCRYPTION_MARKER: &str = "aes";

/// A file offered for import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFile {
    pub name: String,
    pub mime: Option<String>,
    pub content: Vec<u8>,
}

impl ImportFile {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Io`] if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(name, content))
    }

    /// Lowercased extension of the file name, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Content as text, without a leading byte order mark.
    #[must_use]
    pub fn text(&self) -> String {
        let text = String::from_utf8_lossy(&self.content);
        text.trim_start_matches('\u{feff}').to_string()
    }

    /// Whether type or name alone mark this file as an API specification.
    #[must_use]
    pub fn is_api_file(&self) -> bool {
        let by_mime = self
            .mime
            .as_deref()
            .is_some_and(|mime| API_MIME_TYPES.contains(&mime));
        by_mime
            || self
                .extension()
                .is_some_and(|ext| API_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// Decrypts the payload of an encrypted export.
pub trait Decoder: Send + Sync {
    /// Turn ciphertext into plaintext JSON text.
    fn decode(&self, ciphertext: &str) -> Result<String>;
}

impl<F> Decoder for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn decode(&self, ciphertext: &str) -> Result<String> {
        self(ciphertext)
    }
}

/// Parses API specification files into an API model.
pub trait ApiParser: Send + Sync {
    fn parse(&self, file: &ImportFile) -> Result<Value>;
}

impl<F> ApiParser for F
where
    F: Fn(&ImportFile) -> Result<Value> + Send + Sync,
{
    fn parse(&self, file: &ImportFile) -> Result<Value> {
        self(file)
    }
}

/// What a file turned out to contain.
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    /// Import data, ready for normalization.
    Data(Value),
    /// Model produced by the API parser.
    ApiModel(Value),
}

/// Routes files to the right collaborator.
#[derive(Default)]
pub struct FileIntake {
    decoder: Option<Box<dyn Decoder>>,
    api_parser: Option<Box<dyn ApiParser>>,
}

impl fmt::Debug for FileIntake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileIntake")
            .field("decoder", &self.decoder.is_some())
            .field("api_parser", &self.api_parser.is_some())
            .finish()
    }
}

impl FileIntake {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    #[must_use]
    pub fn with_api_parser(mut self, parser: impl ApiParser + 'static) -> Self {
        self.api_parser = Some(Box::new(parser));
        self
    }

    /// Classify and read `file`.
    ///
    /// # Errors
    ///
    /// - [`ImportError::UnavailableCollaborator`] when the file needs a
    ///   decoder or API parser that is not installed
    /// - [`ImportError::Collaborator`] (or whatever the collaborator raised)
    ///   when it fails
    /// - [`ImportError::Parse`] when the content is neither JSON nor an API
    ///   specification
    pub fn read(&self, file: &ImportFile) -> Result<FileContent> {
        if file.is_api_file() {
            debug!(name = %file.name, "api file by type");
            return self.parse_api(file);
        }

        let mut text = file.text();
        if text.trim_start().starts_with("#%RAML") {
            debug!(name = %file.name, "raml content");
            return self.parse_api(file);
        }
        if let Some(ciphertext) = encrypted_payload(&text) {
            let decoder = self.decoder.as_ref().ok_or_else(|| {
                ImportError::UnavailableCollaborator("Unable to decode encrypted file.".to_string())
            })?;
            text = decoder.decode(ciphertext)?;
        }

        let data: Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))
            .map_err(|_| ImportError::Parse("Unknown file format".to_string()))?;
        if data.get("swagger").is_some() || data.get("openapi").is_some() {
            debug!(name = %file.name, "openapi content");
            return self.parse_api(file);
        }
        Ok(FileContent::Data(data))
    }

    fn parse_api(&self, file: &ImportFile) -> Result<FileContent> {
        let parser = self.api_parser.as_ref().ok_or_else(|| {
            ImportError::UnavailableCollaborator("API processor not available".to_string())
        })?;
        parser.parse(file).map(FileContent::ApiModel)
    }
}

/// Ciphertext of an encrypted export: everything after a first line that
/// reads `aes`.
fn encrypted_payload(text: &str) -> Option<&str> {
    let (first, rest) = text.split_once('\n')?;
    (first.trim_end_matches('\r') == ENCRYPTION_MARKER).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_parser() -> impl ApiParser {
        |file: &ImportFile| -> Result<Value> { Ok(json!({"api": file.name})) }
    }

    #[test]
    fn json_data_passes_through() {
        let file = ImportFile::new("export.json", br#"{"requests": []}"#.to_vec());
        assert_eq!(
            FileIntake::new().read(&file).unwrap(),
            FileContent::Data(json!({"requests": []}))
        );
    }

    #[test]
    fn api_files_by_type_and_extension() {
        let intake = FileIntake::new().with_api_parser(api_parser());
        let by_ext = ImportFile::new("spec.RAML", b"anything".to_vec());
        let by_mime = ImportFile::new("blob", b"PK".to_vec()).with_mime("application/zip");
        assert_eq!(
            intake.read(&by_ext).unwrap(),
            FileContent::ApiModel(json!({"api": "spec.RAML"}))
        );
        assert!(matches!(intake.read(&by_mime).unwrap(), FileContent::ApiModel(_)));
    }

    #[test]
    fn api_files_by_content() {
        let intake = FileIntake::new().with_api_parser(api_parser());
        let raml = ImportFile::new("api.txt", b"#%RAML 1.0\ntitle: x".to_vec());
        let openapi = ImportFile::new("api.json", br#"{"openapi": "3.0.0"}"#.to_vec());
        let swagger = ImportFile::new("api.json", br#"{"swagger": "2.0"}"#.to_vec());
        for file in [raml, openapi, swagger] {
            assert!(matches!(intake.read(&file).unwrap(), FileContent::ApiModel(_)));
        }
    }

    #[test]
    fn missing_api_parser() {
        let file = ImportFile::new("spec.yaml", b"a: b".to_vec());
        let err = FileIntake::new().read(&file).unwrap_err();
        assert!(matches!(err, ImportError::UnavailableCollaborator(_)));
        assert_eq!(err.to_string(), "API processor not available");
    }

    #[test]
    fn api_parser_failure_is_surfaced() {
        let intake = FileIntake::new().with_api_parser(|_: &ImportFile| -> Result<Value> {
            Err(ImportError::Collaborator("bad spec".to_string()))
        });
        let err = intake.read(&ImportFile::new("x.zip", Vec::new())).unwrap_err();
        assert_eq!(err.to_string(), "bad spec");
    }

    #[test]
    fn encrypted_files_are_decoded() {
        let intake = FileIntake::new().with_decoder(|cipher: &str| -> Result<String> {
            Ok(cipher.chars().rev().collect())
        });
        let file = ImportFile::new("enc.arc", b"aes\n}][:\"yrotsih\"{".to_vec());
        assert_eq!(
            intake.read(&file).unwrap(),
            FileContent::Data(json!({"history": []}))
        );
    }

    #[test]
    fn encrypted_without_decoder() {
        let file = ImportFile::new("enc.arc", b"aes\nxxxx".to_vec());
        let err = FileIntake::new().read(&file).unwrap_err();
        assert_eq!(err.to_string(), "Unable to decode encrypted file.");
    }

    #[test]
    fn garbage_is_unknown_format() {
        let file = ImportFile::new("x.txt", b"hello there".to_vec());
        let err = FileIntake::new().read(&file).unwrap_err();
        assert!(matches!(err, ImportError::Parse(ref m) if m == "Unknown file format"));
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let file = ImportFile::new("x.json", "\u{feff}{\"a\":1}".as_bytes().to_vec());
        assert!(matches!(FileIntake::new().read(&file).unwrap(), FileContent::Data(_)));
    }
}
