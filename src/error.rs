//! Error types for the DLTINS ETL pipeline.
//!
//! Variants follow the failure buckets of a run: transport (either HTTP
//! call), parse (search result or reference-data XML), archive, output and
//! upload.

use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed or returned a non-success status
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// XML was not well formed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML was well formed but not shaped as expected
    #[error("Parse error: {0}")]
    Parse(String),

    /// No search result entry carried the wanted file type and a link
    #[error("{file_type} Download Link Not Found")]
    LinkNotFound { file_type: String },

    /// Archive was corrupt, truncated or unsupported
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Working directory held no file matching the document pattern
    #[error("no file matching *{pattern}*{extension} in {}", dir.display())]
    DocumentNotFound {
        dir: PathBuf,
        pattern: String,
        extension: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Object store rejected the upload
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Content after the document element closed: a second root or stray text.
    pub(crate) fn junk_after_root() -> Self {
        Error::Parse("junk after document element".to_string())
    }

    /// Returns `true` for failures reading either XML document, including a
    /// missing download link.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::Xml(_) | Error::Parse(_) | Error::LinkNotFound { .. }
        )
    }

    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Http(_))
    }

    pub fn is_archive_error(&self) -> bool {
        matches!(self, Error::Archive(_))
    }
}
