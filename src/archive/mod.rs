//! Archive import/export subsystem.
//!
//! An archive is a ZIP file holding the dataset document, a manifest and every
//! attachment the dataset references. Attachments carry a SHA-256 checksum in
//! the dataset so corruption between export and import is detected.

mod export;
mod import;
mod validate;

pub use export::*;
pub use import::*;
pub use validate::*;

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Archive entry holding the dataset document.
pub const DATASET_ENTRY: &str = "employee-data.json";

/// Archive entry holding the manifest.
pub const MANIFEST_ENTRY: &str = "manifest.json";

/// Prefix of attachment entries inside an archive.
pub const DOCUMENTS_PREFIX: &str = "documents/";

/// Errors raised while exporting or importing.
///
/// The display text of each variant is the message returned to the client.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Invalid format parameter. Use \"json\" or \"zip\"")]
    InvalidExportFormat,

    #[error("No file provided")]
    NoFile,

    #[error("File must be a JSON or ZIP file")]
    UnsupportedType,

    #[error("Invalid ZIP archive or processing error")]
    CorruptContainer(String),

    #[error("Invalid archive manifest")]
    InvalidManifest(String),

    #[error("Invalid archive format")]
    WrongFormat,

    #[error("Archive missing employee-data.json")]
    MissingDataset,

    #[error("Invalid JSON format in employee-data.json")]
    InvalidDatasetJson(String),

    #[error("Invalid JSON format")]
    InvalidJson(String),

    #[error("Invalid data structure: missing employees array")]
    MissingEmployees,

    #[error("Invalid employee structure: missing required fields (id, name, startDate)")]
    MissingEmployeeFields,

    #[error("Invalid employee structure: notes, praise, and feedback must be arrays")]
    EntriesNotArrays,

    #[error("Invalid employee structure: performanceReviews must be an array")]
    ReviewsNotArray,

    #[error("Invalid employee structure: {0}")]
    MalformedEmployee(String),

    #[error("Failed to build archive: {0}")]
    Build(String),

    #[error("Attachment storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
