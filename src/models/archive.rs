//! Archive manifest and import/export wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format tag identifying archives produced by this service.
pub const ARCHIVE_FORMAT: &str = "employee-notes-archive";

/// Archive layout version written by the exporter.
pub const ARCHIVE_VERSION: &str = "2.0";

/// Metadata document stored as `manifest.json` inside an archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveManifest {
    #[serde(default)]
    pub export_date: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub document_count: Option<u64>,
    #[serde(default)]
    pub employee_count: Option<u64>,
    #[serde(default)]
    pub format: Option<String>,
}

impl ArchiveManifest {
    pub fn new(export_date: String, document_count: usize, employee_count: usize) -> Self {
        Self {
            export_date: Some(export_date),
            version: Some(ARCHIVE_VERSION.to_string()),
            document_count: Some(document_count as u64),
            employee_count: Some(employee_count as u64),
            format: Some(ARCHIVE_FORMAT.to_string()),
        }
    }

    /// Whether a raw manifest document declares this archive family.
    ///
    /// Only `format` is inspected; the other fields are informational and may
    /// carry any JSON value.
    pub fn declares_supported_format(manifest: &Value) -> bool {
        manifest.get("format").and_then(Value::as_str) == Some(ARCHIVE_FORMAT)
    }
}

/// Export flavour selected by the `format` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Bare dataset document, kept for backward compatibility
    Json,
    /// ZIP archive with manifest and attachments
    Zip,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "json" => Some(ExportFormat::Json),
            "zip" => Some(ExportFormat::Zip),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Zip => "zip",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Zip => "application/zip",
        }
    }
}

/// Query string of the export endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: Option<String>,
}

/// Result of a successful import, as returned to the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub success: bool,
    pub message: String,
    pub missing_docs_count: usize,
    pub imported_docs_count: usize,
    pub checksum_errors: usize,
}

impl ImportOutcome {
    /// Build the outcome and its human-readable summary from the counters.
    pub fn new(imported_docs_count: usize, missing_docs_count: usize, checksum_errors: usize) -> Self {
        let mut message = String::from("Data imported successfully");
        let mut details = Vec::new();

        if imported_docs_count > 0 {
            details.push(format!("{} document(s) imported", imported_docs_count));
        }
        if missing_docs_count > 0 {
            details.push(format!(
                "{} document(s) were skipped due to missing files",
                missing_docs_count
            ));
        }
        if checksum_errors > 0 {
            details.push(format!(
                "{} document(s) failed checksum validation",
                checksum_errors
            ));
        }
        if !details.is_empty() {
            message.push_str(&format!(". {}.", details.join(", ")));
        }

        Self {
            success: true,
            message,
            missing_docs_count,
            imported_docs_count,
            checksum_errors,
        }
    }
}
