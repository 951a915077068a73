//! Error handling module for the employee notes backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::archive::ArchiveError;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const INVALID_ARCHIVE: &str = "INVALID_ARCHIVE";
    pub const INVALID_FORMAT: &str = "INVALID_FORMAT";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Request or document failed a structural rule
    Validation(String),
    /// Bad request
    BadRequest(String),
    /// Upload claims to be an archive but is not a usable one
    InvalidArchive(String),
    /// Upload is not parseable structured data
    InvalidFormat(String),
    /// Dataset store or attachment directory failure
    Storage(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidArchive(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::InvalidArchive(_) => codes::INVALID_ARCHIVE,
            AppError::InvalidFormat(_) => codes::INVALID_FORMAT,
            AppError::Storage(_) => codes::STORAGE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::InvalidArchive(msg) => msg.clone(),
            AppError::InvalidFormat(msg) => msg.clone(),
            AppError::Storage(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
        }
    }

    /// Whether the caller caused this error.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Replace the message of a server-side error with a generic one.
    ///
    /// Client errors keep their message since it names the violated rule.
    pub fn with_server_message(self, message: &str) -> Self {
        if self.is_client_error() {
            self
        } else {
            AppError::Internal(message.to_string())
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("Storage error: {:?}", err);
        AppError::Storage(format!("Storage error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::Internal(format!("JSON error: {}", err))
    }
}

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        let message = err.to_string();
        match err {
            ArchiveError::InvalidExportFormat
            | ArchiveError::NoFile
            | ArchiveError::UnsupportedType => AppError::BadRequest(message),
            ArchiveError::CorruptContainer(_)
            | ArchiveError::InvalidManifest(_)
            | ArchiveError::WrongFormat
            | ArchiveError::MissingDataset => AppError::InvalidArchive(message),
            ArchiveError::InvalidDatasetJson(_) | ArchiveError::InvalidJson(_) => {
                AppError::InvalidFormat(message)
            }
            ArchiveError::MissingEmployees
            | ArchiveError::MissingEmployeeFields
            | ArchiveError::EntriesNotArrays
            | ArchiveError::ReviewsNotArray
            | ArchiveError::MalformedEmployee(_) => AppError::Validation(message),
            ArchiveError::Build(_) => {
                tracing::error!("{}", message);
                AppError::Internal(message)
            }
            ArchiveError::Io(e) => {
                tracing::error!("Archive I/O error: {:?}", e);
                AppError::Storage(message)
            }
        }
    }
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: error.message(),
            code: error.error_code().to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_errors_map_to_client_statuses() {
        let cases = [
            (ArchiveError::UnsupportedType, StatusCode::BAD_REQUEST, codes::BAD_REQUEST),
            (ArchiveError::WrongFormat, StatusCode::BAD_REQUEST, codes::INVALID_ARCHIVE),
            (ArchiveError::MissingDataset, StatusCode::BAD_REQUEST, codes::INVALID_ARCHIVE),
            (
                ArchiveError::InvalidJson("eof".to_string()),
                StatusCode::BAD_REQUEST,
                codes::INVALID_FORMAT,
            ),
            (ArchiveError::MissingEmployees, StatusCode::BAD_REQUEST, codes::VALIDATION_ERROR),
        ];

        for (err, status, code) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status_code(), status);
            assert_eq!(app.error_code(), code);
        }
    }

    #[test]
    fn test_archive_messages_survive_conversion() {
        let app: AppError = ArchiveError::MissingDataset.into();
        assert_eq!(app.message(), "Archive missing employee-data.json");

        let app: AppError = ArchiveError::WrongFormat.into();
        assert_eq!(app.message(), "Invalid archive format");
    }

    #[test]
    fn test_server_message_replaces_only_server_errors() {
        let storage = AppError::Storage("disk full".to_string()).with_server_message("Failed");
        assert_eq!(storage.message(), "Failed");
        assert_eq!(storage.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let client = AppError::Validation("bad".to_string()).with_server_message("Failed");
        assert_eq!(client.message(), "bad");
    }
}
