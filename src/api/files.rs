//! Attachment download endpoint.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use super::ApiResult;
use crate::errors::AppError;
use crate::AppState;

/// Stored filenames produced by the upload service all share this prefix.
pub const STORED_FILE_PREFIX: &str = "supporting-doc-";

/// GET /api/files/:filename - Download a stored attachment.
pub async fn get_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let not_found = || AppError::NotFound("File not found".to_string());

    if !filename.starts_with(STORED_FILE_PREFIX) {
        return Err(not_found());
    }

    let bytes = state.attachments.read(&filename).await.map_err(|e| {
        tracing::debug!("Attachment {} unavailable: {}", filename, e);
        not_found()
    })?;

    let headers = [
        (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
        (
            header::CACHE_CONTROL,
            "private, max-age=0, no-cache".to_string(),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// Media type for a stored filename, based on its extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
