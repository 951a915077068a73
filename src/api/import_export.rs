//! Import/export API endpoints.

use axum::{
    extract::{Multipart, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use super::ApiResult;
use crate::archive::{self, ArchiveError, UploadedFile};
use crate::errors::AppError;
use crate::models::{ExportFormat, ExportQuery, ImportOutcome};
use crate::AppState;

/// Multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";

/// GET /api/import-export/export?format=json|zip - Download the dataset.
pub async fn export_data(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let format = ExportFormat::parse(query.format.as_deref().unwrap_or("json"))
        .ok_or(ArchiveError::InvalidExportFormat)?;

    let payload = archive::export_dataset(&state.repo, &state.attachments, format)
        .await
        .map_err(|e| {
            tracing::error!("Export error: {}", e);
            e.with_server_message("Failed to export data")
        })?;

    let headers = [
        (header::CONTENT_TYPE, payload.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", payload.filename),
        ),
    ];
    Ok((headers, payload.bytes).into_response())
}

/// POST /api/import-export/import - Restore the dataset from an upload.
pub async fn import_data(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<ImportOutcome>> {
    let upload = read_upload(multipart).await?;
    let outcome = archive::import_upload(
        &state.repo,
        &state.attachments,
        upload,
        state.config.max_entry_bytes,
    )
    .await?;
    Ok(Json(outcome))
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    let bad_request = |e: axum::extract::multipart::MultipartError| {
        tracing::warn!("Malformed multipart upload: {}", e);
        AppError::BadRequest("Invalid upload".to_string())
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(bad_request)?;

        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ArchiveError::NoFile.into())
}
