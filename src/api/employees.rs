//! Employee API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{created, require, ApiResult, Created};
use crate::db::EntryKind;
use crate::errors::AppError;
use crate::models::{
    CreateEmployeeRequest, CreateEntryRequest, CreatePerformanceReviewRequest, Employee,
    EmployeeEntry, EmployeeNote, SupportingDocument,
};
use crate::AppState;

/// GET /api/employees - List all employees.
pub async fn list_employees(State(state): State<AppState>) -> ApiResult<Json<Vec<Employee>>> {
    let employees = state
        .repo
        .list_employees()
        .await
        .map_err(|e| e.with_server_message("Failed to fetch employees"))?;
    Ok(Json(employees))
}

/// GET /api/employees/:id - Get a single employee.
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Employee>> {
    match state.repo.get_employee(&id).await {
        Ok(Some(employee)) => Ok(Json(employee)),
        Ok(None) => Err(AppError::NotFound("Employee not found".to_string())),
        Err(e) => Err(e.with_server_message("Failed to fetch employee")),
    }
}

/// POST /api/employees - Create a new employee.
pub async fn create_employee(
    State(state): State<AppState>,
    Json(request): Json<CreateEmployeeRequest>,
) -> ApiResult<Created<Employee>> {
    if request.name.trim().is_empty() || request.start_date.trim().is_empty() {
        return Err(AppError::Validation(
            "Name and start date are required".to_string(),
        ));
    }

    let employee = state
        .repo
        .create_employee(&request.name, &request.start_date)
        .await
        .map_err(|e| e.with_server_message("Failed to create employee"))?;
    tracing::info!("Created employee {}", employee.id);
    created(employee)
}

/// POST /api/employees/:id/notes - Add a note.
pub async fn add_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreateEntryRequest>,
) -> ApiResult<Created<EmployeeNote>> {
    require(&request.content, "Content is required")?;

    let note = state
        .repo
        .add_note(&id, &request.content, request.date.as_deref())
        .await
        .map_err(|e| e.with_server_message("Failed to add note"))?;
    created(note)
}

/// POST /api/employees/:id/praise - Add a praise entry.
pub async fn add_praise(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreateEntryRequest>,
) -> ApiResult<Created<EmployeeEntry>> {
    add_entry(state, id, EntryKind::Praise, request, "Failed to add praise").await
}

/// POST /api/employees/:id/feedback - Add a feedback entry.
pub async fn add_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreateEntryRequest>,
) -> ApiResult<Created<EmployeeEntry>> {
    add_entry(state, id, EntryKind::Feedback, request, "Failed to add feedback").await
}

async fn add_entry(
    state: AppState,
    id: String,
    kind: EntryKind,
    request: CreateEntryRequest,
    failure: &str,
) -> ApiResult<Created<EmployeeEntry>> {
    require(&request.content, "Content is required")?;

    let entry = state
        .repo
        .add_entry(&id, kind, &request.content, request.date.as_deref())
        .await
        .map_err(|e| e.with_server_message(failure))?;
    created(entry)
}

/// POST /api/employees/:id/performance-reviews - Attach a performance review document.
pub async fn add_performance_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreatePerformanceReviewRequest>,
) -> ApiResult<Created<SupportingDocument>> {
    let Some(document) = request.document else {
        return Err(AppError::Validation(
            "Performance review document is required".to_string(),
        ));
    };
    let document = document.into_document().ok_or_else(|| {
        AppError::Validation(
            "Document must have id, filename, originalName, path, mimeType, and size".to_string(),
        )
    })?;

    let review = state
        .repo
        .add_performance_review(&id, document)
        .await
        .map_err(|e| e.with_server_message("Failed to add performance review"))?;
    created(review)
}
