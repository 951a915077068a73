//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract:
//! entities are returned as bare JSON, errors as `{ success: false, error }`.

mod employees;
mod files;
mod import_export;

pub use employees::*;
pub use files::*;
pub use import_export::*;

use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::errors::AppError;

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<T, AppError>;

/// Response for a newly created resource.
pub type Created<T> = (StatusCode, Json<T>);

/// Wrap a newly created resource in a 201 response.
pub fn created<T: Serialize>(data: T) -> ApiResult<Created<T>> {
    Ok((StatusCode::CREATED, Json(data)))
}

/// Reject a blank required string field.
fn require(value: &str, message: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(AppError::Validation(message.to_string()))
    } else {
        Ok(())
    }
}
