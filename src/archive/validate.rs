//! Structural validation of an untyped dataset document.

use serde_json::{Map, Value};

use super::ArchiveError;
use crate::models::EmployeeDatabase;

/// Check the shape of a parsed dataset document and convert it to the typed model.
///
/// Rules run in a fixed order and the first violation is returned. A missing
/// or null `performanceReviews` is filled in with an empty list.
pub fn validate_dataset(value: Value) -> Result<EmployeeDatabase, ArchiveError> {
    let Value::Object(mut root) = value else {
        return Err(ArchiveError::MissingEmployees);
    };

    let Some(Value::Array(employees)) = root.get_mut("employees") else {
        return Err(ArchiveError::MissingEmployees);
    };

    for employee in employees.iter_mut() {
        let Value::Object(fields) = employee else {
            return Err(ArchiveError::MissingEmployeeFields);
        };
        validate_employee(fields)?;
    }

    serde_json::from_value(Value::Object(root))
        .map_err(|e| ArchiveError::MalformedEmployee(e.to_string()))
}

fn validate_employee(fields: &mut Map<String, Value>) -> Result<(), ArchiveError> {
    let has_text = |key: &str| matches!(fields.get(key), Some(Value::String(s)) if !s.is_empty());
    if !(has_text("id") && has_text("name") && has_text("startDate")) {
        return Err(ArchiveError::MissingEmployeeFields);
    }

    let is_array = |key: &str| matches!(fields.get(key), Some(Value::Array(_)));
    if !(is_array("notes") && is_array("praise") && is_array("feedback")) {
        return Err(ArchiveError::EntriesNotArrays);
    }

    match fields.get("performanceReviews") {
        None | Some(Value::Null) => {
            fields.insert("performanceReviews".to_string(), Value::Array(Vec::new()));
        }
        Some(Value::Array(_)) => {}
        Some(_) => return Err(ArchiveError::ReviewsNotArray),
    }

    Ok(())
}
