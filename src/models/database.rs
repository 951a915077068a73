//! Dataset document model: the whole JSON file in one value.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::Employee;

/// The root document containing all employee data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDatabase {
    pub employees: Vec<Employee>,
    #[serde(default = "now_iso")]
    pub last_updated: String,
}

impl EmployeeDatabase {
    /// An empty dataset stamped with the current time.
    pub fn empty() -> Self {
        Self {
            employees: Vec::new(),
            last_updated: now_iso(),
        }
    }
}

/// Current UTC time as an ISO-8601 string with millisecond precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
