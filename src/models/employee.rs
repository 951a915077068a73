//! Employee model matching the frontend Employee interface.

use serde::{Deserialize, Serialize};

/// An uploaded file attached to a note or stored as a performance review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SupportingDocument {
    pub id: String,
    /// Stored filename, unique inside the attachment directory
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub mime_type: String,
    pub size: u64,
    /// Lowercase hex SHA-256 of the file, only set by archive exports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// A dated note, optionally backed by supporting documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeNote {
    pub id: String,
    pub date: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supporting_documents: Option<Vec<SupportingDocument>>,
}

/// A dated praise or feedback entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeEntry {
    pub id: String,
    pub date: String,
    pub content: String,
}

/// An employee and everything recorded about them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub start_date: String,
    pub notes: Vec<EmployeeNote>,
    pub praise: Vec<EmployeeEntry>,
    pub feedback: Vec<EmployeeEntry>,
    #[serde(default)]
    pub performance_reviews: Vec<SupportingDocument>,
}

impl Employee {
    /// Every attachment reference held by this employee, notes first.
    pub fn documents(&self) -> impl Iterator<Item = &SupportingDocument> {
        self.notes
            .iter()
            .filter_map(|note| note.supporting_documents.as_ref())
            .flatten()
            .chain(self.performance_reviews.iter())
    }
}

/// Request body for creating a new employee.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: String,
}

/// Request body for adding a note, praise or feedback entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntryRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub date: Option<String>,
}

/// Request body for attaching a performance review document.
///
/// Fields are optional here so the handler can report every missing field
/// with one message instead of a generic deserialization error.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePerformanceReviewRequest {
    #[serde(default)]
    pub document: Option<PerformanceReviewDocument>,
}

/// Loosely-typed performance review document as posted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReviewDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl PerformanceReviewDocument {
    /// Convert into a stored reference, or `None` when a field is missing or empty.
    pub fn into_document(self) -> Option<SupportingDocument> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Some(SupportingDocument {
            id: non_empty(self.id)?,
            filename: non_empty(self.filename)?,
            original_name: non_empty(self.original_name)?,
            path: non_empty(self.path)?,
            mime_type: non_empty(self.mime_type)?,
            size: self.size.filter(|s| *s > 0)?,
            checksum: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(filename: &str) -> SupportingDocument {
        SupportingDocument {
            id: format!("id-{}", filename),
            filename: filename.to_string(),
            original_name: filename.to_string(),
            path: format!("/api/files/{}", filename),
            mime_type: "application/pdf".to_string(),
            size: 10,
            checksum: None,
        }
    }

    #[test]
    fn test_documents_visits_notes_then_reviews() {
        let employee = Employee {
            id: "1".to_string(),
            name: "Jane".to_string(),
            start_date: "2023-01-01".to_string(),
            notes: vec![
                EmployeeNote {
                    id: "n1".to_string(),
                    date: "2023-01-02".to_string(),
                    content: "first".to_string(),
                    supporting_documents: Some(vec![doc("a.pdf"), doc("b.pdf")]),
                },
                EmployeeNote {
                    id: "n2".to_string(),
                    date: "2023-01-03".to_string(),
                    content: "second".to_string(),
                    supporting_documents: None,
                },
            ],
            praise: vec![],
            feedback: vec![],
            performance_reviews: vec![doc("review.pdf")],
        };

        let names: Vec<_> = employee.documents().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "review.pdf"]);
    }

    #[test]
    fn test_checksum_omitted_when_absent() {
        let value = serde_json::to_value(doc("a.pdf")).unwrap();
        assert!(value.get("checksum").is_none());
        assert_eq!(value["originalName"], "a.pdf");
        assert_eq!(value["mimeType"], "application/pdf");
    }

    #[test]
    fn test_performance_reviews_default_to_empty() {
        let employee: Employee = serde_json::from_value(serde_json::json!({
            "id": "1",
            "name": "Jane",
            "startDate": "2023-01-01",
            "notes": [],
            "praise": [],
            "feedback": []
        }))
        .unwrap();
        assert!(employee.performance_reviews.is_empty());
    }

    #[test]
    fn test_review_document_requires_all_fields() {
        let complete = PerformanceReviewDocument {
            id: Some("r1".to_string()),
            filename: Some("supporting-doc-r1.pdf".to_string()),
            original_name: Some("review.pdf".to_string()),
            path: Some("/api/files/supporting-doc-r1.pdf".to_string()),
            mime_type: Some("application/pdf".to_string()),
            size: Some(512),
        };
        assert!(complete.clone().into_document().is_some());

        let missing_path = PerformanceReviewDocument {
            path: None,
            ..complete.clone()
        };
        assert!(missing_path.into_document().is_none());

        let zero_size = PerformanceReviewDocument {
            size: Some(0),
            ..complete
        };
        assert!(zero_size.into_document().is_none());
    }
}
