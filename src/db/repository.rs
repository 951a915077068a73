//! JSON-file repository for the employee dataset.
//!
//! Every mutation is a whole-document load-modify-save cycle under a write lock,
//! and saves go through a temp file and rename so the document is never torn.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::models::{
    now_iso, Employee, EmployeeDatabase, EmployeeEntry, EmployeeNote, SupportingDocument,
};

/// Repository over the dataset document file.
#[derive(Debug)]
pub struct Repository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

/// Which dated collection of an employee an entry goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Praise,
    Feedback,
}

impl Repository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full dataset, creating an empty one if the file does not exist.
    pub async fn load(&self) -> Result<EmployeeDatabase, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                tracing::error!("Dataset file {:?} is not valid: {}", self.path, e);
                AppError::Storage(format!("Dataset file is corrupt: {}", e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let _guard = self.write_lock.lock().await;
                // Another writer may have created it while we waited
                if let Ok(bytes) = tokio::fs::read(&self.path).await {
                    return Ok(serde_json::from_slice(&bytes)?);
                }
                let mut db = EmployeeDatabase::empty();
                self.save(&mut db).await?;
                Ok(db)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the whole dataset.
    pub async fn replace(&self, mut db: EmployeeDatabase) -> Result<EmployeeDatabase, AppError> {
        let _guard = self.write_lock.lock().await;
        self.save(&mut db).await?;
        Ok(db)
    }

    // ==================== EMPLOYEE OPERATIONS ====================

    /// List all employees.
    pub async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        Ok(self.load().await?.employees)
    }

    /// Get an employee by ID.
    pub async fn get_employee(&self, id: &str) -> Result<Option<Employee>, AppError> {
        Ok(self.load().await?.employees.into_iter().find(|e| e.id == id))
    }

    /// Create a new employee with empty collections.
    pub async fn create_employee(&self, name: &str, start_date: &str) -> Result<Employee, AppError> {
        let employee = Employee {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            start_date: start_date.to_string(),
            notes: Vec::new(),
            praise: Vec::new(),
            feedback: Vec::new(),
            performance_reviews: Vec::new(),
        };

        let created = employee.clone();
        self.modify(|db| {
            db.employees.push(employee);
            Ok(())
        })
        .await?;

        Ok(created)
    }

    /// Append a note to an employee.
    pub async fn add_note(
        &self,
        employee_id: &str,
        content: &str,
        date: Option<&str>,
    ) -> Result<EmployeeNote, AppError> {
        let note = EmployeeNote {
            id: uuid::Uuid::new_v4().to_string(),
            date: date.map(str::to_string).unwrap_or_else(now_iso),
            content: content.to_string(),
            supporting_documents: None,
        };

        let created = note.clone();
        self.modify_employee(employee_id, |employee| employee.notes.push(note))
            .await?;
        Ok(created)
    }

    /// Append a praise or feedback entry to an employee.
    pub async fn add_entry(
        &self,
        employee_id: &str,
        kind: EntryKind,
        content: &str,
        date: Option<&str>,
    ) -> Result<EmployeeEntry, AppError> {
        let entry = EmployeeEntry {
            id: uuid::Uuid::new_v4().to_string(),
            date: date.map(str::to_string).unwrap_or_else(now_iso),
            content: content.to_string(),
        };

        let created = entry.clone();
        self.modify_employee(employee_id, |employee| match kind {
            EntryKind::Praise => employee.praise.push(entry),
            EntryKind::Feedback => employee.feedback.push(entry),
        })
        .await?;
        Ok(created)
    }

    /// Attach a performance review document to an employee.
    pub async fn add_performance_review(
        &self,
        employee_id: &str,
        document: SupportingDocument,
    ) -> Result<SupportingDocument, AppError> {
        let created = document.clone();
        self.modify_employee(employee_id, |employee| {
            employee.performance_reviews.push(document)
        })
        .await?;
        Ok(created)
    }

    // ==================== INTERNALS ====================

    async fn modify_employee<F>(&self, employee_id: &str, f: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Employee),
    {
        self.modify(|db| {
            let employee = db
                .employees
                .iter_mut()
                .find(|e| e.id == employee_id)
                .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;
            f(employee);
            Ok(())
        })
        .await
    }

    async fn modify<F>(&self, f: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut EmployeeDatabase) -> Result<(), AppError>,
    {
        // Make sure the file exists before taking the lock, load() may need it
        self.load().await?;

        let _guard = self.write_lock.lock().await;
        let bytes = tokio::fs::read(&self.path).await?;
        let mut db: EmployeeDatabase = serde_json::from_slice(&bytes)?;
        f(&mut db)?;
        self.save(&mut db).await
    }

    /// Write the dataset atomically. Caller must hold the write lock.
    async fn save(&self, db: &mut EmployeeDatabase) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        db.last_updated = now_iso();
        let json = serde_json::to_vec_pretty(db)?;

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(&json).await?;
            file.flush().await?;
            file.sync_all().await?;
        }
        tokio::fs::rename(&temp_path, &self.path).await?;

        tracing::debug!(
            "Saved dataset with {} employees to {:?}",
            db.employees.len(),
            self.path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo_in(temp_dir: &TempDir) -> Repository {
        Repository::new(temp_dir.path().join("data").join("employees.json"))
    }

    #[tokio::test]
    async fn test_load_creates_empty_dataset() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo_in(&temp_dir);

        let db = repo.load().await.unwrap();
        assert!(db.employees.is_empty());
        assert!(repo.path().exists());
    }

    #[tokio::test]
    async fn test_load_rejects_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo_in(&temp_dir);
        std::fs::create_dir_all(repo.path().parent().unwrap()).unwrap();
        std::fs::write(repo.path(), "{ not json").unwrap();

        let err = repo.load().await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        // The corrupt file is left for inspection
        assert_eq!(std::fs::read_to_string(repo.path()).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn test_employee_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo_in(&temp_dir);

        let employee = repo.create_employee("Jane Doe", "2023-01-01").await.unwrap();
        repo.add_note(&employee.id, "Great sprint", None).await.unwrap();
        repo.add_entry(&employee.id, EntryKind::Praise, "Helped on-call", Some("2023-02-01"))
            .await
            .unwrap();
        repo.add_entry(&employee.id, EntryKind::Feedback, "Write more tests", None)
            .await
            .unwrap();

        let stored = repo.get_employee(&employee.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Jane Doe");
        assert_eq!(stored.notes.len(), 1);
        assert_eq!(stored.praise[0].date, "2023-02-01");
        assert_eq!(stored.feedback[0].content, "Write more tests");
        assert_eq!(repo.list_employees().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_employee_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo_in(&temp_dir);

        let err = repo.add_note("missing", "text", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(repo.get_employee("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_overwrites_everything() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo_in(&temp_dir);
        repo.create_employee("Old", "2020-01-01").await.unwrap();

        let mut db = EmployeeDatabase::empty();
        db.employees.push(Employee {
            id: "new".to_string(),
            name: "New".to_string(),
            start_date: "2024-01-01".to_string(),
            notes: vec![],
            praise: vec![],
            feedback: vec![],
            performance_reviews: vec![],
        });
        repo.replace(db).await.unwrap();

        let employees = repo.list_employees().await.unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].id, "new");
        assert!(!repo.path().with_extension("json.tmp").exists());
    }
}
