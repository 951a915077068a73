//! Dataset export as a legacy JSON document or a ZIP archive.

use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Write};

use chrono::Utc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{sha256_hex, ArchiveError, DATASET_ENTRY, DOCUMENTS_PREFIX, MANIFEST_ENTRY};
use crate::db::{AttachmentStore, Repository};
use crate::errors::AppError;
use crate::models::{now_iso, ArchiveManifest, EmployeeDatabase, ExportFormat, SupportingDocument};

/// Bytes of an export together with how to deliver them.
#[derive(Debug)]
pub struct ExportPayload {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

/// Dataset with attachment references resolved against the attachment directory.
#[derive(Debug)]
pub struct ResolvedExport {
    /// Dataset with checksums added and unresolvable references removed
    pub dataset: EmployeeDatabase,
    /// Unique attachment contents keyed by stored filename
    pub documents: BTreeMap<String, Vec<u8>>,
    /// One entry per dropped reference
    pub warnings: Vec<String>,
}

/// Export the current dataset in the requested format.
///
/// The dataset store and attachment directory are only read.
pub async fn export_dataset(
    repo: &Repository,
    attachments: &AttachmentStore,
    format: ExportFormat,
) -> Result<ExportPayload, AppError> {
    let dataset = repo.load().await?;
    let filename = format!(
        "employee-data-{}.{}",
        Utc::now().format("%Y-%m-%d"),
        format.extension()
    );

    let bytes = match format {
        ExportFormat::Json => serde_json::to_vec_pretty(&dataset)?,
        ExportFormat::Zip => {
            let resolved = resolve_attachments(dataset, attachments).await;
            tracing::info!(
                "Exporting archive with {} employees, {} documents, {} skipped references",
                resolved.dataset.employees.len(),
                resolved.documents.len(),
                resolved.warnings.len()
            );
            build_archive(&resolved, now_iso())?
        }
    };

    Ok(ExportPayload {
        bytes,
        content_type: format.content_type(),
        filename,
    })
}

/// Walk every note attachment and performance review, hashing each file once.
///
/// References whose file is missing or unreadable are dropped with a warning;
/// the rest get their `checksum` filled in.
pub async fn resolve_attachments(
    mut dataset: EmployeeDatabase,
    attachments: &AttachmentStore,
) -> ResolvedExport {
    let mut resolver = Resolver {
        attachments,
        documents: BTreeMap::new(),
        checksums: BTreeMap::new(),
        unresolved: HashSet::new(),
        warnings: Vec::new(),
    };

    for employee in &mut dataset.employees {
        for note in &mut employee.notes {
            if let Some(docs) = note.supporting_documents.take() {
                note.supporting_documents = Some(resolver.resolve_all(docs, "Document").await);
            }
        }

        let reviews = std::mem::take(&mut employee.performance_reviews);
        employee.performance_reviews = resolver
            .resolve_all(reviews, "Performance review document")
            .await;
    }

    ResolvedExport {
        dataset,
        documents: resolver.documents,
        warnings: resolver.warnings,
    }
}

struct Resolver<'a> {
    attachments: &'a AttachmentStore,
    documents: BTreeMap<String, Vec<u8>>,
    checksums: BTreeMap<String, String>,
    unresolved: HashSet<String>,
    warnings: Vec<String>,
}

impl Resolver<'_> {
    async fn resolve_all(
        &mut self,
        docs: Vec<SupportingDocument>,
        label: &str,
    ) -> Vec<SupportingDocument> {
        let mut kept = Vec::with_capacity(docs.len());
        for doc in docs {
            if let Some(doc) = self.resolve(doc, label).await {
                kept.push(doc);
            }
        }
        kept
    }

    async fn resolve(&mut self, mut doc: SupportingDocument, label: &str) -> Option<SupportingDocument> {
        if let Some(checksum) = self.checksums.get(&doc.filename) {
            doc.checksum = Some(checksum.clone());
            return Some(doc);
        }

        if self.unresolved.contains(&doc.filename) || !self.attachments.exists(&doc.filename).await {
            self.warn(format!("{} not found: {}", label, doc.filename));
            self.unresolved.insert(doc.filename);
            return None;
        }

        match self.attachments.read(&doc.filename).await {
            Ok(bytes) => {
                let checksum = sha256_hex(&bytes);
                self.checksums.insert(doc.filename.clone(), checksum.clone());
                self.documents.insert(doc.filename.clone(), bytes);
                doc.checksum = Some(checksum);
                Some(doc)
            }
            Err(e) => {
                self.warn(format!("Error processing {} {}: {}", label, doc.filename, e));
                self.unresolved.insert(doc.filename);
                None
            }
        }
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Serialize a resolved export into ZIP bytes.
pub fn build_archive(resolved: &ResolvedExport, export_date: String) -> Result<Vec<u8>, ArchiveError> {
    let dataset_json = serde_json::to_vec_pretty(&resolved.dataset).map_err(build_err)?;
    let manifest = ArchiveManifest::new(
        export_date,
        resolved.documents.len(),
        resolved.dataset.employees.len(),
    );
    let manifest_json = serde_json::to_vec_pretty(&manifest).map_err(build_err)?;

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(DATASET_ENTRY, options)
            .map_err(build_err)?;
        zip.write_all(&dataset_json).map_err(build_err)?;

        for (filename, bytes) in &resolved.documents {
            zip.start_file(format!("{}{}", DOCUMENTS_PREFIX, filename), options)
                .map_err(build_err)?;
            zip.write_all(bytes).map_err(build_err)?;
        }

        zip.start_file(MANIFEST_ENTRY, options)
            .map_err(build_err)?;
        zip.write_all(&manifest_json).map_err(build_err)?;

        zip.finish().map_err(build_err)?;
    }

    Ok(cursor.into_inner())
}

fn build_err(e: impl std::fmt::Display) -> ArchiveError {
    ArchiveError::Build(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, EmployeeNote};
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn doc(filename: &str) -> SupportingDocument {
        SupportingDocument {
            id: format!("id-{}", filename),
            filename: filename.to_string(),
            original_name: filename.to_string(),
            path: format!("/api/files/{}", filename),
            mime_type: "application/pdf".to_string(),
            size: 17,
            checksum: None,
        }
    }

    fn note(id: &str, docs: Vec<SupportingDocument>) -> EmployeeNote {
        EmployeeNote {
            id: id.to_string(),
            date: "2023-01-01".to_string(),
            content: format!("note {}", id),
            supporting_documents: Some(docs),
        }
    }

    fn dataset(notes: Vec<EmployeeNote>, reviews: Vec<SupportingDocument>) -> EmployeeDatabase {
        EmployeeDatabase {
            employees: vec![Employee {
                id: "1".to_string(),
                name: "John Doe".to_string(),
                start_date: "2023-01-01".to_string(),
                notes,
                praise: vec![],
                feedback: vec![],
                performance_reviews: reviews,
            }],
            last_updated: "2023-01-01T00:00:00.000Z".to_string(),
        }
    }

    async fn store_with(files: &[(&str, &str)]) -> (TempDir, AttachmentStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = AttachmentStore::new(temp_dir.path().join("resources"));
        store.ensure_directory().await.unwrap();
        for (name, bytes) in files {
            store.write(name, bytes.as_bytes()).await.unwrap();
        }
        (temp_dir, store)
    }

    #[tokio::test]
    async fn test_missing_file_is_dropped_with_warning() {
        let (_temp_dir, store) = store_with(&[]).await;
        let data = dataset(vec![note("n1", vec![doc("gone.pdf")])], vec![]);

        let resolved = resolve_attachments(data, &store).await;

        let docs = resolved.dataset.employees[0].notes[0]
            .supporting_documents
            .as_ref()
            .unwrap();
        assert!(docs.is_empty());
        assert!(resolved.documents.is_empty());
        assert_eq!(resolved.warnings.len(), 1);
        assert!(resolved.warnings[0].contains("gone.pdf"));
    }

    #[tokio::test]
    async fn test_checksums_added_and_files_deduplicated() {
        let content = "test file content";
        let (_temp_dir, store) = store_with(&[("shared.pdf", content), ("review.pdf", "r")]).await;
        let data = dataset(
            vec![
                note("n1", vec![doc("shared.pdf")]),
                note("n2", vec![doc("shared.pdf")]),
            ],
            vec![doc("review.pdf")],
        );

        let resolved = resolve_attachments(data, &store).await;
        let employee = &resolved.dataset.employees[0];
        let expected = sha256_hex(content.as_bytes());

        for n in &employee.notes {
            let docs = n.supporting_documents.as_ref().unwrap();
            assert_eq!(docs[0].checksum.as_deref(), Some(expected.as_str()));
        }
        assert_eq!(
            employee.performance_reviews[0].checksum.as_deref(),
            Some(sha256_hex(b"r").as_str())
        );
        assert_eq!(resolved.documents.len(), 2);
        assert!(resolved.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_missing_review_is_dropped() {
        let (_temp_dir, store) = store_with(&[("kept.pdf", "k")]).await;
        let data = dataset(vec![], vec![doc("kept.pdf"), doc("lost.pdf")]);

        let resolved = resolve_attachments(data, &store).await;
        let reviews = &resolved.dataset.employees[0].performance_reviews;

        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].filename, "kept.pdf");
        assert!(resolved.warnings[0].starts_with("Performance review document not found"));
    }

    #[tokio::test]
    async fn test_archive_layout() {
        let (_temp_dir, store) = store_with(&[("a.pdf", "alpha")]).await;
        let data = dataset(vec![note("n1", vec![doc("a.pdf")])], vec![]);
        let resolved = resolve_attachments(data, &store).await;

        let bytes = build_archive(&resolved, "2024-05-01T10:00:00.000Z".to_string()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let mut manifest = String::new();
        archive
            .by_name(MANIFEST_ENTRY)
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        let manifest: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(manifest["format"], "employee-notes-archive");
        assert_eq!(manifest["version"], "2.0");
        assert_eq!(manifest["documentCount"], 1);
        assert_eq!(manifest["employeeCount"], 1);
        assert_eq!(manifest["exportDate"], "2024-05-01T10:00:00.000Z");

        let mut attachment = Vec::new();
        archive
            .by_name("documents/a.pdf")
            .unwrap()
            .read_to_end(&mut attachment)
            .unwrap();
        assert_eq!(attachment, b"alpha");

        let mut dataset_json = String::new();
        archive
            .by_name(DATASET_ENTRY)
            .unwrap()
            .read_to_string(&mut dataset_json)
            .unwrap();
        // Pretty-printed
        assert!(dataset_json.contains("\n  \"employees\""));
        assert!(dataset_json.contains(&sha256_hex(b"alpha")));
    }

    #[tokio::test]
    async fn test_export_leaves_sources_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::new(temp_dir.path().join("employees.json"));
        let store = AttachmentStore::new(temp_dir.path().join("resources"));
        store.ensure_directory().await.unwrap();
        store.write("a.pdf", b"alpha").await.unwrap();
        repo.replace(dataset(
            vec![note("n1", vec![doc("a.pdf"), doc("missing.pdf")])],
            vec![],
        ))
        .await
        .unwrap();
        let before = std::fs::read(repo.path()).unwrap();

        let payload = export_dataset(&repo, &store, ExportFormat::Zip).await.unwrap();
        assert_eq!(payload.content_type, "application/zip");
        assert!(payload.filename.starts_with("employee-data-"));
        assert!(payload.filename.ends_with(".zip"));

        assert_eq!(std::fs::read(repo.path()).unwrap(), before);
        let stored = repo.load().await.unwrap();
        let docs = stored.employees[0].notes[0].supporting_documents.as_ref().unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].checksum.is_none());
    }

    #[tokio::test]
    async fn test_json_export_is_plain_document() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::new(temp_dir.path().join("employees.json"));
        let store = AttachmentStore::new(temp_dir.path().join("resources"));
        repo.replace(dataset(vec![note("n1", vec![doc("missing.pdf")])], vec![]))
            .await
            .unwrap();

        let payload = export_dataset(&repo, &store, ExportFormat::Json).await.unwrap();
        assert_eq!(payload.content_type, "application/json");
        assert!(payload.filename.ends_with(".json"));

        let exported: EmployeeDatabase = serde_json::from_slice(&payload.bytes).unwrap();
        let docs = exported.employees[0].notes[0].supporting_documents.as_ref().unwrap();
        // No resolution in legacy mode
        assert_eq!(docs.len(), 1);
        assert!(docs[0].checksum.is_none());
    }
}
