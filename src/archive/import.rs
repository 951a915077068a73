//! Import of an uploaded archive or legacy dataset document.

use std::collections::HashSet;
use std::io::{self, Cursor, Read};
use std::path::Path;

use serde_json::Value;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{
    sha256_hex, validate_dataset, ArchiveError, DATASET_ENTRY, DOCUMENTS_PREFIX, MANIFEST_ENTRY,
};
use crate::db::{is_plain_filename, AttachmentStore, Repository};
use crate::errors::AppError;
use crate::models::{ArchiveManifest, EmployeeDatabase, ImportOutcome};

/// A file received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// How an upload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Archive,
    Document,
}

/// Decide from the declared media type or file extension what an upload is.
pub fn classify_upload(upload: &UploadedFile) -> Result<UploadKind, ArchiveError> {
    let content_type = upload
        .content_type
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase());
    let name = upload.file_name.to_ascii_lowercase();

    match content_type.as_deref() {
        Some("application/zip") | Some("application/x-zip-compressed") => Ok(UploadKind::Archive),
        _ if name.ends_with(".zip") => Ok(UploadKind::Archive),
        Some("application/json") => Ok(UploadKind::Document),
        _ if name.ends_with(".json") => Ok(UploadKind::Document),
        _ => Err(ArchiveError::UnsupportedType),
    }
}

/// Counters gathered while placing attachments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportCounts {
    pub imported: usize,
    pub missing: usize,
    pub checksum_errors: usize,
}

/// Dataset and attachment entries read out of an archive.
#[derive(Debug)]
pub struct ArchiveContents {
    pub dataset: EmployeeDatabase,
    /// `(entry name, bytes)` for every file under `documents/`
    pub documents: Vec<(String, Vec<u8>)>,
    /// Entries whose bytes could not be read back
    pub unreadable: Vec<String>,
}

/// Import an upload, replacing the dataset store on success.
///
/// Every format and structure problem is reported before the store is touched.
/// `max_entry_bytes` caps the decompressed size of each archive entry.
pub async fn import_upload(
    repo: &Repository,
    attachments: &AttachmentStore,
    upload: UploadedFile,
    max_entry_bytes: u64,
) -> Result<ImportOutcome, AppError> {
    let kind = classify_upload(&upload)?;
    tracing::info!(
        "Importing {} ({:?}, {} bytes)",
        upload.file_name,
        kind,
        upload.bytes.len()
    );

    let (dataset, counts) = match kind {
        UploadKind::Archive => {
            let contents = read_archive(&upload.bytes, max_entry_bytes)?;
            restore_attachments(contents, attachments).await?
        }
        UploadKind::Document => {
            let value = serde_json::from_slice(&upload.bytes)
                .map_err(|e| ArchiveError::InvalidJson(e.to_string()))?;
            let dataset = validate_dataset(value)?;
            reconcile_missing(dataset, attachments).await
        }
    };

    repo.replace(dataset).await.map_err(|e| {
        tracing::error!("Failed to commit imported dataset: {}", e);
        e.with_server_message("Failed to import data")
    })?;

    let outcome = ImportOutcome::new(counts.imported, counts.missing, counts.checksum_errors);
    tracing::info!("{}", outcome.message);
    Ok(outcome)
}

/// Open an archive, check its manifest and read the dataset and attachments.
///
/// No entry is decompressed past `max_entry_bytes`. An oversized dataset or
/// manifest rejects the archive; an oversized or unopenable attachment is
/// reported in `unreadable` and the rest of the archive is still read.
pub fn read_archive(bytes: &[u8], max_entry_bytes: u64) -> Result<ArchiveContents, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ArchiveError::CorruptContainer(e.to_string()))?;

    match read_entry(&mut archive, MANIFEST_ENTRY, max_entry_bytes)? {
        Some(raw) => {
            let manifest: Value = serde_json::from_slice(&raw)
                .map_err(|e| ArchiveError::InvalidManifest(e.to_string()))?;
            if !ArchiveManifest::declares_supported_format(&manifest) {
                return Err(ArchiveError::WrongFormat);
            }
        }
        None => tracing::debug!("Archive has no manifest, skipping format check"),
    }

    let raw = read_entry(&mut archive, DATASET_ENTRY, max_entry_bytes)?
        .ok_or(ArchiveError::MissingDataset)?;
    let value = serde_json::from_slice(&raw)
        .map_err(|e| ArchiveError::InvalidDatasetJson(e.to_string()))?;
    let dataset = validate_dataset(value)?;

    // Names come from the central directory, so entries outside documents/
    // are never opened.
    let names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with(DOCUMENTS_PREFIX) && !name.ends_with('/'))
        .map(str::to_string)
        .collect();

    let mut documents = Vec::new();
    let mut unreadable = Vec::new();
    for name in names {
        let read = match archive.by_name(&name) {
            Ok(mut entry) => {
                let declared = entry.size();
                read_capped(&mut entry, declared, max_entry_bytes)
            }
            Err(e) => Err(io::Error::other(e)),
        };

        match read {
            Ok(data) => documents.push((name, data)),
            Err(e) => {
                tracing::warn!("Failed to read archive entry {}: {}", name, e);
                unreadable.push(name);
            }
        }
    }

    Ok(ArchiveContents {
        dataset,
        documents,
        unreadable,
    })
}

fn read_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
    max_entry_bytes: u64,
) -> Result<Option<Vec<u8>>, ArchiveError> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let declared = file.size();
            read_capped(&mut file, declared, max_entry_bytes)
                .map(Some)
                .map_err(|e| ArchiveError::CorruptContainer(format!("{}: {}", name, e)))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(ArchiveError::CorruptContainer(e.to_string())),
    }
}

/// Read at most `limit` bytes; the header size is checked first and the
/// stream is cut at `limit + 1` so a lying header cannot get past the cap.
fn read_capped(reader: impl Read, declared_size: u64, limit: u64) -> io::Result<Vec<u8>> {
    let too_large = || {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("entry exceeds the {} byte limit", limit),
        )
    };

    if declared_size > limit {
        return Err(too_large());
    }

    let mut buffer = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut buffer)?;
    if buffer.len() as u64 > limit {
        return Err(too_large());
    }
    Ok(buffer)
}

/// Stored filename for an archive entry, its final path component.
pub fn entry_target_name(entry_name: &str) -> Option<&str> {
    Path::new(entry_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| is_plain_filename(n))
}

/// Checksum recorded for `filename` anywhere in the dataset.
pub fn recorded_checksum<'a>(dataset: &'a EmployeeDatabase, filename: &str) -> Option<&'a str> {
    dataset
        .employees
        .iter()
        .flat_map(|employee| employee.documents())
        .filter(|doc| doc.filename == filename)
        .find_map(|doc| doc.checksum.as_deref())
}

/// Verify and write every attachment of an archive.
///
/// Attachments failing their checksum are not written and their references are
/// removed from the dataset, so no reference points at a file that was never
/// restored. Attachments that cannot be written are counted as missing and
/// pruned the same way. Entries in different folders that map to the same
/// stored filename are written once: the first copy that is written wins and
/// its references are kept even if another copy failed.
pub async fn restore_attachments(
    contents: ArchiveContents,
    attachments: &AttachmentStore,
) -> Result<(EmployeeDatabase, ImportCounts), ArchiveError> {
    let ArchiveContents {
        mut dataset,
        documents,
        unreadable,
    } = contents;

    attachments.ensure_directory().await?;

    let mut counts = ImportCounts::default();
    let mut rejected = HashSet::new();
    let mut written: HashSet<String> = HashSet::new();

    for entry_name in unreadable {
        if let Some(target) = entry_target_name(&entry_name) {
            counts.checksum_errors += 1;
            rejected.insert(target.to_string());
        }
    }

    for (entry_name, data) in documents {
        let Some(target) = entry_target_name(&entry_name) else {
            tracing::warn!("Skipping archive entry with unusable name: {}", entry_name);
            continue;
        };

        if written.contains(target) {
            tracing::warn!(
                "Skipping archive entry {}, {} was already restored",
                entry_name,
                target
            );
            continue;
        }

        if let Some(expected) = recorded_checksum(&dataset, target) {
            let actual = sha256_hex(&data);
            if actual != expected {
                tracing::warn!(
                    "Checksum mismatch for {}: expected {}, got {}",
                    target,
                    expected,
                    actual
                );
                counts.checksum_errors += 1;
                rejected.insert(target.to_string());
                continue;
            }
        }

        match attachments.write(target, &data).await {
            Ok(()) => {
                counts.imported += 1;
                written.insert(target.to_string());
            }
            Err(e) => {
                tracing::warn!("Failed to write document {}: {}", target, e);
                counts.missing += 1;
                rejected.insert(target.to_string());
            }
        }
    }

    rejected.retain(|filename: &String| !written.contains(filename));
    prune_references(&mut dataset, |filename| !rejected.contains(filename));
    Ok((dataset, counts))
}

/// Drop note attachment references whose file is not in the attachment directory.
///
/// Only used for legacy documents, which carry no files of their own.
pub async fn reconcile_missing(
    mut dataset: EmployeeDatabase,
    attachments: &AttachmentStore,
) -> (EmployeeDatabase, ImportCounts) {
    let mut counts = ImportCounts::default();

    for employee in &mut dataset.employees {
        for note in &mut employee.notes {
            let Some(docs) = note.supporting_documents.take() else {
                continue;
            };

            let mut kept = Vec::with_capacity(docs.len());
            for doc in docs {
                if attachments.exists(&doc.filename).await {
                    kept.push(doc);
                } else {
                    tracing::warn!("Dropping reference to missing document {}", doc.filename);
                    counts.missing += 1;
                }
            }
            note.supporting_documents = Some(kept);
        }
    }

    (dataset, counts)
}

fn prune_references<F>(dataset: &mut EmployeeDatabase, keep: F)
where
    F: Fn(&str) -> bool,
{
    for employee in &mut dataset.employees {
        for note in &mut employee.notes {
            if let Some(docs) = note.supporting_documents.as_mut() {
                docs.retain(|doc| keep(&doc.filename));
            }
        }
        employee
            .performance_reviews
            .retain(|doc| keep(&doc.filename));
    }
}
