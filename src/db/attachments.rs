//! Local directory of uploaded attachment files.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Attachment directory keyed by stored filename.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Map a stored filename to its path, refusing anything that is not a
    /// single plain path component.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        is_plain_filename(filename).then(|| self.root.join(filename))
    }

    /// Create the directory if it does not exist yet.
    pub async fn ensure_directory(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Whether a regular file with this stored filename exists.
    pub async fn exists(&self, filename: &str) -> bool {
        match self.resolve(filename) {
            Some(path) => tokio::fs::metadata(path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            None => false,
        }
    }

    pub async fn read(&self, filename: &str) -> io::Result<Vec<u8>> {
        let path = self.resolve(filename).ok_or_else(|| invalid_name(filename))?;
        tokio::fs::read(path).await
    }

    pub async fn write(&self, filename: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.resolve(filename).ok_or_else(|| invalid_name(filename))?;
        tokio::fs::write(path, bytes).await
    }
}

/// True when `name` is one normal path component with no separators.
pub fn is_plain_filename(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn invalid_name(filename: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("invalid attachment filename: {}", filename),
    )
}
