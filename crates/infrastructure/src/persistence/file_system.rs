//! Real file system implementation.

use std::io::ErrorKind;
use std::path::Path;

use pulse_application::ports::{FileSystem, FileSystemError};
use tokio::fs;

/// File system backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    /// Creates a new `TokioFileSystem`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn classify(error: std::io::Error, path: &Path) -> FileSystemError {
    match error.kind() {
        ErrorKind::NotFound => FileSystemError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => FileSystemError::PermissionDenied(path.to_path_buf()),
        _ => FileSystemError::Io(error),
    }
}

impl FileSystem for TokioFileSystem {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FileSystemError> {
        fs::read(path).await.map_err(|e| classify(e, path))
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FileSystemError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, contents).await.map_err(|e| classify(e, path))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), FileSystemError> {
        fs::create_dir_all(path).await.map_err(|e| classify(e, path))
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).await.is_ok()
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), FileSystemError> {
        fs::rename(from, to).await.map_err(|e| classify(e, from))
    }

    async fn remove_file(&self, path: &Path) -> Result<(), FileSystemError> {
        fs::remove_file(path).await.map_err(|e| classify(e, path))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/pulse/session.json");
        let fs = TokioFileSystem::new();

        fs.write_file(&path, b"{}").await.unwrap();

        assert!(fs.exists(&path).await);
        assert_eq!(fs.read_file(&path).await.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let error = TokioFileSystem::new().read_file(&path).await.unwrap_err();

        assert!(matches!(error, FileSystemError::NotFound(p) if p == path));
    }

    #[tokio::test]
    async fn test_rename_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("session.json.tmp");
        let to = dir.path().join("session.json");
        let fs = TokioFileSystem::new();
        fs.write_file(&to, b"old").await.unwrap();
        fs.write_file(&from, b"new").await.unwrap();

        fs.rename(&from, &to).await.unwrap();

        assert_eq!(fs.read_file(&to).await.unwrap(), b"new");
        assert!(!fs.exists(&from).await);
    }
}
