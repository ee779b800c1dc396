//! File system storage backend
//!
//! ## Security
//!
//! All path operations are validated to prevent path traversal attacks.
//! Paths containing ".." are rejected, and all resolved paths are verified
//! to remain within the base directory.
//!
//! Writes go to a temporary sibling file that is renamed over the target, so
//! a reader never sees a half-written package file.

use super::{StorageBackend, StorageError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// File system storage backend
#[derive(Debug, Clone)]
pub struct FileSystemStorageBackend {
    base_path: PathBuf,
}

impl FileSystemStorageBackend {
    /// Create a backend rooted at `base_path`
    ///
    /// # Example
    ///
    /// ```rust
    /// use mf6_modelling_sdk::storage::FileSystemStorageBackend;
    ///
    /// let backend = FileSystemStorageBackend::new("/simulations/flow");
    /// ```
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn base_canonical(&self) -> PathBuf {
        self.base_path
            .canonicalize()
            .unwrap_or_else(|_| self.base_path.clone())
    }

    /// Resolve a path relative to the base path with security checks.
    fn resolve_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        let normalized = path.trim_start_matches('/');

        if normalized.contains("..") {
            return Err(StorageError::PermissionDenied(
                "Path traversal (..) not allowed".to_string(),
            ));
        }

        let full = self.base_path.join(normalized);

        for component in full.components() {
            if matches!(component, Component::ParentDir) {
                return Err(StorageError::PermissionDenied(
                    "Path traversal not allowed".to_string(),
                ));
            }
        }

        if full.exists() {
            let canonical = full
                .canonicalize()
                .map_err(|e| StorageError::IoError(format!("Failed to resolve path: {}", e)))?;
            if !canonical.starts_with(self.base_canonical()) {
                return Err(StorageError::PermissionDenied(
                    "Path escapes base directory".to_string(),
                ));
            }
            return Ok(canonical);
        }

        if let Some(parent) = full.parent()
            && parent.exists()
        {
            let parent_canonical = parent.canonicalize().map_err(|e| {
                StorageError::IoError(format!("Failed to resolve parent path: {}", e))
            })?;
            if !parent_canonical.starts_with(self.base_canonical()) {
                return Err(StorageError::PermissionDenied(
                    "Path escapes base directory".to_string(),
                ));
            }
        }

        Ok(full)
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

impl StorageBackend for FileSystemStorageBackend {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full_path = self.resolve_path(path)?;

        fs::read(&full_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::FileNotFound(path.to_string())
            } else {
                StorageError::IoError(format!("Failed to read file {}: {}", path, e))
            }
        })
    }

    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        let full_path = self.resolve_path(path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::IoError(format!("Failed to create directory for {}: {}", path, e))
            })?;
        }

        let temp = temp_sibling(&full_path);
        let written = fs::write(&temp, content)
            .map_err(|e| format!("Failed to write file {}: {}", path, e))
            .and_then(|_| {
                fs::rename(&temp, &full_path)
                    .map_err(|e| format!("Failed to replace file {}: {}", path, e))
            });
        if let Err(message) = written {
            let _ = fs::remove_file(&temp);
            return Err(StorageError::IoError(message));
        }
        debug!("Wrote {} bytes to {}", content.len(), full_path.display());
        Ok(())
    }

    fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let full_path = self.resolve_path(dir)?;

        let read_dir = fs::read_dir(&full_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::DirectoryNotFound(dir.to_string())
            } else {
                StorageError::IoError(format!("Failed to read directory {}: {}", dir, e))
            }
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry
                .map_err(|e| StorageError::IoError(format!("Failed to read directory entry: {}", e)))?;
            if let Ok(file_type) = entry.file_type()
                && file_type.is_file()
                && let Some(file_name) = entry.file_name().to_str()
            {
                entries.push(file_name.to_string());
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        let full_path = self.resolve_path(path)?;

        match fs::metadata(&full_path) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(format!(
                "Failed to check file existence {}: {}",
                path, e
            ))),
        }
    }

    fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let full_path = self.resolve_path(path)?;

        fs::remove_file(&full_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::FileNotFound(path.to_string())
            } else {
                StorageError::IoError(format!("Failed to delete file {}: {}", path, e))
            }
        })
    }

    fn create_dir(&self, path: &str) -> Result<(), StorageError> {
        let full_path = self.resolve_path(path)?;

        fs::create_dir_all(&full_path).map_err(|e| {
            StorageError::IoError(format!("Failed to create directory {}: {}", path, e))
        })
    }

    fn dir_exists(&self, path: &str) -> Result<bool, StorageError> {
        let full_path = self.resolve_path(path)?;

        match fs::metadata(&full_path) {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(format!(
                "Failed to check directory existence {}: {}",
                path, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_traversal_blocked() {
        let temp = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(temp.path());

        let result = backend.resolve_path("../etc/passwd");
        assert!(matches!(result, Err(StorageError::PermissionDenied(_))));

        let result = backend.resolve_path("/foo/../../../etc/passwd");
        assert!(matches!(result, Err(StorageError::PermissionDenied(_))));

        assert!(backend.resolve_path("valid/path/file.txt").is_ok());
    }

    #[test]
    fn test_write_replaces_content() {
        let temp = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(temp.path());

        backend.write_file("sim/model.rch", b"first").unwrap();
        backend.write_file("sim/model.rch", b"second").unwrap();

        assert_eq!(backend.read_text("sim/model.rch").unwrap(), "second");
        assert_eq!(backend.list_files("sim").unwrap(), vec!["model.rch".to_string()]);
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(temp.path());
        fs::create_dir_all(temp.path().join("sim/flow.rch/inner")).unwrap();

        assert!(matches!(
            backend.write_file("sim/flow.rch", b"BEGIN options\nEND options\n"),
            Err(StorageError::IoError(_))
        ));
        assert!(backend.list_files("sim").unwrap().is_empty());
        assert!(!temp_sibling(&temp.path().join("sim/flow.rch")).exists());
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(temp.path());

        assert!(!backend.file_exists("mfsim.nam").unwrap());
        assert!(matches!(
            backend.read_file("mfsim.nam"),
            Err(StorageError::FileNotFound(_))
        ));
        assert!(matches!(
            backend.delete_file("mfsim.nam"),
            Err(StorageError::FileNotFound(_))
        ));
    }
}
