//! Storage backend abstraction
//!
//! Simulation files are read and written through the StorageBackend trait:
//! - FileSystemStorageBackend: native file system rooted at a base directory
//! - MemoryStorageBackend: in-memory file map (tests, dry runs)

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Trait for storage backends
///
/// Paths are relative to the backend root and use `/` as separator.
pub trait StorageBackend: Send + Sync {
    /// Read a file from storage
    fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a file to storage, replacing any previous content
    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError>;

    /// List file names in a directory
    fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError>;

    fn file_exists(&self, path: &str) -> Result<bool, StorageError>;

    fn delete_file(&self, path: &str) -> Result<(), StorageError>;

    fn create_dir(&self, path: &str) -> Result<(), StorageError>;

    fn dir_exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Read a file as UTF-8 text
    fn read_text(&self, path: &str) -> Result<String, StorageError> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes)
            .map_err(|e| StorageError::IoError(format!("File {} is not valid UTF-8: {}", path, e)))
    }
}

impl<T: StorageBackend + ?Sized> StorageBackend for &T {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        (**self).read_file(path)
    }

    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        (**self).write_file(path, content)
    }

    fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        (**self).list_files(dir)
    }

    fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        (**self).file_exists(path)
    }

    fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        (**self).delete_file(path)
    }

    fn create_dir(&self, path: &str) -> Result<(), StorageError> {
        (**self).create_dir(path)
    }

    fn dir_exists(&self, path: &str) -> Result<bool, StorageError> {
        (**self).dir_exists(path)
    }
}

/// Join a directory and a file name with `/`
pub fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

#[cfg(feature = "native-fs")]
pub mod filesystem;
pub mod memory;

#[cfg(feature = "native-fs")]
pub use filesystem::FileSystemStorageBackend;
pub use memory::MemoryStorageBackend;
