//! In-memory storage backend

use super::{StorageBackend, StorageError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

/// File map keyed by normalized relative path
#[derive(Debug, Default)]
pub struct MemoryStorageBackend {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
    dirs: RwLock<BTreeSet<String>>,
}

fn normalize(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

impl MemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of every stored file
    pub fn paths(&self) -> Vec<String> {
        match self.files.read() {
            Ok(files) => files.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        }
    }

    fn check(path: &str) -> Result<String, StorageError> {
        if path.contains("..") {
            return Err(StorageError::PermissionDenied(
                "Path traversal (..) not allowed".to_string(),
            ));
        }
        Ok(normalize(path))
    }
}

impl StorageBackend for MemoryStorageBackend {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let key = Self::check(path)?;
        let files = self.files.read().unwrap_or_else(|p| p.into_inner());
        files
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::FileNotFound(path.to_string()))
    }

    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        let key = Self::check(path)?;
        let mut files = self.files.write().unwrap_or_else(|p| p.into_inner());
        files.insert(key, content.to_vec());
        Ok(())
    }

    fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let prefix = Self::check(dir)?;
        if !self.dir_exists(dir)? {
            return Err(StorageError::DirectoryNotFound(dir.to_string()));
        }
        let files = self.files.read().unwrap_or_else(|p| p.into_inner());
        Ok(files
            .keys()
            .filter_map(|key| {
                let rest = if prefix.is_empty() {
                    key.as_str()
                } else {
                    key.strip_prefix(&prefix)?.strip_prefix('/')?
                };
                (!rest.contains('/')).then(|| rest.to_string())
            })
            .collect())
    }

    fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        let key = Self::check(path)?;
        let files = self.files.read().unwrap_or_else(|p| p.into_inner());
        Ok(files.contains_key(&key))
    }

    fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let key = Self::check(path)?;
        let mut files = self.files.write().unwrap_or_else(|p| p.into_inner());
        files
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| StorageError::FileNotFound(path.to_string()))
    }

    fn create_dir(&self, path: &str) -> Result<(), StorageError> {
        let key = Self::check(path)?;
        let mut dirs = self.dirs.write().unwrap_or_else(|p| p.into_inner());
        dirs.insert(key);
        Ok(())
    }

    fn dir_exists(&self, path: &str) -> Result<bool, StorageError> {
        let key = Self::check(path)?;
        if key.is_empty() {
            return Ok(true);
        }
        let dirs = self.dirs.read().unwrap_or_else(|p| p.into_inner());
        if dirs.contains(&key) {
            return Ok(true);
        }
        let files = self.files.read().unwrap_or_else(|p| p.into_inner());
        let prefix = format!("{}/", key);
        Ok(files.keys().any(|k| k.starts_with(&prefix)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_files_is_shallow() {
        let backend = MemoryStorageBackend::new();
        backend.write_file("mfsim.nam", b"").unwrap();
        backend.write_file("/flow/flow.nam", b"").unwrap();
        backend.write_file("flow/ext/rch_1.txt", b"").unwrap();

        assert_eq!(backend.list_files("").unwrap(), vec!["mfsim.nam".to_string()]);
        assert_eq!(backend.list_files("flow").unwrap(), vec!["flow.nam".to_string()]);
        assert!(backend.dir_exists("flow/ext").unwrap());
        assert!(matches!(
            backend.list_files("missing"),
            Err(StorageError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_traversal_rejected() {
        let backend = MemoryStorageBackend::new();
        assert!(matches!(
            backend.write_file("../x", b""),
            Err(StorageError::PermissionDenied(_))
        ));
    }
}
