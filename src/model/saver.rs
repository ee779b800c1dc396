//! Simulation saving
//!
//! Every file is rendered (and validated) in memory first; storage is only
//! touched once the whole simulation renders.

use super::error::ModelError;
use super::{Model, RenderedFile, Simulation};
use crate::config::SdkConfig;
use crate::storage::{StorageBackend, join_path};
use tracing::info;

/// Simulation saver that uses a storage backend
pub struct SimulationSaver<B: StorageBackend> {
    storage: B,
}

impl<B: StorageBackend> SimulationSaver<B> {
    pub fn new(storage: B) -> Self {
        Self { storage }
    }

    /// Write every simulation file into `dir`, returning the stored paths
    pub fn save(&self, simulation: &Simulation, dir: &str) -> Result<Vec<String>, ModelError> {
        let files = simulation.write_all()?;
        let paths = self.store(dir, &files)?;
        info!(
            "Saved simulation '{}' ({} files) to {}",
            simulation.name(),
            paths.len(),
            if dir.is_empty() { "." } else { dir }
        );
        Ok(paths)
    }

    /// Write one model's name file and packages into `dir`
    pub fn save_model(
        &self,
        model: &Model,
        config: &SdkConfig,
        dir: &str,
    ) -> Result<Vec<String>, ModelError> {
        let files = model.write_all(config)?;
        let paths = self.store(dir, &files)?;
        info!("Saved model '{}' ({} files)", model.name(), paths.len());
        Ok(paths)
    }

    fn store(&self, dir: &str, files: &[RenderedFile]) -> Result<Vec<String>, ModelError> {
        if !dir.is_empty() && !self.storage.dir_exists(dir)? {
            self.storage.create_dir(dir)?;
        }
        let mut paths = Vec::with_capacity(files.len());
        for file in files {
            let path = join_path(dir, &file.path);
            self.storage.write_file(&path, file.content.as_bytes())?;
            info!("Saved {}", path);
            paths.push(path);
        }
        Ok(paths)
    }
}
