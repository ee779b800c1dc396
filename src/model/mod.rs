//! Models and simulations
//!
//! A [`Model`] owns an ordered set of packages plus its name file; a
//! [`Simulation`] owns the simulation-level packages (TDIS, IMS) and its
//! models. Both render every file in memory before anything is stored.
//! [`SimulationLoader`] and [`SimulationSaver`] move simulations through a
//! storage backend.

mod error;
pub mod flow_model;
pub mod loader;
pub mod saver;
pub mod simulation;

pub use error::ModelError;
pub use flow_model::Model;
pub use loader::SimulationLoader;
pub use saver::SimulationSaver;
pub use simulation::{SIM_NAME_FILE, Simulation};

/// One rendered input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// File name relative to the simulation directory
    pub path: String,
    pub content: String,
}

impl RenderedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}
