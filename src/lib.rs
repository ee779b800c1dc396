//! MF6 Modelling SDK - schema-driven input files for groundwater simulations
//!
//! Provides unified interfaces for:
//! - Package definitions (catalog) and the field templates generated from them
//! - Values bound to templates, validated when set and again when written
//! - Block-file rendering and parsing of packages
//! - Models and simulations with cross-package file references
//! - Loading and saving simulations through storage backends

pub mod catalog;
pub mod config;
pub mod data;
pub mod model;
pub mod models;
pub mod package;
pub mod packages;
pub mod storage;
pub mod template;
pub mod validation;

// Re-export commonly used types
pub use catalog::{SchemaCatalog, SchemaError};
pub use config::{ConfigError, SdkConfig};
pub use data::{BoundData, FileResolver, NoReferences};
pub use model::{Model, ModelError, RenderedFile, Simulation, SimulationLoader, SimulationSaver};
pub use models::{
    ArrayValue, CellValue, ExternalFile, FieldKind, FieldSchema, FieldValue, GridKind, Row,
    SchemaPath,
};
pub use package::{Block, Package};
pub use packages::GwfRch;
pub use storage::{MemoryStorageBackend, StorageBackend, StorageError};
#[cfg(feature = "native-fs")]
pub use storage::FileSystemStorageBackend;
pub use template::{Template, TemplateGenerator};
pub use validation::{BindContext, DataError, FieldRule, MemberOfRule};
