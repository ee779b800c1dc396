//! Field type registry
//!
//! The catalog maps every [`SchemaPath`] to exactly one [`FieldSchema`]. It is
//! loaded once (from YAML, JSON or the built-in definitions), checked for
//! consistency, and read-only afterwards, so it can be shared between models
//! behind an `Arc` without locking.

mod checks;

use crate::models::{PackageDefinition, SchemaPath};
use crate::models::schema::FieldSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Built-in catalog shipped with the SDK
const BUILTIN_CATALOG: &str = include_str!("../../schemas/mf6-catalog.yaml");

/// Error type for catalog operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema not found: {path}")]
    NotFound { path: SchemaPath },
    #[error("Failed to parse catalog: {0}")]
    Parse(String),
    #[error("Invalid catalog entry {path}: {reason}")]
    InvalidCatalog { path: SchemaPath, reason: String },
}

/// On-disk catalog layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub packages: Vec<PackageDefinition>,
}

/// Read-only registry of package and field schemas
#[derive(Debug)]
pub struct SchemaCatalog {
    version: Option<String>,
    packages: Vec<Arc<PackageDefinition>>,
    by_key: HashMap<(String, String), usize>,
    fields: HashMap<SchemaPath, Arc<FieldSchema>>,
}

impl SchemaCatalog {
    /// Build a catalog from package definitions, checking consistency
    pub fn from_definitions(
        version: Option<String>,
        definitions: Vec<PackageDefinition>,
    ) -> Result<Self, SchemaError> {
        let definitions: Vec<PackageDefinition> =
            definitions.into_iter().map(normalize_definition).collect();
        checks::check_definitions(&definitions)?;

        let mut packages = Vec::with_capacity(definitions.len());
        let mut by_key = HashMap::new();
        let mut fields = HashMap::new();

        for mut definition in definitions {
            for block in &mut definition.blocks {
                for field in &mut block.fields {
                    field.path = SchemaPath::field(
                        &definition.model_type,
                        &definition.abbr,
                        &block.name,
                        &field.name,
                    );
                    fields.insert(field.path.clone(), Arc::new(field.clone()));
                }
            }
            by_key.insert(
                (definition.model_type.clone(), definition.abbr.clone()),
                packages.len(),
            );
            packages.push(Arc::new(definition));
        }

        info!(
            "Loaded schema catalog with {} packages and {} fields",
            packages.len(),
            fields.len()
        );

        Ok(Self {
            version,
            packages,
            by_key,
            fields,
        })
    }

    /// Load a catalog from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self, SchemaError> {
        let file: CatalogFile = serde_yaml::from_str(content)
            .map_err(|e| SchemaError::Parse(format!("Failed to parse YAML: {}", e)))?;
        Self::from_definitions(file.version, file.packages)
    }

    /// Load a catalog from JSON text
    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        let file: CatalogFile = serde_json::from_str(content)
            .map_err(|e| SchemaError::Parse(format!("Failed to parse JSON: {}", e)))?;
        Self::from_definitions(file.version, file.packages)
    }

    /// The catalog embedded in the SDK
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Resolve a field path to its schema
    pub fn resolve(&self, path: &SchemaPath) -> Result<Arc<FieldSchema>, SchemaError> {
        self.fields
            .get(path)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound { path: path.clone() })
    }

    /// Look up a package definition by model type and abbreviation
    pub fn package(
        &self,
        model_type: &str,
        abbr: &str,
    ) -> Result<Arc<PackageDefinition>, SchemaError> {
        let key = (model_type.to_lowercase(), abbr.to_lowercase());
        self.by_key
            .get(&key)
            .map(|&idx| self.packages[idx].clone())
            .ok_or_else(|| SchemaError::NotFound {
                path: SchemaPath::new([model_type, abbr]),
            })
    }

    /// Package definitions of a model type sharing a name-file ftype
    pub fn packages_by_ftype(&self, model_type: &str, ftype: &str) -> Vec<Arc<PackageDefinition>> {
        self.packages
            .iter()
            .filter(|p| {
                p.model_type.eq_ignore_ascii_case(model_type) && p.ftype.eq_ignore_ascii_case(ftype)
            })
            .cloned()
            .collect()
    }

    pub fn packages(&self) -> impl Iterator<Item = &Arc<PackageDefinition>> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Lower-case every name so lookups are case-insensitive
fn normalize_definition(mut definition: PackageDefinition) -> PackageDefinition {
    definition.model_type = definition.model_type.trim().to_lowercase();
    definition.abbr = definition.abbr.trim().to_lowercase();
    definition.ftype = definition.ftype.trim().to_uppercase();
    definition.variant_keyword = definition
        .variant_keyword
        .map(|k| k.trim().to_uppercase());
    for block in &mut definition.blocks {
        block.name = block.name.trim().to_lowercase();
        for field in &mut block.fields {
            field.name = field.name.trim().to_lowercase();
            field.member_of = field.member_of.take().map(|m| m.trim().to_lowercase());
            if let Some(count) = field.count.as_mut() {
                count.field = count.field.trim().to_lowercase();
            }
            for item in &mut field.items {
                item.name = item.name.trim().to_lowercase();
                item.file_reference = item.file_reference.take().map(|r| r.trim().to_lowercase());
            }
        }
    }
    definition
}
