//! Memoizing template generator

use super::Template;
use crate::catalog::{SchemaCatalog, SchemaError};
use crate::models::SchemaPath;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Produces templates from catalog paths, caching one per path
///
/// Owned by a model or simulation and passed to packages on construction.
#[derive(Debug)]
pub struct TemplateGenerator {
    catalog: Arc<SchemaCatalog>,
    cache: RwLock<HashMap<SchemaPath, Arc<Template>>>,
}

impl TemplateGenerator {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self {
            catalog,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Generator over the built-in catalog
    pub fn builtin() -> Result<Self, SchemaError> {
        Ok(Self::new(Arc::new(SchemaCatalog::builtin()?)))
    }

    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    /// Empty template for a field path
    pub fn generate(&self, path: &SchemaPath) -> Result<Arc<Template>, SchemaError> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(template) = cache.get(path) {
                return Ok(template.clone());
            }
        }

        let schema = self.catalog.resolve(path)?;
        debug!("Template cache miss for {}", path);
        let template = Arc::new(Template::from_schema(schema));

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        Ok(cache.entry(path.clone()).or_insert(template).clone())
    }

    /// Number of templates generated so far
    pub fn cache_len(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
