//! Model and simulation errors

use crate::catalog::SchemaError;
use crate::package::Package;
use crate::storage::StorageError;
use crate::validation::DataError;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Package not found: {name}")]
    PackageNotFound { name: String },
    #[error("Ambiguous package '{abbr}', candidates: {}", .candidates.join(", "))]
    AmbiguousPackage { abbr: String, candidates: Vec<String> },
    #[error("Duplicate package '{name}' in '{owner}'")]
    DuplicatePackage { owner: String, name: String },
    #[error("Model not found: {name}")]
    ModelNotFound { name: String },
    #[error("Duplicate model name: {name}")]
    DuplicateModel { name: String },
    #[error("Package '{package}' of type {package_type} does not belong in '{owner}'")]
    IncompatiblePackage {
        package: String,
        package_type: String,
        owner: String,
    },
    #[error("Package '{package}': {source}")]
    Package {
        package: String,
        #[source]
        source: DataError,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Failed to load {path}: {reason}")]
    Load { path: String, reason: String },
}

impl ModelError {
    /// Attach a package name to a data error; an unresolved package
    /// reference becomes `PackageNotFound`
    pub(crate) fn from_data(package: &Package, error: DataError) -> Self {
        match error {
            DataError::UnresolvedReference { name, .. } => ModelError::PackageNotFound { name },
            source => ModelError::Package {
                package: package.name().to_string(),
                source,
            },
        }
    }
}

/// Find one package by abbreviation among `packages`
pub(crate) fn find_by_abbr<'p>(packages: &'p [Package], abbr: &str) -> Result<&'p Package, ModelError> {
    let idx = index_by_abbr(packages, abbr)?;
    Ok(&packages[idx])
}

pub(crate) fn index_by_abbr(packages: &[Package], abbr: &str) -> Result<usize, ModelError> {
    let matches: Vec<usize> = packages
        .iter()
        .enumerate()
        .filter(|(_, p)| p.abbr().eq_ignore_ascii_case(abbr))
        .map(|(idx, _)| idx)
        .collect();
    match matches.as_slice() {
        [] => Err(ModelError::PackageNotFound {
            name: abbr.to_lowercase(),
        }),
        [idx] => Ok(*idx),
        _ => Err(ModelError::AmbiguousPackage {
            abbr: abbr.to_lowercase(),
            candidates: matches.iter().map(|&i| packages[i].name().to_string()).collect(),
        }),
    }
}
