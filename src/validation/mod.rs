//! Validation functionality
//!
//! Provides the error taxonomy shared by bound data and packages, plus:
//! - Structural checks run on every bind/set (cell kinds, row arity, cellids)
//! - Write-time checks (count links, pluggable package rules)

pub(crate) mod checks;
pub mod rules;

pub use rules::{FieldRule, MemberOfRule};

use crate::catalog::SchemaError;
use crate::models::{CountRule, SchemaPath};
use std::collections::HashMap;

/// Structured validation failure carrying the offending field path
///
/// Row indices are zero-based.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("Schema not found: {path}")]
    SchemaNotFound { path: SchemaPath },

    #[error("Type mismatch in {path}{}: column '{column}' expects {expected}, found {found}", at_row(.row))]
    TypeMismatch {
        path: SchemaPath,
        row: Option<usize>,
        column: String,
        expected: String,
        found: String,
    },

    #[error("Row arity mismatch in {path} row {row}: expected {expected} cells, found {actual}")]
    RowArityMismatch {
        path: SchemaPath,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Count mismatch in {path}{}: {count_field} = {count} but {rows} rows bound ({rule})", in_period(.period))]
    CountMismatch {
        path: SchemaPath,
        count_field: String,
        count: i64,
        rows: usize,
        rule: CountRule,
        period: Option<u32>,
    },

    #[error("Required field missing: {path}")]
    RequiredFieldMissing { path: SchemaPath },

    #[error("Invalid value for {path}: {reason}")]
    InvalidValue { path: SchemaPath, reason: String },

    #[error("Shape mismatch in {path}: expected {expected} values, found {actual}")]
    ShapeMismatch {
        path: SchemaPath,
        expected: usize,
        actual: usize,
    },

    #[error("Parse error in {path} at line {line}: {reason}")]
    Parse {
        path: SchemaPath,
        line: usize,
        reason: String,
    },

    #[error("Rule '{rule}' failed for {path}: {reason}")]
    RuleViolation {
        rule: String,
        path: SchemaPath,
        reason: String,
    },

    #[error("Unresolved package reference '{name}' in {path}")]
    UnresolvedReference { path: SchemaPath, name: String },

    #[error("Catalog error: {0}")]
    Catalog(String),
}

fn at_row(row: &Option<usize>) -> String {
    row.map(|r| format!(" row {}", r)).unwrap_or_default()
}

fn in_period(period: &Option<u32>) -> String {
    period.map(|p| format!(" period {}", p)).unwrap_or_default()
}

impl DataError {
    /// Schema path of the offending field, when the error has one
    pub fn path(&self) -> Option<&SchemaPath> {
        match self {
            DataError::SchemaNotFound { path }
            | DataError::TypeMismatch { path, .. }
            | DataError::RowArityMismatch { path, .. }
            | DataError::CountMismatch { path, .. }
            | DataError::RequiredFieldMissing { path }
            | DataError::InvalidValue { path, .. }
            | DataError::ShapeMismatch { path, .. }
            | DataError::Parse { path, .. }
            | DataError::RuleViolation { path, .. }
            | DataError::UnresolvedReference { path, .. } => Some(path),
            DataError::Catalog(_) => None,
        }
    }
}

impl From<SchemaError> for DataError {
    fn from(e: SchemaError) -> Self {
        match e {
            SchemaError::NotFound { path } => DataError::SchemaNotFound { path },
            other => DataError::Catalog(other.to_string()),
        }
    }
}

/// Values of other fields a bind-time check depends on
///
/// Carries the package's string lists (auxiliary names, time-series names)
/// that expand recarray columns, the number of integers in a cellid, and any
/// known dimension sizes for array shape checks.
#[derive(Debug, Clone)]
pub struct BindContext {
    pub ncelldim: usize,
    pub lists: HashMap<String, Vec<String>>,
    pub dims: HashMap<String, usize>,
}

impl Default for BindContext {
    fn default() -> Self {
        Self {
            ncelldim: 3,
            lists: HashMap::new(),
            dims: HashMap::new(),
        }
    }
}

impl BindContext {
    pub fn new(ncelldim: usize) -> Self {
        Self {
            ncelldim,
            ..Self::default()
        }
    }

    pub fn with_list<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lists
            .insert(name.to_lowercase(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_dim(mut self, name: &str, size: usize) -> Self {
        self.dims.insert(name.to_lowercase(), size);
        self
    }

    /// Names declared by a list field, empty when unset
    pub fn list(&self, name: &str) -> &[String] {
        self.lists.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dim(&self, name: &str) -> Option<usize> {
        self.dims.get(name).copied()
    }
}
