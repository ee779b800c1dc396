//! Models module for the SDK
//!
//! Defines the schema and value types shared by the catalog, the template
//! generator, bound data and packages.

pub mod grid;
pub mod schema;
pub mod value;

pub use grid::GridKind;
pub use schema::{
    BlockDefinition, CountLink, CountRule, FieldKind, FieldSchema, ItemSchema, PackageDefinition,
    SchemaPath, Shape,
};
pub use value::{ArrayValue, CellValue, ExternalFile, FieldValue, Row};
