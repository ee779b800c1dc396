//! Grid discretization kinds

use serde::{Deserialize, Serialize};

/// Discretization type of a model grid
///
/// Determines how many integers make up a cell identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridKind {
    /// DIS: layer, row, column
    #[default]
    Structured,
    /// DISV: layer, cell2d
    Vertex,
    /// DISU: node
    Unstructured,
}

impl GridKind {
    /// Number of integers in a cell identifier
    pub fn cell_dims(self) -> usize {
        match self {
            GridKind::Structured => 3,
            GridKind::Vertex => 2,
            GridKind::Unstructured => 1,
        }
    }

    /// Grid kind for a discretization package abbreviation
    pub fn from_dis_abbr(abbr: &str) -> Option<Self> {
        match abbr.to_lowercase().as_str() {
            "dis" => Some(GridKind::Structured),
            "disv" => Some(GridKind::Vertex),
            "disu" => Some(GridKind::Unstructured),
            _ => None,
        }
    }
}
