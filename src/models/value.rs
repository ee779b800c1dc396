//! Value model for the SDK
//!
//! Concrete values bound to package fields. Cells are a tagged variant so a
//! numeric column can carry either a literal or a symbolic time-series name.

use serde::{Deserialize, Serialize};

/// One cell of a record or recarray row, or one scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Integer(i64),
    Double(f64),
    Text(String),
    /// Keyword token, stored as the declared item name
    Keyword(String),
    /// Cell identifier (layer, row, column / layer, cell2d / node)
    CellId(Vec<i64>),
    /// Symbolic name resolved from a time-series file by the engine
    TimeSeries(String),
    /// Name of another package whose file name is substituted at write time
    PackageRef(String),
    /// Trailing list of names (e.g. models solved by one solution)
    Names(Vec<String>),
    /// Optional cell left empty
    Missing,
}

impl CellValue {
    /// Cell identifier from any integer sequence
    pub fn cellid<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<i64>,
    {
        CellValue::CellId(ids.into_iter().map(Into::into).collect())
    }

    pub fn time_series(name: impl Into<String>) -> Self {
        CellValue::TimeSeries(name.into())
    }

    pub fn package_ref(name: impl Into<String>) -> Self {
        CellValue::PackageRef(name.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Integer(_) => "integer",
            CellValue::Double(_) => "double",
            CellValue::Text(_) => "string",
            CellValue::Keyword(_) => "keyword",
            CellValue::CellId(_) => "cellid",
            CellValue::TimeSeries(_) => "time-series name",
            CellValue::PackageRef(_) => "package reference",
            CellValue::Names(_) => "name list",
            CellValue::Missing => "missing",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Double(v) => Some(*v),
            CellValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Text-like content (strings, keywords, symbolic names)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s)
            | CellValue::Keyword(s)
            | CellValue::TimeSeries(s)
            | CellValue::PackageRef(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, CellValue::TimeSeries(_) | CellValue::PackageRef(_))
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Integer(value.into())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Double(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<(i64, i64, i64)> for CellValue {
    fn from(value: (i64, i64, i64)) -> Self {
        CellValue::CellId(vec![value.0, value.1, value.2])
    }
}

impl From<(i64, i64)> for CellValue {
    fn from(value: (i64, i64)) -> Self {
        CellValue::CellId(vec![value.0, value.1])
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Missing)
    }
}

/// One recarray row: one cell per active column
pub type Row = Vec<CellValue>;

/// Build a row from heterogeneous cell values
#[macro_export]
macro_rules! row {
    ($($cell:expr),* $(,)?) => {
        vec![$($crate::models::CellValue::from($cell)),*]
    };
}

/// External file replacing inline data (`OPEN/CLOSE`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalFile {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
    #[serde(default)]
    pub binary: bool,
}

impl ExternalFile {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            factor: None,
            binary: false,
        }
    }
}

/// Gridded array data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArrayValue {
    /// Same value for every cell
    Constant { value: CellValue },
    /// Values listed in the file, optionally scaled
    Internal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        factor: Option<CellValue>,
        values: Vec<CellValue>,
    },
}

impl ArrayValue {
    pub fn constant(value: impl Into<CellValue>) -> Self {
        ArrayValue::Constant {
            value: value.into(),
        }
    }

    pub fn internal<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CellValue>,
    {
        ArrayValue::Internal {
            factor: None,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Value bound to one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Presence flag of a keyword field
    Keyword(bool),
    Scalar(CellValue),
    /// One-or-more values on a single line
    List(Vec<CellValue>),
    /// Record items in declared order (keyword items may be omitted)
    Record(Vec<CellValue>),
    Recarray(Vec<Row>),
    Array(ArrayValue),
    External(ExternalFile),
}

impl FieldValue {
    pub fn list<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CellValue>,
    {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }

    pub fn record<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CellValue>,
    {
        FieldValue::Record(values.into_iter().map(Into::into).collect())
    }

    pub fn rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Row>,
    {
        FieldValue::Recarray(rows.into_iter().collect())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Keyword(_) => "keyword",
            FieldValue::Scalar(cell) => cell.type_name(),
            FieldValue::List(_) => "list",
            FieldValue::Record(_) => "record",
            FieldValue::Recarray(_) => "recarray",
            FieldValue::Array(_) => "array",
            FieldValue::External(_) => "external file",
        }
    }

    pub fn as_rows(&self) -> Option<&[Row]> {
        match self {
            FieldValue::Recarray(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_cell(&self) -> Option<&CellValue> {
        match self {
            FieldValue::Scalar(cell) => Some(cell),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Keyword(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Scalar(CellValue::Integer(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Scalar(CellValue::Integer(value.into()))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Scalar(CellValue::Double(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(CellValue::Text(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(CellValue::Text(value))
    }
}

impl From<CellValue> for FieldValue {
    fn from(value: CellValue) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<Vec<Row>> for FieldValue {
    fn from(value: Vec<Row>) -> Self {
        FieldValue::Recarray(value)
    }
}

impl From<ArrayValue> for FieldValue {
    fn from(value: ArrayValue) -> Self {
        FieldValue::Array(value)
    }
}

impl From<ExternalFile> for FieldValue {
    fn from(value: ExternalFile) -> Self {
        FieldValue::External(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_macro_mixes_cell_types() {
        let row: Row = crate::row![(1, 1, 1), 0.001, "boundA"];
        assert_eq!(row.len(), 3);
        assert_eq!(row[0], CellValue::CellId(vec![1, 1, 1]));
        assert_eq!(row[1], CellValue::Double(0.001));
        assert_eq!(row[2], CellValue::Text("boundA".to_string()));
    }

    #[test]
    fn test_optional_cell_maps_to_missing() {
        let none: Option<&str> = None;
        assert_eq!(CellValue::from(none), CellValue::Missing);
        assert_eq!(CellValue::from(Some(3i64)), CellValue::Integer(3));
    }

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(FieldValue::from(true), FieldValue::Keyword(true));
        assert_eq!(
            FieldValue::list(["conc", "temp"]),
            FieldValue::List(vec![
                CellValue::Text("conc".to_string()),
                CellValue::Text("temp".to_string())
            ])
        );
        assert_eq!(FieldValue::from(2i64).as_cell(), Some(&CellValue::Integer(2)));
    }
}
