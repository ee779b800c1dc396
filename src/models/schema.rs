//! Schema model for the SDK
//!
//! Declarative description of packages, blocks and fields as loaded from a
//! schema catalog. These types are immutable once the catalog is built.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered namespace path identifying one declared field
///
/// Segments are stored lower-case: model type, package abbreviation, block
/// name and field name (e.g. `gwf6/rch/options/auxiliary`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaPath(Vec<String>);

impl SchemaPath {
    /// Create a path from arbitrary segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            segments
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .collect(),
        )
    }

    /// Path of a field declared in a package block
    pub fn field(model_type: &str, abbr: &str, block: &str, field: &str) -> Self {
        Self::new([model_type, abbr, block, field])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment, usually the field name
    pub fn name(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }

    /// Extend the path with one more segment
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.trim().to_lowercase());
        Self(segments)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl From<(&str, &str, &str, &str)> for SchemaPath {
    fn from(value: (&str, &str, &str, &str)) -> Self {
        Self::field(value.0, value.1, value.2, value.3)
    }
}

/// Supported field shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Keyword,
    String,
    Integer,
    Double,
    Record,
    Recarray,
    Array,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Keyword => "keyword",
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Double => "double",
            FieldKind::Record => "record",
            FieldKind::Recarray => "recarray",
            FieldKind::Array => "array",
        }
    }

    /// Kinds that hold exactly one token per value
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            FieldKind::Keyword | FieldKind::String | FieldKind::Integer | FieldKind::Double
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Double)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cardinality and layout of a field or column
///
/// Written in catalogs as a plain string: `scalar`, `one_or_more`, `cellid`,
/// `expand:<list field>` or `dims:<dim>,<dim>,...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Shape {
    /// Exactly one value
    #[default]
    Scalar,
    /// A non-empty list of values on one line
    OneOrMore,
    /// Cell identifier with one integer per grid dimension
    CellId,
    /// One column per name declared in the named list field
    Expand(String),
    /// Array dimensions, fastest varying first
    Dims(Vec<String>),
}

impl TryFrom<String> for Shape {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "scalar" => return Ok(Shape::Scalar),
            "one_or_more" | "(:)" => return Ok(Shape::OneOrMore),
            "cellid" | "ncelldim" => return Ok(Shape::CellId),
            _ => {}
        }
        if let Some((head, tail)) = trimmed.split_once(':') {
            let tail = tail.trim();
            match head.trim().to_lowercase().as_str() {
                "expand" if !tail.is_empty() => return Ok(Shape::Expand(tail.to_lowercase())),
                "dims" => {
                    let dims: Vec<String> = tail
                        .split(',')
                        .map(|d| d.trim().to_lowercase())
                        .filter(|d| !d.is_empty())
                        .collect();
                    return Ok(Shape::Dims(dims));
                }
                _ => {}
            }
        }
        Err(format!("unknown shape '{}'", value))
    }
}

impl From<Shape> for String {
    fn from(value: Shape) -> Self {
        match value {
            Shape::Scalar => "scalar".to_string(),
            Shape::OneOrMore => "one_or_more".to_string(),
            Shape::CellId => "cellid".to_string(),
            Shape::Expand(list) => format!("expand:{}", list),
            Shape::Dims(dims) => format!("dims:{}", dims.join(",")),
        }
    }
}

/// How a count field relates to the row count of its linked recarray
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountRule {
    /// Rows must not exceed the count (e.g. MAXBOUND)
    #[default]
    Bound,
    /// Rows must equal the count (e.g. NPER)
    Equal,
}

impl fmt::Display for CountRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountRule::Bound => f.write_str("bound"),
            CountRule::Equal => f.write_str("equal"),
        }
    }
}

/// Link from an integer count field to a recarray field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountLink {
    pub field: String,
    #[serde(default)]
    pub rule: CountRule,
}

/// One item of a record, or one column of a recarray
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSchema {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub shape: Shape,
    #[serde(default)]
    pub optional: bool,
    /// Cell may hold a time-series name instead of a literal
    #[serde(default)]
    pub time_series: bool,
    /// Package type (`model_type/abbr`) a filename in this item may refer to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_reference: Option<String>,
    #[serde(default)]
    pub description: String,
}

fn default_true() -> bool {
    true
}

/// Declared shape of one package field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub shape: Shape,
    /// Whether the field may be left unset at write time (default: true)
    #[serde(default = "default_true")]
    pub optional: bool,
    #[serde(default)]
    pub time_series: bool,
    /// Accepts an `OPEN/CLOSE` external file in place of inline data
    #[serde(default)]
    pub filein: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<CountLink>,
    /// Value must be one of the names held by this list field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_of: Option<String>,
    /// Element kind of an array field (default: double)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<FieldKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemSchema>,
    #[serde(default)]
    pub description: String,
    /// Filled in by the catalog when the field is indexed
    #[serde(skip)]
    pub path: SchemaPath,
}

impl FieldSchema {
    /// Keyword token written in front of the field's value
    pub fn keyword_token(&self) -> String {
        self.name.to_uppercase()
    }

    /// Leading token that identifies this field's line in a block
    ///
    /// Records start with their first keyword item when they have one.
    pub fn tag(&self) -> String {
        if self.kind == FieldKind::Record
            && let Some(first) = self.items.first()
            && first.kind == FieldKind::Keyword
        {
            return first.name.to_uppercase();
        }
        self.keyword_token()
    }

    pub fn is_list(&self) -> bool {
        self.shape == Shape::OneOrMore
    }

    pub fn element_kind(&self) -> FieldKind {
        self.element.unwrap_or(FieldKind::Double)
    }

    /// Array dimension names, empty for non-array fields
    pub fn dims(&self) -> &[String] {
        match &self.shape {
            Shape::Dims(dims) => dims,
            _ => &[],
        }
    }
}

/// One `BEGIN <name>` ... `END <name>` block of a package file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub name: String,
    /// Repeated once per stress period with an index in the header
    #[serde(default)]
    pub repeating: bool,
    pub fields: Vec<FieldSchema>,
}

/// Declarative description of one package type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDefinition {
    pub model_type: String,
    pub abbr: String,
    /// File type token used in name files (e.g. `RCH6`)
    pub ftype: String,
    /// Options keyword telling apart packages that share an ftype
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_keyword: Option<String>,
    #[serde(default)]
    pub multi_package: bool,
    #[serde(default)]
    pub description: String,
    pub blocks: Vec<BlockDefinition>,
}

impl PackageDefinition {
    /// Catalog key, e.g. `gwf6/rch`
    pub fn key(&self) -> String {
        format!("{}/{}", self.model_type, self.abbr)
    }

    /// Package type tag, e.g. `gwfrch`
    pub fn package_type(&self) -> String {
        let model: String = self
            .model_type
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        format!("{}{}", model, self.abbr)
    }

    /// All fields in declaration order with their block
    pub fn fields(&self) -> impl Iterator<Item = (&BlockDefinition, &FieldSchema)> {
        self.blocks
            .iter()
            .flat_map(|block| block.fields.iter().map(move |field| (block, field)))
    }

    pub fn block(&self, name: &str) -> Option<&BlockDefinition> {
        self.blocks
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name))
    }

    pub fn field(&self, name: &str) -> Option<(&BlockDefinition, &FieldSchema)> {
        self.fields()
            .find(|(_, f)| f.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_path_display() {
        let path = SchemaPath::field("GWF6", "rch", "Options", "auxiliary");
        assert_eq!(path.to_string(), "gwf6/rch/options/auxiliary");
        assert_eq!(path.name(), "auxiliary");
        assert_eq!(path.child("aux").segments().len(), 5);
    }

    #[test]
    fn test_shape_parsing() {
        assert_eq!(Shape::try_from("scalar".to_string()).unwrap(), Shape::Scalar);
        assert_eq!(Shape::try_from("cellid".to_string()).unwrap(), Shape::CellId);
        assert_eq!(
            Shape::try_from("expand:auxiliary".to_string()).unwrap(),
            Shape::Expand("auxiliary".to_string())
        );
        assert_eq!(
            Shape::try_from("dims: ncol, nrow".to_string()).unwrap(),
            Shape::Dims(vec!["ncol".to_string(), "nrow".to_string()])
        );
        assert!(Shape::try_from("triangle".to_string()).is_err());
    }

    #[test]
    fn test_record_tag_uses_leading_keyword() {
        let field = FieldSchema {
            name: "ts_filerecord".to_string(),
            kind: FieldKind::Record,
            shape: Shape::Scalar,
            optional: true,
            time_series: false,
            filein: false,
            count: None,
            member_of: None,
            element: None,
            items: vec![ItemSchema {
                name: "ts6".to_string(),
                kind: FieldKind::Keyword,
                shape: Shape::Scalar,
                optional: false,
                time_series: false,
                file_reference: None,
                description: String::new(),
            }],
            description: String::new(),
            path: SchemaPath::default(),
        };
        assert_eq!(field.tag(), "TS6");
    }
}
