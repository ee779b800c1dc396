//! Token formatting for block files

use crate::config::SdkConfig;
use crate::models::{CellValue, SchemaPath};
use crate::validation::DataError;

/// Resolves cross-package names at write time
pub trait FileResolver {
    /// File name of the package with this name, if it exists
    fn resolve_filename(&self, package_name: &str) -> Option<String>;

    /// Size of a named model dimension (e.g. `nlay`)
    fn dimension(&self, _name: &str) -> Option<usize> {
        None
    }
}

/// Resolver for packages written on their own
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferences;

impl FileResolver for NoReferences {
    fn resolve_filename(&self, _package_name: &str) -> Option<String> {
        None
    }
}

/// Everything serialization needs besides the value itself
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub config: &'a SdkConfig,
    pub resolver: &'a dyn FileResolver,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a SdkConfig, resolver: &'a dyn FileResolver) -> Self {
        Self { config, resolver }
    }

    pub(crate) fn indent(&self, depth: usize) -> String {
        self.config.indent_str().repeat(depth)
    }
}

/// Format a double, shortest round-trip unless a precision is configured
pub(crate) fn format_double(value: f64, config: &SdkConfig) -> String {
    match config.float_precision {
        Some(precision) => format!("{:.*E}", precision, value),
        None => format!("{:?}", value),
    }
}

/// Quote text that would not survive tokenizing as a single token
pub(crate) fn quote(text: &str) -> String {
    let needs_quotes = text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ',' | '\'' | '"'))
        || text.starts_with('#')
        || text.starts_with('!')
        || text.starts_with("//");
    if needs_quotes {
        if text.contains('\'') {
            format!("\"{}\"", text)
        } else {
            format!("'{}'", text)
        }
    } else {
        text.to_string()
    }
}

/// Render one cell; `Missing` renders nothing
pub(crate) fn format_cell(
    path: &SchemaPath,
    cell: &CellValue,
    ctx: &RenderContext<'_>,
) -> Result<Option<String>, DataError> {
    let token = match cell {
        CellValue::Integer(n) => n.to_string(),
        CellValue::Double(v) => format_double(*v, ctx.config),
        CellValue::Text(text) => quote(text),
        CellValue::Keyword(name) => name.to_uppercase(),
        CellValue::CellId(ids) => ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(" "),
        CellValue::TimeSeries(name) => name.clone(),
        CellValue::PackageRef(name) => match ctx.resolver.resolve_filename(name) {
            Some(filename) => quote(&filename),
            None => {
                return Err(DataError::UnresolvedReference {
                    path: path.clone(),
                    name: name.clone(),
                });
            }
        },
        CellValue::Names(names) => names.iter().map(|n| quote(n)).collect::<Vec<_>>().join(" "),
        CellValue::Missing => return Ok(None),
    };
    Ok(Some(token))
}

/// Render cells space-separated, skipping empty optional cells
pub(crate) fn format_cells<'c>(
    path: &SchemaPath,
    cells: impl IntoIterator<Item = &'c CellValue>,
    ctx: &RenderContext<'_>,
) -> Result<String, DataError> {
    let mut tokens = Vec::new();
    for cell in cells {
        if let Some(token) = format_cell(path, cell, ctx)? {
            tokens.push(token);
        }
    }
    Ok(tokens.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneFile;

    impl FileResolver for OneFile {
        fn resolve_filename(&self, package_name: &str) -> Option<String> {
            (package_name == "ts").then(|| "model.ts".to_string())
        }
    }

    #[test]
    fn test_format_double_shortest() {
        let config = SdkConfig::default();
        assert_eq!(format_double(0.001, &config), "0.001");
        assert_eq!(format_double(1.0, &config), "1.0");
        assert_eq!(format_double(0.1 + 0.2, &config).parse::<f64>().unwrap(), 0.1 + 0.2);
    }

    #[test]
    fn test_format_double_precision() {
        let config = SdkConfig::builder().float_precision(3).build();
        assert_eq!(format_double(0.001, &config), "1.000E-3");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("boundA"), "boundA");
        assert_eq!(quote("two words"), "'two words'");
        assert_eq!(quote(""), "''");
        assert_eq!(quote("a,b"), "'a,b'");
        assert_eq!(quote("o'neil"), "\"o'neil\"");
        assert_eq!(quote("#3"), "'#3'");
        assert_eq!(quote("//x"), "'//x'");
    }

    #[test]
    fn test_package_reference_resolution() {
        let config = SdkConfig::default();
        let path = SchemaPath::new(["x"]);
        let ctx = RenderContext::new(&config, &OneFile);
        assert_eq!(
            format_cell(&path, &CellValue::package_ref("ts"), &ctx).unwrap(),
            Some("model.ts".to_string())
        );
        assert!(matches!(
            format_cell(&path, &CellValue::package_ref("obs"), &ctx),
            Err(DataError::UnresolvedReference { .. })
        ));
    }
}
