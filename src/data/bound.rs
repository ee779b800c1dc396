//! Bound data objects
//!
//! A [`BoundData`] pairs a shared template with the caller's value for one
//! field of one package instance. Structural checks run on every bind and
//! set; completeness (required fields) is only checked when serializing.

use super::format::{RenderContext, format_cell, format_cells, format_double};
use super::parse::{OPEN_CLOSE, parse_lines};
use crate::models::schema::FieldSchema;
use crate::models::{ArrayValue, ExternalFile, FieldKind, FieldValue, SchemaPath};
use crate::template::Template;
use crate::validation::checks::check_value;
use crate::validation::{BindContext, DataError};
use std::sync::Arc;

/// Value of one declared field, validated against its template
#[derive(Debug, Clone, PartialEq)]
pub struct BoundData {
    template: Arc<Template>,
    value: Option<FieldValue>,
}

impl BoundData {
    /// Field left unset
    pub fn unset(template: Arc<Template>) -> Self {
        Self {
            template,
            value: None,
        }
    }

    /// Bind a value (or nothing) to a template
    ///
    /// `None` is always accepted here, even for required fields; a missing
    /// required value is reported by [`BoundData::serialize`].
    pub fn bind(
        template: Arc<Template>,
        value: Option<FieldValue>,
        ctx: &BindContext,
    ) -> Result<Self, DataError> {
        let mut bound = Self::unset(template);
        if let Some(value) = value {
            bound.set(value, ctx)?;
        }
        Ok(bound)
    }

    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    pub fn schema(&self) -> &FieldSchema {
        self.template.schema()
    }

    pub fn path(&self) -> &SchemaPath {
        self.template.path()
    }

    pub fn get(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    /// Replace the value; on failure the previous value is kept
    pub fn set(&mut self, value: FieldValue, ctx: &BindContext) -> Result<(), DataError> {
        self.value = Some(check_value(&self.template, value, ctx)?);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    /// Whether the field would render anything
    pub fn is_set(&self) -> bool {
        !matches!(self.value, None | Some(FieldValue::Keyword(false)))
    }

    /// Re-run the structural checks against a (possibly changed) context
    pub fn validate(&self, ctx: &BindContext) -> Result<(), DataError> {
        match &self.value {
            Some(value) => check_value(&self.template, value.clone(), ctx).map(|_| ()),
            None => Ok(()),
        }
    }

    pub fn check_required(&self) -> Result<(), DataError> {
        if self.template.is_optional() || self.is_set() {
            Ok(())
        } else {
            Err(DataError::RequiredFieldMissing {
                path: self.path().clone(),
            })
        }
    }

    /// Rows bound inline, None for non-recarray or external data
    pub fn row_count(&self) -> Option<usize> {
        self.value.as_ref().and_then(FieldValue::as_rows).map(<[_]>::len)
    }

    /// Render the field as block lines, indented for its block
    pub fn serialize(&self, ctx: &RenderContext<'_>) -> Result<Vec<String>, DataError> {
        self.check_required()?;
        let Some(value) = &self.value else {
            return Ok(Vec::new());
        };

        let path = self.path();
        let indent = ctx.indent(1);
        let tag = self.schema().tag();

        let lines = match value {
            FieldValue::Keyword(true) => vec![format!("{}{}", indent, tag)],
            FieldValue::Keyword(false) => Vec::new(),
            FieldValue::Scalar(cell) => match format_cell(path, cell, ctx)? {
                Some(token) => vec![format!("{}{} {}", indent, tag, token)],
                None => Vec::new(),
            },
            FieldValue::List(cells) => {
                vec![format!("{}{} {}", indent, tag, format_cells(path, cells, ctx)?)]
            }
            FieldValue::Record(cells) => {
                let body = format_cells(path, cells, ctx)?;
                let starts_with_keyword = self
                    .template
                    .columns()
                    .first()
                    .is_some_and(|slot| slot.is_keyword());
                if starts_with_keyword {
                    vec![format!("{}{}", indent, body)]
                } else {
                    vec![format!("{}{} {}", indent, tag, body)]
                }
            }
            FieldValue::Recarray(rows) => rows
                .iter()
                .map(|row| Ok(format!("{}{}", indent, format_cells(path, row, ctx)?)))
                .collect::<Result<Vec<_>, DataError>>()?,
            FieldValue::Array(array) => {
                let mut lines = vec![format!("{}{}", indent, tag)];
                lines.extend(self.array_lines(array, ctx)?);
                lines
            }
            FieldValue::External(file) => {
                let control = external_line(file, ctx);
                if self.template.kind() == FieldKind::Array {
                    vec![format!("{}{}", indent, tag), format!("{}{}", ctx.indent(2), control)]
                } else {
                    vec![format!("{}{}", indent, control)]
                }
            }
        };
        Ok(lines)
    }

    fn array_lines(&self, array: &ArrayValue, ctx: &RenderContext<'_>) -> Result<Vec<String>, DataError> {
        let path = self.path();
        let control_indent = ctx.indent(2);
        match array {
            ArrayValue::Constant { value } => Ok(vec![format!(
                "{}CONSTANT {}",
                control_indent,
                format_cells(path, [value], ctx)?
            )]),
            ArrayValue::Internal { factor, values } => {
                let mut lines = vec![match factor {
                    Some(factor) => format!(
                        "{}INTERNAL FACTOR {}",
                        control_indent,
                        format_cells(path, [factor], ctx)?
                    ),
                    None => format!("{}INTERNAL", control_indent),
                }];
                let value_indent = ctx.indent(3);
                for chunk in values.chunks(ctx.config.values_per_line.max(1)) {
                    lines.push(format!("{}{}", value_indent, format_cells(path, chunk, ctx)?));
                }
                Ok(lines)
            }
        }
    }

    /// Render the field as text, one line per entry
    pub fn to_text(&self, ctx: &RenderContext<'_>) -> Result<String, DataError> {
        Ok(self.serialize(ctx)?.join("\n"))
    }

    /// Read the field back from its rendered lines
    ///
    /// Blank text unsets the field. The value is checked exactly like a
    /// bound one, so time-series names are accepted in the same columns.
    pub fn deserialize(&mut self, text: &str, ctx: &BindContext) -> Result<(), DataError> {
        let lines: Vec<(usize, String)> = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.to_string()))
            .collect();
        self.deserialize_lines(&lines, ctx)
    }

    pub(crate) fn deserialize_lines(
        &mut self,
        lines: &[(usize, String)],
        ctx: &BindContext,
    ) -> Result<(), DataError> {
        match parse_lines(&self.template, lines, ctx)? {
            Some(value) => self.set(value, ctx),
            None => {
                self.clear();
                Ok(())
            }
        }
    }
}

fn external_line(file: &ExternalFile, ctx: &RenderContext<'_>) -> String {
    let mut line = format!("{} '{}'", OPEN_CLOSE, file.filename);
    if let Some(factor) = file.factor {
        line.push_str(&format!(" FACTOR {}", format_double(factor, ctx.config)));
    }
    if file.binary {
        line.push_str(" (BINARY)");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SdkConfig;
    use crate::data::NoReferences;
    use crate::models::CellValue;
    use crate::row;
    use crate::template::TemplateGenerator;

    fn template(generator: &TemplateGenerator, block: &str, field: &str) -> Arc<Template> {
        generator
            .generate(&SchemaPath::field("gwf6", "rch", block, field))
            .unwrap()
    }

    fn render(bound: &BoundData) -> Result<Vec<String>, DataError> {
        let config = SdkConfig::default();
        bound.serialize(&RenderContext::new(&config, &NoReferences))
    }

    #[test]
    fn test_unset_optional_renders_nothing() {
        let generator = TemplateGenerator::builtin().unwrap();
        let bound = BoundData::bind(
            template(&generator, "options", "fixed_cell"),
            None,
            &BindContext::default(),
        )
        .unwrap();
        assert_eq!(render(&bound).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_unset_required_fails_at_serialize() {
        let generator = TemplateGenerator::builtin().unwrap();
        let bound = BoundData::bind(
            template(&generator, "dimensions", "maxbound"),
            None,
            &BindContext::default(),
        )
        .unwrap();
        assert!(matches!(
            render(&bound),
            Err(DataError::RequiredFieldMissing { .. })
        ));
    }

    #[test]
    fn test_keyword_rejects_values() {
        let generator = TemplateGenerator::builtin().unwrap();
        let result = BoundData::bind(
            template(&generator, "options", "fixed_cell"),
            Some(FieldValue::from(3i64)),
            &BindContext::default(),
        );
        assert!(matches!(result, Err(DataError::TypeMismatch { .. })));
    }

    #[test]
    fn test_record_shorthand_and_render() {
        let generator = TemplateGenerator::builtin().unwrap();
        let bound = BoundData::bind(
            template(&generator, "options", "ts_filerecord"),
            Some(FieldValue::record(["rch.ts"])),
            &BindContext::default(),
        )
        .unwrap();
        assert_eq!(
            bound.get(),
            Some(&FieldValue::Record(vec![
                CellValue::Keyword("ts6".to_string()),
                CellValue::Keyword("filein".to_string()),
                CellValue::Text("rch.ts".to_string()),
            ]))
        );
        assert_eq!(render(&bound).unwrap(), vec!["  TS6 FILEIN rch.ts"]);
    }

    #[test]
    fn test_failed_set_keeps_previous_value() {
        let generator = TemplateGenerator::builtin().unwrap();
        let ctx = BindContext::default();
        let mut bound =
            BoundData::bind(template(&generator, "dimensions", "maxbound"), Some(2i64.into()), &ctx).unwrap();
        assert!(bound.set(FieldValue::from(2.5), &ctx).is_err());
        assert_eq!(bound.get(), Some(&FieldValue::from(2i64)));
    }

    #[test]
    fn test_recarray_round_trip() {
        let generator = TemplateGenerator::builtin().unwrap();
        let ctx = BindContext::default();
        let rows = vec![
            row![(1, 1, 1), 0.001, "boundA"],
            row![(1, 1, 2), CellValue::time_series("ts_recharge_1"), None::<&str>],
        ];
        let bound = BoundData::bind(
            template(&generator, "period", "periodrecarray"),
            Some(FieldValue::rows(rows)),
            &ctx,
        )
        .unwrap();

        let lines = render(&bound).unwrap();
        assert_eq!(lines, vec!["  1 1 1 0.001 boundA", "  1 1 2 ts_recharge_1"]);

        let mut read = BoundData::unset(bound.template().clone());
        read.deserialize(&lines.join("\n"), &ctx).unwrap();
        assert_eq!(read, bound);
    }

    #[test]
    fn test_internal_array_wraps_values() {
        let generator = TemplateGenerator::builtin().unwrap();
        let schema = generator
            .generate(&SchemaPath::field("gwf6", "dis", "griddata", "delr"))
            .unwrap();
        let ctx = BindContext::default().with_dim("ncol", 12);
        let bound = BoundData::bind(
            schema,
            Some(FieldValue::Array(ArrayValue::internal(vec![100.0; 12]))),
            &ctx,
        )
        .unwrap();
        let lines = render(&bound).unwrap();
        assert_eq!(lines[0], "  DELR");
        assert_eq!(lines[1], "    INTERNAL");
        assert_eq!(lines.len(), 4);

        let mut read = BoundData::unset(bound.template().clone());
        read.deserialize(&lines.join("\n"), &ctx).unwrap();
        assert_eq!(read, bound);

        let wrong = BoundData::bind(
            bound.template().clone(),
            Some(FieldValue::Array(ArrayValue::internal(vec![1.0; 5]))),
            &ctx,
        );
        assert!(matches!(wrong, Err(DataError::ShapeMismatch { expected: 12, actual: 5, .. })));
    }

    #[test]
    fn test_external_file_render() {
        let generator = TemplateGenerator::builtin().unwrap();
        let mut file = ExternalFile::new("rch_1.txt");
        file.factor = Some(2.0);
        let bound = BoundData::bind(
            template(&generator, "period", "periodrecarray"),
            Some(FieldValue::External(file)),
            &BindContext::default(),
        )
        .unwrap();
        assert_eq!(render(&bound).unwrap(), vec!["  OPEN/CLOSE 'rch_1.txt' FACTOR 2.0"]);
    }
}
