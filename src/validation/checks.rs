//! Bind-time structural checks
//!
//! Every check takes ownership of the candidate value and returns it in
//! normalized form: numeric text becomes a number, symbolic names in
//! time-series columns become [`CellValue::TimeSeries`], record shorthand
//! gains its keyword items.

use super::{BindContext, DataError};
use crate::models::{ArrayValue, CellValue, FieldKind, FieldValue, Row, SchemaPath, Shape};
use crate::template::{ColumnDef, Template, TemplateLayout};
use once_cell::sync::Lazy;
use regex::Regex;

static SYMBOLIC_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap());

/// Whether text can stand in for a number as a time-series name
pub(crate) fn is_symbolic_name(text: &str) -> bool {
    SYMBOLIC_NAME.is_match(text)
}

fn looks_numeric(text: &str) -> bool {
    matches!(text.chars().next(), Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
}

/// Parse a double, accepting Fortran `D` exponents
pub(crate) fn parse_double(text: &str) -> Option<f64> {
    if !looks_numeric(text) {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .or_else(|| text.replace(['d', 'D'], "e").parse::<f64>().ok())
}

pub(crate) fn parse_integer(text: &str) -> Option<i64> {
    if !looks_numeric(text) {
        return None;
    }
    text.parse::<i64>().ok()
}

/// Validate and normalize a value against a template
pub(crate) fn check_value(
    template: &Template,
    value: FieldValue,
    ctx: &BindContext,
) -> Result<FieldValue, DataError> {
    let schema = template.schema();
    let path = template.path();

    if let FieldValue::External(file) = &value {
        if !schema.filein {
            return Err(mismatch(path, None, &schema.name, "inline data", "external file"));
        }
        if file.filename.trim().is_empty() {
            return Err(invalid(path, "external file name is empty"));
        }
        return Ok(value);
    }

    match template.layout() {
        TemplateLayout::Slot(slot) => check_slot(path, slot, value, ctx),
        TemplateLayout::Record { slots } => match value {
            FieldValue::Record(cells) => check_record(path, slots, cells, ctx).map(FieldValue::Record),
            other => Err(mismatch(path, None, &schema.name, "record", other.type_name())),
        },
        TemplateLayout::Recarray { .. } => match value {
            FieldValue::Recarray(rows) => {
                check_rows(path, &template.active_columns(ctx), rows, ctx).map(FieldValue::Recarray)
            }
            other => Err(mismatch(path, None, &schema.name, "recarray rows", other.type_name())),
        },
        TemplateLayout::Array { dims, element } => match value {
            FieldValue::Array(array) => {
                check_array(path, dims, element, array, ctx).map(FieldValue::Array)
            }
            other => Err(mismatch(path, None, &schema.name, "array", other.type_name())),
        },
    }
}

fn check_slot(
    path: &SchemaPath,
    slot: &ColumnDef,
    value: FieldValue,
    ctx: &BindContext,
) -> Result<FieldValue, DataError> {
    if slot.is_keyword() {
        return match value {
            FieldValue::Keyword(flag) => Ok(FieldValue::Keyword(flag)),
            other => Err(mismatch(path, None, &slot.name, "keyword flag", other.type_name())),
        };
    }

    let element = ColumnDef {
        shape: Shape::Scalar,
        optional: false,
        ..slot.clone()
    };
    match (slot.shape == Shape::OneOrMore, value) {
        (false, FieldValue::Scalar(cell)) => {
            check_cell(path, None, &element, cell, ctx.ncelldim).map(FieldValue::Scalar)
        }
        (true, FieldValue::List(cells)) => {
            if cells.is_empty() {
                return Err(invalid(path, "at least one value is required"));
            }
            cells
                .into_iter()
                .map(|cell| check_cell(path, None, &element, cell, ctx.ncelldim))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::List)
        }
        (true, FieldValue::Scalar(cell)) => {
            check_cell(path, None, &element, cell, ctx.ncelldim).map(|c| FieldValue::List(vec![c]))
        }
        (list, other) => Err(mismatch(
            path,
            None,
            &slot.name,
            &if list {
                format!("list of {}", slot.kind)
            } else {
                slot.kind.to_string()
            },
            other.type_name(),
        )),
    }
}

/// Records accept every item, or only the value items with keywords implied
fn check_record(
    path: &SchemaPath,
    slots: &[ColumnDef],
    cells: Vec<CellValue>,
    ctx: &BindContext,
) -> Result<Vec<CellValue>, DataError> {
    let value_slots = slots.iter().filter(|s| !s.is_keyword()).count();

    let full: Vec<CellValue> = if cells.len() == slots.len() {
        cells
    } else if cells.len() == value_slots {
        let mut values = cells.into_iter();
        slots
            .iter()
            .map(|slot| {
                if slot.is_keyword() {
                    CellValue::Keyword(slot.name.clone())
                } else {
                    values.next().unwrap_or(CellValue::Missing)
                }
            })
            .collect()
    } else {
        return Err(DataError::RowArityMismatch {
            path: path.clone(),
            row: 0,
            expected: slots.len(),
            actual: cells.len(),
        });
    };

    check_cells(path, None, slots, full, ctx.ncelldim)
}

fn check_rows(
    path: &SchemaPath,
    columns: &[ColumnDef],
    rows: Vec<Row>,
    ctx: &BindContext,
) -> Result<Vec<Row>, DataError> {
    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| {
            if row.len() != columns.len() {
                return Err(DataError::RowArityMismatch {
                    path: path.clone(),
                    row: idx,
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
            check_cells(path, Some(idx), columns, row, ctx.ncelldim)
        })
        .collect()
}

/// Check cells positionally; missing cells are only allowed at the end
fn check_cells(
    path: &SchemaPath,
    row: Option<usize>,
    columns: &[ColumnDef],
    cells: Vec<CellValue>,
    ncelldim: usize,
) -> Result<Vec<CellValue>, DataError> {
    let mut seen_missing = false;
    let mut checked = Vec::with_capacity(cells.len());
    for (column, cell) in columns.iter().zip(cells) {
        if cell.is_missing() {
            seen_missing = true;
        } else if seen_missing {
            return Err(invalid(
                path,
                &format!("cell '{}' follows an empty optional cell", column.name),
            ));
        }
        checked.push(check_cell(path, row, column, cell, ncelldim)?);
    }
    Ok(checked)
}

fn check_array(
    path: &SchemaPath,
    dims: &[String],
    element: &ColumnDef,
    array: ArrayValue,
    ctx: &BindContext,
) -> Result<ArrayValue, DataError> {
    let element = ColumnDef {
        optional: false,
        ..element.clone()
    };
    match array {
        ArrayValue::Constant { value } => Ok(ArrayValue::Constant {
            value: check_cell(path, None, &element, value, ctx.ncelldim)?,
        }),
        ArrayValue::Internal { factor, values } => {
            if values.is_empty() {
                return Err(invalid(path, "internal array has no values"));
            }
            let sizes: Option<Vec<usize>> = dims.iter().map(|d| ctx.dim(d)).collect();
            if let Some(sizes) = sizes
                && !sizes.is_empty()
            {
                let expected: usize = sizes.iter().product();
                if expected != values.len() {
                    return Err(DataError::ShapeMismatch {
                        path: path.clone(),
                        expected,
                        actual: values.len(),
                    });
                }
            }
            let factor = factor
                .map(|f| check_cell(path, None, &element, f, ctx.ncelldim))
                .transpose()?;
            let values = values
                .into_iter()
                .enumerate()
                .map(|(idx, v)| check_cell(path, Some(idx), &element, v, ctx.ncelldim))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ArrayValue::Internal { factor, values })
        }
    }
}

/// Check one cell against its column, returning the normalized cell
pub(crate) fn check_cell(
    path: &SchemaPath,
    row: Option<usize>,
    column: &ColumnDef,
    cell: CellValue,
    ncelldim: usize,
) -> Result<CellValue, DataError> {
    let fail = |found: &str| mismatch(path, row, &column.name, &expected_name(column, ncelldim), found);

    if cell.is_missing() {
        return if column.optional {
            Ok(CellValue::Missing)
        } else {
            Err(fail("nothing"))
        };
    }

    if column.shape == Shape::CellId {
        let ids = match cell {
            CellValue::CellId(ids) => ids,
            CellValue::Integer(node) if ncelldim == 1 => vec![node],
            CellValue::Text(text) => {
                let parsed: Option<Vec<i64>> = text.split_whitespace().map(parse_integer).collect();
                match parsed {
                    Some(ids) if !ids.is_empty() => ids,
                    _ => return Err(fail(&format!("'{}'", text))),
                }
            }
            other => return Err(fail(other.type_name())),
        };
        if ids.len() != ncelldim {
            return Err(fail(&format!("cellid with {} components", ids.len())));
        }
        if ids.iter().any(|&id| id < 1) {
            return Err(invalid(
                path,
                &format!("cellid components are one-based, found {:?}", ids),
            ));
        }
        return Ok(CellValue::CellId(ids));
    }

    match column.kind {
        FieldKind::Keyword => match cell {
            CellValue::Keyword(text) | CellValue::Text(text)
                if text.eq_ignore_ascii_case(&column.name) =>
            {
                Ok(CellValue::Keyword(column.name.clone()))
            }
            other => Err(fail(&describe(&other))),
        },
        FieldKind::Integer => match cell {
            CellValue::Integer(n) => Ok(CellValue::Integer(n)),
            CellValue::Text(text) => match parse_integer(&text) {
                Some(n) => Ok(CellValue::Integer(n)),
                None => symbolic(column, text).ok_or_else(|| fail("text")),
            },
            CellValue::TimeSeries(name) if column.time_series && is_symbolic_name(&name) => {
                Ok(CellValue::TimeSeries(name))
            }
            other => Err(fail(&describe(&other))),
        },
        FieldKind::Double => match cell {
            CellValue::Double(v) if v.is_finite() => Ok(CellValue::Double(v)),
            CellValue::Double(v) => Err(invalid(path, &format!("non-finite value {}", v))),
            CellValue::Integer(n) => Ok(CellValue::Double(n as f64)),
            CellValue::Text(text) => match parse_double(&text) {
                Some(v) if v.is_finite() => Ok(CellValue::Double(v)),
                Some(v) => Err(invalid(path, &format!("non-finite value {}", v))),
                None => symbolic(column, text).ok_or_else(|| fail("text")),
            },
            CellValue::TimeSeries(name) if column.time_series && is_symbolic_name(&name) => {
                Ok(CellValue::TimeSeries(name))
            }
            other => Err(fail(&describe(&other))),
        },
        FieldKind::String => match cell {
            CellValue::Text(text) if column.shape == Shape::OneOrMore => {
                writable_text(path, &text)?;
                Ok(CellValue::Names(text.split_whitespace().map(String::from).collect()))
            }
            CellValue::Names(names) if column.shape == Shape::OneOrMore => {
                if names.is_empty() {
                    Err(invalid(path, &format!("'{}' needs at least one name", column.name)))
                } else {
                    for name in &names {
                        writable_text(path, name)?;
                    }
                    Ok(CellValue::Names(names))
                }
            }
            CellValue::Text(text) | CellValue::Keyword(text) => {
                writable_text(path, &text)?;
                Ok(CellValue::Text(text))
            }
            CellValue::PackageRef(name) if column.file_reference.is_some() => {
                Ok(CellValue::PackageRef(name))
            }
            other => Err(fail(&describe(&other))),
        },
        FieldKind::Record | FieldKind::Recarray | FieldKind::Array => {
            Err(fail(cell.type_name()))
        }
    }
}

fn symbolic(column: &ColumnDef, text: String) -> Option<CellValue> {
    (column.time_series && is_symbolic_name(&text)).then_some(CellValue::TimeSeries(text))
}

fn expected_name(column: &ColumnDef, ncelldim: usize) -> String {
    if column.shape == Shape::CellId {
        return format!("cellid with {} components", ncelldim);
    }
    match (column.kind, column.time_series) {
        (FieldKind::Keyword, _) => format!("keyword {}", column.name.to_uppercase()),
        (kind, true) => format!("{} or time-series name", kind),
        (kind, false) => kind.to_string(),
    }
}

fn describe(cell: &CellValue) -> String {
    match cell {
        CellValue::Text(text) | CellValue::Keyword(text) => format!("'{}'", text),
        other => other.type_name().to_string(),
    }
}

fn mismatch(path: &SchemaPath, row: Option<usize>, column: &str, expected: &str, found: &str) -> DataError {
    DataError::TypeMismatch {
        path: path.clone(),
        row,
        column: column.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

/// Block files quote with either `'` or `"`, never both in one token
fn writable_text(path: &SchemaPath, text: &str) -> Result<(), DataError> {
    if text.contains('\'') && text.contains('"') {
        return Err(invalid(
            path,
            &format!("text {} mixes single and double quotes", text),
        ));
    }
    Ok(())
}

fn invalid(path: &SchemaPath, reason: &str) -> DataError {
    DataError::InvalidValue {
        path: path.clone(),
        reason: reason.to_string(),
    }
}
