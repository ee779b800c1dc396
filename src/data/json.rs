//! Binding values from JSON
//!
//! Lets callers drive packages from JSON documents (web front ends, stored
//! scenarios). Conversion only shapes the value; the usual bind-time checks
//! still run when it is set on a field.

use crate::models::schema::FieldSchema;
use crate::models::{ArrayValue, CellValue, ExternalFile, FieldKind, FieldValue, Row};
use crate::validation::DataError;
use serde_json::Value;

impl FieldValue {
    /// Shape a JSON value for a field; `null` means unset
    pub fn from_json(schema: &FieldSchema, value: &Value) -> Result<Option<FieldValue>, DataError> {
        if value.is_null() {
            return Ok(None);
        }
        let invalid = |reason: &str| DataError::InvalidValue {
            path: schema.path.clone(),
            reason: reason.to_string(),
        };

        let field = match schema.kind {
            FieldKind::Keyword => match value {
                Value::Bool(flag) => FieldValue::Keyword(*flag),
                _ => return Err(invalid("keyword fields take true or false")),
            },
            FieldKind::String | FieldKind::Integer | FieldKind::Double => match value {
                Value::Array(items) if schema.is_list() => {
                    FieldValue::List(items.iter().map(cell_from_json).collect())
                }
                other => FieldValue::Scalar(cell_from_json(other)),
            },
            FieldKind::Record => match value {
                Value::Array(items) => FieldValue::Record(items.iter().map(cell_from_json).collect()),
                Value::Object(map) => FieldValue::Record(
                    schema
                        .items
                        .iter()
                        .map(|item| match map.get(&item.name) {
                            Some(v) => cell_from_json(v),
                            None if item.kind == FieldKind::Keyword => {
                                CellValue::Keyword(item.name.clone())
                            }
                            None => CellValue::Missing,
                        })
                        .collect(),
                ),
                _ => return Err(invalid("records take an array or an object")),
            },
            FieldKind::Recarray => match value {
                Value::Array(rows) => FieldValue::Recarray(
                    rows.iter()
                        .map(|row| match row {
                            Value::Array(cells) => Ok(cells.iter().map(cell_from_json).collect::<Row>()),
                            _ => Err(invalid("recarray rows must be arrays")),
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                Value::Object(_) => FieldValue::External(external_from_json(schema, value)?),
                _ => return Err(invalid("recarrays take an array of rows")),
            },
            FieldKind::Array => match value {
                Value::Number(_) => FieldValue::Array(ArrayValue::Constant {
                    value: cell_from_json(value),
                }),
                Value::Array(_) => {
                    let mut values = Vec::new();
                    flatten(value, &mut values);
                    FieldValue::Array(ArrayValue::Internal {
                        factor: None,
                        values,
                    })
                }
                Value::Object(map) if map.contains_key("filename") => {
                    FieldValue::External(external_from_json(schema, value)?)
                }
                Value::Object(_) => FieldValue::Array(
                    serde_json::from_value(value.clone()).map_err(|e| invalid(&e.to_string()))?,
                ),
                _ => return Err(invalid("arrays take a number, nested arrays or an object")),
            },
        };
        Ok(Some(field))
    }
}

fn external_from_json(schema: &FieldSchema, value: &Value) -> Result<ExternalFile, DataError> {
    serde_json::from_value(value.clone()).map_err(|e| DataError::InvalidValue {
        path: schema.path.clone(),
        reason: format!("invalid external file: {}", e),
    })
}

/// Numbers, strings and integer arrays (cellids) map onto cells directly
fn cell_from_json(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Missing,
        Value::Bool(flag) => CellValue::Text(flag.to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Integer(i),
            None => CellValue::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => CellValue::Text(s.clone()),
        Value::Array(items) => {
            let ids: Option<Vec<i64>> = items.iter().map(Value::as_i64).collect();
            match ids {
                Some(ids) => CellValue::CellId(ids),
                None => CellValue::Names(
                    items
                        .iter()
                        .map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string()))
                        .collect(),
                ),
            }
        }
        Value::Object(_) => CellValue::Text(value.to_string()),
    }
}

fn flatten(value: &Value, out: &mut Vec<CellValue>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| flatten(v, out)),
        other => out.push(cell_from_json(other)),
    }
}
