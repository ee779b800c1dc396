//! Reading one field's lines back into raw values
//!
//! Produces raw cells (numbers stay text) that the bind-time checks then
//! normalize, so read values follow exactly the same rules as bound ones.

use super::tokenize::{is_content, tokenize};
use crate::models::{ArrayValue, CellValue, ExternalFile, FieldValue, SchemaPath, Shape};
use crate::template::{ColumnDef, Template, TemplateLayout};
use crate::validation::checks::{parse_double, parse_integer};
use crate::validation::{BindContext, DataError};

pub(crate) const OPEN_CLOSE: &str = "OPEN/CLOSE";

/// Parse the content lines of one field (line number, text)
pub(crate) fn parse_lines(
    template: &Template,
    lines: &[(usize, String)],
    ctx: &BindContext,
) -> Result<Option<FieldValue>, DataError> {
    let lines: Vec<(usize, Vec<String>)> = lines
        .iter()
        .filter(|(_, text)| is_content(text))
        .map(|(no, text)| (*no, tokenize(text)))
        .filter(|(_, tokens)| !tokens.is_empty())
        .collect();
    let Some((first_no, first)) = lines.first() else {
        return Ok(None);
    };
    let path = template.path();
    let tag = template.schema().tag();

    match template.layout() {
        TemplateLayout::Slot(slot) => {
            single_line(path, &lines)?;
            expect_tag(path, *first_no, first, &tag)?;
            let values = &first[1..];
            if slot.is_keyword() {
                if !values.is_empty() {
                    return Err(parse_error(path, *first_no, "keyword takes no values"));
                }
                return Ok(Some(FieldValue::Keyword(true)));
            }
            if slot.shape == Shape::OneOrMore {
                if values.is_empty() {
                    return Err(parse_error(path, *first_no, "expected at least one value"));
                }
                return Ok(Some(FieldValue::List(values.iter().map(text).collect())));
            }
            match values {
                [value] => Ok(Some(FieldValue::Scalar(text(value)))),
                _ => Err(parse_error(
                    path,
                    *first_no,
                    &format!("expected one value, found {}", values.len()),
                )),
            }
        }
        TemplateLayout::Record { slots } => {
            single_line(path, &lines)?;
            let tokens = match slots.first() {
                Some(slot) if slot.is_keyword() => &first[..],
                _ => {
                    expect_tag(path, *first_no, first, &tag)?;
                    &first[1..]
                }
            };
            split_cells(path, slots, tokens, *first_no, 0, ctx.ncelldim).map(|cells| Some(FieldValue::Record(cells)))
        }
        TemplateLayout::Recarray { .. } => {
            if first[0].eq_ignore_ascii_case(OPEN_CLOSE) {
                single_line(path, &lines)?;
                return parse_external(path, *first_no, &first[1..]).map(|f| Some(FieldValue::External(f)));
            }
            let columns = template.active_columns(ctx);
            lines
                .iter()
                .enumerate()
                .map(|(idx, (no, tokens))| split_cells(path, &columns, tokens, *no, idx, ctx.ncelldim))
                .collect::<Result<Vec<_>, _>>()
                .map(|rows| Some(FieldValue::Recarray(rows)))
        }
        TemplateLayout::Array { .. } => {
            expect_tag(path, *first_no, first, &tag)?;
            let Some((ctrl_no, control)) = lines.get(1) else {
                return Err(parse_error(path, *first_no, "missing array control record"));
            };
            match control[0].to_uppercase().as_str() {
                "CONSTANT" => match control.get(1) {
                    Some(value) if lines.len() == 2 => Ok(Some(FieldValue::Array(ArrayValue::Constant {
                        value: text(value),
                    }))),
                    _ => Err(parse_error(path, *ctrl_no, "CONSTANT takes exactly one value")),
                },
                "INTERNAL" => {
                    let factor = option_value(path, *ctrl_no, control, "FACTOR")?.map(|f| text(&f));
                    let values = lines[2..]
                        .iter()
                        .flat_map(|(_, tokens)| tokens.iter().map(text))
                        .collect();
                    Ok(Some(FieldValue::Array(ArrayValue::Internal { factor, values })))
                }
                "OPEN/CLOSE" => {
                    if lines.len() > 2 {
                        return Err(parse_error(path, lines[2].0, "unexpected data after OPEN/CLOSE"));
                    }
                    parse_external(path, *ctrl_no, &control[1..]).map(|f| Some(FieldValue::External(f)))
                }
                other => Err(parse_error(
                    path,
                    *ctrl_no,
                    &format!("unknown array control record '{}'", other),
                )),
            }
        }
    }
}

fn text(token: &String) -> CellValue {
    CellValue::Text(token.clone())
}

fn single_line(path: &SchemaPath, lines: &[(usize, Vec<String>)]) -> Result<(), DataError> {
    match lines.get(1) {
        Some((no, _)) => Err(parse_error(path, *no, "field appears more than once")),
        None => Ok(()),
    }
}

fn expect_tag(path: &SchemaPath, line: usize, tokens: &[String], tag: &str) -> Result<(), DataError> {
    if tokens.first().is_some_and(|t| t.eq_ignore_ascii_case(tag)) {
        Ok(())
    } else {
        Err(parse_error(path, line, &format!("expected {}", tag)))
    }
}

/// Distribute tokens over columns; cellids consume one token per dimension
fn split_cells(
    path: &SchemaPath,
    columns: &[ColumnDef],
    tokens: &[String],
    line: usize,
    row: usize,
    ncelldim: usize,
) -> Result<Vec<CellValue>, DataError> {
    let mut cells = Vec::with_capacity(columns.len());
    let mut pos = 0;
    let arity = |filled: usize| DataError::RowArityMismatch {
        path: path.clone(),
        row,
        expected: columns.len(),
        actual: filled,
    };

    for column in columns {
        let remaining = &tokens[pos..];
        if remaining.is_empty() {
            if !column.optional {
                return Err(arity(cells.len()));
            }
            cells.push(CellValue::Missing);
            continue;
        }
        match column.shape {
            Shape::CellId => {
                if remaining.len() < ncelldim {
                    return Err(arity(cells.len()));
                }
                let ids = remaining[..ncelldim]
                    .iter()
                    .map(|t| {
                        parse_integer(t)
                            .ok_or_else(|| parse_error(path, line, &format!("invalid cellid component '{}'", t)))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                cells.push(CellValue::CellId(ids));
                pos += ncelldim;
            }
            Shape::OneOrMore => {
                cells.push(CellValue::Names(remaining.to_vec()));
                pos = tokens.len();
            }
            _ => {
                cells.push(CellValue::Text(remaining[0].clone()));
                pos += 1;
            }
        }
    }

    if pos < tokens.len() {
        return Err(arity(cells.len() + tokens.len() - pos));
    }
    Ok(cells)
}

fn parse_external(path: &SchemaPath, line: usize, tokens: &[String]) -> Result<ExternalFile, DataError> {
    let Some(filename) = tokens.first() else {
        return Err(parse_error(path, line, "OPEN/CLOSE needs a file name"));
    };
    let mut file = ExternalFile::new(filename.clone());
    file.factor = option_value(path, line, tokens, "FACTOR")?
        .map(|f| parse_double(&f).ok_or_else(|| parse_error(path, line, &format!("invalid factor '{}'", f))))
        .transpose()?;
    file.binary = tokens.iter().any(|t| t.eq_ignore_ascii_case("(BINARY)"));
    Ok(file)
}

/// Value following an option keyword on a control line
fn option_value(
    path: &SchemaPath,
    line: usize,
    tokens: &[String],
    option: &str,
) -> Result<Option<String>, DataError> {
    match tokens.iter().position(|t| t.eq_ignore_ascii_case(option)) {
        Some(idx) => tokens
            .get(idx + 1)
            .cloned()
            .map(Some)
            .ok_or_else(|| parse_error(path, line, &format!("{} needs a value", option))),
        None => Ok(None),
    }
}

pub(crate) fn parse_error(path: &SchemaPath, line: usize, reason: &str) -> DataError {
    DataError::Parse {
        path: path.clone(),
        line,
        reason: reason.to_string(),
    }
}
