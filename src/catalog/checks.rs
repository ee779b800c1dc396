//! Consistency checks run once when a catalog is loaded

use super::SchemaError;
use crate::models::schema::{FieldSchema, ItemSchema};
use crate::models::{FieldKind, PackageDefinition, SchemaPath, Shape};
use std::collections::HashSet;

pub(super) fn check_definitions(definitions: &[PackageDefinition]) -> Result<(), SchemaError> {
    let mut keys = HashSet::new();
    for definition in definitions {
        let package_path = SchemaPath::new([&definition.model_type, &definition.abbr]);
        if definition.model_type.is_empty() || definition.abbr.is_empty() {
            return Err(invalid(&package_path, "model_type and abbr are required"));
        }
        if !keys.insert((definition.model_type.clone(), definition.abbr.clone())) {
            return Err(invalid(&package_path, "package declared more than once"));
        }
        check_package(definition)?;
    }
    Ok(())
}

fn check_package(definition: &PackageDefinition) -> Result<(), SchemaError> {
    let mut block_names = HashSet::new();
    let mut field_names = HashSet::new();

    for block in &definition.blocks {
        let block_path = SchemaPath::new([&definition.model_type, &definition.abbr, &block.name]);
        if !block_names.insert(block.name.as_str()) {
            return Err(invalid(&block_path, "block declared more than once"));
        }
        if block.fields.is_empty() {
            return Err(invalid(&block_path, "block declares no fields"));
        }
        let recarrays = block
            .fields
            .iter()
            .filter(|f| f.kind == FieldKind::Recarray)
            .count();
        if recarrays > 1 {
            return Err(invalid(&block_path, "at most one recarray field per block"));
        }
        for field in &block.fields {
            if !field_names.insert(field.name.as_str()) {
                return Err(invalid(
                    &block_path.child(&field.name),
                    "field declared more than once in package",
                ));
            }
        }
    }

    for (block, field) in definition.fields() {
        let path = SchemaPath::field(
            &definition.model_type,
            &definition.abbr,
            &block.name,
            &field.name,
        );
        check_field(definition, field, &path)?;
    }
    Ok(())
}

fn check_field(
    definition: &PackageDefinition,
    field: &FieldSchema,
    path: &SchemaPath,
) -> Result<(), SchemaError> {
    match field.kind {
        FieldKind::Record | FieldKind::Recarray => {
            if field.items.is_empty() {
                return Err(invalid(path, "record and recarray fields need items"));
            }
            let last = field.items.len() - 1;
            for (idx, item) in field.items.iter().enumerate() {
                check_item(definition, field, item, idx == last, &path.child(&item.name))?;
            }
        }
        FieldKind::Array => {
            if !matches!(field.shape, Shape::Dims(_)) {
                return Err(invalid(path, "array fields need a dims shape"));
            }
            if !field.element_kind().is_numeric() {
                return Err(invalid(path, "array elements must be integer or double"));
            }
        }
        _ => {
            if !field.items.is_empty() {
                return Err(invalid(path, "only records and recarrays declare items"));
            }
            match &field.shape {
                Shape::Scalar => {}
                Shape::OneOrMore if field.kind != FieldKind::Keyword => {}
                other => {
                    return Err(invalid(
                        path,
                        &format!("shape {} is not valid for a {} field", String::from(other.clone()), field.kind),
                    ));
                }
            }
        }
    }

    if let Some(count) = &field.count {
        if field.kind != FieldKind::Integer {
            return Err(invalid(path, "count fields must be integers"));
        }
        match definition.field(&count.field) {
            Some((_, target)) if target.kind == FieldKind::Recarray => {}
            _ => {
                return Err(invalid(
                    path,
                    &format!("count target '{}' is not a recarray field", count.field),
                ));
            }
        }
    }

    if let Some(list) = &field.member_of {
        check_name_list(definition, list, path)?;
    }
    Ok(())
}

fn check_item(
    definition: &PackageDefinition,
    field: &FieldSchema,
    item: &ItemSchema,
    is_last: bool,
    path: &SchemaPath,
) -> Result<(), SchemaError> {
    if !item.kind.is_scalar() {
        return Err(invalid(path, "items must be keyword, string, integer or double"));
    }
    match &item.shape {
        Shape::Scalar => {}
        Shape::CellId if item.kind == FieldKind::Integer => {}
        Shape::OneOrMore if item.kind == FieldKind::String && is_last => {}
        Shape::Expand(list) if field.kind == FieldKind::Recarray && item.kind.is_numeric() => {
            check_name_list(definition, list, path)?;
        }
        other => {
            return Err(invalid(
                path,
                &format!("shape {} is not valid here", String::from(other.clone())),
            ));
        }
    }
    if item.kind == FieldKind::Keyword && item.optional {
        return Err(invalid(path, "keyword items cannot be optional"));
    }
    Ok(())
}

/// The target must be a string list field of the same package
fn check_name_list(
    definition: &PackageDefinition,
    list: &str,
    path: &SchemaPath,
) -> Result<(), SchemaError> {
    match definition.field(list) {
        Some((_, target)) if target.kind == FieldKind::String && target.is_list() => Ok(()),
        _ => Err(invalid(
            path,
            &format!("'{}' is not a string list field of the package", list),
        )),
    }
}

fn invalid(path: &SchemaPath, reason: &str) -> SchemaError {
    SchemaError::InvalidCatalog {
        path: path.clone(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::{SchemaCatalog, SchemaError};

    fn catalog_with_period_items(items: &str) -> Result<SchemaCatalog, SchemaError> {
        let yaml = format!(
            r#"
packages:
  - model_type: gwf6
    abbr: wel
    ftype: WEL6
    blocks:
      - name: options
        fields:
          - name: auxiliary
            kind: string
            shape: one_or_more
      - name: period
        repeating: true
        fields:
          - name: spd
            kind: recarray
            items:
{}
"#,
            items
        );
        SchemaCatalog::from_yaml_str(&yaml)
    }

    #[test]
    fn test_expand_target_must_exist() {
        let ok = catalog_with_period_items(
            "              - {name: q, kind: double}\n              - {name: aux, kind: double, shape: 'expand:auxiliary'}",
        );
        assert!(ok.is_ok());

        let bad = catalog_with_period_items(
            "              - {name: q, kind: double}\n              - {name: aux, kind: double, shape: 'expand:nothing'}",
        );
        assert!(matches!(bad, Err(SchemaError::InvalidCatalog { .. })));
    }

    #[test]
    fn test_cellid_must_be_integer() {
        let bad = catalog_with_period_items("              - {name: cellid, kind: double, shape: cellid}");
        assert!(matches!(bad, Err(SchemaError::InvalidCatalog { .. })));
    }

    #[test]
    fn test_duplicate_package_rejected() {
        let yaml = r#"
packages:
  - {model_type: gwf6, abbr: wel, ftype: WEL6, blocks: [{name: options, fields: [{name: a, kind: keyword}]}]}
  - {model_type: GWF6, abbr: WEL, ftype: WEL6, blocks: [{name: options, fields: [{name: a, kind: keyword}]}]}
"#;
        assert!(matches!(
            SchemaCatalog::from_yaml_str(yaml),
            Err(SchemaError::InvalidCatalog { .. })
        ));
    }

    #[test]
    fn test_count_target_must_be_recarray() {
        let yaml = r#"
packages:
  - model_type: gwf6
    abbr: wel
    ftype: WEL6
    blocks:
      - name: dimensions
        fields:
          - {name: maxbound, kind: integer, count: {field: missing}}
"#;
        assert!(matches!(
            SchemaCatalog::from_yaml_str(yaml),
            Err(SchemaError::InvalidCatalog { .. })
        ));
    }
}
