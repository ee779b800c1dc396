//! Catalog, template and bound data tests

use mf6_modelling_sdk::catalog::SchemaCatalog;
use mf6_modelling_sdk::data::RenderContext;
use mf6_modelling_sdk::template::TemplateLayout;
use mf6_modelling_sdk::{
    BindContext, BoundData, CellValue, DataError, FieldKind, FieldRule, FieldValue, NoReferences,
    Package, SchemaError, SchemaPath, SdkConfig, TemplateGenerator, row,
};
use serde_json::json;
use std::sync::Arc;

const WELL_CATALOG: &str = r#"
version: "test"
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
      - name: dimensions
        fields:
          - name: maxbound
            kind: integer
            optional: false
            count:
              field: spd
              rule: bound
      - name: period
        repeating: true
        fields:
          - name: spd
            kind: recarray
            items:
              - name: cellid
                kind: integer
                shape: cellid
              - name: q
                kind: double
                time_series: true
"#;

fn well_generator() -> TemplateGenerator {
    TemplateGenerator::new(Arc::new(SchemaCatalog::from_yaml_str(WELL_CATALOG).unwrap()))
}

mod catalog_lookup_tests {
    use super::*;

    #[test]
    fn test_builtin_resolves_fields() {
        let catalog = SchemaCatalog::builtin().unwrap();
        let schema = catalog
            .resolve(&SchemaPath::field("gwf6", "rch", "dimensions", "maxbound"))
            .unwrap();
        assert_eq!(schema.kind, FieldKind::Integer);
        assert!(!schema.optional);

        let rch = catalog.packages_by_ftype("gwf6", "RCH6");
        assert_eq!(rch.len(), 2);
    }

    #[test]
    fn test_unknown_path() {
        let catalog = SchemaCatalog::builtin().unwrap();
        let result = catalog.resolve(&SchemaPath::field("gwf6", "rch", "options", "no_such_field"));
        assert!(matches!(result, Err(SchemaError::NotFound { .. })));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = SchemaCatalog::from_yaml_str(WELL_CATALOG).unwrap();
        assert_eq!(catalog.version(), Some("test"));
        assert!(catalog.package("GWF6", "WEL").is_ok());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            SchemaCatalog::from_yaml_str("packages: [ {"),
            Err(SchemaError::Parse(_))
        ));
    }
}

mod template_tests {
    use super::*;

    #[test]
    fn test_templates_are_cached() {
        let generator = well_generator();
        let path = SchemaPath::field("gwf6", "wel", "period", "spd");
        let first = generator.generate(&path).unwrap();
        let second = generator.generate(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(generator.cache_len(), 1);
    }

    #[test]
    fn test_recarray_template_has_no_rows() {
        let generator = well_generator();
        let template = generator
            .generate(&SchemaPath::field("gwf6", "wel", "period", "spd"))
            .unwrap();
        match template.layout() {
            TemplateLayout::Recarray { columns } => {
                let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["cellid", "q"]);
            }
            other => panic!("expected a recarray layout, got {:?}", other),
        }
    }

    #[test]
    fn test_auxiliary_columns_follow_base_columns() {
        let generator = well_generator();
        let template = generator
            .generate(&SchemaPath::field("gwf6", "wel", "period", "spd"))
            .unwrap();
        let ctx = BindContext::new(3).with_list("auxiliary", ["conc", "temp"]);
        let names: Vec<String> = template
            .active_columns(&ctx)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["cellid", "q", "conc", "temp"]);
    }
}

mod bound_data_tests {
    use super::*;

    #[test]
    fn test_bind_and_render_rows() {
        let generator = well_generator();
        let template = generator
            .generate(&SchemaPath::field("gwf6", "wel", "period", "spd"))
            .unwrap();
        let ctx = BindContext::new(2);
        let bound = BoundData::bind(
            template,
            Some(FieldValue::rows([row![(1, 7), -50.0], row![(1, 8), "pump_a"]])),
            &ctx,
        )
        .unwrap();
        assert_eq!(bound.row_count(), Some(2));

        let config = SdkConfig::default();
        let lines = bound
            .serialize(&RenderContext::new(&config, &NoReferences))
            .unwrap();
        assert_eq!(lines, vec!["  1 7 -50.0", "  1 8 pump_a"]);
    }

    #[test]
    fn test_cellid_length_follows_grid() {
        let generator = well_generator();
        let template = generator
            .generate(&SchemaPath::field("gwf6", "wel", "period", "spd"))
            .unwrap();
        let result = BoundData::bind(
            template.clone(),
            Some(FieldValue::rows([row![(1, 1, 1), -1.0]])),
            &BindContext::new(2),
        );
        assert!(matches!(result, Err(DataError::TypeMismatch { row: Some(0), .. })));

        let node = BoundData::bind(
            template,
            Some(FieldValue::rows([row![42, -1.0]])),
            &BindContext::new(1),
        )
        .unwrap();
        assert_eq!(
            node.get().and_then(FieldValue::as_rows).unwrap()[0][0],
            CellValue::CellId(vec![42])
        );
    }

    #[test]
    fn test_deserialize_blank_unsets() {
        let generator = well_generator();
        let template = generator
            .generate(&SchemaPath::field("gwf6", "wel", "dimensions", "maxbound"))
            .unwrap();
        let ctx = BindContext::default();
        let mut bound = BoundData::bind(template, Some(FieldValue::from(4i64)), &ctx).unwrap();
        bound.deserialize("  MAXBOUND 6", &ctx).unwrap();
        assert_eq!(bound.get(), Some(&FieldValue::Scalar(CellValue::Integer(6))));
        bound.deserialize("", &ctx).unwrap();
        assert!(!bound.is_set());
    }
}

mod json_tests {
    use super::*;

    #[test]
    fn test_rows_from_json() {
        let generator = well_generator();
        let mut package = Package::new(&generator, "gwf6", "wel").unwrap();
        let schema = package.template("spd").unwrap().schema().clone();
        let value = FieldValue::from_json(&schema, &json!([[[1, 2, 3], -25.5], [[1, 2, 4], "pump_b"]]))
            .unwrap()
            .unwrap();
        package.set("spd", value).unwrap();

        let rows = package.rows("spd").unwrap();
        assert_eq!(rows[0][0], CellValue::CellId(vec![1, 2, 3]));
        assert_eq!(rows[1][1], CellValue::TimeSeries("pump_b".to_string()));
    }

    #[test]
    fn test_null_is_unset() {
        let generator = well_generator();
        let package = Package::new(&generator, "gwf6", "wel").unwrap();
        let schema = package.template("maxbound").unwrap().schema().clone();
        assert_eq!(FieldValue::from_json(&schema, &json!(null)).unwrap(), None);
    }
}

mod rule_tests {
    use super::*;

    /// Wells may only extract water
    #[derive(Debug)]
    struct ExtractionOnly;

    impl FieldRule for ExtractionOnly {
        fn name(&self) -> &str {
            "extraction_only"
        }

        fn check(&self, package: &Package) -> Result<(), DataError> {
            let injecting = package
                .rows("spd")
                .unwrap_or_default()
                .iter()
                .any(|row| row[1].as_f64().is_some_and(|q| q > 0.0));
            if injecting {
                return Err(DataError::RuleViolation {
                    rule: self.name().to_string(),
                    path: package.field_path("spd"),
                    reason: "positive rate".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_custom_rule_runs_at_write() {
        let generator = well_generator();
        let mut package = Package::new(&generator, "gwf6", "wel").unwrap();
        package.add_rule(ExtractionOnly);
        package.set("maxbound", 1i64).unwrap();
        package.set("spd", vec![row![(1, 1, 1), 10.0]]).unwrap();

        match package.write_blocks(&NoReferences, &SdkConfig::default()) {
            Err(DataError::RuleViolation { rule, .. }) => assert_eq!(rule, "extraction_only"),
            other => panic!("expected a rule violation, got {:?}", other),
        }

        package.set("spd", vec![row![(1, 1, 1), -10.0]]).unwrap();
        assert!(package.write_blocks(&NoReferences, &SdkConfig::default()).is_ok());
    }
}
