//! Model and simulation tests

use mf6_modelling_sdk::{
    ArrayValue, CellValue, FieldValue, Model, ModelError, Package, SdkConfig, Simulation,
    TemplateGenerator, row,
};
use std::sync::Arc;

fn generator() -> Arc<TemplateGenerator> {
    Arc::new(TemplateGenerator::builtin().unwrap())
}

fn plain() -> SdkConfig {
    SdkConfig::builder().write_header(false).build()
}

fn dis(model: &Model) -> Package {
    let mut dis = model.new_package("dis").unwrap();
    dis.set("nlay", 1i64).unwrap();
    dis.set("nrow", 1i64).unwrap();
    dis.set("ncol", 2i64).unwrap();
    dis.set("delr", ArrayValue::constant(10.0)).unwrap();
    dis.set("delc", ArrayValue::constant(10.0)).unwrap();
    dis.set("top", ArrayValue::constant(5.0)).unwrap();
    dis.set("botm", ArrayValue::internal([0.0, -1.0])).unwrap();
    dis
}

fn rch(model: &Model) -> Package {
    let mut rch = model.new_package("rch").unwrap();
    rch.set("maxbound", 1i64).unwrap();
    rch.set("periodrecarray", vec![row![(1, 1, 1), 0.001, None::<&str>]])
        .unwrap();
    rch
}

fn chd(model: &Model, name: &str) -> Package {
    let mut chd = model.new_package("chd").unwrap().with_name(name);
    chd.set("maxbound", 1i64).unwrap();
    chd.set("stress_period_data", vec![row![(1, 1, 2), 4.5, None::<&str>]])
        .unwrap();
    chd
}

mod model_write_tests {
    use super::*;

    #[test]
    fn test_files_in_insertion_order() {
        let mut model = Model::new(generator(), "flow", "gwf6").unwrap();
        let packages = [dis(&model), rch(&model), chd(&model, "chd")];
        for package in packages {
            model.add_package(package).unwrap();
        }

        let files = model.write_all(&plain()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["flow.nam", "flow.dis", "flow.rch", "flow.chd"]);
        assert_eq!(
            files[0].content,
            "BEGIN packages\n  DIS6 flow.dis dis\n  RCH6 flow.rch rch\n  CHD6 flow.chd chd\nEND packages\n"
        );
    }

    #[test]
    fn test_time_series_reference_resolved() {
        let mut model = Model::new(generator(), "flow", "gwf6").unwrap();
        let mut ts = Package::new(model.generator(), "utl", "ts")
            .unwrap()
            .with_name("rch_ts");
        ts.set("names", FieldValue::list(["ts_recharge_1"])).unwrap();
        ts.set("methods", FieldValue::list(["linear"])).unwrap();
        ts.set("timeseries", vec![row![0.0, 0.001], row![1.0, 0.002]])
            .unwrap();

        let mut rch = model.new_package("rch").unwrap();
        rch.set(
            "ts_filerecord",
            FieldValue::Record(vec![CellValue::package_ref("rch_ts")]),
        )
        .unwrap();
        rch.set("maxbound", 1i64).unwrap();
        rch.set("periodrecarray", vec![row![(1, 1, 1), "ts_recharge_1", None::<&str>]])
            .unwrap();

        model.add_package(rch).unwrap();
        model.add_package(ts).unwrap();

        let files = model.write_all(&plain()).unwrap();
        let rch_file = files.iter().find(|f| f.path == "flow.rch").unwrap();
        assert!(rch_file.content.contains("  TS6 FILEIN flow_rch_ts.ts\n"));
        let ts_file = files.iter().find(|f| f.path == "flow_rch_ts.ts").unwrap();
        assert!(ts_file.content.contains("  NAMES ts_recharge_1\n"));
        assert!(ts_file.content.contains("  1.0 0.002\n"));

        // Time-series files are not listed in the name file
        assert!(!files[0].content.contains("TS6"));
    }

    #[test]
    fn test_unknown_reference_is_package_not_found() {
        let mut model = Model::new(generator(), "flow", "gwf6").unwrap();
        let mut rch = rch(&model);
        rch.set(
            "ts_filerecord",
            FieldValue::Record(vec![CellValue::package_ref("missing_ts")]),
        )
        .unwrap();
        model.add_package(rch).unwrap();

        assert!(matches!(
            model.write_all(&plain()),
            Err(ModelError::PackageNotFound { name }) if name == "missing_ts"
        ));
    }

    #[test]
    fn test_invalid_package_fails_whole_write() {
        let mut model = Model::new(generator(), "flow", "gwf6").unwrap();
        model.add_package(dis(&model)).unwrap();
        let empty = model.new_package("rch").unwrap();
        model.add_package(empty).unwrap();

        match model.write_all(&plain()) {
            Err(ModelError::Package { package, .. }) => assert_eq!(package, "rch"),
            other => panic!("expected a package error, got {:?}", other),
        }
    }
}

mod package_lookup_tests {
    use super::*;

    #[test]
    fn test_get_package() {
        let mut model = Model::new(generator(), "flow", "gwf6").unwrap();
        model.add_package(rch(&model)).unwrap();

        assert_eq!(model.get_package("RCH").unwrap().name(), "rch");
        assert!(matches!(
            model.get_package("chd"),
            Err(ModelError::PackageNotFound { name }) if name == "chd"
        ));
    }

    #[test]
    fn test_ambiguous_package() {
        let mut model = Model::new(generator(), "flow", "gwf6").unwrap();
        model.add_package(chd(&model, "chd-1")).unwrap();
        model.add_package(chd(&model, "chd-2")).unwrap();

        match model.get_package("chd") {
            Err(ModelError::AmbiguousPackage { abbr, candidates }) => {
                assert_eq!(abbr, "chd");
                assert_eq!(candidates, vec!["chd-1", "chd-2"]);
            }
            other => panic!("expected AmbiguousPackage, got {:?}", other),
        }
        assert_eq!(
            model.get_package_named("chd", "chd-2").unwrap().filename(),
            Some("flow_chd-2.chd")
        );
    }

    #[test]
    fn test_duplicate_name() {
        let mut model = Model::new(generator(), "flow", "gwf6").unwrap();
        model.add_package(chd(&model, "chd-1")).unwrap();
        assert!(matches!(
            model.add_package(chd(&model, "chd-1")),
            Err(ModelError::DuplicatePackage { .. })
        ));
    }

    #[test]
    fn test_remove_package() {
        let mut model = Model::new(generator(), "flow", "gwf6").unwrap();
        model.add_package(rch(&model)).unwrap();
        let removed = model.remove_package("rch").unwrap();
        assert_eq!(removed.abbr(), "rch");
        assert!(model.packages().is_empty());
        assert!(model.remove_package("rch").is_err());
    }
}

mod simulation_tests {
    use super::*;

    fn simulation() -> Simulation {
        let mut sim = Simulation::new(generator(), "sim")
            .unwrap()
            .with_config(plain());

        let mut tdis = sim.new_package("tdis").unwrap();
        tdis.set("nper", 1i64).unwrap();
        tdis.set("perioddata", vec![row![1.0, 1, 1.0]]).unwrap();
        sim.add_package(tdis).unwrap();
        let ims = sim.new_package("ims").unwrap();
        sim.add_package(ims).unwrap();

        let mut model = sim.new_model("flow", "gwf6").unwrap();
        model.add_package(dis(&model)).unwrap();
        model.add_package(rch(&model)).unwrap();
        sim.add_model(model).unwrap();
        sim
    }

    #[test]
    fn test_write_all() {
        let sim = simulation();
        let files = sim.write_all().unwrap();

        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["mfsim.nam", "sim.tdis", "sim.ims", "flow.nam", "flow.dis", "flow.rch"]
        );
        assert_eq!(
            files[0].content,
            "BEGIN timing\n  TDIS6 sim.tdis\nEND timing\n\n\
             BEGIN models\n  GWF6 flow.nam flow\nEND models\n\n\
             BEGIN solutiongroup 1\n  IMS6 sim.ims flow\nEND solutiongroup 1\n"
        );
    }

    #[test]
    fn test_tdis_period_count() {
        let mut sim = simulation();
        sim.get_package_mut("tdis").unwrap().set("nper", 2i64).unwrap();
        assert!(matches!(
            sim.write_all(),
            Err(ModelError::Package { package, .. }) if package == "tdis"
        ));
    }

    #[test]
    fn test_missing_solution() {
        let mut sim = Simulation::new(generator(), "sim").unwrap();
        let mut tdis = sim.new_package("tdis").unwrap();
        tdis.set("nper", 1i64).unwrap();
        tdis.set("perioddata", vec![row![1.0, 1, 1.0]]).unwrap();
        sim.add_package(tdis).unwrap();
        let model = sim.new_model("flow", "gwf6").unwrap();
        sim.add_model(model).unwrap();

        assert!(matches!(
            sim.write_all(),
            Err(ModelError::PackageNotFound { name }) if name == "ims"
        ));
    }

    #[test]
    fn test_get_model() {
        let sim = simulation();
        assert_eq!(sim.get_model("FLOW").unwrap().packages().len(), 2);
        assert!(matches!(
            sim.get_model("transport"),
            Err(ModelError::ModelNotFound { .. })
        ));
    }
}
