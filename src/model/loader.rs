//! Simulation loading
//!
//! Reads `mfsim.nam` from a storage backend and follows it: the TDIS file,
//! the solution packages of the SOLUTIONGROUP block, every model name file
//! and the packages it lists. Time-series files named by a package are
//! loaded as utility packages and linked back to it.

use super::error::ModelError;
use super::{Model, SIM_NAME_FILE, Simulation};
use crate::config::SdkConfig;
use crate::data::tokenize::{is_content, tokenize};
use crate::models::{CellValue, GridKind, PackageDefinition};
use crate::package::Package;
use crate::storage::{StorageBackend, join_path};
use crate::template::TemplateGenerator;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Simulation loader that uses a storage backend
pub struct SimulationLoader<B: StorageBackend> {
    storage: B,
    generator: Arc<TemplateGenerator>,
    config: SdkConfig,
}

impl<B: StorageBackend> SimulationLoader<B> {
    pub fn new(storage: B, generator: Arc<TemplateGenerator>) -> Self {
        Self {
            storage,
            generator,
            config: SdkConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SdkConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the simulation stored in `dir`
    pub fn load(&self, dir: &str) -> Result<Simulation, ModelError> {
        let name = dir
            .rsplit('/')
            .find(|s| !s.is_empty() && *s != ".")
            .unwrap_or("sim");
        let mut simulation =
            Simulation::new(self.generator.clone(), name)?.with_config(self.config.clone());

        let text = self.read(dir, SIM_NAME_FILE)?;
        simulation
            .nam_mut()
            .load_text(&text)
            .map_err(|e| load_error(SIM_NAME_FILE, e))?;
        let nam = simulation.nam().clone();

        if let Some(tdis_file) = nam.string("tdis6") {
            let tdis = self.load_package(dir, "sim", "tdis", tdis_file, "tdis")?;
            simulation.add_package(tdis)?;
        }

        let mut solutions: Vec<(String, Vec<String>)> = Vec::new();
        for period in nam.periods("solutiongroup") {
            for row in nam.rows_in_period("solutiongroup", period).unwrap_or_default() {
                let (Some(ftype), Some(fname)) = (cell_text(&row[0]), cell_text(&row[1])) else {
                    continue;
                };
                let definition = self.definition_for(dir, "sim", ftype, fname)?;
                let pname = if solutions.is_empty() {
                    definition.abbr.clone()
                } else {
                    format!("{}-{}", definition.abbr, solutions.len() + 1)
                };
                let package = self.load_definition(dir, definition, fname, &pname)?;
                simulation.add_package(package)?;
                let models = match row.get(2) {
                    Some(CellValue::Names(names)) => names.clone(),
                    Some(CellValue::Text(name)) => vec![name.clone()],
                    _ => Vec::new(),
                };
                solutions.push((pname, models));
            }
        }

        for row in nam.rows("models").unwrap_or_default() {
            let (Some(mtype), Some(mfname), Some(mname)) =
                (cell_text(&row[0]), cell_text(&row[1]), cell_text(&row[2]))
            else {
                continue;
            };
            let model = self.load_model(dir, mtype, mfname, mname)?;
            simulation.add_model(model)?;
        }

        for (solution, models) in &solutions {
            let models: Vec<&str> = models.iter().map(String::as_str).collect();
            simulation.assign_solution(solution, &models)?;
        }

        info!(
            "Loaded simulation '{}' with {} models from {}",
            simulation.name(),
            simulation.models().len(),
            if dir.is_empty() { "." } else { dir }
        );
        Ok(simulation)
    }

    /// Load one model from its name file
    pub fn load_model(
        &self,
        dir: &str,
        model_type: &str,
        name_file: &str,
        name: &str,
    ) -> Result<Model, ModelError> {
        let model_type = model_type.to_lowercase();
        let mut model = Model::new(self.generator.clone(), name, &model_type)?;
        let text = self.read(dir, name_file)?;
        model
            .nam_mut()
            .load_text(&text)
            .map_err(|e| load_error(name_file, e))?;
        model.nam_mut().set_filename(name_file);

        let rows = model.nam().rows("packages").unwrap_or_default().to_vec();
        for row in &rows {
            if let Some(ftype) = cell_text(&row[0])
                && let Some(grid) = GridKind::from_dis_abbr(ftype.trim_end_matches(|c: char| c.is_ascii_digit()))
            {
                model.set_grid(grid)?;
            }
        }

        for row in &rows {
            let (Some(ftype), Some(fname)) = (cell_text(&row[0]), cell_text(&row[1])) else {
                continue;
            };
            let definition = self.definition_for(dir, &model_type, ftype, fname)?;
            let pname = match row.get(2).and_then(cell_text) {
                Some(pname) => pname.to_lowercase(),
                None => unique_name(&definition.abbr, |n| model.package_by_name(n).is_some()),
            };
            let mut package = self.load_definition_with_dims(dir, definition, fname, &pname, model.grid())?;

            let mut children = Vec::new();
            for reference in package.file_references() {
                let Some((child_type, child_abbr)) = reference.target.split_once('/') else {
                    continue;
                };
                let child_name = format!("{}_{}", pname, child_abbr);
                let child = self.load_package(dir, child_type, child_abbr, &reference.filename, &child_name)?;
                package
                    .link_reference(&reference.field, &child_name)
                    .map_err(|e| load_error(fname, e))?;
                children.push(child);
            }

            model.add_package(package)?;
            for child in children {
                model.add_package(child)?;
            }
        }

        debug!(
            "Loaded model '{}' with {} packages",
            model.name(),
            model.packages().len()
        );
        Ok(model)
    }

    fn read(&self, dir: &str, file: &str) -> Result<String, ModelError> {
        Ok(self.storage.read_text(&join_path(dir, file))?)
    }

    fn load_package(
        &self,
        dir: &str,
        model_type: &str,
        abbr: &str,
        file: &str,
        name: &str,
    ) -> Result<Package, ModelError> {
        let definition = self.generator.catalog().package(model_type, abbr)?;
        self.load_definition(dir, definition, file, name)
    }

    fn load_definition(
        &self,
        dir: &str,
        definition: Arc<PackageDefinition>,
        file: &str,
        name: &str,
    ) -> Result<Package, ModelError> {
        self.load_definition_with_dims(dir, definition, file, name, GridKind::Structured)
    }

    fn load_definition_with_dims(
        &self,
        dir: &str,
        definition: Arc<PackageDefinition>,
        file: &str,
        name: &str,
        grid: GridKind,
    ) -> Result<Package, ModelError> {
        let text = self.read(dir, file)?;
        let mut package = Package::from_definition(&self.generator, definition)
            .map_err(|e| load_error(file, e))?
            .with_name(name)
            .with_filename(file);
        package
            .set_cell_dims(grid.cell_dims())
            .map_err(|e| load_error(file, e))?;
        package.load_text(&text).map_err(|e| load_error(file, e))?;
        debug!("Loaded package '{}' from {}", name, file);
        Ok(package)
    }

    /// Pick the definition for a name-file ftype
    ///
    /// Types sharing an ftype are told apart by their variant keyword in
    /// the file's OPTIONS block.
    fn definition_for(
        &self,
        dir: &str,
        model_type: &str,
        ftype: &str,
        file: &str,
    ) -> Result<Arc<PackageDefinition>, ModelError> {
        let candidates = self.generator.catalog().packages_by_ftype(model_type, ftype);
        match candidates.len() {
            0 => Err(ModelError::Load {
                path: file.to_string(),
                reason: format!("unknown file type {} for {} models", ftype, model_type),
            }),
            1 => Ok(candidates[0].clone()),
            _ => {
                let text = self.read(dir, file)?;
                let keywords = option_keywords(&text);
                let variant = candidates.iter().find(|d| {
                    d.variant_keyword
                        .as_ref()
                        .is_some_and(|k| keywords.iter().any(|w| w.eq_ignore_ascii_case(k)))
                });
                let plain = candidates.iter().find(|d| d.variant_keyword.is_none());
                match variant.or(plain) {
                    Some(definition) => Ok(definition.clone()),
                    None => {
                        warn!("No variant of {} matches {}", ftype, file);
                        Err(ModelError::Load {
                            path: file.to_string(),
                            reason: format!("cannot tell which {} variant the file holds", ftype),
                        })
                    }
                }
            }
        }
    }
}

fn load_error(path: &str, error: impl std::fmt::Display) -> ModelError {
    ModelError::Load {
        path: path.to_string(),
        reason: error.to_string(),
    }
}

fn cell_text(cell: &CellValue) -> Option<&str> {
    match cell {
        CellValue::Text(text) => Some(text),
        _ => None,
    }
}

fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|name| !taken(name))
        .unwrap_or_else(|| base.to_string())
}

/// First token of each line inside the OPTIONS block
fn option_keywords(text: &str) -> Vec<String> {
    let mut inside = false;
    let mut keywords = Vec::new();
    for line in text.lines().filter(|l| is_content(l)) {
        let tokens = tokenize(line);
        match tokens.as_slice() {
            [begin, block, ..] if begin.eq_ignore_ascii_case("begin") => {
                inside = block.eq_ignore_ascii_case("options");
            }
            [end, ..] if end.eq_ignore_ascii_case("end") => inside = false,
            [first, ..] if inside => keywords.push(first.clone()),
            _ => {}
        }
    }
    keywords
}
