//! Simulation: timing, solutions and models

use super::error::{ModelError, find_by_abbr, index_by_abbr};
use super::{Model, RenderedFile};
use crate::config::SdkConfig;
use crate::data::FileResolver;
use crate::models::{CellValue, Row};
use crate::package::Package;
use crate::template::TemplateGenerator;
use std::sync::Arc;
use tracing::{info, warn};

/// File name of the simulation name file
pub const SIM_NAME_FILE: &str = "mfsim.nam";

#[derive(Debug, Clone)]
pub struct Simulation {
    name: String,
    generator: Arc<TemplateGenerator>,
    config: SdkConfig,
    nam: Package,
    packages: Vec<Package>,
    models: Vec<Model>,
    /// Solution package name with the models it solves
    solutions: Vec<(String, Vec<String>)>,
}

impl Simulation {
    pub fn new(generator: Arc<TemplateGenerator>, name: &str) -> Result<Self, ModelError> {
        let nam = Package::new(&generator, "sim", "nam")
            .map_err(|source| ModelError::Package {
                package: "nam".to_string(),
                source,
            })?
            .with_filename(SIM_NAME_FILE);
        Ok(Self {
            name: name.to_lowercase(),
            generator,
            config: SdkConfig::default(),
            nam,
            packages: Vec::new(),
            models: Vec::new(),
            solutions: Vec::new(),
        })
    }

    pub fn with_config(mut self, config: SdkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn generator(&self) -> &Arc<TemplateGenerator> {
        &self.generator
    }

    /// Options of the simulation name file; the other blocks are generated
    pub fn nam(&self) -> &Package {
        &self.nam
    }

    pub fn nam_mut(&mut self) -> &mut Package {
        &mut self.nam
    }

    /// Empty simulation-level package (`tdis`, `ims`)
    pub fn new_package(&self, abbr: &str) -> Result<Package, ModelError> {
        Package::new(&self.generator, "sim", abbr).map_err(|source| ModelError::Package {
            package: abbr.to_lowercase(),
            source,
        })
    }

    pub fn add_package(&mut self, mut package: Package) -> Result<&mut Package, ModelError> {
        if package.model_type() != "sim" || package.abbr() == "nam" {
            return Err(ModelError::IncompatiblePackage {
                package: package.name().to_string(),
                package_type: package.package_type(),
                owner: self.name.clone(),
            });
        }
        if self.packages.iter().any(|p| p.name() == package.name())
            || (!package.definition().multi_package
                && self.packages.iter().any(|p| p.abbr() == package.abbr()))
        {
            return Err(ModelError::DuplicatePackage {
                owner: self.name.clone(),
                name: package.name().to_string(),
            });
        }
        if package.filename().is_none() {
            let filename = if package.name() == package.abbr() {
                format!("{}.{}", self.name, package.abbr())
            } else {
                format!("{}_{}.{}", self.name, package.name(), package.abbr())
            };
            package.set_filename(filename);
        }
        let idx = self.packages.len();
        self.packages.push(package);
        Ok(&mut self.packages[idx])
    }

    pub fn get_package(&self, abbr: &str) -> Result<&Package, ModelError> {
        find_by_abbr(&self.packages, abbr)
    }

    pub fn get_package_mut(&mut self, abbr: &str) -> Result<&mut Package, ModelError> {
        let idx = index_by_abbr(&self.packages, abbr)?;
        Ok(&mut self.packages[idx])
    }

    pub fn package_by_name(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Empty model on the configured default grid
    pub fn new_model(&self, name: &str, model_type: &str) -> Result<Model, ModelError> {
        Model::new(self.generator.clone(), name, model_type)?.with_grid(self.config.default_grid)
    }

    pub fn add_model(&mut self, model: Model) -> Result<&mut Model, ModelError> {
        if self.models.iter().any(|m| m.name() == model.name()) {
            return Err(ModelError::DuplicateModel {
                name: model.name().to_string(),
            });
        }
        info!("Added {} model '{}'", model.model_type(), model.name());
        let idx = self.models.len();
        self.models.push(model);
        Ok(&mut self.models[idx])
    }

    pub fn get_model(&self, name: &str) -> Result<&Model, ModelError> {
        self.models
            .iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ModelError::ModelNotFound {
                name: name.to_lowercase(),
            })
    }

    pub fn get_model_mut(&mut self, name: &str) -> Result<&mut Model, ModelError> {
        self.models
            .iter_mut()
            .find(|m| m.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ModelError::ModelNotFound {
                name: name.to_lowercase(),
            })
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Solve `models` with the solution package named `solution`
    ///
    /// A model is solved by one solution only; it is moved out of any
    /// earlier assignment.
    pub fn assign_solution(&mut self, solution: &str, models: &[&str]) -> Result<(), ModelError> {
        let package = self
            .package_by_name(solution)
            .filter(|p| p.abbr() == "ims")
            .ok_or_else(|| ModelError::PackageNotFound {
                name: solution.to_lowercase(),
            })?;
        let solution = package.name().to_string();
        let mut names = Vec::new();
        for model in models {
            names.push(self.get_model(model)?.name().to_string());
        }
        for (_, assigned) in &mut self.solutions {
            assigned.retain(|m| !names.contains(m));
        }
        self.solutions.retain(|(_, assigned)| !assigned.is_empty());
        match self.solutions.iter_mut().find(|(s, _)| *s == solution) {
            Some((_, assigned)) => assigned.extend(names),
            None => self.solutions.push((solution, names)),
        }
        Ok(())
    }

    /// Solution group rows; without assignments one IMS solves every model
    fn solution_rows(&self) -> Result<Vec<Row>, ModelError> {
        if self.models.is_empty() {
            return Ok(Vec::new());
        }
        let groups: Vec<(&Package, Vec<String>)> = if self.solutions.is_empty() {
            let ims = self.get_package("ims")?;
            vec![(ims, self.models.iter().map(|m| m.name().to_string()).collect())]
        } else {
            let mut groups = Vec::new();
            for (solution, models) in &self.solutions {
                let package = self
                    .package_by_name(solution)
                    .ok_or_else(|| ModelError::PackageNotFound {
                        name: solution.clone(),
                    })?;
                groups.push((package, models.clone()));
            }
            for model in &self.models {
                if !self.solutions.iter().any(|(_, m)| m.iter().any(|n| n == model.name())) {
                    warn!("Model '{}' is not assigned to any solution", model.name());
                }
            }
            groups
        };
        Ok(groups
            .into_iter()
            .map(|(package, models)| {
                vec![
                    CellValue::Text(package.ftype().to_string()),
                    CellValue::Text(package.filename().unwrap_or_default().to_string()),
                    CellValue::Names(models),
                ]
            })
            .collect())
    }

    /// Simulation name file with TIMING, MODELS and SOLUTIONGROUP filled in
    pub fn name_file(&self) -> Result<Package, ModelError> {
        let mut nam = self.nam.clone();
        let tdis = self.get_package("tdis")?;
        nam.set("tdis6", tdis.filename().unwrap_or_default())
            .map_err(|e| ModelError::from_data(&self.nam, e))?;

        let models: Vec<Row> = self
            .models
            .iter()
            .map(|m| {
                vec![
                    CellValue::Text(m.model_type().to_uppercase()),
                    CellValue::Text(m.name_file_name()),
                    CellValue::Text(m.name().to_string()),
                ]
            })
            .collect();
        nam.set("models", models)
            .map_err(|e| ModelError::from_data(&self.nam, e))?;

        let solutions = self.solution_rows()?;
        if !solutions.is_empty() {
            nam.set_period("solutiongroup", 1, solutions)
                .map_err(|e| ModelError::from_data(&self.nam, e))?;
        }
        Ok(nam)
    }

    /// Render `mfsim.nam`, the simulation packages, then each model
    ///
    /// Nothing is returned unless every file renders.
    pub fn write_all(&self) -> Result<Vec<RenderedFile>, ModelError> {
        let nam = self.name_file()?;
        let mut files = vec![RenderedFile::new(
            SIM_NAME_FILE,
            nam.to_text(self, &self.config)
                .map_err(|e| ModelError::from_data(&nam, e))?,
        )];
        for package in &self.packages {
            let content = package
                .to_text(self, &self.config)
                .map_err(|e| ModelError::from_data(package, e))?;
            files.push(RenderedFile::new(
                package.filename().unwrap_or_default(),
                content,
            ));
        }
        for model in &self.models {
            files.extend(model.write_all(&self.config)?);
        }
        info!("Rendered simulation '{}' ({} files)", self.name, files.len());
        Ok(files)
    }
}

impl FileResolver for Simulation {
    fn resolve_filename(&self, package_name: &str) -> Option<String> {
        self.package_by_name(package_name)
            .and_then(|p| p.filename().map(String::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulation() -> Simulation {
        let generator = Arc::new(TemplateGenerator::builtin().unwrap());
        Simulation::new(generator, "sim").unwrap()
    }

    #[test]
    fn test_missing_tdis() {
        let sim = simulation();
        assert!(matches!(
            sim.name_file(),
            Err(ModelError::PackageNotFound { name }) if name == "tdis"
        ));
    }

    #[test]
    fn test_duplicate_model() {
        let mut sim = simulation();
        let model = sim.new_model("flow", "gwf6").unwrap();
        sim.add_model(model.clone()).unwrap();
        assert!(matches!(
            sim.add_model(model),
            Err(ModelError::DuplicateModel { .. })
        ));
    }

    #[test]
    fn test_assign_solution_moves_model() {
        let mut sim = simulation();
        for name in ["ims", "ims-2"] {
            let ims = sim.new_package("ims").unwrap().with_name(name);
            sim.add_package(ims).unwrap();
        }
        let model = sim.new_model("flow", "gwf6").unwrap();
        sim.add_model(model).unwrap();

        sim.assign_solution("ims", &["flow"]).unwrap();
        sim.assign_solution("ims-2", &["flow"]).unwrap();
        assert_eq!(sim.solutions, vec![("ims-2".to_string(), vec!["flow".to_string()])]);

        assert!(matches!(
            sim.assign_solution("ims", &["transport"]),
            Err(ModelError::ModelNotFound { .. })
        ));
    }
}
