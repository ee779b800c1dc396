//! A single model (e.g. GWF6) and its packages

use super::RenderedFile;
use super::error::{ModelError, find_by_abbr, index_by_abbr};
use crate::config::SdkConfig;
use crate::data::FileResolver;
use crate::models::{GridKind, Row};
use crate::package::Package;
use crate::row;
use crate::template::TemplateGenerator;
use std::sync::Arc;
use tracing::{debug, info};

/// Model packages in insertion order, plus the model name file
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    model_type: String,
    grid: GridKind,
    generator: Arc<TemplateGenerator>,
    nam: Package,
    packages: Vec<Package>,
}

impl Model {
    /// Empty model with a structured grid; its name file is `<name>.nam`
    pub fn new(
        generator: Arc<TemplateGenerator>,
        name: &str,
        model_type: &str,
    ) -> Result<Self, ModelError> {
        let name = name.to_lowercase();
        let model_type = model_type.to_lowercase();
        let nam = Package::new(&generator, &model_type, "nam")
            .map_err(|source| ModelError::Package {
                package: "nam".to_string(),
                source,
            })?
            .with_filename(format!("{}.nam", name));
        Ok(Self {
            name,
            model_type,
            grid: GridKind::default(),
            generator,
            nam,
            packages: Vec::new(),
        })
    }

    pub fn with_grid(mut self, grid: GridKind) -> Result<Self, ModelError> {
        self.set_grid(grid)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model type, e.g. `gwf6`
    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    pub fn grid(&self) -> GridKind {
        self.grid
    }

    /// Change the grid kind; every package must still hold valid cell ids
    pub fn set_grid(&mut self, grid: GridKind) -> Result<(), ModelError> {
        let previous = self.grid.cell_dims();
        for idx in 0..self.packages.len() {
            if let Err(e) = self.packages[idx].set_cell_dims(grid.cell_dims()) {
                for package in &mut self.packages[..idx] {
                    let _ = package.set_cell_dims(previous);
                }
                return Err(ModelError::from_data(&self.packages[idx], e));
            }
        }
        self.grid = grid;
        Ok(())
    }

    pub fn generator(&self) -> &Arc<TemplateGenerator> {
        &self.generator
    }

    /// Options of the model name file; the PACKAGES block is generated
    pub fn nam(&self) -> &Package {
        &self.nam
    }

    pub fn nam_mut(&mut self) -> &mut Package {
        &mut self.nam
    }

    pub fn name_file_name(&self) -> String {
        self.nam
            .filename()
            .map(String::from)
            .unwrap_or_else(|| format!("{}.nam", self.name))
    }

    /// Empty package of this model's type, ready to be filled and added
    pub fn new_package(&self, abbr: &str) -> Result<Package, ModelError> {
        let mut package = Package::new(&self.generator, &self.model_type, abbr).map_err(|source| {
            ModelError::Package {
                package: abbr.to_lowercase(),
                source,
            }
        })?;
        package
            .set_cell_dims(self.grid.cell_dims())
            .map_err(|e| ModelError::from_data(&package, e))?;
        Ok(package)
    }

    /// Add a package of this model's type (or a utility package)
    ///
    /// Names are unique within the model. Only multi-package types may
    /// appear more than once. A discretization package sets the grid kind.
    pub fn add_package(&mut self, mut package: Package) -> Result<&mut Package, ModelError> {
        let model_type = package.model_type().to_string();
        if package.abbr() == "nam" || (model_type != self.model_type && model_type != "utl") {
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

        if let Some(grid) = GridKind::from_dis_abbr(package.abbr())
            && grid != self.grid
        {
            self.set_grid(grid)?;
        }
        package
            .set_cell_dims(self.grid.cell_dims())
            .map_err(|e| ModelError::from_data(&package, e))?;
        if package.filename().is_none() {
            let filename = if package.name() == package.abbr() {
                format!("{}.{}", self.name, package.abbr())
            } else {
                format!("{}_{}.{}", self.name, package.name(), package.abbr())
            };
            package.set_filename(filename);
        }

        debug!(
            "Added package '{}' ({}) to model '{}'",
            package.name(),
            package.package_type(),
            self.name
        );
        let idx = self.packages.len();
        self.packages.push(package);
        Ok(&mut self.packages[idx])
    }

    /// The one package with this abbreviation
    pub fn get_package(&self, abbr: &str) -> Result<&Package, ModelError> {
        find_by_abbr(&self.packages, abbr)
    }

    pub fn get_package_mut(&mut self, abbr: &str) -> Result<&mut Package, ModelError> {
        let idx = index_by_abbr(&self.packages, abbr)?;
        Ok(&mut self.packages[idx])
    }

    /// Package with this abbreviation and name
    pub fn get_package_named(&self, abbr: &str, name: &str) -> Result<&Package, ModelError> {
        self.packages
            .iter()
            .find(|p| p.abbr().eq_ignore_ascii_case(abbr) && p.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ModelError::PackageNotFound {
                name: name.to_lowercase(),
            })
    }

    pub fn package_by_name(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn package_by_name_mut(&mut self, name: &str) -> Option<&mut Package> {
        self.packages
            .iter_mut()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn remove_package(&mut self, name: &str) -> Result<Package, ModelError> {
        let idx = self
            .packages
            .iter()
            .position(|p| p.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ModelError::PackageNotFound {
                name: name.to_lowercase(),
            })?;
        Ok(self.packages.remove(idx))
    }

    /// Packages in insertion order
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Name file with one PACKAGES row per model package
    ///
    /// Utility packages (time series) are reached through their parent
    /// package and are not listed.
    pub fn name_file(&self) -> Result<Package, ModelError> {
        let mut nam = self.nam.clone();
        let rows: Vec<Row> = self
            .packages
            .iter()
            .filter(|p| p.model_type() != "utl")
            .map(|p| row![p.ftype(), p.filename().unwrap_or_default(), p.name()])
            .collect();
        nam.set("packages", rows)
            .map_err(|e| ModelError::from_data(&self.nam, e))?;
        Ok(nam)
    }

    /// Render the name file, then every package in insertion order
    ///
    /// Nothing is returned unless every file renders.
    pub fn write_all(&self, config: &SdkConfig) -> Result<Vec<RenderedFile>, ModelError> {
        let nam = self.name_file()?;
        let mut files = vec![RenderedFile::new(
            self.name_file_name(),
            nam.to_text(self, config)
                .map_err(|e| ModelError::from_data(&nam, e))?,
        )];
        for package in &self.packages {
            let content = package
                .to_text(self, config)
                .map_err(|e| ModelError::from_data(package, e))?;
            files.push(RenderedFile::new(
                package.filename().unwrap_or_default(),
                content,
            ));
        }
        info!("Rendered model '{}' ({} files)", self.name, files.len());
        Ok(files)
    }

    fn dis_dimension(&self, name: &str) -> Option<usize> {
        let dis = self
            .packages
            .iter()
            .find(|p| GridKind::from_dis_abbr(p.abbr()).is_some())?;
        let get = |n: &str| dis.integer(n).and_then(|v| usize::try_from(v).ok());
        match (name, self.grid) {
            ("ncpl", GridKind::Structured) => Some(get("nrow")? * get("ncol")?),
            ("nodes", GridKind::Structured) => Some(get("nlay")? * get("nrow")? * get("ncol")?),
            ("nodes", GridKind::Vertex) => Some(get("nlay")? * get("ncpl")?),
            _ => get(name),
        }
    }
}

impl FileResolver for Model {
    fn resolve_filename(&self, package_name: &str) -> Option<String> {
        self.package_by_name(package_name)
            .and_then(|p| p.filename().map(String::from))
    }

    fn dimension(&self, name: &str) -> Option<usize> {
        self.dis_dimension(&name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    fn model() -> Model {
        let generator = Arc::new(TemplateGenerator::builtin().unwrap());
        Model::new(generator, "flow", "gwf6").unwrap()
    }

    #[test]
    fn test_default_filename() {
        let mut model = model();
        let rch = model.new_package("rch").unwrap();
        let added = model.add_package(rch).unwrap();
        assert_eq!(added.filename(), Some("flow.rch"));

        let chd = model.new_package("chd").unwrap().with_name("chd-2");
        let added = model.add_package(chd).unwrap();
        assert_eq!(added.filename(), Some("flow_chd-2.chd"));
    }

    #[test]
    fn test_single_package_type_added_twice() {
        let mut model = model();
        let first = model.new_package("rch").unwrap();
        model.add_package(first).unwrap();
        let second = model.new_package("rch").unwrap().with_name("rch-2");
        assert!(matches!(
            model.add_package(second),
            Err(ModelError::DuplicatePackage { .. })
        ));
    }

    #[test]
    fn test_sim_package_rejected() {
        let mut model = model();
        let tdis = Package::new(model.generator(), "sim", "tdis").unwrap();
        assert!(matches!(
            model.add_package(tdis),
            Err(ModelError::IncompatiblePackage { .. })
        ));
    }

    #[test]
    fn test_dimensions_from_dis() {
        let mut model = model();
        let mut dis = model.new_package("dis").unwrap();
        dis.set("nlay", 2i64).unwrap();
        dis.set("nrow", 3i64).unwrap();
        dis.set("ncol", 4i64).unwrap();
        model.add_package(dis).unwrap();

        assert_eq!(model.dimension("NCOL"), Some(4));
        assert_eq!(model.dimension("ncpl"), Some(12));
        assert_eq!(model.dimension("nodes"), Some(24));
    }

    #[test]
    fn test_name_file_lists_packages() {
        let mut model = model();
        let mut rch = model.new_package("rch").unwrap();
        rch.set("maxbound", 1i64).unwrap();
        model.add_package(rch).unwrap();
        let ts = Package::new(model.generator(), "utl", "ts")
            .unwrap()
            .with_name("rch_ts");
        model.add_package(ts).unwrap();

        let nam = model.name_file().unwrap();
        assert_eq!(
            nam.get("packages"),
            Some(&FieldValue::Recarray(vec![row!["RCH6", "flow.rch", "rch"]]))
        );
    }
}
