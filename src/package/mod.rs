//! Packages
//!
//! A [`Package`] is one instance of a catalog package definition: an
//! explicit map from field name to [`BoundData`], built once from the
//! catalog. Fields in repeating blocks (PERIOD) hold one value per stress
//! period. Every set re-validates the field; completeness, count links and
//! package rules are checked when the package is written.

mod block;

pub use block::Block;
pub use crate::data::{FileResolver, NoReferences};

use crate::config::SdkConfig;
use crate::data::tokenize::tokenize;
use crate::data::{BoundData, RenderContext};
use crate::data::parse::parse_error;
use crate::models::{CellValue, FieldKind, FieldValue, PackageDefinition, Row, SchemaPath};
use crate::template::{Template, TemplateGenerator};
use crate::validation::rules::{check_count, inline_rows};
use crate::validation::{BindContext, DataError, FieldRule, MemberOfRule};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
enum SlotData {
    Single(BoundData),
    Periodic(BTreeMap<u32, BoundData>),
}

#[derive(Debug, Clone)]
struct FieldSlot {
    block: String,
    template: Arc<Template>,
    data: SlotData,
}

impl FieldSlot {
    fn bound(&self, period: u32) -> Option<&BoundData> {
        match &self.data {
            SlotData::Single(bound) => Some(bound),
            SlotData::Periodic(periods) => periods.get(&period),
        }
    }

    fn all(&self) -> Vec<(Option<u32>, &BoundData)> {
        match &self.data {
            SlotData::Single(bound) => vec![(None, bound)],
            SlotData::Periodic(periods) => periods.iter().map(|(p, b)| (Some(*p), b)).collect(),
        }
    }

    fn clear(&mut self) {
        match &mut self.data {
            SlotData::Single(bound) => bound.clear(),
            SlotData::Periodic(periods) => periods.clear(),
        }
    }
}

/// File name held by a record item that refers to another package type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub field: String,
    /// Referenced package type, e.g. `utl/ts`
    pub target: String,
    pub filename: String,
}

/// One package instance: named, typed, bound fields
#[derive(Debug, Clone)]
pub struct Package {
    definition: Arc<PackageDefinition>,
    name: String,
    filename: Option<String>,
    ncelldim: usize,
    fields: Vec<FieldSlot>,
    index: HashMap<String, usize>,
    rules: Vec<Arc<dyn FieldRule>>,
}

impl Package {
    /// Empty package of a catalog type, named after its abbreviation
    pub fn new(generator: &TemplateGenerator, model_type: &str, abbr: &str) -> Result<Self, DataError> {
        let definition = generator.catalog().package(model_type, abbr)?;
        Self::from_definition(generator, definition)
    }

    pub fn from_definition(
        generator: &TemplateGenerator,
        definition: Arc<PackageDefinition>,
    ) -> Result<Self, DataError> {
        let mut fields = Vec::new();
        let mut index = HashMap::new();
        let mut rules: Vec<Arc<dyn FieldRule>> = Vec::new();

        for (block, field) in definition.fields() {
            let template = generator.generate(&field.path)?;
            let data = if block.repeating {
                SlotData::Periodic(BTreeMap::new())
            } else {
                SlotData::Single(BoundData::unset(template.clone()))
            };
            index.insert(field.name.clone(), fields.len());
            fields.push(FieldSlot {
                block: block.name.clone(),
                template,
                data,
            });
            if let Some(list) = &field.member_of {
                rules.push(Arc::new(MemberOfRule::new(&field.name, list)));
            }
        }

        Ok(Self {
            name: definition.abbr.clone(),
            definition,
            filename: None,
            ncelldim: 3,
            fields,
            index,
            rules,
        })
    }

    /// Package with initial values; `None` leaves a field unset
    ///
    /// Values are bound in declaration order, so option lists (auxiliary
    /// names) are known before the rows that depend on them.
    pub fn with_values<I, S>(
        generator: &TemplateGenerator,
        model_type: &str,
        abbr: &str,
        values: I,
    ) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = (S, Option<FieldValue>)>,
        S: AsRef<str>,
    {
        let mut package = Self::new(generator, model_type, abbr)?;
        let mut pending: HashMap<usize, Option<FieldValue>> = HashMap::new();
        for (name, value) in values {
            let name = name.as_ref();
            let idx = package.slot_index(name)?;
            if pending.insert(idx, value).is_some() {
                return Err(DataError::InvalidValue {
                    path: package.field_path(name),
                    reason: format!("field '{}' given more than once", name),
                });
            }
        }
        for idx in 0..package.fields.len() {
            if let Some(Some(value)) = pending.remove(&idx) {
                package.bind_slot(idx, 1, Some(value))?;
            }
        }
        Ok(package)
    }

    pub fn definition(&self) -> &Arc<PackageDefinition> {
        &self.definition
    }

    pub fn model_type(&self) -> &str {
        &self.definition.model_type
    }

    pub fn abbr(&self) -> &str {
        &self.definition.abbr
    }

    /// Name-file type token, e.g. `RCH6`
    pub fn ftype(&self) -> &str {
        &self.definition.ftype
    }

    /// Package type tag, e.g. `gwfrch`
    pub fn package_type(&self) -> String {
        self.definition.package_type()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into().to_lowercase();
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = Some(filename.into());
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.set_filename(filename);
        self
    }

    pub fn cell_dims(&self) -> usize {
        self.ncelldim
    }

    /// Change the cellid length; bound values must still validate
    pub fn set_cell_dims(&mut self, ncelldim: usize) -> Result<(), DataError> {
        let previous = self.ncelldim;
        self.ncelldim = ncelldim;
        let ctx = self.bind_context(None);
        for slot in &self.fields {
            for (_, bound) in slot.all() {
                if let Err(e) = bound.validate(&ctx) {
                    self.ncelldim = previous;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|s| s.template.name()).collect()
    }

    pub fn template(&self, name: &str) -> Option<&Arc<Template>> {
        self.index
            .get(&name.to_lowercase())
            .map(|&idx| &self.fields[idx].template)
    }

    /// Schema path of a field, or of the package when the field is unknown
    pub fn field_path(&self, name: &str) -> SchemaPath {
        match self.template(name) {
            Some(template) => template.path().clone(),
            None => SchemaPath::new([self.model_type(), self.abbr(), name]),
        }
    }

    pub(crate) fn package_path(&self) -> SchemaPath {
        SchemaPath::new([self.model_type(), self.abbr()])
    }

    fn slot_index(&self, name: &str) -> Result<usize, DataError> {
        self.index
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| DataError::SchemaNotFound {
                path: SchemaPath::new([self.model_type(), self.abbr(), name]),
            })
    }

    /// Bound data of a field (period 1 for repeating fields)
    pub fn bound(&self, name: &str) -> Option<&BoundData> {
        self.bound_in_period(name, 1)
    }

    pub fn bound_in_period(&self, name: &str, period: u32) -> Option<&BoundData> {
        let idx = self.index.get(&name.to_lowercase())?;
        self.fields[*idx].bound(period)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.bound(name).and_then(BoundData::get)
    }

    pub fn get_period(&self, name: &str, period: u32) -> Option<&FieldValue> {
        self.bound_in_period(name, period).and_then(BoundData::get)
    }

    /// Stress periods holding a value for a repeating field
    pub fn periods(&self, name: &str) -> Vec<u32> {
        match self.index.get(&name.to_lowercase()).map(|&idx| &self.fields[idx].data) {
            Some(SlotData::Periodic(periods)) => periods.keys().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// Set a field, addressing period 1 for repeating fields
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), DataError> {
        let idx = self.slot_index(name)?;
        self.bind_slot(idx, 1, Some(value.into()))
    }

    /// Set a repeating field for one stress period (1-based)
    pub fn set_period(
        &mut self,
        name: &str,
        period: u32,
        value: impl Into<FieldValue>,
    ) -> Result<(), DataError> {
        let idx = self.slot_index(name)?;
        if !matches!(self.fields[idx].data, SlotData::Periodic(_)) {
            return Err(DataError::InvalidValue {
                path: self.fields[idx].template.path().clone(),
                reason: "field is not in a repeating block".to_string(),
            });
        }
        self.bind_slot(idx, period, Some(value.into()))
    }

    /// Unset a field (every period of a repeating field)
    pub fn clear(&mut self, name: &str) -> Result<(), DataError> {
        let idx = self.slot_index(name)?;
        self.fields[idx].clear();
        Ok(())
    }

    pub fn clear_period(&mut self, name: &str, period: u32) -> Result<(), DataError> {
        let idx = self.slot_index(name)?;
        self.bind_slot(idx, period, None)
    }

    fn bind_slot(&mut self, idx: usize, period: u32, value: Option<FieldValue>) -> Result<(), DataError> {
        let ctx = self.bind_context(None);
        let slot = &mut self.fields[idx];
        match &mut slot.data {
            SlotData::Single(bound) => match value {
                Some(value) => bound.set(value, &ctx),
                None => {
                    bound.clear();
                    Ok(())
                }
            },
            SlotData::Periodic(periods) => {
                if period == 0 {
                    return Err(DataError::InvalidValue {
                        path: slot.template.path().clone(),
                        reason: "stress periods are numbered from 1".to_string(),
                    });
                }
                match value {
                    Some(value) => {
                        let bound = BoundData::bind(slot.template.clone(), Some(value), &ctx)?;
                        periods.insert(period, bound);
                    }
                    None => {
                        periods.remove(&period);
                    }
                }
                Ok(())
            }
        }
    }

    /// Register a rule checked every time the package is written
    pub fn add_rule(&mut self, rule: impl FieldRule + 'static) {
        self.rules.push(Arc::new(rule));
    }

    pub fn keyword(&self, name: &str) -> bool {
        matches!(self.get(name), Some(FieldValue::Keyword(true)))
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_cell()?.as_i64()
    }

    pub fn double(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_cell()?.as_f64()
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.get(name)?.as_cell()? {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Values of a list field as text, empty when unset
    pub fn strings(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(FieldValue::List(cells)) => cells
                .iter()
                .filter_map(|c| c.as_str().map(String::from))
                .collect(),
            Some(FieldValue::Scalar(cell)) => cell.as_str().map(String::from).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn rows(&self, name: &str) -> Option<&[Row]> {
        self.get(name)?.as_rows()
    }

    pub fn rows_in_period(&self, name: &str, period: u32) -> Option<&[Row]> {
        self.get_period(name, period)?.as_rows()
    }

    /// Context for checking values against this package's current state
    pub fn bind_context(&self, resolver: Option<&dyn FileResolver>) -> BindContext {
        let mut ctx = BindContext::new(self.ncelldim);
        for slot in &self.fields {
            let schema = slot.template.schema();
            let SlotData::Single(bound) = &slot.data else {
                continue;
            };
            match bound.get() {
                Some(FieldValue::List(cells)) if schema.kind == FieldKind::String => {
                    ctx.lists.insert(
                        schema.name.clone(),
                        cells.iter().filter_map(|c| c.as_str().map(String::from)).collect(),
                    );
                }
                Some(FieldValue::Scalar(CellValue::Integer(n))) if *n >= 0 => {
                    ctx.dims.insert(schema.name.clone(), *n as usize);
                }
                _ => {}
            }
        }
        if let Some(resolver) = resolver {
            for slot in &self.fields {
                for dim in slot.template.schema().dims() {
                    if !ctx.dims.contains_key(dim)
                        && let Some(size) = resolver.dimension(dim)
                    {
                        ctx.dims.insert(dim.clone(), size);
                    }
                }
            }
        }
        ctx
    }

    /// Write-time validation: structure against the final state,
    /// completeness, count links and package rules
    pub fn validate(&self, resolver: &dyn FileResolver) -> Result<(), DataError> {
        let ctx = self.bind_context(Some(resolver));
        for slot in &self.fields {
            match &slot.data {
                SlotData::Single(bound) => {
                    bound.validate(&ctx)?;
                    bound.check_required()?;
                }
                SlotData::Periodic(periods) => {
                    for bound in periods.values() {
                        bound.validate(&ctx)?;
                    }
                    if !slot.template.is_optional() && !periods.values().any(BoundData::is_set) {
                        return Err(DataError::RequiredFieldMissing {
                            path: slot.template.path().clone(),
                        });
                    }
                }
            }
        }
        self.check_counts()?;
        self.warn_unbacked_time_series();
        for rule in &self.rules {
            rule.check(self)?;
        }
        Ok(())
    }

    fn check_counts(&self) -> Result<(), DataError> {
        for slot in &self.fields {
            let schema = slot.template.schema();
            let Some(link) = &schema.count else {
                continue;
            };
            let Some(count) = self.integer(&schema.name) else {
                continue;
            };
            let Some(&target) = self.index.get(&link.field) else {
                continue;
            };
            for (period, bound) in self.fields[target].all() {
                if let Some(rows) = bound.get().and_then(inline_rows) {
                    check_count(slot.template.path(), count, link.rule, rows, period)?;
                }
            }
        }
        Ok(())
    }

    fn warn_unbacked_time_series(&self) {
        let uses_series = self.fields.iter().any(|slot| {
            slot.all()
                .iter()
                .any(|(_, bound)| bound.get().is_some_and(holds_time_series))
        });
        if !uses_series {
            return;
        }
        let has_series_file = self.fields.iter().any(|slot| {
            slot.template
                .columns()
                .iter()
                .any(|c| c.file_reference.as_deref() == Some("utl/ts"))
                && slot.all().iter().any(|(_, b)| b.is_set())
        });
        if !has_series_file {
            warn!(
                "Package '{}' uses time-series names but declares no time-series file",
                self.name
            );
        }
    }

    /// Render every block in file order; nothing is returned on failure
    pub fn write_blocks(
        &self,
        resolver: &dyn FileResolver,
        config: &SdkConfig,
    ) -> Result<Vec<Block>, DataError> {
        self.validate(resolver)?;
        let ctx = RenderContext::new(config, resolver);
        let mut blocks = Vec::new();

        for block in &self.definition.blocks {
            let slots: Vec<&FieldSlot> = self.fields.iter().filter(|s| s.block == block.name).collect();
            if block.repeating {
                let periods: BTreeSet<u32> = slots
                    .iter()
                    .flat_map(|s| s.all().into_iter().filter_map(|(p, _)| p))
                    .collect();
                for period in periods {
                    let mut lines = Vec::new();
                    for slot in &slots {
                        if let Some(bound) = slot.bound(period) {
                            lines.extend(bound.serialize(&ctx)?);
                        }
                    }
                    if !lines.is_empty() {
                        blocks.push(Block::new(block.name.clone(), Some(period), lines));
                    }
                }
            } else {
                let mut lines = Vec::new();
                for slot in &slots {
                    if let SlotData::Single(bound) = &slot.data {
                        lines.extend(bound.serialize(&ctx)?);
                    }
                }
                if !lines.is_empty() {
                    blocks.push(Block::new(block.name.clone(), None, lines));
                }
            }
        }

        debug!("Rendered {} blocks for package '{}'", blocks.len(), self.name);
        Ok(blocks)
    }

    /// Render the whole package file
    pub fn to_text(&self, resolver: &dyn FileResolver, config: &SdkConfig) -> Result<String, DataError> {
        let blocks = self.write_blocks(resolver, config)?;
        let mut out = String::new();
        if config.write_header {
            out.push_str(&format!(
                "# File generated by {} version {} on {}\n\n",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                chrono::Local::now().format("%m/%d/%Y %H:%M:%S")
            ));
        }
        let rendered: Vec<String> = blocks.iter().map(Block::render).collect();
        out.push_str(&rendered.join("\n"));
        Ok(out)
    }

    /// Replace every field with the content of a package file
    ///
    /// Blocks are applied in file order against a staged copy; the package
    /// is only changed when the whole file reads cleanly.
    pub fn load_text(&mut self, text: &str) -> Result<(), DataError> {
        let path = self.package_path();
        let raw_blocks = block::split_blocks(&path, text)?;

        let mut staged = self.clone();
        for slot in &mut staged.fields {
            slot.clear();
        }

        for raw in &raw_blocks {
            let Some(definition) = self.definition.block(&raw.name) else {
                return Err(parse_error(&path, raw.line, &format!("unknown block '{}'", raw.name)));
            };
            let period = match (definition.repeating, raw.index) {
                (true, Some(index)) if index > 0 => index,
                (true, _) => {
                    return Err(parse_error(&path, raw.line, "repeating block needs a period number"));
                }
                (false, _) => 1,
            };
            for (idx, lines) in staged.group_lines(&path, &definition.name, &raw.lines)? {
                let ctx = staged.bind_context(None);
                let slot = &mut staged.fields[idx];
                match &mut slot.data {
                    SlotData::Single(bound) => bound.deserialize_lines(&lines, &ctx)?,
                    SlotData::Periodic(periods) => {
                        let mut bound = BoundData::unset(slot.template.clone());
                        bound.deserialize_lines(&lines, &ctx)?;
                        periods.insert(period, bound);
                    }
                }
            }
        }

        *self = staged;
        Ok(())
    }

    /// Assign the lines of one block to its fields
    ///
    /// Lines starting with a field tag belong to that field; array data
    /// continues until the next tag; anything else is a recarray row.
    fn group_lines(
        &self,
        path: &SchemaPath,
        block: &str,
        lines: &[(usize, String)],
    ) -> Result<Vec<(usize, Vec<(usize, String)>)>, DataError> {
        let mut tags: HashMap<String, usize> = HashMap::new();
        let mut recarray = None;
        for (idx, slot) in self.fields.iter().enumerate().filter(|(_, s)| s.block == block) {
            if slot.template.kind() == FieldKind::Recarray {
                recarray = Some(idx);
            } else {
                tags.insert(slot.template.schema().tag(), idx);
            }
        }

        let mut groups: Vec<(usize, Vec<(usize, String)>)> = Vec::new();
        let mut seen_arrays: BTreeSet<usize> = BTreeSet::new();
        let mut current_array: Option<usize> = None;
        let mut push = |idx: usize, line: (usize, String)| match groups.iter_mut().find(|(i, _)| *i == idx) {
            Some((_, group)) => group.push(line),
            None => groups.push((idx, vec![line])),
        };

        for (no, line) in lines {
            let tokens = tokenize(line);
            let Some(first) = tokens.first() else {
                continue;
            };
            if let Some(&idx) = tags.get(&first.to_uppercase()) {
                if self.fields[idx].template.kind() == FieldKind::Array {
                    if !seen_arrays.insert(idx) {
                        return Err(parse_error(path, *no, "array appears more than once"));
                    }
                    current_array = Some(idx);
                } else {
                    current_array = None;
                }
                push(idx, (*no, line.clone()));
            } else if let Some(idx) = current_array {
                push(idx, (*no, line.clone()));
            } else if let Some(idx) = recarray {
                push(idx, (*no, line.clone()));
            } else {
                return Err(parse_error(
                    path,
                    *no,
                    &format!("unrecognized line in block '{}': {}", block, line.trim()),
                ));
            }
        }
        Ok(groups)
    }

    /// Names of packages referenced through `PackageRef` cells
    pub fn references(&self) -> Vec<String> {
        let mut names = Vec::new();
        for slot in &self.fields {
            for (_, bound) in slot.all() {
                let cells: Vec<&CellValue> = match bound.get() {
                    Some(FieldValue::Scalar(cell)) => vec![cell],
                    Some(FieldValue::List(cells)) | Some(FieldValue::Record(cells)) => cells.iter().collect(),
                    Some(FieldValue::Recarray(rows)) => rows.iter().flatten().collect(),
                    _ => Vec::new(),
                };
                for cell in cells {
                    if let CellValue::PackageRef(name) = cell
                        && !names.contains(name)
                    {
                        names.push(name.clone());
                    }
                }
            }
        }
        names
    }

    /// File names held by record items that refer to another package type
    pub fn file_references(&self) -> Vec<FileReference> {
        let mut refs = Vec::new();
        for slot in &self.fields {
            let Some(FieldValue::Record(cells)) = slot.bound(1).and_then(BoundData::get) else {
                continue;
            };
            for (column, cell) in slot.template.columns().iter().zip(cells) {
                if let (Some(target), CellValue::Text(filename)) = (&column.file_reference, cell) {
                    refs.push(FileReference {
                        field: slot.template.name().to_string(),
                        target: target.clone(),
                        filename: filename.clone(),
                    });
                }
            }
        }
        refs
    }

    /// Point a file-reference record at another package by name
    pub fn link_reference(&mut self, field: &str, package_name: &str) -> Result<(), DataError> {
        let idx = self.slot_index(field)?;
        let template = self.fields[idx].template.clone();
        let Some(FieldValue::Record(cells)) = self.fields[idx].bound(1).and_then(BoundData::get) else {
            return Err(DataError::InvalidValue {
                path: template.path().clone(),
                reason: "field holds no file record".to_string(),
            });
        };
        let mut linked = false;
        let cells: Vec<CellValue> = template
            .columns()
            .iter()
            .zip(cells)
            .map(|(column, cell)| {
                if column.file_reference.is_some() {
                    linked = true;
                    CellValue::PackageRef(package_name.to_lowercase())
                } else {
                    cell.clone()
                }
            })
            .collect();
        if !linked {
            return Err(DataError::InvalidValue {
                path: template.path().clone(),
                reason: "record has no file reference item".to_string(),
            });
        }
        self.bind_slot(idx, 1, Some(FieldValue::Record(cells)))
    }
}

fn holds_time_series(value: &FieldValue) -> bool {
    match value {
        FieldValue::Scalar(cell) => matches!(cell, CellValue::TimeSeries(_)),
        FieldValue::List(cells) | FieldValue::Record(cells) => {
            cells.iter().any(|c| matches!(c, CellValue::TimeSeries(_)))
        }
        FieldValue::Recarray(rows) => rows
            .iter()
            .flatten()
            .any(|c| matches!(c, CellValue::TimeSeries(_))),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn generator() -> TemplateGenerator {
        TemplateGenerator::builtin().unwrap()
    }

    #[test]
    fn test_unknown_field() {
        let generator = generator();
        let mut package = Package::new(&generator, "gwf6", "rch").unwrap();
        assert!(matches!(
            package.set("no_such_field", true),
            Err(DataError::SchemaNotFound { .. })
        ));
    }

    #[test]
    fn test_period_zero_rejected() {
        let generator = generator();
        let mut package = Package::new(&generator, "gwf6", "rch").unwrap();
        let result = package.set_period("periodrecarray", 0, vec![row![(1, 1, 1), 0.1, None::<&str>]]);
        assert!(matches!(result, Err(DataError::InvalidValue { .. })));
        assert!(package.set_period("maxbound", 2, 3i64).is_err());
    }

    #[test]
    fn test_aux_declared_after_rows_fails_at_write() {
        let generator = generator();
        let mut package = Package::new(&generator, "gwf6", "rch").unwrap();
        package.set("maxbound", 1i64).unwrap();
        package
            .set("periodrecarray", vec![row![(1, 1, 1), 0.1, None::<&str>]])
            .unwrap();
        package.set("auxiliary", FieldValue::list(["mult"])).unwrap();
        let result = package.write_blocks(&NoReferences, &SdkConfig::default());
        assert!(matches!(result, Err(DataError::RowArityMismatch { expected: 4, actual: 3, .. })));
    }

    #[test]
    fn test_member_of_rule() {
        let generator = generator();
        let mut package = Package::new(&generator, "gwf6", "rch").unwrap();
        package.set("maxbound", 1i64).unwrap();
        package.set("auxiliary", FieldValue::list(["mult"])).unwrap();
        package.set("auxmultname", "other").unwrap();
        let result = package.write_blocks(&NoReferences, &SdkConfig::default());
        assert!(matches!(result, Err(DataError::RuleViolation { .. })));

        package.set("auxmultname", "MULT").unwrap();
        assert!(package.write_blocks(&NoReferences, &SdkConfig::default()).is_ok());
    }

    #[test]
    fn test_load_text_duplicate_scalar() {
        let generator = generator();
        let mut package = Package::new(&generator, "gwf6", "rch").unwrap();
        let text = "BEGIN dimensions\n  MAXBOUND 1\n  MAXBOUND 2\nEND dimensions\n";
        assert!(matches!(
            package.load_text(text),
            Err(DataError::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_failed_load_leaves_package_unchanged() {
        let generator = generator();
        let mut package = Package::new(&generator, "gwf6", "rch").unwrap();
        package.set("maxbound", 5i64).unwrap();
        let text = "BEGIN dimensions\n  MAXBOUND 1\nEND dimensions\nBEGIN period 1\n  1 1 0.1\nEND period 1\n";
        assert!(package.load_text(text).is_err());
        assert_eq!(package.integer("maxbound"), Some(5));
    }

    #[test]
    fn test_link_reference() {
        let generator = generator();
        let mut package = Package::new(&generator, "gwf6", "rch").unwrap();
        package.set("ts_filerecord", FieldValue::record(["rch.ts"])).unwrap();
        assert_eq!(
            package.file_references(),
            vec![FileReference {
                field: "ts_filerecord".to_string(),
                target: "utl/ts".to_string(),
                filename: "rch.ts".to_string(),
            }]
        );
        package.link_reference("ts_filerecord", "rch_ts").unwrap();
        assert_eq!(package.references(), vec!["rch_ts".to_string()]);
        assert!(package.file_references().is_empty());
    }
}
