//! Template generator
//!
//! A [`Template`] is the empty, correctly shaped blueprint of one declared
//! field: a single slot for keywords and scalars, named slots for records,
//! column definitions for recarrays and a dimension descriptor for arrays.
//! Templates hold no user data and are shared behind `Arc` between every
//! package instance of the same type.

mod generator;

pub use generator::TemplateGenerator;

use crate::models::schema::{FieldSchema, ItemSchema};
use crate::models::{FieldKind, SchemaPath, Shape};
use crate::validation::BindContext;
use std::sync::Arc;

/// One value slot of a template: a scalar, a record item or a recarray column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub kind: FieldKind,
    pub shape: Shape,
    pub optional: bool,
    pub time_series: bool,
    pub file_reference: Option<String>,
}

impl ColumnDef {
    /// Slot holding the value of a scalar field (or one element of an array)
    pub fn for_field(schema: &FieldSchema) -> Self {
        let kind = match schema.kind {
            FieldKind::Array => schema.element_kind(),
            kind => kind,
        };
        let shape = match schema.shape {
            Shape::OneOrMore => Shape::OneOrMore,
            _ => Shape::Scalar,
        };
        Self {
            name: schema.name.clone(),
            kind,
            shape,
            optional: schema.optional,
            time_series: schema.time_series,
            file_reference: None,
        }
    }

    pub fn for_item(item: &ItemSchema) -> Self {
        Self {
            name: item.name.clone(),
            kind: item.kind,
            shape: item.shape.clone(),
            optional: item.optional,
            time_series: item.time_series,
            file_reference: item.file_reference.clone(),
        }
    }

    pub fn is_keyword(&self) -> bool {
        self.kind == FieldKind::Keyword
    }
}

/// Structural layout of a template
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateLayout {
    /// Keyword, string, integer or double: one empty slot
    Slot(ColumnDef),
    /// Named slots in output order, optional ones included
    Record { slots: Vec<ColumnDef> },
    /// Column definitions, zero rows
    Recarray { columns: Vec<ColumnDef> },
    /// Dimension names (fastest varying first) and element slot
    Array { dims: Vec<String>, element: ColumnDef },
}

/// Empty blueprint of one declared field
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    schema: Arc<FieldSchema>,
    layout: TemplateLayout,
}

impl Template {
    pub fn from_schema(schema: Arc<FieldSchema>) -> Self {
        let layout = match schema.kind {
            FieldKind::Keyword | FieldKind::String | FieldKind::Integer | FieldKind::Double => {
                TemplateLayout::Slot(ColumnDef::for_field(&schema))
            }
            FieldKind::Record => TemplateLayout::Record {
                slots: schema.items.iter().map(ColumnDef::for_item).collect(),
            },
            FieldKind::Recarray => TemplateLayout::Recarray {
                columns: schema.items.iter().map(ColumnDef::for_item).collect(),
            },
            FieldKind::Array => TemplateLayout::Array {
                dims: schema.dims().to_vec(),
                element: ColumnDef::for_field(&schema),
            },
        };
        Self { schema, layout }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn path(&self) -> &SchemaPath {
        &self.schema.path
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn kind(&self) -> FieldKind {
        self.schema.kind
    }

    pub fn layout(&self) -> &TemplateLayout {
        &self.layout
    }

    pub fn is_optional(&self) -> bool {
        self.schema.optional
    }

    /// Declared slots or columns, before any expansion
    pub fn columns(&self) -> &[ColumnDef] {
        match &self.layout {
            TemplateLayout::Slot(slot) => std::slice::from_ref(slot),
            TemplateLayout::Record { slots } => slots,
            TemplateLayout::Recarray { columns } => columns,
            TemplateLayout::Array { element, .. } => std::slice::from_ref(element),
        }
    }

    /// Columns a recarray row must supply under the given context
    ///
    /// `expand:<list>` columns become one column per declared name. When the
    /// package declares auxiliary names and a cellid-keyed recarray has no
    /// expand column, the auxiliary columns follow the base columns.
    pub fn active_columns(&self, ctx: &BindContext) -> Vec<ColumnDef> {
        let columns = self.columns();
        let mut active = Vec::with_capacity(columns.len());
        let mut expanded = false;

        for column in columns {
            match &column.shape {
                Shape::Expand(list) => {
                    expanded = true;
                    active.extend(ctx.list(list).iter().map(|name| ColumnDef {
                        name: name.clone(),
                        shape: Shape::Scalar,
                        ..column.clone()
                    }));
                }
                _ => active.push(column.clone()),
            }
        }

        if !expanded
            && matches!(self.layout, TemplateLayout::Recarray { .. })
            && columns.iter().any(|c| c.shape == Shape::CellId)
        {
            active.extend(ctx.list("auxiliary").iter().map(|name| ColumnDef {
                name: name.clone(),
                kind: FieldKind::Double,
                shape: Shape::Scalar,
                optional: false,
                time_series: true,
                file_reference: None,
            }));
        }
        active
    }
}
