//! Schema descriptors for field resolution and value coercion.
//!
//! A [`Schema`] is an explicit, build-once description of every record
//! shape the compiler may be asked about: the ordered field list with
//! declared types, and the mapping from logical shape name to physical
//! table name. Field lookups are resolved here, at compile time, so an
//! invalid field name fails deterministically with a suggestion instead
//! of being silently dropped.

use serde::{Deserialize, Serialize};
use strsim::levenshtein;

use crate::error::{QuarryError, QuarryResult};

/// Declared field types a value can coerce to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Decimal,
    Text,
    Uuid,
    Timestamp,
    Date,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FieldType::Bool => "Bool",
            FieldType::Int => "Int",
            FieldType::Float => "Float",
            FieldType::Decimal => "Decimal",
            FieldType::Text => "Text",
            FieldType::Uuid => "Uuid",
            FieldType::Timestamp => "Timestamp",
            FieldType::Date => "Date",
        };
        write!(f, "{}", s)
    }
}

/// A declared field with name and type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type", alias = "typ")]
    pub ty: FieldType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            primary_key: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// A record shape: logical name, physical table, ordered fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDef {
    /// Logical shape name used by specifications.
    pub name: String,
    /// Physical table/collection name handed to the store executor.
    pub table: String,
    /// Declared fields, in order.
    pub fields: Vec<FieldDef>,
}

impl ShapeDef {
    /// A shape whose physical table name equals its logical name.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        let name = name.into();
        Self {
            table: name.clone(),
            name,
            fields,
        }
    }

    /// Override the physical table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Resolve a field by name. Resolution is case-insensitive unless
    /// `exact_case` is set by the owning condition.
    pub fn resolve(&self, field: &str, exact_case: bool) -> Option<&FieldDef> {
        self.fields.iter().find(|f| {
            if exact_case {
                f.name == field
            } else {
                f.name.eq_ignore_ascii_case(field)
            }
        })
    }

    /// Fields forming the primary key, in declaration order.
    pub fn primary_key(&self) -> Vec<&FieldDef> {
        self.fields.iter().filter(|f| f.primary_key).collect()
    }

    /// Find the best near-miss for an unresolved field name.
    pub fn did_you_mean(&self, input: &str) -> Option<String> {
        let mut best_match = None;
        let mut min_dist = usize::MAX;

        for field in &self.fields {
            let dist = levenshtein(input, &field.name);

            // Threshold scales with input length so short names only
            // match precisely.
            let threshold = match input.len() {
                0..=2 => 0,
                3..=5 => 2,
                _ => 3,
            };

            if dist <= threshold && dist < min_dist {
                min_dist = dist;
                best_match = Some(field.name.clone());
            }
        }

        best_match
    }
}

/// Provides shape descriptors to the compiler.
///
/// The seam through which any schema source (static declarations, loaded
/// catalog metadata, test fixtures) feeds field resolution and coercion.
pub trait SchemaProvider {
    /// Look up a shape by logical name.
    fn shape(&self, name: &str) -> Option<&ShapeDef>;

    /// Look up a shape or fail with [`QuarryError::ShapeNotFound`].
    fn require_shape(&self, name: &str) -> QuarryResult<&ShapeDef> {
        self.shape(name)
            .ok_or_else(|| QuarryError::ShapeNotFound(name.to_string()))
    }
}

/// An in-memory schema: a list of shape declarations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub shapes: Vec<ShapeDef>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shape, fluently.
    pub fn with(mut self, shape: ShapeDef) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Load a schema from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl SchemaProvider for Schema {
    fn shape(&self, name: &str) -> Option<&ShapeDef> {
        self.shapes.iter().find(|s| s.name == name)
    }
}
