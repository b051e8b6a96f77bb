//! Multi-key sort specification.

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// A single (field, direction) sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    /// Ascending sort key.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort key.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// An ordered list of sort keys.
///
/// The first key is the primary sort; later keys break ties left-to-right.
/// Key order is preserved exactly through compilation. An empty sort is an
/// identity transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Sort(pub Vec<SortKey>);

impl Sort {
    /// Empty sort specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an ascending key.
    pub fn asc(mut self, field: impl Into<String>) -> Self {
        self.0.push(SortKey::asc(field));
        self
    }

    /// Append a descending key.
    pub fn desc(mut self, field: impl Into<String>) -> Self {
        self.0.push(SortKey::desc(field));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }
}

impl From<Vec<SortKey>> for Sort {
    fn from(keys: Vec<SortKey>) -> Self {
        Self(keys)
    }
}
