//! The aggregate query specification.

use serde::{Deserialize, Serialize};

use super::column::ColumnRef;
use super::condition::Condition;
use super::page::Page;
use super::sort::Sort;

/// A complete declarative query over one record shape.
///
/// Aggregates an optional projection, filter tree, sort specification and
/// page window. A `QuerySpec` is a pure value: builders take `self` by
/// move and return the modified value, so shared specifications are never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// The record shape this query runs against.
    pub shape: String,
    /// Explicit column projection; `None` means all declared fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Vec<ColumnRef>>,
    /// Filter tree; `None` selects everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Condition>,
    /// Sort specification; `None` or empty is identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    /// Page window; `None` means all rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<Page>,
}

impl QuerySpec {
    /// Start a specification for the given record shape.
    pub fn on(shape: impl Into<String>) -> Self {
        Self {
            shape: shape.into(),
            projection: None,
            filter: None,
            sort: None,
            page: None,
        }
    }

    /// Project the given columns instead of all declared fields.
    pub fn select<C: Into<ColumnRef>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.projection = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the filter tree.
    pub fn filter(mut self, condition: Condition) -> Self {
        self.filter = Some(condition);
        self
    }

    /// Set the sort specification.
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the page window.
    pub fn page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}
