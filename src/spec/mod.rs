//! Declarative query specifications.
//!
//! The types in this module are immutable value objects: freely cloned,
//! serialized, shared across threads, and usable as plan-cache keys. They
//! carry no evaluation semantics; the [`crate::compile`] module translates
//! them into engine-neutral compiled queries.

pub mod builders;
pub mod column;
pub mod condition;
pub mod page;
pub mod query;
pub mod sort;
pub mod value;

pub use column::ColumnRef;
pub use condition::{Combinator, Condition, Operator};
pub use page::Page;
pub use query::QuerySpec;
pub use sort::{Sort, SortDirection, SortKey};
pub use value::Value;
