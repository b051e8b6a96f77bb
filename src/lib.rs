//! # Quarry — storage-agnostic query specifications
//!
//! Build queries as data, compile them once, run them anywhere.
//!
//! A [`spec::QuerySpec`] is an immutable value describing *what* to
//! fetch: a condition tree, a multi-key sort, a page window, and an
//! optional projection. [`compile::compile`] turns it into an
//! engine-neutral [`compile::CompiledQuery`] against a declared
//! [`schema::Schema`], and an [`exec::StoreExecutor`] turns that plan
//! into rows.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use quarry::prelude::*;
//!
//! let spec = QuerySpec::on("books")
//!     .filter(eq("available", true).and(starts_with("name", "Al")))
//!     .sort(Sort::new().asc("id"))
//!     .page(Page::first(5)?);
//!
//! let plan = compile(&spec, &schema)?;
//! let rows = store.fetch(&plan)?;
//! ```

pub mod compile;
pub mod error;
pub mod exec;
pub mod schema;
pub mod spec;

pub mod prelude {
    pub use crate::compile::{CompiledQuery, compile};
    pub use crate::error::{QuarryError, QuarryResult};
    pub use crate::exec::{Entity, MemoryStore, Record, Repository, StoreExecutor, UnitOfWork};
    pub use crate::schema::{FieldDef, FieldType, Schema, SchemaProvider, ShapeDef};
    pub use crate::spec::builders::*;
    pub use crate::spec::{
        ColumnRef, Combinator, Condition, Operator, Page, QuerySpec, Sort, SortDirection, SortKey,
        Value,
    };
}
