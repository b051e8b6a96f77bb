//! Execution facade: binds compiled queries to an abstract store.
//!
//! The [`StoreExecutor`] trait is the seam where a SQL engine, an ORM or
//! an in-memory store plugs in; [`Repository`] is the typed facade on top
//! of it. Committing and rolling back belong to the externally-owned
//! [`UnitOfWork`] collaborator — the facade never commits on its own.

pub mod memory;
pub mod repository;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::compile::{CompiledQuery, Predicate};
use crate::error::QuarryResult;

pub use memory::MemoryStore;
pub use repository::Repository;

/// A raw result row: field name to JSON-typed value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A domain record type bound to a schema shape.
pub trait Entity: Serialize + DeserializeOwned {
    /// Logical shape name this entity maps to.
    const SHAPE: &'static str;
}

/// Executes compiled queries against a real backing store.
///
/// Mutations are staged against the executor's transaction scope; they
/// become durable only when the surrounding [`UnitOfWork`] commits.
/// Errors surface verbatim as [`crate::QuarryError::Execution`].
pub trait StoreExecutor {
    /// Run a select and return raw rows.
    fn fetch(&mut self, query: &CompiledQuery) -> QuarryResult<Vec<Record>>;

    /// Count the rows the query's predicate matches (paging ignored).
    fn count(&mut self, query: &CompiledQuery) -> QuarryResult<u64>;

    /// Stage an insert; returns the number of rows written.
    fn insert(&mut self, table: &str, row: Record) -> QuarryResult<u64>;

    /// Stage a set-based update; returns the exact affected-row count.
    /// A `None` predicate updates every row.
    fn update(
        &mut self,
        table: &str,
        assignments: Record,
        predicate: Option<&Predicate>,
    ) -> QuarryResult<u64>;

    /// Stage a set-based delete; returns the exact affected-row count.
    /// A `None` predicate deletes every row.
    fn delete(&mut self, table: &str, predicate: Option<&Predicate>) -> QuarryResult<u64>;
}

impl<S: StoreExecutor> StoreExecutor for &mut S {
    fn fetch(&mut self, query: &CompiledQuery) -> QuarryResult<Vec<Record>> {
        (**self).fetch(query)
    }

    fn count(&mut self, query: &CompiledQuery) -> QuarryResult<u64> {
        (**self).count(query)
    }

    fn insert(&mut self, table: &str, row: Record) -> QuarryResult<u64> {
        (**self).insert(table, row)
    }

    fn update(
        &mut self,
        table: &str,
        assignments: Record,
        predicate: Option<&Predicate>,
    ) -> QuarryResult<u64> {
        (**self).update(table, assignments, predicate)
    }

    fn delete(&mut self, table: &str, predicate: Option<&Predicate>) -> QuarryResult<u64> {
        (**self).delete(table, predicate)
    }
}

/// The externally-owned transaction boundary.
pub trait UnitOfWork {
    /// Make all staged mutations durable.
    fn commit(&mut self) -> QuarryResult<()>;

    /// Discard all staged mutations.
    fn rollback(&mut self) -> QuarryResult<()>;
}
