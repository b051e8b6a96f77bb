//! Typed repository facade over a store executor.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use crate::compile::{self, CompareOp, CompiledQuery, Predicate, coerce};
use crate::error::{QuarryError, QuarryResult};
use crate::schema::{Schema, SchemaProvider, ShapeDef};
use crate::spec::condition::Condition;
use crate::spec::query::QuerySpec;

use super::{Entity, Record, StoreExecutor};

/// Cache of compiled plans keyed by the serialized specification.
pub type PlanCache = Arc<RwLock<HashMap<String, CompiledQuery>>>;

/// A repository-style facade binding one entity type to one executor.
///
/// The executor is transaction-scoped, so a repository is too: one
/// instance per logical transaction, `&mut` for every store access.
/// Compiled plans are memoized; compilation determinism makes the
/// serialized specification a sound cache key.
pub struct Repository<T: Entity, S: StoreExecutor> {
    schema: Arc<Schema>,
    executor: S,
    plans: PlanCache,
    cache_enabled: bool,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, S: StoreExecutor> Repository<T, S> {
    /// Bind an entity type to a schema and an executor.
    pub fn new(schema: Arc<Schema>, executor: S) -> Self {
        Self {
            schema,
            executor,
            plans: Arc::new(RwLock::new(HashMap::new())),
            cache_enabled: true,
            _entity: PhantomData,
        }
    }

    /// Enable or disable plan caching.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Clear the plan cache.
    pub fn clear_cache(&self) {
        if let Ok(mut plans) = self.plans.write() {
            plans.clear();
        }
    }

    /// Get cache statistics: (cached plans, enabled).
    pub fn cache_stats(&self) -> (usize, bool) {
        let size = self.plans.read().map(|p| p.len()).unwrap_or(0);
        (size, self.cache_enabled)
    }

    /// Access the underlying executor (e.g. to reach its unit of work).
    pub fn executor_mut(&mut self) -> &mut S {
        &mut self.executor
    }

    /// Give the executor back.
    pub fn into_executor(self) -> S {
        self.executor
    }

    /// The physical table name this repository writes to.
    pub fn table_name(&self) -> QuarryResult<String> {
        Ok(self.shape()?.table.clone())
    }

    fn shape(&self) -> QuarryResult<&ShapeDef> {
        self.schema.require_shape(T::SHAPE)
    }

    /// Get a cached plan for a specification, or compile and cache it.
    fn plan(&self, spec: &QuerySpec) -> QuarryResult<CompiledQuery> {
        if spec.shape != T::SHAPE {
            return Err(QuarryError::invalid(format!(
                "specification targets shape '{}', repository is bound to '{}'",
                spec.shape,
                T::SHAPE
            )));
        }

        let key = serde_json::to_string(spec)
            .map_err(|e| QuarryError::invalid(format!("unserializable specification: {e}")))?;

        if self.cache_enabled {
            if let Ok(plans) = self.plans.read() {
                if let Some(plan) = plans.get(&key) {
                    return Ok(plan.clone());
                }
            }
        }

        let plan = compile::compile(spec, self.schema.as_ref())?;

        if self.cache_enabled {
            if let Ok(mut plans) = self.plans.write() {
                plans.insert(key, plan.clone());
            }
        }

        Ok(plan)
    }

    /// Fetch the first matching record, if any.
    pub fn get_one(&mut self, spec: &QuerySpec) -> QuarryResult<Option<T>> {
        let mut plan = self.plan(spec)?;
        plan.take = 1;
        let rows = self.executor.fetch(&plan)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(decode(row)?)),
            None => Ok(None),
        }
    }

    /// Fetch all matching records.
    pub fn get_many(&mut self, spec: &QuerySpec) -> QuarryResult<Vec<T>> {
        let plan = self.plan(spec)?;
        let rows = self.executor.fetch(&plan)?;
        rows.into_iter().map(decode).collect()
    }

    /// Count matching rows, ignoring the specification's page window.
    pub fn count(&mut self, spec: &QuerySpec) -> QuarryResult<u64> {
        let plan = self.plan(spec)?;
        self.executor.count(&plan)
    }

    /// Stage an insert of one entity. Returns the rows written.
    pub fn insert(&mut self, entity: &T) -> QuarryResult<u64> {
        let table = self.table_name()?;
        let row = encode(entity)?;
        self.executor.insert(&table, row)
    }

    /// Stage an update of one entity's non-key fields.
    ///
    /// With `filter = None` the shape's primary key identifies the row —
    /// at most one logical entity is affected. With a filter, the update
    /// is set-based and may touch zero-to-many rows; the store's exact
    /// affected count is returned either way.
    pub fn update(&mut self, entity: &T, filter: Option<&Condition>) -> QuarryResult<u64> {
        let shape = self.shape()?;
        let table = shape.table.clone();
        let mut row = encode(entity)?;

        let predicate = match filter {
            Some(condition) => compile::compile_filter(shape, condition)?,
            None => identity_predicate(shape, &row)?,
        };

        // Key fields identify rows; they are not assignable.
        for key in shape.primary_key() {
            row.remove(&key.name);
        }

        self.executor.update(&table, row, Some(&predicate))
    }

    /// Stage a delete of one entity, identified by its primary key.
    pub fn delete(&mut self, entity: &T) -> QuarryResult<u64> {
        let shape = self.shape()?;
        let table = shape.table.clone();
        let row = encode(entity)?;
        let predicate = identity_predicate(shape, &row)?;
        self.executor.delete(&table, Some(&predicate))
    }

    /// Stage a set-based delete of every row the filter matches.
    pub fn delete_where(&mut self, filter: &Condition) -> QuarryResult<u64> {
        let shape = self.shape()?;
        let table = shape.table.clone();
        let predicate = compile::compile_filter(shape, filter)?;
        self.executor.delete(&table, Some(&predicate))
    }
}

fn encode<T: Entity>(entity: &T) -> QuarryResult<Record> {
    match serde_json::to_value(entity) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(QuarryError::invalid(
            "entity must serialize to an object".to_string(),
        )),
        Err(e) => Err(QuarryError::invalid(format!("unserializable entity: {e}"))),
    }
}

fn decode<T: Entity>(row: Record) -> QuarryResult<T> {
    serde_json::from_value(serde_json::Value::Object(row))
        .map_err(|e| QuarryError::Execution(format!("row does not match entity: {e}")))
}

/// Build the equality predicate identifying one entity by the shape's
/// primary key.
fn identity_predicate(shape: &ShapeDef, row: &Record) -> QuarryResult<Predicate> {
    let keys = shape.primary_key();
    if keys.is_empty() {
        return Err(QuarryError::invalid(format!(
            "shape '{}' declares no primary key",
            shape.name
        )));
    }

    let mut predicate = None;
    for key in keys {
        let cell = row
            .get(&key.name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| {
                QuarryError::invalid(format!("entity is missing key field '{}'", key.name))
            })?;
        let value = coerce(key, &json_to_value(cell, key)?)?;
        let compare = Predicate::Compare {
            field: key.name.clone(),
            op: CompareOp::Eq,
            value,
        };
        predicate = Some(match predicate {
            None => compare,
            Some(acc) => Predicate::And(Box::new(acc), Box::new(compare)),
        });
    }
    predicate.ok_or_else(|| {
        QuarryError::invalid(format!("shape '{}' declares no primary key", shape.name))
    })
}

/// Lift a raw JSON cell into a specification value for coercion.
fn json_to_value(
    cell: &serde_json::Value,
    field: &crate::schema::FieldDef,
) -> QuarryResult<crate::spec::Value> {
    use crate::spec::Value;
    match cell {
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(QuarryError::coercion(&field.name, n, field.ty))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
        other => Err(QuarryError::coercion(&field.name, other, field.ty)),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;
    use crate::exec::{MemoryStore, UnitOfWork};
    use crate::schema::{FieldDef, FieldType, ShapeDef};
    use crate::spec::builders::*;
    use crate::spec::page::Page;
    use crate::spec::sort::Sort;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Book {
        id: i64,
        name: String,
        available: bool,
    }

    impl Entity for Book {
        const SHAPE: &'static str = "books";
    }

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new().with(ShapeDef::new(
            "books",
            vec![
                FieldDef::new("id", FieldType::Int).primary_key(),
                FieldDef::new("name", FieldType::Text),
                FieldDef::new("available", FieldType::Bool),
            ],
        )))
    }

    fn seeded_repo() -> Repository<Book, MemoryStore> {
        let store = MemoryStore::new().with_table(
            "books",
            vec![
                json!({"id": 1, "name": "Alice in Wonderland", "available": true})
                    .as_object()
                    .unwrap()
                    .clone(),
                json!({"id": 2, "name": "Almanac", "available": false})
                    .as_object()
                    .unwrap()
                    .clone(),
            ],
        );
        Repository::new(schema(), store)
    }

    #[test]
    fn test_get_one_and_many() {
        let mut repo = seeded_repo();

        let spec = QuerySpec::on("books")
            .filter(eq("available", true).and(starts_with("name", "Al")))
            .sort(Sort::new().asc("id"))
            .page(Page::first(5).unwrap());
        let one = repo.get_one(&spec).unwrap().unwrap();
        assert_eq!(one.id, 1);

        let all = repo.get_many(&QuerySpec::on("books")).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(repo.count(&QuerySpec::on("books")).unwrap(), 2);
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let mut repo = seeded_repo();
        let err = repo.get_many(&QuerySpec::on("magazines")).unwrap_err();
        assert!(matches!(err, QuarryError::InvalidArgument(_)));
    }

    #[test]
    fn test_plan_cache_fills_and_clears() {
        let mut repo = seeded_repo();
        let spec = QuerySpec::on("books").filter(eq("id", 1));

        assert_eq!(repo.cache_stats(), (0, true));
        repo.get_many(&spec).unwrap();
        repo.get_many(&spec).unwrap();
        assert_eq!(repo.cache_stats(), (1, true));

        repo.clear_cache();
        assert_eq!(repo.cache_stats(), (0, true));
    }

    #[test]
    fn test_insert_then_commit() {
        let mut repo = seeded_repo();
        let inserted = repo
            .insert(&Book {
                id: 3,
                name: "Beowulf".into(),
                available: true,
            })
            .unwrap();
        assert_eq!(inserted, 1);

        // Staged but not durable until the unit of work commits.
        assert_eq!(repo.executor_mut().committed_rows("books").len(), 2);
        repo.executor_mut().commit().unwrap();
        assert_eq!(repo.executor_mut().committed_rows("books").len(), 3);
    }

    #[test]
    fn test_identity_update_touches_one_row() {
        let mut repo = seeded_repo();
        let affected = repo
            .update(
                &Book {
                    id: 2,
                    name: "Almanac 2nd ed.".into(),
                    available: true,
                },
                None,
            )
            .unwrap();
        assert_eq!(affected, 1);

        repo.executor_mut().commit().unwrap();
        let updated = repo
            .get_one(&QuerySpec::on("books").filter(eq("id", 2)))
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Almanac 2nd ed.");
        // The key field itself is never assigned.
        assert_eq!(updated.id, 2);
    }

    #[test]
    fn test_set_based_update_counts_rows_and_skips_keys() {
        let mut repo = seeded_repo();
        // The filter selects the rows; the entity only supplies the
        // assignments, its key is stripped and never written.
        let affected = repo
            .update(
                &Book {
                    id: 99,
                    name: "Archived".into(),
                    available: false,
                },
                Some(&gt("id", 0)),
            )
            .unwrap();
        assert_eq!(affected, 2);

        repo.executor_mut().commit().unwrap();
        let all = repo
            .get_many(&QuerySpec::on("books").sort(Sort::new().asc("id")))
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[1].id, 2);
        assert!(all.iter().all(|b| b.name == "Archived" && !b.available));

        let none = repo
            .update(
                &Book {
                    id: 99,
                    name: "X".into(),
                    available: true,
                },
                Some(&eq("name", "No Such Book")),
            )
            .unwrap();
        assert_eq!(none, 0);
    }

    #[test]
    fn test_set_based_delete_reports_exact_count() {
        let mut repo = seeded_repo();
        let deleted = repo.delete_where(&eq("available", false)).unwrap();
        assert_eq!(deleted, 1);

        let none = repo.delete_where(&eq("name", "No Such Book")).unwrap();
        assert_eq!(none, 0);
    }

    #[test]
    fn test_identity_delete() {
        let mut repo = seeded_repo();
        let entity = Book {
            id: 1,
            name: "Alice in Wonderland".into(),
            available: true,
        };
        assert_eq!(repo.delete(&entity).unwrap(), 1);
        repo.executor_mut().rollback().unwrap();
        assert_eq!(repo.count(&QuerySpec::on("books")).unwrap(), 2);
    }
}
