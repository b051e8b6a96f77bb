//! In-memory store executor.
//!
//! The reference [`StoreExecutor`]: rows are JSON field maps held per
//! table, predicates are evaluated directly against them, and mutations
//! are staged in a pending log until the [`UnitOfWork`] boundary commits
//! or rolls back. Used as the fixture backend in tests and as the
//! executable definition of the engine-neutral predicate semantics.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::compile::{CompareOp, CompiledQuery, MatchKind, Predicate};
use crate::error::QuarryResult;
use crate::spec::sort::{SortDirection, SortKey};
use crate::spec::value::Value;

use super::{Record, StoreExecutor, UnitOfWork};

/// A staged mutation, applied on commit in staging order.
#[derive(Debug, Clone)]
enum StagedOp {
    Insert {
        table: String,
        row: Record,
    },
    Update {
        table: String,
        assignments: Record,
        predicate: Option<Predicate>,
    },
    Delete {
        table: String,
        predicate: Option<Predicate>,
    },
}

/// An in-memory table store with staged mutations.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    committed: HashMap<String, Vec<Record>>,
    staged: Vec<StagedOp>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with committed rows (test fixtures).
    pub fn with_table(mut self, table: impl Into<String>, rows: Vec<Record>) -> Self {
        self.committed.insert(table.into(), rows);
        self
    }

    /// Number of mutations staged but not committed.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Committed rows of a table, ignoring staged mutations.
    pub fn committed_rows(&self, table: &str) -> &[Record] {
        self.committed.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Materialize a table as reads see it: committed rows with the
    /// staged log applied in order.
    fn view(&self, table: &str) -> Vec<Record> {
        let mut rows = self.committed.get(table).cloned().unwrap_or_default();
        for op in &self.staged {
            apply_op(table, &mut rows, op);
        }
        rows
    }
}

fn apply_op(table: &str, rows: &mut Vec<Record>, op: &StagedOp) {
    match op {
        StagedOp::Insert { table: t, row } if t == table => rows.push(row.clone()),
        StagedOp::Update {
            table: t,
            assignments,
            predicate,
        } if t == table => {
            for row in rows.iter_mut() {
                if matches(predicate.as_ref(), row) {
                    for (k, v) in assignments {
                        row.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        StagedOp::Delete {
            table: t,
            predicate,
        } if t == table => {
            rows.retain(|row| !matches(predicate.as_ref(), row));
        }
        _ => {}
    }
}

fn matches(predicate: Option<&Predicate>, row: &Record) -> bool {
    predicate.map(|p| eval(p, row)).unwrap_or(true)
}

impl StoreExecutor for MemoryStore {
    fn fetch(&mut self, query: &CompiledQuery) -> QuarryResult<Vec<Record>> {
        let mut rows: Vec<Record> = self
            .view(&query.table)
            .into_iter()
            .filter(|row| matches(query.predicate.as_ref(), row))
            .collect();

        sort_rows(&mut rows, &query.order_by);

        let rows = rows.into_iter().skip(query.skip as usize);
        let mut rows: Vec<Record> = if query.take > 0 {
            rows.take(query.take as usize).collect()
        } else {
            rows.collect()
        };

        if let Some(projection) = &query.projection {
            for row in &mut rows {
                let mut projected = Record::new();
                for col in projection {
                    let key = col.alias.as_ref().unwrap_or(&col.name);
                    let value = row.get(&col.name).cloned().unwrap_or(serde_json::Value::Null);
                    projected.insert(key.clone(), value);
                }
                *row = projected;
            }
        }

        Ok(rows)
    }

    fn count(&mut self, query: &CompiledQuery) -> QuarryResult<u64> {
        let count = self
            .view(&query.table)
            .iter()
            .filter(|row| matches(query.predicate.as_ref(), row))
            .count();
        Ok(count as u64)
    }

    fn insert(&mut self, table: &str, row: Record) -> QuarryResult<u64> {
        self.staged.push(StagedOp::Insert {
            table: table.to_string(),
            row,
        });
        Ok(1)
    }

    fn update(
        &mut self,
        table: &str,
        assignments: Record,
        predicate: Option<&Predicate>,
    ) -> QuarryResult<u64> {
        let affected = self
            .view(table)
            .iter()
            .filter(|row| matches(predicate, row))
            .count() as u64;
        self.staged.push(StagedOp::Update {
            table: table.to_string(),
            assignments,
            predicate: predicate.cloned(),
        });
        Ok(affected)
    }

    fn delete(&mut self, table: &str, predicate: Option<&Predicate>) -> QuarryResult<u64> {
        let affected = self
            .view(table)
            .iter()
            .filter(|row| matches(predicate, row))
            .count() as u64;
        self.staged.push(StagedOp::Delete {
            table: table.to_string(),
            predicate: predicate.cloned(),
        });
        Ok(affected)
    }
}

impl UnitOfWork for MemoryStore {
    fn commit(&mut self) -> QuarryResult<()> {
        let staged = std::mem::take(&mut self.staged);
        for op in &staged {
            let table = match op {
                StagedOp::Insert { table, .. }
                | StagedOp::Update { table, .. }
                | StagedOp::Delete { table, .. } => table.clone(),
            };
            let rows = self.committed.entry(table.clone()).or_default();
            apply_op(&table, rows, op);
        }
        Ok(())
    }

    fn rollback(&mut self) -> QuarryResult<()> {
        self.staged.clear();
        Ok(())
    }
}

/// Evaluate a compiled predicate against a row.
fn eval(predicate: &Predicate, row: &Record) -> bool {
    match predicate {
        Predicate::Compare { field, op, value } => {
            let Some(cell) = row.get(field) else {
                return false;
            };
            let Some(ordering) = compare_cell(cell, value) else {
                return false;
            };
            match op {
                CompareOp::Eq => ordering == Ordering::Equal,
                CompareOp::Ne => ordering != Ordering::Equal,
                CompareOp::Gt => ordering == Ordering::Greater,
                CompareOp::Gte => ordering != Ordering::Less,
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Lte => ordering != Ordering::Greater,
            }
        }
        Predicate::Match {
            field,
            kind,
            pattern,
            case_sensitive,
        } => {
            let Some(serde_json::Value::String(text)) = row.get(field) else {
                return false;
            };
            let (text, pattern) = if *case_sensitive {
                (text.clone(), pattern.clone())
            } else {
                (text.to_lowercase(), pattern.to_lowercase())
            };
            match kind {
                MatchKind::Prefix => text.starts_with(&pattern),
                MatchKind::Suffix => text.ends_with(&pattern),
                MatchKind::Substring => text.contains(&pattern),
                MatchKind::Like => like_match(&pattern, &text),
            }
        }
        Predicate::Null { field } => row
            .get(field)
            .map(serde_json::Value::is_null)
            .unwrap_or(true),
        Predicate::NotNull { field } => !row
            .get(field)
            .map(serde_json::Value::is_null)
            .unwrap_or(true),
        Predicate::Not(inner) => !eval(inner, row),
        Predicate::And(lhs, rhs) => eval(lhs, row) && eval(rhs, row),
        Predicate::Or(lhs, rhs) => eval(lhs, row) || eval(rhs, row),
    }
}

/// Compare a row cell against a coerced scalar. `None` means the pair is
/// incomparable (null cell or type mismatch), which makes the predicate
/// false.
fn compare_cell(cell: &serde_json::Value, value: &Value) -> Option<Ordering> {
    use serde_json::Value as Json;
    match (cell, value) {
        (Json::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Json::Number(a), Value::Int(b)) => {
            if let Some(a) = a.as_i64() {
                Some(a.cmp(b))
            } else {
                a.as_f64().and_then(|a| a.partial_cmp(&(*b as f64)))
            }
        }
        (Json::Number(a), Value::Float(b)) => a.as_f64().and_then(|a| a.partial_cmp(b)),
        (Json::Number(a), Value::Decimal(b)) => {
            use rust_decimal::prelude::FromPrimitive;
            let a = a.as_f64().and_then(rust_decimal::Decimal::from_f64)?;
            Some(a.cmp(b))
        }
        (Json::String(a), Value::Text(b)) => Some(a.as_str().cmp(b.as_str())),
        (Json::String(a), Value::Uuid(b)) => {
            let a: uuid::Uuid = a.parse().ok()?;
            Some(a.cmp(b))
        }
        (Json::String(a), Value::Timestamp(b)) => {
            let a = chrono::DateTime::parse_from_rfc3339(a).ok()?;
            Some(a.with_timezone(&chrono::Utc).cmp(b))
        }
        (Json::String(a), Value::Date(b)) => {
            let a: chrono::NaiveDate = a.parse().ok()?;
            Some(a.cmp(b))
        }
        _ => None,
    }
}

/// Rank-order two row cells for sorting: nulls first, then by type
/// family, then by value.
fn cmp_cells(a: &serde_json::Value, b: &serde_json::Value) -> Ordering {
    use serde_json::Value as Json;
    fn rank(v: &Json) -> u8 {
        match v {
            Json::Null => 0,
            Json::Bool(_) => 1,
            Json::Number(_) => 2,
            Json::String(_) => 3,
            _ => 4,
        }
    }
    match (a, b) {
        (Json::Bool(a), Json::Bool(b)) => a.cmp(b),
        (Json::Number(a), Json::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Json::String(a), Json::String(b)) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn sort_rows(rows: &mut [Record], order_by: &[SortKey]) {
    if order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for key in order_by {
            let null = serde_json::Value::Null;
            let left = a.get(&key.field).unwrap_or(&null);
            let right = b.get(&key.field).unwrap_or(&null);
            let ordering = match key.direction {
                SortDirection::Ascending => cmp_cells(left, right),
                SortDirection::Descending => cmp_cells(right, left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// SQL-style LIKE: `%` matches any run, `_` matches one character.
fn like_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    like_at(&pattern, &text)
}

fn like_at(pattern: &[char], text: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('%') => {
            // Greedily try every split point.
            (0..=text.len()).any(|i| like_at(&pattern[1..], &text[i..]))
        }
        Some('_') => !text.is_empty() && like_at(&pattern[1..], &text[1..]),
        Some(c) => text.first() == Some(c) && like_at(&pattern[1..], &text[1..]),
    }
}
