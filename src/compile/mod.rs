//! Pure translation from [`QuerySpec`] to [`CompiledQuery`].
//!
//! Compilation resolves every field reference against the schema, coerces
//! condition values to their declared types, folds sibling combinators
//! left-to-right, and flattens sort/page into an order-by list and a
//! skip/take pair. It performs no I/O and holds no state: the same
//! specification always compiles to a structurally identical plan.

pub mod coerce;
pub mod predicate;

use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, QuarryResult};
use crate::schema::{FieldType, SchemaProvider, ShapeDef};
use crate::spec::column::ColumnRef;
use crate::spec::condition::{Condition, Operator};
use crate::spec::query::QuerySpec;
use crate::spec::sort::SortKey;
use crate::spec::value::Value;

pub use coerce::coerce;
pub use predicate::{CompareOp, MatchKind, Predicate};

/// The engine-neutral output of compiling a specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
    /// Logical shape the query was compiled against.
    pub shape: String,
    /// Physical table/collection name for the store executor.
    pub table: String,
    /// Resolved projection; `None` means all declared fields.
    pub projection: Option<Vec<ColumnRef>>,
    /// Compiled filter; `None` selects everything.
    pub predicate: Option<Predicate>,
    /// Resolved order-by clauses, input order preserved.
    pub order_by: Vec<SortKey>,
    /// Rows to skip.
    pub skip: u64,
    /// Rows to take; 0 means unlimited.
    pub take: u64,
}

impl CompiledQuery {
    /// Stable cache key for plan caching; compilation determinism makes
    /// the serialized specification a sound key, this is the mirror for
    /// diagnostics.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Compile a specification against a schema.
pub fn compile(spec: &QuerySpec, schema: &impl SchemaProvider) -> QuarryResult<CompiledQuery> {
    let shape = schema.require_shape(&spec.shape)?;

    let projection = match &spec.projection {
        Some(columns) => Some(
            columns
                .iter()
                .map(|c| resolve_column(shape, c))
                .collect::<QuarryResult<Vec<_>>>()?,
        ),
        None => None,
    };

    let predicate = match &spec.filter {
        Some(filter) => Some(compile_condition(shape, filter)?),
        None => None,
    };

    let mut order_by = Vec::new();
    if let Some(sort) = &spec.sort {
        for key in sort.keys() {
            let field = resolve_field(shape, &key.field, false)?;
            order_by.push(SortKey {
                field: field.name.clone(),
                direction: key.direction,
            });
        }
    }

    let (skip, take) = match spec.page {
        Some(page) => (page.offset, page.limit),
        None => (0, 0),
    };

    Ok(CompiledQuery {
        shape: shape.name.clone(),
        table: shape.table.clone(),
        projection,
        predicate,
        order_by,
        skip,
        take,
    })
}

/// Compile a bare filter tree against a shape, without the rest of a
/// specification. Used by the set-based update/delete paths.
pub fn compile_filter(shape: &ShapeDef, condition: &Condition) -> QuarryResult<Predicate> {
    compile_condition(shape, condition)
}

/// Compile a condition node: a leaf becomes a single predicate, a group
/// folds its children left-to-right. The node's own combinator is the
/// caller's concern; the root's is ignored.
///
/// A childless node is treated as a leaf, so a malformed node (empty
/// field, no children) fails field resolution like any other bad
/// reference.
fn compile_condition(shape: &ShapeDef, condition: &Condition) -> QuarryResult<Predicate> {
    if let Some((first, rest)) = condition.children.split_first() {
        let compiled = compile_condition(shape, first)?;
        let mut acc = Predicate::fold(None, first.combinator, compiled);
        for child in rest {
            let compiled = compile_condition(shape, child)?;
            acc = Predicate::fold(Some(acc), child.combinator, compiled);
        }
        Ok(acc)
    } else {
        compile_leaf(shape, condition)
    }
}

fn compile_leaf(shape: &ShapeDef, condition: &Condition) -> QuarryResult<Predicate> {
    let field = resolve_field(shape, &condition.field, condition.case_sensitive)?;

    if condition.op.is_null_test() {
        let name = field.name.clone();
        return Ok(match condition.op {
            Operator::IsNull => Predicate::Null { field: name },
            _ => Predicate::NotNull { field: name },
        });
    }

    if condition.op.is_string_match() {
        if field.ty != FieldType::Text {
            return Err(QuarryError::coercion(&field.name, &condition.value, field.ty));
        }
        let pattern = condition
            .value
            .as_text()
            .ok_or_else(|| QuarryError::coercion(&field.name, &condition.value, FieldType::Text))?;
        return Ok(Predicate::Match {
            field: field.name.clone(),
            kind: match condition.op {
                Operator::Like => MatchKind::Like,
                Operator::StartsWith => MatchKind::Prefix,
                Operator::EndsWith => MatchKind::Suffix,
                _ => MatchKind::Substring,
            },
            pattern: pattern.to_string(),
            case_sensitive: condition.case_sensitive,
        });
    }

    if condition.value.is_null() {
        // Comparisons against null never match; demand the explicit
        // null-test operators instead of guessing.
        return Err(QuarryError::coercion(&field.name, &Value::Null, field.ty));
    }

    let value = coerce(field, &condition.value)?;
    Ok(Predicate::Compare {
        field: field.name.clone(),
        op: match condition.op {
            Operator::Equals => CompareOp::Eq,
            Operator::NotEquals => CompareOp::Ne,
            Operator::GreaterThan => CompareOp::Gt,
            Operator::GreaterOrEqual => CompareOp::Gte,
            Operator::LessThan => CompareOp::Lt,
            _ => CompareOp::Lte,
        },
        value,
    })
}

fn resolve_field<'a>(
    shape: &'a ShapeDef,
    name: &str,
    exact_case: bool,
) -> QuarryResult<&'a crate::schema::FieldDef> {
    shape.resolve(name, exact_case).ok_or_else(|| {
        QuarryError::field_not_found(&shape.name, name, shape.did_you_mean(name))
    })
}

fn resolve_column(shape: &ShapeDef, column: &ColumnRef) -> QuarryResult<ColumnRef> {
    let field = resolve_field(shape, &column.name, false)?;
    Ok(ColumnRef {
        table: column.table.clone(),
        name: field.name.clone(),
        alias: column.alias.clone(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::{FieldDef, Schema, ShapeDef};
    use crate::spec::builders::*;
    use crate::spec::page::Page;
    use crate::spec::sort::{Sort, SortDirection};

    fn books_schema() -> Schema {
        Schema::new().with(ShapeDef::new(
            "books",
            vec![
                FieldDef::new("id", FieldType::Int).primary_key(),
                FieldDef::new("name", FieldType::Text),
                FieldDef::new("price", FieldType::Decimal),
                FieldDef::new("available", FieldType::Bool),
                FieldDef::new("published_at", FieldType::Date).nullable(),
            ],
        ))
    }

    #[test]
    fn test_compile_is_deterministic() {
        let schema = books_schema();
        let spec = QuerySpec::on("books")
            .filter(eq("available", true).and(starts_with("name", "Al")))
            .sort(Sort::new().asc("id"))
            .page(Page::first(5).unwrap());

        let once = compile(&spec, &schema).unwrap();
        let twice = compile(&spec, &schema).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.fingerprint(), twice.fingerprint());
    }

    #[test]
    fn test_left_fold_grouping() {
        // eq(a).and(b).or(c) must compile to (A AND B) OR C.
        let schema = books_schema();
        let spec = QuerySpec::on("books").filter(
            eq("available", true)
                .and(gt("id", 10))
                .or_else(eq("name", "x")),
        );
        let compiled = compile(&spec, &schema).unwrap();

        let a = Predicate::Compare {
            field: "available".into(),
            op: CompareOp::Eq,
            value: Value::Bool(true),
        };
        let b = Predicate::Compare {
            field: "id".into(),
            op: CompareOp::Gt,
            value: Value::Int(10),
        };
        let c = Predicate::Compare {
            field: "name".into(),
            op: CompareOp::Eq,
            value: Value::Text("x".into()),
        };
        let expected = Predicate::Or(
            Box::new(Predicate::And(Box::new(a), Box::new(b))),
            Box::new(c),
        );
        assert_eq!(compiled.predicate, Some(expected));
    }

    #[test]
    fn test_nested_group_folds_as_one_operand() {
        let schema = books_schema();
        let spec = QuerySpec::on("books").filter(group(vec![
            eq("available", true),
            group(vec![eq("name", "a"), eq("name", "b").or()]),
        ]));
        let compiled = compile(&spec, &schema).unwrap();

        // available AND (name = a OR name = b)
        match compiled.predicate.unwrap() {
            Predicate::And(_, rhs) => assert!(matches!(*rhs, Predicate::Or(_, _))),
            other => panic!("expected top-level AND, got {other:?}"),
        }
    }

    #[test]
    fn test_negated_child() {
        let schema = books_schema();
        let spec =
            QuerySpec::on("books").filter(eq("available", true).and(eq("name", "x").negate()));
        let compiled = compile(&spec, &schema).unwrap();
        match compiled.predicate.unwrap() {
            Predicate::And(_, rhs) => assert!(matches!(*rhs, Predicate::Not(_))),
            other => panic!("expected AND with negated rhs, got {other:?}"),
        }
    }

    #[test]
    fn test_sort_order_preserved() {
        let schema = Schema::new().with(ShapeDef::new(
            "people",
            vec![
                FieldDef::new("age", FieldType::Int),
                FieldDef::new("name", FieldType::Text),
            ],
        ));
        let spec = QuerySpec::on("people").sort(Sort::new().desc("age").asc("name"));
        let compiled = compile(&spec, &schema).unwrap();

        assert_eq!(compiled.order_by.len(), 2);
        assert_eq!(compiled.order_by[0].field, "age");
        assert_eq!(compiled.order_by[0].direction, SortDirection::Descending);
        assert_eq!(compiled.order_by[1].field, "name");
        assert_eq!(compiled.order_by[1].direction, SortDirection::Ascending);
    }

    #[test]
    fn test_unknown_field_fails_loudly() {
        let schema = books_schema();

        let spec = QuerySpec::on("books").filter(eq("nonexistent", 1));
        assert!(matches!(
            compile(&spec, &schema),
            Err(QuarryError::FieldNotFound { .. })
        ));

        // Unknown sort fields fail too instead of silently reordering.
        let spec = QuerySpec::on("books").sort(Sort::new().asc("nonexistent"));
        assert!(matches!(
            compile(&spec, &schema),
            Err(QuarryError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_nodes_fail_field_resolution() {
        // Hand-built nodes that are neither leaf nor group (empty field,
        // no children) only arise by bypassing the builders; they fail
        // like any other unresolved reference.
        let schema = books_schema();
        let empty = crate::spec::Condition::group(Vec::new());
        let spec = QuerySpec::on("books").filter(empty);
        assert!(matches!(
            compile(&spec, &schema),
            Err(QuarryError::FieldNotFound { .. })
        ));

        let mut bare = eq("id", 1);
        bare.field = String::new();
        let spec = QuerySpec::on("books").filter(bare);
        assert!(matches!(
            compile(&spec, &schema),
            Err(QuarryError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_field_not_found_suggests() {
        let schema = books_schema();
        let spec = QuerySpec::on("books").filter(eq("avalable", true));
        match compile(&spec, &schema) {
            Err(QuarryError::FieldNotFound { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("available"));
            }
            other => panic!("expected FieldNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_case_insensitive_resolution_normalizes_name() {
        let schema = books_schema();
        let spec = QuerySpec::on("books").filter(eq("Available", true));
        let compiled = compile(&spec, &schema).unwrap();
        assert_eq!(
            compiled.predicate,
            Some(Predicate::Compare {
                field: "available".into(),
                op: CompareOp::Eq,
                value: Value::Bool(true),
            })
        );

        // Exact-case resolution (string matchers) rejects the wrong case.
        let spec = QuerySpec::on("books").filter(starts_with("Name", "A"));
        assert!(matches!(
            compile(&spec, &schema),
            Err(QuarryError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_coercion_failure_is_loud() {
        let schema = books_schema();
        let spec = QuerySpec::on("books").filter(eq("id", "abc"));
        match compile(&spec, &schema) {
            Err(QuarryError::ValueCoercion { field, expected, .. }) => {
                assert_eq!(field, "id");
                assert_eq!(expected, FieldType::Int);
            }
            other => panic!("expected ValueCoercion, got {other:?}"),
        }
    }

    #[test]
    fn test_string_match_requires_text_field() {
        let schema = books_schema();
        let spec = QuerySpec::on("books").filter(contains("id", "1"));
        assert!(matches!(
            compile(&spec, &schema),
            Err(QuarryError::ValueCoercion { .. })
        ));
    }

    #[test]
    fn test_paging_compiles_to_skip_take() {
        let schema = books_schema();
        let spec = QuerySpec::on("books").page(Page::numbered(3, 10).unwrap());
        let compiled = compile(&spec, &schema).unwrap();
        assert_eq!(compiled.skip, 20);
        assert_eq!(compiled.take, 10);

        let spec = QuerySpec::on("books").page(Page::numbered(0, 10).unwrap());
        assert_eq!(compile(&spec, &schema).unwrap().skip, 0);
    }

    #[test]
    fn test_projection_resolves_and_keeps_order() {
        let schema = books_schema();
        let spec = QuerySpec::on("books").select([
            ColumnRef::new("Name").aliased("title"),
            ColumnRef::new("id"),
        ]);
        let compiled = compile(&spec, &schema).unwrap();
        let projection = compiled.projection.unwrap();
        assert_eq!(projection[0].name, "name");
        assert_eq!(projection[0].alias.as_deref(), Some("title"));
        assert_eq!(projection[1].name, "id");

        let spec = QuerySpec::on("books").select(["bogus"]);
        assert!(matches!(
            compile(&spec, &schema),
            Err(QuarryError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_shape() {
        let schema = books_schema();
        let spec = QuerySpec::on("magazines");
        assert!(matches!(
            compile(&spec, &schema),
            Err(QuarryError::ShapeNotFound(_))
        ));
    }

    #[test]
    fn test_null_comparison_rejected() {
        let schema = books_schema();
        let spec = QuerySpec::on("books").filter(eq("published_at", Value::Null));
        assert!(matches!(
            compile(&spec, &schema),
            Err(QuarryError::ValueCoercion { .. })
        ));
        // The explicit null test is the supported spelling.
        let spec = QuerySpec::on("books").filter(is_null("published_at"));
        assert_eq!(
            compile(&spec, &schema).unwrap().predicate,
            Some(Predicate::Null {
                field: "published_at".into()
            })
        );
    }
}
