//! Engine-neutral compiled predicates.
//!
//! A [`Predicate`] is the compiled form of a condition tree: field names
//! are resolved, values are coerced to their declared types, and sibling
//! combinators are folded into an explicit binary tree. Backends translate
//! this structure into their native query form; the in-memory store
//! evaluates it directly.

use serde::{Deserialize, Serialize};

use crate::spec::condition::Combinator;
use crate::spec::value::Value;

/// Comparison operators over coerced values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// String-match flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    /// `%`/`_` wildcard pattern
    Like,
    Prefix,
    Suffix,
    Substring,
}

/// A compiled boolean expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Typed comparison against a coerced scalar.
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// String match with explicit case sensitivity.
    Match {
        field: String,
        kind: MatchKind,
        pattern: String,
        case_sensitive: bool,
    },
    /// Field is null.
    Null { field: String },
    /// Field is not null.
    NotNull { field: String },
    /// Logical negation.
    Not(Box<Predicate>),
    /// Logical conjunction, left-associated.
    And(Box<Predicate>, Box<Predicate>),
    /// Logical disjunction, left-associated.
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// Fold the next sibling into an accumulated predicate, left-to-right.
    ///
    /// The first sibling contributes only its own negation; its AND/OR
    /// half is meaningless with nothing to join to.
    pub fn fold(acc: Option<Predicate>, combinator: Combinator, next: Predicate) -> Predicate {
        let next = if combinator.is_negated() {
            Predicate::Not(Box::new(next))
        } else {
            next
        };
        match acc {
            None => next,
            Some(acc) if combinator.is_or() => Predicate::Or(Box::new(acc), Box::new(next)),
            Some(acc) => Predicate::And(Box::new(acc), Box::new(next)),
        }
    }
}
