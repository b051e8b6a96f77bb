//! The condition tree: a declarative boolean filter.
//!
//! A [`Condition`] is either a leaf predicate (non-empty `field`, empty
//! `children`) or a group (empty `field`, at least one child) — never both.
//! Each node's [`Combinator`] describes how it attaches to its siblings;
//! siblings fold strictly left-to-right with no precedence reordering.
//! The root node's combinator is ignored.
//!
//! Conditions carry no evaluation semantics of their own; translation is
//! the compiler's job.

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Equal (=)
    Equals,
    /// Not equal (!=)
    NotEquals,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal (>=)
    GreaterOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal (<=)
    LessOrEqual,
    /// Pattern match with `%`/`_` wildcards
    Like,
    /// String prefix match
    StartsWith,
    /// String suffix match
    EndsWith,
    /// Substring match
    Contains,
    /// IS NULL (carries no value)
    IsNull,
    /// IS NOT NULL (carries no value)
    IsNotNull,
}

impl Operator {
    /// String-match operators require a text value and honor case
    /// sensitivity.
    pub fn is_string_match(self) -> bool {
        matches!(
            self,
            Operator::Like | Operator::StartsWith | Operator::EndsWith | Operator::Contains
        )
    }

    /// Null-test operators carry no value.
    pub fn is_null_test(self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::Like => "LIKE",
            Operator::StartsWith => "STARTS",
            Operator::EndsWith => "ENDS",
            Operator::Contains => "CONTAINS",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        };
        write!(f, "{}", s)
    }
}

/// How a condition joins with its siblings at the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Combinator {
    #[default]
    And,
    AndNot,
    Or,
    OrNot,
}

impl Combinator {
    /// Whether this combinator negates the condition it attaches.
    pub fn is_negated(self) -> bool {
        matches!(self, Combinator::AndNot | Combinator::OrNot)
    }

    /// Whether this combinator joins with OR.
    pub fn is_or(self) -> bool {
        matches!(self, Combinator::Or | Combinator::OrNot)
    }
}

/// A node in a boolean filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Field name; empty for group nodes.
    pub field: String,
    /// Comparison operator; groups ignore it.
    pub op: Operator,
    /// Value to compare against; `Value::Null` when the operator carries
    /// no value.
    #[serde(default = "null_value")]
    pub value: Value,
    /// Whether string matching and field resolution are exact-case.
    #[serde(default)]
    pub case_sensitive: bool,
    /// How this node attaches to its siblings.
    #[serde(default)]
    pub combinator: Combinator,
    /// Sub-conditions; non-empty only for group nodes.
    #[serde(default)]
    pub children: Vec<Condition>,
}

fn null_value() -> Value {
    Value::Null
}

impl Condition {
    /// Create a leaf condition with an explicit operator.
    pub fn leaf(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
            case_sensitive: false,
            combinator: Combinator::And,
            children: Vec::new(),
        }
    }

    /// Create a group node from sub-conditions.
    pub fn group(children: Vec<Condition>) -> Self {
        Self {
            field: String::new(),
            op: Operator::Equals,
            value: Value::Null,
            case_sensitive: false,
            combinator: Combinator::And,
            children,
        }
    }

    /// Whether this node is a group.
    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    /// Attach to siblings with OR instead of AND.
    ///
    /// Preserves negation: `AndNot` becomes `OrNot`.
    pub fn or(mut self) -> Self {
        self.combinator = if self.combinator.is_negated() {
            Combinator::OrNot
        } else {
            Combinator::Or
        };
        self
    }

    /// Negate this condition where it attaches to its siblings.
    pub fn negate(mut self) -> Self {
        self.combinator = match self.combinator {
            Combinator::And | Combinator::AndNot => Combinator::AndNot,
            Combinator::Or | Combinator::OrNot => Combinator::OrNot,
        };
        self
    }

    /// Compare strings (and resolve the field name) ignoring case.
    pub fn ignore_case(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    /// Append a sibling joined with AND, wrapping `self` into a group if
    /// it is a leaf.
    pub fn and(self, other: Condition) -> Self {
        self.push(other)
    }

    /// Append a sibling joined with OR.
    pub fn or_else(self, other: Condition) -> Self {
        self.push(other.or())
    }

    fn push(self, other: Condition) -> Self {
        let mut group = if self.is_group() && self.field.is_empty() {
            self
        } else {
            Condition::group(vec![self])
        };
        group.children.push(other);
        group
    }
}
