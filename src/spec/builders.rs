//! Free-function condition builders.
//!
//! Each builder returns an AND-attached condition; the [`Condition::or`],
//! [`Condition::negate`] and [`Condition::ignore_case`] adapters produce
//! the OR / NOT / case-insensitive forms.

use super::condition::{Condition, Operator};
use super::value::Value;

/// Create an equality condition (field = value)
pub fn eq(field: &str, value: impl Into<Value>) -> Condition {
    Condition::leaf(field, Operator::Equals, value)
}

/// Create a not-equal condition (field != value)
pub fn ne(field: &str, value: impl Into<Value>) -> Condition {
    Condition::leaf(field, Operator::NotEquals, value)
}

/// Create a greater-than condition (field > value)
pub fn gt(field: &str, value: impl Into<Value>) -> Condition {
    Condition::leaf(field, Operator::GreaterThan, value)
}

/// Create a greater-than-or-equal condition (field >= value)
pub fn gte(field: &str, value: impl Into<Value>) -> Condition {
    Condition::leaf(field, Operator::GreaterOrEqual, value)
}

/// Create a less-than condition (field < value)
pub fn lt(field: &str, value: impl Into<Value>) -> Condition {
    Condition::leaf(field, Operator::LessThan, value)
}

/// Create a less-than-or-equal condition (field <= value)
pub fn lte(field: &str, value: impl Into<Value>) -> Condition {
    Condition::leaf(field, Operator::LessOrEqual, value)
}

/// Create a condition with an explicit operator.
pub fn cmp(field: &str, op: Operator, value: impl Into<Value>) -> Condition {
    Condition::leaf(field, op, value)
}

/// String-match builders compare case-sensitively; chain
/// [`Condition::ignore_case`] for the insensitive form.
fn string_match(field: &str, op: Operator, pattern: &str) -> Condition {
    let mut cond = Condition::leaf(field, op, pattern);
    cond.case_sensitive = true;
    cond
}

/// Create a LIKE condition (`%`/`_` wildcards in the pattern)
pub fn like(field: &str, pattern: &str) -> Condition {
    string_match(field, Operator::Like, pattern)
}

/// Create a prefix-match condition
pub fn starts_with(field: &str, prefix: &str) -> Condition {
    string_match(field, Operator::StartsWith, prefix)
}

/// Create a suffix-match condition
pub fn ends_with(field: &str, suffix: &str) -> Condition {
    string_match(field, Operator::EndsWith, suffix)
}

/// Create a substring-match condition
pub fn contains(field: &str, needle: &str) -> Condition {
    string_match(field, Operator::Contains, needle)
}

/// Create an IS NULL condition
pub fn is_null(field: &str) -> Condition {
    Condition::leaf(field, Operator::IsNull, Value::Null)
}

/// Create an IS NOT NULL condition
pub fn is_not_null(field: &str) -> Condition {
    Condition::leaf(field, Operator::IsNotNull, Value::Null)
}

/// Group sub-conditions so they fold as a single operand.
pub fn group(children: Vec<Condition>) -> Condition {
    Condition::group(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::condition::Combinator;

    #[test]
    fn test_builders_set_operator() {
        assert_eq!(eq("a", 1).op, Operator::Equals);
        assert_eq!(gt("a", 1).op, Operator::GreaterThan);
        assert_eq!(starts_with("name", "Al").op, Operator::StartsWith);
        assert_eq!(is_null("deleted_at").op, Operator::IsNull);
        assert!(is_null("deleted_at").value.is_null());
    }

    #[test]
    fn test_string_builders_default_case_sensitive() {
        let c = contains("name", "al");
        assert!(c.case_sensitive);
        assert!(!c.ignore_case().case_sensitive);
        // Plain comparisons resolve fields case-insensitively.
        assert!(!eq("name", "al").case_sensitive);
    }

    #[test]
    fn test_group_builder() {
        let g = group(vec![eq("role", "admin"), eq("role", "mod").or()]);
        assert!(g.is_group());
        assert_eq!(g.children[1].combinator, Combinator::Or);
    }
}
