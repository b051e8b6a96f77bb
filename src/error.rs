//! Error types for quarry.

use thiserror::Error;

use crate::schema::FieldType;

/// The main error type for quarry operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuarryError {
    /// Malformed specification input (e.g. negative offset/limit).
    /// Raised at construction time, never during compilation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The record shape named by a specification is not known to the schema.
    #[error("Unknown shape: '{0}'")]
    ShapeNotFound(String),

    /// A condition or sort key references a field the shape does not declare.
    #[error("Field '{field}' not found in shape '{shape}'{}", suggestion_suffix(.suggestion))]
    FieldNotFound {
        shape: String,
        field: String,
        suggestion: Option<String>,
    },

    /// A condition value cannot be converted to the field's declared type.
    #[error("Cannot coerce value {value} to {expected} for field '{field}'")]
    ValueCoercion {
        field: String,
        value: String,
        expected: FieldType,
    },

    /// Opaque failure surfaced by the store executor. Passed through
    /// verbatim; the core never retries or interprets it.
    #[error("Execution error: {0}")]
    Execution(String),
}

impl QuarryError {
    /// Create an invalid-argument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a field-not-found error.
    pub fn field_not_found(
        shape: impl Into<String>,
        field: impl Into<String>,
        suggestion: Option<String>,
    ) -> Self {
        Self::FieldNotFound {
            shape: shape.into(),
            field: field.into(),
            suggestion,
        }
    }

    /// Create a coercion error naming the field and the offending raw value.
    pub fn coercion(field: impl Into<String>, value: impl ToString, expected: FieldType) -> Self {
        Self::ValueCoercion {
            field: field.into(),
            value: value.to_string(),
            expected,
        }
    }
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean '{s}'?"),
        None => String::new(),
    }
}

/// Result type alias for quarry operations.
pub type QuarryResult<T> = Result<T, QuarryError>;
