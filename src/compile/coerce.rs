//! Value coercion against declared field types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use uuid::Uuid;

use crate::error::{QuarryError, QuarryResult};
use crate::schema::{FieldDef, FieldType};
use crate::spec::value::Value;

/// Coerce a specification-layer value to a field's declared type.
///
/// Strings parse into the numeric, temporal, uuid and boolean families;
/// integers widen to floats and decimals; everything else must already
/// match. Failure names the field and the offending raw value and never
/// silently drops the condition.
pub fn coerce(field: &FieldDef, value: &Value) -> QuarryResult<Value> {
    let fail = || QuarryError::coercion(&field.name, value, field.ty);

    match field.ty {
        FieldType::Bool => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Text(s) => match s.to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },
            _ => Err(fail()),
        },
        FieldType::Int => match value {
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::Float(f) if f.fract() == 0.0 => Ok(Value::Int(*f as i64)),
            Value::Text(s) => s.parse::<i64>().map(Value::Int).map_err(|_| fail()),
            _ => Err(fail()),
        },
        FieldType::Float => match value {
            Value::Float(f) => Ok(Value::Float(*f)),
            Value::Int(n) => Ok(Value::Float(*n as f64)),
            Value::Decimal(d) => d.to_f64().map(Value::Float).ok_or_else(fail),
            Value::Text(s) => s.parse::<f64>().map(Value::Float).map_err(|_| fail()),
            _ => Err(fail()),
        },
        FieldType::Decimal => match value {
            Value::Decimal(d) => Ok(Value::Decimal(*d)),
            Value::Int(n) => Ok(Value::Decimal(Decimal::from(*n))),
            Value::Float(f) => Decimal::from_f64(*f).map(Value::Decimal).ok_or_else(fail),
            Value::Text(s) => s.parse::<Decimal>().map(Value::Decimal).map_err(|_| fail()),
            _ => Err(fail()),
        },
        FieldType::Text => match value {
            Value::Text(s) => Ok(Value::Text(s.clone())),
            _ => Err(fail()),
        },
        FieldType::Uuid => match value {
            Value::Uuid(u) => Ok(Value::Uuid(*u)),
            Value::Text(s) => s.parse::<Uuid>().map(Value::Uuid).map_err(|_| fail()),
            _ => Err(fail()),
        },
        FieldType::Timestamp => match value {
            Value::Timestamp(t) => Ok(Value::Timestamp(*t)),
            Value::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
                .map_err(|_| fail()),
            _ => Err(fail()),
        },
        FieldType::Date => match value {
            Value::Date(d) => Ok(Value::Date(*d)),
            Value::Timestamp(t) => Ok(Value::Date(t.date_naive())),
            Value::Text(s) => s.parse::<NaiveDate>().map(Value::Date).map_err(|_| fail()),
            _ => Err(fail()),
        },
    }
}
