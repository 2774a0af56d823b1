//! Value coercion between raw column values and declared member kinds.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use uuid::Uuid;

use crate::ast::{Value, ValueKind};
use crate::error::{RelqError, RelqResult};

/// A pluggable per-call converter: raw value in, value of the target kind out.
pub type Converter = dyn Fn(Value, ValueKind) -> RelqResult<Value> + Send + Sync;

fn mismatch(value: &Value, target: ValueKind) -> RelqError {
    RelqError::Conversion {
        from: value.to_string(),
        to: target,
    }
}

/// The default conversion policy.
///
/// NULL markers become the target kind's default value; integers widen to
/// float/decimal; text parses into uuid/datetime/numeric/bool/json targets.
/// Anything else is a conversion error.
pub fn convert_default(value: Value, target: ValueKind) -> RelqResult<Value> {
    if value.is_null() {
        return Ok(target.default_value());
    }
    if value.kind() == Some(target) {
        return Ok(value);
    }

    match (&value, target) {
        (Value::Int(n), ValueKind::Float) => Ok(Value::Float(*n as f64)),
        (Value::Int(n), ValueKind::Decimal) => Ok(Value::Decimal(Decimal::from(*n))),
        (Value::Int(n), ValueKind::Bool) => Ok(Value::Bool(*n != 0)),
        (Value::Float(f), ValueKind::Decimal) => Decimal::from_f64(*f)
            .map(Value::Decimal)
            .ok_or_else(|| mismatch(&value, target)),
        (Value::Decimal(d), ValueKind::Float) => d
            .to_f64()
            .map(Value::Float)
            .ok_or_else(|| mismatch(&value, target)),
        (Value::Decimal(d), ValueKind::Int) => d
            .to_i64()
            .map(Value::Int)
            .ok_or_else(|| mismatch(&value, target)),
        (Value::Text(s), ValueKind::Uuid) => Uuid::parse_str(s)
            .map(Value::Uuid)
            .map_err(|_| mismatch(&value, target)),
        (Value::Text(s), ValueKind::DateTime) => parse_datetime(s)
            .map(Value::DateTime)
            .ok_or_else(|| mismatch(&value, target)),
        (Value::Text(s), ValueKind::Int) => s
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| mismatch(&value, target)),
        (Value::Text(s), ValueKind::Float) => s
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| mismatch(&value, target)),
        (Value::Text(s), ValueKind::Decimal) => s
            .parse::<Decimal>()
            .map(Value::Decimal)
            .map_err(|_| mismatch(&value, target)),
        (Value::Text(s), ValueKind::Bool) => parse_bool(s)
            .map(Value::Bool)
            .ok_or_else(|| mismatch(&value, target)),
        (Value::Text(s), ValueKind::Json) => serde_json::from_str(s)
            .map(Value::Json)
            .map_err(|_| mismatch(&value, target)),
        (Value::Uuid(u), ValueKind::Text) => Ok(Value::Text(u.to_string())),
        _ => Err(mismatch(&value, target)),
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "t" | "true" | "1" => Some(true),
        "f" | "false" | "0" => Some(false),
        _ => None,
    }
}
