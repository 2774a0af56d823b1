use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A runtime value: a bound parameter, an entity member value, or a result cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL marker
    Null,
    /// Boolean
    Bool(bool),
    /// Integer (all integral widths widen to i64)
    Int(i64),
    /// Float
    Float(f64),
    /// String
    Text(String),
    /// Raw byte string
    Bytes(Vec<u8>),
    /// UUID value
    Uuid(Uuid),
    /// UTC timestamp
    DateTime(DateTime<Utc>),
    /// Exact decimal (NUMERIC columns, money-like aggregates)
    Decimal(Decimal),
    /// JSON document
    Json(serde_json::Value),
}

/// The declared kind of an entity member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
    Uuid,
    DateTime,
    Decimal,
    Json,
}

impl ValueKind {
    /// The zero/default value for this kind, used when a NULL marker lands
    /// on a non-optional member.
    pub fn default_value(self) -> Value {
        match self {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int => Value::Int(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::Bytes => Value::Bytes(Vec::new()),
            ValueKind::Uuid => Value::Uuid(Uuid::nil()),
            ValueKind::DateTime => Value::DateTime(DateTime::UNIX_EPOCH),
            ValueKind::Decimal => Value::Decimal(Decimal::ZERO),
            ValueKind::Json => Value::Json(serde_json::Value::Null),
        }
    }
}

impl Value {
    /// The kind of this value; `None` for the NULL marker.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Bytes(_) => Some(ValueKind::Bytes),
            Value::Uuid(_) => Some(ValueKind::Uuid),
            Value::DateTime(_) => Some(ValueKind::DateTime),
            Value::Decimal(_) => Some(ValueKind::Decimal),
            Value::Json(_) => Some(ValueKind::Json),
        }
    }

    /// True if this is the NULL marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Uuid(u) => write!(f, "'{}'", u),
            Value::DateTime(dt) => write!(f, "'{}'", dt),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Json(j) => write!(f, "{}", j),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<serde_json::Value> for Value {
    fn from(j: serde_json::Value) -> Self {
        Value::Json(j)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
