use serde::{Deserialize, Serialize};

use crate::ast::{BinaryOp, StrFunc, Value};

/// A node in a predicate or projection expression tree.
///
/// Trees are built by the caller (usually through [`crate::ast::builders`]),
/// handed to the translator once, and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Constant value; always compiled to a bound parameter.
    Value(Value),
    /// Access to an entity member by member name.
    Member(String),
    /// Binary operation: comparison or AND/OR composition.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Logical negation of the inner predicate.
    Not(Box<Expr>),
    /// String-matching call on a member (substring/prefix/suffix).
    Call {
        func: StrFunc,
        member: Box<Expr>,
        arg: Box<Expr>,
    },
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Value(v) => write!(f, "{}", v),
            Expr::Member(name) => write!(f, "{}", name),
            Expr::Binary { op, lhs, rhs } => {
                write!(f, "({} {} {})", lhs, op.sql_symbol(), rhs)
            }
            Expr::Not(inner) => write!(f, "NOT ({})", inner),
            Expr::Call { func, member, arg } => {
                write!(f, "{:?}({}, {})", func, member, arg)
            }
        }
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Value(v)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Value(Value::Bool(b))
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::Value(Value::Int(n as i64))
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::Value(Value::Int(n))
    }
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::Value(Value::Float(n))
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Value(Value::Text(s.to_string()))
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Value(Value::Text(s))
    }
}

impl From<uuid::Uuid> for Expr {
    fn from(u: uuid::Uuid) -> Self {
        Expr::Value(Value::Uuid(u))
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Expr {
    fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Expr::Value(Value::DateTime(dt))
    }
}

impl From<rust_decimal::Decimal> for Expr {
    fn from(d: rust_decimal::Decimal) -> Self {
        Expr::Value(Value::Decimal(d))
    }
}
