//! Fluent builders for predicate trees.

use crate::ast::{BinaryOp, Expr, StrFunc, Value};

/// Reference an entity member by name.
pub fn member(name: impl Into<String>) -> Expr {
    Expr::Member(name.into())
}

/// Lift a constant into an expression node.
pub fn value(v: impl Into<Value>) -> Expr {
    Expr::Value(v.into())
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

impl Expr {
    /// `self = rhs`
    pub fn eq(self, rhs: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Eq, self, rhs.into())
    }

    /// `self != rhs`
    pub fn ne(self, rhs: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Ne, self, rhs.into())
    }

    /// `self > rhs`
    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Gt, self, rhs.into())
    }

    /// `self >= rhs`
    pub fn gte(self, rhs: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Gte, self, rhs.into())
    }

    /// `self < rhs`
    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Lt, self, rhs.into())
    }

    /// `self <= rhs`
    pub fn lte(self, rhs: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Lte, self, rhs.into())
    }

    /// `self LIKE pattern` (pattern passed through verbatim)
    pub fn like(self, pattern: impl Into<String>) -> Expr {
        binary(BinaryOp::Like, self, Expr::Value(Value::Text(pattern.into())))
    }

    /// `(self AND rhs)`
    pub fn and(self, rhs: Expr) -> Expr {
        binary(BinaryOp::And, self, rhs)
    }

    /// `(self OR rhs)`
    pub fn or(self, rhs: Expr) -> Expr {
        binary(BinaryOp::Or, self, rhs)
    }

    /// `NOT (self)`
    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }

    /// `self IS NULL`
    pub fn is_null(self) -> Expr {
        self.eq(Value::Null)
    }

    /// `self IS NOT NULL`
    pub fn is_not_null(self) -> Expr {
        self.ne(Value::Null)
    }

    /// Substring match, compiled to `LIKE '%needle%'`.
    pub fn contains(self, needle: impl Into<String>) -> Expr {
        str_call(StrFunc::Contains, self, needle.into())
    }

    /// Prefix match, compiled to `LIKE 'needle%'`.
    pub fn starts_with(self, needle: impl Into<String>) -> Expr {
        str_call(StrFunc::StartsWith, self, needle.into())
    }

    /// Suffix match, compiled to `LIKE '%needle'`.
    pub fn ends_with(self, needle: impl Into<String>) -> Expr {
        str_call(StrFunc::EndsWith, self, needle.into())
    }
}

fn str_call(func: StrFunc, target: Expr, needle: String) -> Expr {
    Expr::Call {
        func,
        member: Box::new(target),
        arg: Box::new(Expr::Value(Value::Text(needle))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_shapes() {
        let e = member("age").gt(18).and(member("name").eq("A"));
        match e {
            Expr::Binary {
                op: BinaryOp::And, ..
            } => {}
            other => panic!("expected AND root, got {other}"),
        }
    }

    #[test]
    fn test_is_null_is_eq_null() {
        assert_eq!(member("name").is_null(), member("name").eq(Value::Null));
    }
}
