use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RelqError;

/// Binary operators over expression nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Logical AND
    And,
    /// Logical OR
    Or,
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// LIKE pattern match
    Like,
}

impl BinaryOp {
    /// The SQL symbol/keyword for this operator.
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Like => "LIKE",
        }
    }

    /// True for AND/OR.
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// String-matching member calls compiled to LIKE patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrFunc {
    /// Substring match -> `%v%`
    Contains,
    /// Prefix match -> `v%`
    StartsWith,
    /// Suffix match -> `%v`
    EndsWith,
}

impl StrFunc {
    /// Wrap the needle in the LIKE wildcards for this function.
    pub fn pattern(&self, needle: &str) -> String {
        match self {
            StrFunc::Contains => format!("%{}%", needle),
            StrFunc::StartsWith => format!("{}%", needle),
            StrFunc::EndsWith => format!("%{}", needle),
        }
    }
}

/// Sort order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl std::fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateFunc::Count => write!(f, "COUNT"),
            AggregateFunc::Sum => write!(f, "SUM"),
            AggregateFunc::Avg => write!(f, "AVG"),
            AggregateFunc::Min => write!(f, "MIN"),
            AggregateFunc::Max => write!(f, "MAX"),
        }
    }
}

impl FromStr for AggregateFunc {
    type Err = RelqError;

    /// Parse a function name, case-insensitively. Unknown names fail fast
    /// so a typo never silently aggregates to NULL.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "count" => Ok(AggregateFunc::Count),
            "sum" => Ok(AggregateFunc::Sum),
            "avg" => Ok(AggregateFunc::Avg),
            "min" => Ok(AggregateFunc::Min),
            "max" => Ok(AggregateFunc::Max),
            _ => Err(RelqError::UnknownAggregate(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_parse() {
        assert_eq!("Sum".parse::<AggregateFunc>().unwrap(), AggregateFunc::Sum);
        assert!("median".parse::<AggregateFunc>().is_err());
    }

    #[test]
    fn test_like_patterns() {
        assert_eq!(StrFunc::Contains.pattern("v"), "%v%");
        assert_eq!(StrFunc::StartsWith.pattern("v"), "v%");
        assert_eq!(StrFunc::EndsWith.pattern("v"), "%v");
    }
}
