pub mod builders;
pub mod expr;
pub mod operators;
pub mod values;

pub use self::builders::{member, value};
pub use self::expr::Expr;
pub use self::operators::{AggregateFunc, BinaryOp, SortOrder, StrFunc};
pub use self::values::{Value, ValueKind};
