//! Predicate, projection, and order-by translation.

use crate::ast::{BinaryOp, Expr, SortOrder, Value, ValueKind};
use crate::entity::EntityDescriptor;
use crate::error::{RelqError, RelqResult};
use crate::transpiler::command::Parameter;
use crate::transpiler::Dialect;

/// Collects bound parameters while a command is being compiled.
///
/// Placeholder names are sequential (1-based) and unique within the
/// command, so repeated translation of the same tree is byte-identical.
#[derive(Debug)]
pub struct ParamContext<'d> {
    dialect: &'d Dialect,
    params: Vec<Parameter>,
}

impl<'d> ParamContext<'d> {
    pub fn new(dialect: &'d Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    /// Bind a value and return its placeholder.
    pub fn push(&mut self, value: Value) -> String {
        let name = self.dialect.placeholder(self.params.len() + 1);
        self.params.push(Parameter {
            name: name.clone(),
            value,
        });
        name
    }

    pub fn into_params(self) -> Vec<Parameter> {
        self.params
    }

    pub fn dialect(&self) -> &Dialect {
        self.dialect
    }
}

/// Compile a predicate tree into a WHERE fragment, binding constants into
/// `ctx` as it walks.
pub fn translate(
    expr: &Expr,
    descriptor: &EntityDescriptor,
    ctx: &mut ParamContext<'_>,
) -> RelqResult<String> {
    match expr {
        Expr::Binary { op, lhs, rhs } if op.is_logical() => {
            let left = translate(lhs, descriptor, ctx)?;
            let right = translate(rhs, descriptor, ctx)?;
            Ok(format!("({} {} {})", left, op.sql_symbol(), right))
        }
        Expr::Binary { op, lhs, rhs } => translate_comparison(*op, lhs, rhs, descriptor, ctx),
        Expr::Not(inner) => {
            let inner_sql = translate(inner, descriptor, ctx)?;
            Ok(format!("NOT ({inner_sql})"))
        }
        Expr::Call { func, member, arg } => {
            let column = column_of(member, descriptor, ctx)?;
            let needle = match arg.as_ref() {
                Expr::Value(Value::Text(s)) => s,
                other => {
                    return Err(RelqError::Unsupported(format!(
                        "string match argument must be a text constant, got {other}"
                    )));
                }
            };
            let placeholder = ctx.push(Value::Text(func.pattern(needle)));
            Ok(format!("{column} LIKE {placeholder}"))
        }
        // A bare boolean member reads as `member = true`.
        Expr::Member(name) => {
            let member = descriptor.require_member(name)?;
            if member.kind != ValueKind::Bool {
                return Err(RelqError::Unsupported(format!(
                    "member '{name}' cannot stand alone as a predicate"
                )));
            }
            let column = ctx.dialect.quote_identifier(member.column);
            let placeholder = ctx.push(Value::Bool(true));
            Ok(format!("{column} = {placeholder}"))
        }
        Expr::Value(v) => Err(RelqError::Unsupported(format!(
            "constant {v} cannot stand alone as a predicate"
        ))),
    }
}

fn translate_comparison(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    descriptor: &EntityDescriptor,
    ctx: &mut ParamContext<'_>,
) -> RelqResult<String> {
    // Comparisons against the NULL constant compile to IS [NOT] NULL.
    let null_side = match (lhs, rhs) {
        (Expr::Value(Value::Null), Expr::Value(Value::Null)) => {
            return Err(RelqError::Unsupported(
                "cannot compare NULL with NULL".to_string(),
            ));
        }
        (other, Expr::Value(Value::Null)) | (Expr::Value(Value::Null), other) => Some(other),
        _ => None,
    };
    if let Some(side) = null_side {
        let column = column_of(side, descriptor, ctx)?;
        return match op {
            BinaryOp::Eq => Ok(format!("{column} IS NULL")),
            BinaryOp::Ne => Ok(format!("{column} IS NOT NULL")),
            _ => Err(RelqError::Unsupported(format!(
                "operator {} does not apply to NULL",
                op.sql_symbol()
            ))),
        };
    }

    let left = operand(lhs, descriptor, ctx)?;
    let right = operand(rhs, descriptor, ctx)?;
    Ok(format!("{} {} {}", left, op.sql_symbol(), right))
}

/// A comparison operand: a member access (column) or a constant (parameter).
fn operand(
    expr: &Expr,
    descriptor: &EntityDescriptor,
    ctx: &mut ParamContext<'_>,
) -> RelqResult<String> {
    match expr {
        Expr::Member(name) => {
            let member = descriptor.require_member(name)?;
            Ok(ctx.dialect.quote_identifier(member.column))
        }
        Expr::Value(v) => Ok(ctx.push(v.clone())),
        other => Err(RelqError::Unsupported(format!(
            "comparison operand must be a member or constant, got {other}"
        ))),
    }
}

fn column_of(
    expr: &Expr,
    descriptor: &EntityDescriptor,
    ctx: &mut ParamContext<'_>,
) -> RelqResult<String> {
    match expr {
        Expr::Member(name) => {
            let member = descriptor.require_member(name)?;
            Ok(ctx.dialect.quote_identifier(member.column))
        }
        other => Err(RelqError::Unsupported(format!(
            "expected a member access, got {other}"
        ))),
    }
}

/// Resolve a projection (member-name list) to quoted column names.
pub fn translate_projection(
    members: &[String],
    descriptor: &EntityDescriptor,
    dialect: &Dialect,
) -> RelqResult<Vec<String>> {
    members
        .iter()
        .map(|name| {
            let member = descriptor.require_member(name)?;
            Ok(dialect.quote_identifier(member.column))
        })
        .collect()
}

/// Compile an order-by list into its SQL fragment.
pub fn translate_order_by(
    pairs: &[(String, SortOrder)],
    descriptor: &EntityDescriptor,
    dialect: &Dialect,
) -> RelqResult<String> {
    let parts: Vec<String> = pairs
        .iter()
        .map(|(name, order)| {
            let member = descriptor.require_member(name)?;
            Ok(format!(
                "{} {}",
                dialect.quote_identifier(member.column),
                order.as_sql()
            ))
        })
        .collect::<RelqResult<_>>()?;
    Ok(parts.join(", "))
}
