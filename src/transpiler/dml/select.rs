//! SELECT SQL generation.

use crate::transpiler::Dialect;

/// Generate SELECT SQL from pre-translated fragments.
pub fn build_select(
    table: &str,
    columns: &[String],
    where_clause: Option<&str>,
    order_by: Option<&str>,
    limit: Option<usize>,
    offset: Option<usize>,
    dialect: &Dialect,
) -> String {
    let mut sql = String::from("SELECT ");

    if columns.is_empty() {
        sql.push('*');
    } else {
        sql.push_str(&columns.join(", "));
    }

    sql.push_str(" FROM ");
    sql.push_str(&dialect.quote_identifier(table));

    if let Some(filter) = where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }

    if let Some(order) = order_by {
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
    }

    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {n}"));
    }
    if let Some(n) = offset {
        sql.push_str(&format!(" OFFSET {n}"));
    }

    sql
}
