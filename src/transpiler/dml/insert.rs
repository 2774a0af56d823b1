//! INSERT SQL generation.

use crate::transpiler::Dialect;

/// Generate INSERT SQL. Columns are already quoted, placeholders already
/// bound in matching order.
pub fn build_insert(
    table: &str,
    columns: &[String],
    placeholders: &[String],
    dialect: &Dialect,
) -> String {
    let mut sql = String::from("INSERT INTO ");
    sql.push_str(&dialect.quote_identifier(table));
    sql.push_str(" (");
    sql.push_str(&columns.join(", "));
    sql.push_str(") VALUES (");
    sql.push_str(&placeholders.join(", "));
    sql.push(')');
    sql
}
