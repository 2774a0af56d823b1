//! UPDATE SQL generation.

use crate::transpiler::Dialect;

/// Generate UPDATE SQL. Assignments are `col = placeholder` fragments;
/// a `None` where-clause updates every row and is only ever produced by
/// an explicit all-rows scope.
pub fn build_update(
    table: &str,
    assignments: &[String],
    where_clause: Option<&str>,
    dialect: &Dialect,
) -> String {
    let mut sql = String::from("UPDATE ");
    sql.push_str(&dialect.quote_identifier(table));
    sql.push_str(" SET ");
    sql.push_str(&assignments.join(", "));

    if let Some(filter) = where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }

    sql
}
