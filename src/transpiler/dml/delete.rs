//! DELETE SQL generation.

use crate::transpiler::Dialect;

/// Generate DELETE SQL. A `None` where-clause deletes every row and is
/// only ever produced by an explicit all-rows scope.
pub fn build_delete(table: &str, where_clause: Option<&str>, dialect: &Dialect) -> String {
    let mut sql = String::from("DELETE FROM ");
    sql.push_str(&dialect.quote_identifier(table));

    if let Some(filter) = where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }

    sql
}
