use serde::{Deserialize, Serialize};

use crate::ast::Value;

/// SQL reserved words that must be quoted when used as identifiers.
const RESERVED_WORDS: &[&str] = &[
    "all", "and", "as", "between", "case", "check", "constraint", "default", "delete", "distinct",
    "else", "end", "from", "group", "having", "in", "index", "insert", "is", "join", "key", "left",
    "like", "limit", "not", "null", "offset", "on", "or", "order", "primary", "right", "select",
    "table", "then", "union", "update", "user", "when", "where",
];

/// Formatting policy for one SQL dialect: identifier quoting, parameter
/// placeholders, and the literal tokens used when bound values are
/// substituted into command text for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dialect {
    /// Parameter placeholder prefix (`@` -> `@p1`, `@p2`, ...).
    pub param_prefix: String,
    /// strftime format for date-time literals.
    pub date_format: String,
    /// Delimiter around string literals.
    pub string_delimiter: char,
    /// Token emitted for NULL.
    pub null_token: String,
    /// Token emitted for true.
    pub true_token: String,
    /// Token emitted for false.
    pub false_token: String,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            param_prefix: "@".to_string(),
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
            string_delimiter: '\'',
            null_token: "NULL".to_string(),
            true_token: "true".to_string(),
            false_token: "false".to_string(),
        }
    }
}

impl Dialect {
    /// The placeholder for the n-th parameter (1-based).
    pub fn placeholder(&self, index: usize) -> String {
        format!("{}p{}", self.param_prefix, index)
    }

    /// Quote an identifier if it is a reserved word or contains special
    /// characters. Dotted identifiers are quoted part by part.
    pub fn quote_identifier(&self, name: &str) -> String {
        if name.contains('.') {
            return name
                .split('.')
                .map(|part| self.quote_single(part))
                .collect::<Vec<_>>()
                .join(".");
        }
        self.quote_single(name)
    }

    fn quote_single(&self, name: &str) -> String {
        let lower = name.to_lowercase();
        let needs_quoting = RESERVED_WORDS.contains(&lower.as_str())
            || name.chars().any(|c| !c.is_alphanumeric() && c != '_')
            || name.chars().next().is_some_and(|c| c.is_numeric());

        if needs_quoting {
            format!("\"{}\"", name.replace('"', "\"\""))
        } else {
            name.to_string()
        }
    }

    /// Render a value as a SQL literal. Used only for the non-executing
    /// raw materialization of a command; execution always binds parameters.
    pub fn literal(&self, value: &Value) -> String {
        let delim = self.string_delimiter;
        let quote = |s: &str| {
            format!(
                "{delim}{}{delim}",
                s.replace(delim, &format!("{delim}{delim}"))
            )
        };
        match value {
            Value::Null => self.null_token.clone(),
            Value::Bool(true) => self.true_token.clone(),
            Value::Bool(false) => self.false_token.clone(),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Text(s) => quote(s),
            Value::Uuid(u) => quote(&u.to_string()),
            Value::DateTime(dt) => quote(&dt.format(&self.date_format).to_string()),
            Value::Bytes(b) => quote(&hex_encode(b)),
            Value::Json(j) => quote(&j.to_string()),
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
