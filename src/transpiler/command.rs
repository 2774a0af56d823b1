use std::time::Duration;

use crate::ast::Value;
use crate::transpiler::Dialect;

/// Default command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One bound parameter: generated placeholder name plus its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

/// A compiled command: SQL text, ordered parameters, timeout.
///
/// Commands are created per operation, handed to the caller's connection
/// for execution, and discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlCommand {
    pub text: String,
    pub params: Vec<Parameter>,
    pub timeout: Duration,
}

impl SqlCommand {
    /// A parameterless command with the default timeout.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Substitute bound values into the command text as dialect literals.
    ///
    /// Diagnostic/logging aid only — the result is never executed, and
    /// execution paths always keep values bound.
    pub fn to_raw_sql(&self, dialect: &Dialect) -> String {
        let mut sql = self.text.clone();
        // Highest index first so @p1 never clobbers the tail of @p10.
        for param in self.params.iter().rev() {
            sql = sql.replace(&param.name, &dialect.literal(&param.value));
        }
        sql
    }
}
