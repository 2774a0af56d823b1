//! The caller-supplied connection boundary.
//!
//! The engine owns no pool and no runtime: it borrows a connection, hands
//! it compiled commands, and reads rows back through a forward-only
//! cursor. Transactions are connection state, driven by
//! BEGIN/COMMIT/ROLLBACK-style calls on the connection itself.

use std::collections::VecDeque;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ast::Value;
use crate::error::RelqResult;
use crate::transpiler::SqlCommand;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Closed,
    Open,
    Broken,
}

/// Transaction isolation level, passed through to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// A forward-only result cursor.
///
/// `advance` yields one row of values ordered like [`RowCursor::columns`],
/// or `None` when the result set is exhausted. Callers may stop early; the
/// owner of the underlying connection handles final cleanup.
pub trait RowCursor {
    /// Result column names, in result order.
    fn columns(&self) -> &[String];
    /// Fetch the next row.
    fn advance(&mut self) -> RelqResult<Option<Vec<Value>>>;
}

/// A synchronous relational connection.
pub trait Connection {
    fn state(&self) -> ConnectionState;
    fn open(&mut self) -> RelqResult<()>;
    fn close(&mut self) -> RelqResult<()>;

    /// Run a command, returning the affected-row count.
    fn execute(&mut self, cmd: &SqlCommand) -> RelqResult<u64>;

    /// Run a command, returning a row cursor.
    fn query(&mut self, cmd: &SqlCommand) -> RelqResult<Box<dyn RowCursor + Send>>;

    fn begin(&mut self, isolation: IsolationLevel) -> RelqResult<()>;
    fn commit(&mut self) -> RelqResult<()>;
    fn rollback(&mut self) -> RelqResult<()>;
    fn in_transaction(&self) -> bool;
}

/// Async counterpart of [`RowCursor`]; `advance` is the cursor's only
/// suspension point.
#[async_trait]
pub trait AsyncRowCursor: Send {
    fn columns(&self) -> &[String];
    async fn advance(&mut self) -> RelqResult<Option<Vec<Value>>>;
}

/// Async counterpart of [`Connection`]. Operations suspend only at I/O.
#[async_trait]
pub trait AsyncConnection: Send {
    fn state(&self) -> ConnectionState;
    async fn open(&mut self) -> RelqResult<()>;
    async fn close(&mut self) -> RelqResult<()>;

    async fn execute(&mut self, cmd: &SqlCommand) -> RelqResult<u64>;
    async fn query(&mut self, cmd: &SqlCommand) -> RelqResult<Box<dyn AsyncRowCursor>>;

    async fn begin(&mut self, isolation: IsolationLevel) -> RelqResult<()>;
    async fn commit(&mut self) -> RelqResult<()>;
    async fn rollback(&mut self) -> RelqResult<()>;
    fn in_transaction(&self) -> bool;
}

/// An in-memory row set, usable as either cursor flavor.
///
/// Drivers that materialize their results wrap them in `Rows`; tests and
/// callers can construct them directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
}

impl Rows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

impl RowCursor for Rows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn advance(&mut self) -> RelqResult<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }
}

#[async_trait]
impl AsyncRowCursor for Rows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn advance(&mut self) -> RelqResult<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_drain_in_order() {
        let mut rows = Rows::new(
            vec!["id".to_string()],
            vec![vec![Value::Int(1)], vec![Value::Int(2)]],
        );
        assert_eq!(RowCursor::advance(&mut rows).unwrap(), Some(vec![Value::Int(1)]));
        assert_eq!(RowCursor::advance(&mut rows).unwrap(), Some(vec![Value::Int(2)]));
        assert_eq!(RowCursor::advance(&mut rows).unwrap(), None);
    }

    #[test]
    fn test_isolation_sql() {
        assert_eq!(IsolationLevel::Serializable.as_sql(), "SERIALIZABLE");
        assert_eq!(IsolationLevel::default(), IsolationLevel::ReadCommitted);
    }
}
