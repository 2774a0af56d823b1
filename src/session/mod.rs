//! CRUD and aggregation engines over a borrowed connection.

pub mod aggregate;
pub mod async_session;
pub mod crud;
pub(crate) mod plan;

pub use self::aggregate::PageInfo;
pub use self::async_session::AsyncSession;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ast::{Expr, SortOrder};
use crate::conn::{Connection, IsolationLevel};
use crate::transpiler::{DEFAULT_TIMEOUT, Dialect};

/// Per-session settings; every compiled command inherits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub dialect: Dialect,
    /// Command timeout (default 30 seconds).
    pub timeout: Duration,
    /// Isolation level for engine-opened transactions.
    pub isolation: IsolationLevel,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            timeout: DEFAULT_TIMEOUT,
            isolation: IsolationLevel::default(),
        }
    }
}

/// The explicit target of a predicate-scoped update or delete.
///
/// There is deliberately no "absent predicate" form: touching every row
/// requires spelling [`Scope::AllRows`] at the call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scope {
    /// Rows matching the predicate.
    Rows(Expr),
    /// Every row in the table. Spell it out.
    AllRows,
}

impl From<Expr> for Scope {
    fn from(expr: Expr) -> Self {
        Scope::Rows(expr)
    }
}

/// A read specification: filter, ordering, projection, window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filter: Option<Expr>,
    pub order: Vec<(String, SortOrder)>,
    /// Member-name projection; `None` selects every mapped column.
    pub columns: Option<Vec<String>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to rows matching the predicate.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(expr);
        self
    }

    /// Append an order-by member.
    pub fn order_by(mut self, member: impl Into<String>, order: SortOrder) -> Self {
        self.order.push((member.into(), order));
        self
    }

    /// Project onto the named members only.
    pub fn select(mut self, members: &[&str]) -> Self {
        self.columns = Some(members.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: usize) -> Self {
        self.offset = Some(n);
        self
    }
}

/// Insert knobs: identity retrieval and column subset.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertOptions<'a> {
    /// Scalar query run on the same connection/transaction after the
    /// insert to fetch a generated identity (e.g. `SELECT lastval()`).
    pub id_query: Option<&'a str>,
    /// Member subset to insert; `None` means every non-key member.
    pub columns: Option<&'a [&'a str]>,
}

/// Synchronous engine facade borrowing a caller-owned connection.
///
/// The connection is assumed non-thread-safe; serializing access to it is
/// the caller's responsibility.
pub struct Session<'c, C: Connection> {
    pub(crate) conn: &'c mut C,
    pub(crate) config: SessionConfig,
}

impl<'c, C: Connection> Session<'c, C> {
    pub fn new(conn: &'c mut C) -> Self {
        Self::with_config(conn, SessionConfig::default())
    }

    pub fn with_config(conn: &'c mut C, config: SessionConfig) -> Self {
        Self { conn, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }
}
