//! Aggregation and paging.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::{AggregateFunc, Expr, Value};
use crate::conn::Connection;
use crate::entity::Entity;
use crate::error::{RelqError, RelqResult};
use crate::session::Session;
use crate::session::plan::plan_aggregate;

/// One page of a fixed-size paging scheme: zero-based number, row offset,
/// and the number of rows on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub number: u64,
    pub offset: u64,
    pub count: u64,
}

/// Compute the page list for a total row count. The final page carries the
/// remainder unless it divides evenly.
pub(crate) fn pages_for(total: u64, page_size: u64) -> Vec<PageInfo> {
    let mut pages = Vec::new();
    let mut number = 0;
    let mut offset = 0;
    while offset < total {
        let count = page_size.min(total - offset);
        pages.push(PageInfo {
            number,
            offset,
            count,
        });
        number += 1;
        offset += page_size;
    }
    pages
}

impl<C: Connection> Session<'_, C> {
    fn aggregate_scalar<T: Entity>(
        &mut self,
        func: AggregateFunc,
        selector: Option<&str>,
        filter: Option<&Expr>,
    ) -> RelqResult<Value> {
        let (cmd, _) = plan_aggregate::<T>(&[(func, selector)], filter, &self.config)?;
        self.run_scalar(&cmd)
    }

    /// Row count, optionally filtered.
    pub fn count<T: Entity>(&mut self, filter: Option<&Expr>) -> RelqResult<u64> {
        match self.aggregate_scalar::<T>(AggregateFunc::Count, None, filter)? {
            Value::Int(n) if n >= 0 => Ok(n as u64),
            Value::Null => Ok(0),
            other => Err(RelqError::InvalidValue(format!(
                "COUNT returned {other}"
            ))),
        }
    }

    /// SUM over a member; NULL for an empty input.
    pub fn sum<T: Entity>(&mut self, member: &str, filter: Option<&Expr>) -> RelqResult<Value> {
        self.aggregate_scalar::<T>(AggregateFunc::Sum, Some(member), filter)
    }

    /// MIN over a member.
    pub fn min<T: Entity>(&mut self, member: &str, filter: Option<&Expr>) -> RelqResult<Value> {
        self.aggregate_scalar::<T>(AggregateFunc::Min, Some(member), filter)
    }

    /// MAX over a member.
    pub fn max<T: Entity>(&mut self, member: &str, filter: Option<&Expr>) -> RelqResult<Value> {
        self.aggregate_scalar::<T>(AggregateFunc::Max, Some(member), filter)
    }

    /// AVG over a member.
    pub fn avg<T: Entity>(&mut self, member: &str, filter: Option<&Expr>) -> RelqResult<Value> {
        self.aggregate_scalar::<T>(AggregateFunc::Avg, Some(member), filter)
    }

    /// Apply one aggregate function (by name) to several members in a
    /// single query; returns column-name → value. An unknown function name
    /// fails before any SQL is built.
    pub fn aggregate<T: Entity>(
        &mut self,
        function: &str,
        members: &[&str],
    ) -> RelqResult<HashMap<String, Value>> {
        let func: AggregateFunc = function.parse()?;
        let calls: Vec<_> = members.iter().map(|m| (func, Some(*m))).collect();
        let (cmd, labels) = plan_aggregate::<T>(&calls, None, &self.config)?;

        let mut cursor = self.run_query(&cmd)?;
        let row = cursor.advance()?.unwrap_or_default();
        Ok(labels.into_iter().zip(row).collect())
    }

    /// Apply several aggregate functions (by name) to several members in a
    /// single query; returns column-name → values in function order.
    pub fn aggregate_all<T: Entity>(
        &mut self,
        functions: &[&str],
        members: &[&str],
    ) -> RelqResult<HashMap<String, Vec<Value>>> {
        let funcs: Vec<AggregateFunc> = functions
            .iter()
            .map(|f| f.parse())
            .collect::<RelqResult<_>>()?;

        let mut calls = Vec::with_capacity(funcs.len() * members.len());
        for member in members {
            for func in &funcs {
                calls.push((*func, Some(*member)));
            }
        }
        let (cmd, labels) = plan_aggregate::<T>(&calls, None, &self.config)?;

        let mut cursor = self.run_query(&cmd)?;
        let row = cursor.advance()?.unwrap_or_default();

        let mut out: HashMap<String, Vec<Value>> = HashMap::new();
        for (label, value) in labels.into_iter().zip(row) {
            out.entry(label).or_default().push(value);
        }
        Ok(out)
    }

    /// `ceil(total / page_size)`.
    pub fn pages_count<T: Entity>(&mut self, page_size: u64) -> RelqResult<u64> {
        if page_size == 0 {
            return Err(RelqError::InvalidValue("page size must be > 0".to_string()));
        }
        let total = self.count::<T>(None)?;
        Ok(total.div_ceil(page_size))
    }

    /// The full page list for the current row count.
    pub fn pages<T: Entity>(&mut self, page_size: u64) -> RelqResult<Vec<PageInfo>> {
        if page_size == 0 {
            return Err(RelqError::InvalidValue("page size must be > 0".to_string()));
        }
        let total = self.count::<T>(None)?;
        Ok(pages_for(total, page_size))
    }
}
