//! Asynchronous CRUD and aggregation engine.
//!
//! Mirrors [`Session`](crate::session::Session) over [`AsyncConnection`];
//! commands are planned by the same code, so both forms compile identical
//! SQL. Operations suspend only at command execution and cursor advance,
//! and dropping a returned future abandons the pending I/O there.

use std::collections::HashMap;

use crate::ast::{AggregateFunc, Expr, Value};
use crate::conn::{AsyncConnection, AsyncRowCursor, ConnectionState};
use crate::entity::Entity;
use crate::error::{RelqError, RelqResult};
use crate::mapper::{MapOptions, map_rows_async};
use crate::session::aggregate::{PageInfo, pages_for};
use crate::session::plan::{
    plan_aggregate, plan_delete_by_key, plan_delete_where, plan_insert, plan_select,
    plan_update_by_key, plan_update_where,
};
use crate::session::{InsertOptions, Query, Scope, SessionConfig};
use crate::transpiler::SqlCommand;

/// Asynchronous engine facade borrowing a caller-owned connection.
pub struct AsyncSession<'c, C: AsyncConnection> {
    conn: &'c mut C,
    config: SessionConfig,
}

impl<'c, C: AsyncConnection> AsyncSession<'c, C> {
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

    async fn ensure_open(&mut self) -> RelqResult<()> {
        if self.conn.state() != ConnectionState::Open {
            let _ = self.conn.close().await;
            self.conn.open().await?;
        }
        Ok(())
    }

    async fn run_execute(&mut self, cmd: &SqlCommand) -> RelqResult<u64> {
        self.ensure_open().await?;
        tracing::debug!(sql = %cmd.text, params = cmd.params.len(), "execute");
        match self.conn.execute(cmd).await {
            Err(RelqError::Connection(reason)) if !self.conn.in_transaction() => {
                tracing::warn!(%reason, "connection failed; reopening once");
                let _ = self.conn.close().await;
                self.conn.open().await?;
                self.conn.execute(cmd).await
            }
            other => other,
        }
    }

    async fn run_query(&mut self, cmd: &SqlCommand) -> RelqResult<Box<dyn AsyncRowCursor>> {
        self.ensure_open().await?;
        tracing::debug!(sql = %cmd.text, params = cmd.params.len(), "query");
        match self.conn.query(cmd).await {
            Err(RelqError::Connection(reason)) if !self.conn.in_transaction() => {
                tracing::warn!(%reason, "connection failed; reopening once");
                let _ = self.conn.close().await;
                self.conn.open().await?;
                self.conn.query(cmd).await
            }
            other => other,
        }
    }

    async fn run_scalar(&mut self, cmd: &SqlCommand) -> RelqResult<Value> {
        let mut cursor = self.run_query(cmd).await?;
        Ok(cursor
            .advance()
            .await?
            .and_then(|row| row.into_iter().next())
            .unwrap_or(Value::Null))
    }

    async fn begin_batch(&mut self) -> RelqResult<bool> {
        let owned = !self.conn.in_transaction();
        if owned {
            self.ensure_open().await?;
            self.conn.begin(self.config.isolation).await?;
        }
        Ok(owned)
    }

    async fn finish_batch<R>(&mut self, owned: bool, result: RelqResult<R>) -> RelqResult<R> {
        match result {
            Ok(value) => {
                if owned {
                    self.conn.commit().await?;
                }
                Ok(value)
            }
            Err(err) => {
                if owned {
                    if let Err(rb) = self.conn.rollback().await {
                        tracing::warn!(error = %rb, "rollback failed");
                    }
                }
                Err(err)
            }
        }
    }

    /// Insert one entity; returns the affected-row count.
    pub async fn insert<T: Entity>(&mut self, entity: &T) -> RelqResult<u64> {
        let cmd = plan_insert(entity, None, &self.config)?;
        self.run_execute(&cmd).await
    }

    /// Insert one entity with options. Returns the generated identity when
    /// an `id_query` was supplied.
    pub async fn insert_with<T: Entity>(
        &mut self,
        entity: &T,
        opts: &InsertOptions<'_>,
    ) -> RelqResult<Option<Value>> {
        let cmd = plan_insert(entity, opts.columns, &self.config)?;
        self.run_execute(&cmd).await?;
        match opts.id_query {
            Some(query) if !query.is_empty() => {
                let id_cmd = SqlCommand::new(query).with_timeout(self.config.timeout);
                Ok(Some(self.run_scalar(&id_cmd).await?))
            }
            _ => Ok(None),
        }
    }

    /// Insert a batch inside one transaction; all-or-nothing.
    pub async fn insert_range<T: Entity>(&mut self, entities: &[T]) -> RelqResult<u64> {
        let owned = self.begin_batch().await?;
        let mut affected = 0;
        let mut outcome = Ok(());
        for entity in entities {
            match self.insert(entity).await {
                Ok(n) => affected += n,
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        self.finish_batch(owned, outcome.map(|()| affected)).await
    }

    /// Batch insert with options; one identity slot per entity.
    pub async fn insert_range_with<T: Entity>(
        &mut self,
        entities: &[T],
        opts: &InsertOptions<'_>,
    ) -> RelqResult<Vec<Option<Value>>> {
        let owned = self.begin_batch().await?;
        let mut ids = Vec::with_capacity(entities.len());
        let mut outcome = Ok(());
        for entity in entities {
            match self.insert_with(entity, opts).await {
                Ok(id) => ids.push(id),
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        self.finish_batch(owned, outcome.map(|()| ids)).await
    }

    /// Update one entity by its key columns.
    pub async fn update<T: Entity>(&mut self, entity: &T) -> RelqResult<u64> {
        let cmd = plan_update_by_key(entity, None, &self.config)?;
        self.run_execute(&cmd).await
    }

    /// Key-scoped update writing only the named members.
    pub async fn update_columns<T: Entity>(
        &mut self,
        entity: &T,
        columns: &[&str],
    ) -> RelqResult<u64> {
        let cmd = plan_update_by_key(entity, Some(columns), &self.config)?;
        self.run_execute(&cmd).await
    }

    /// Predicate-scoped update taking its values from `entity`.
    pub async fn update_where<T: Entity>(
        &mut self,
        entity: &T,
        scope: &Scope,
        columns: Option<&[&str]>,
    ) -> RelqResult<u64> {
        let cmd = plan_update_where(entity, scope, columns, &self.config)?;
        self.run_execute(&cmd).await
    }

    /// Batch update inside one transaction; all-or-nothing.
    pub async fn update_range<T: Entity>(&mut self, entities: &[T]) -> RelqResult<u64> {
        let owned = self.begin_batch().await?;
        let mut affected = 0;
        let mut outcome = Ok(());
        for entity in entities {
            match self.update(entity).await {
                Ok(n) => affected += n,
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        self.finish_batch(owned, outcome.map(|()| affected)).await
    }

    /// Delete one entity by its key columns.
    pub async fn delete<T: Entity>(&mut self, entity: &T) -> RelqResult<u64> {
        let cmd = plan_delete_by_key(entity, &self.config)?;
        self.run_execute(&cmd).await
    }

    /// Predicate-scoped delete; all rows only via [`Scope::AllRows`].
    pub async fn delete_where<T: Entity>(&mut self, scope: &Scope) -> RelqResult<u64> {
        let cmd = plan_delete_where::<T>(scope, &self.config)?;
        self.run_execute(&cmd).await
    }

    /// Batch delete inside one transaction; all-or-nothing.
    pub async fn delete_range<T: Entity>(&mut self, entities: &[T]) -> RelqResult<u64> {
        let owned = self.begin_batch().await?;
        let mut affected = 0;
        let mut outcome = Ok(());
        for entity in entities {
            match self.delete(entity).await {
                Ok(n) => affected += n,
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        self.finish_batch(owned, outcome.map(|()| affected)).await
    }

    /// Fetch entities matching the query.
    pub async fn fetch<T: Entity>(&mut self, query: &Query) -> RelqResult<Vec<T>> {
        self.fetch_with(query, &MapOptions::default()).await
    }

    /// Fetch with explicit mapping options.
    pub async fn fetch_with<T: Entity>(
        &mut self,
        query: &Query,
        opts: &MapOptions<'_, T>,
    ) -> RelqResult<Vec<T>> {
        let cmd = plan_select::<T>(query, &self.config)?;
        let mut cursor = self.run_query(&cmd).await?;
        map_rows_async(cursor.as_mut(), opts).await
    }

    /// First matching entity, if any.
    pub async fn fetch_optional<T: Entity>(&mut self, query: &Query) -> RelqResult<Option<T>> {
        Ok(self
            .fetch_with(query, &MapOptions::first())
            .await?
            .into_iter()
            .next())
    }

    /// First matching entity, or `T::default()` when nothing matched.
    pub async fn fetch_first<T: Entity>(&mut self, query: &Query) -> RelqResult<T> {
        Ok(self.fetch_optional(query).await?.unwrap_or_default())
    }

    async fn aggregate_scalar<T: Entity>(
        &mut self,
        func: AggregateFunc,
        selector: Option<&str>,
        filter: Option<&Expr>,
    ) -> RelqResult<Value> {
        let (cmd, _) = plan_aggregate::<T>(&[(func, selector)], filter, &self.config)?;
        self.run_scalar(&cmd).await
    }

    /// Row count, optionally filtered.
    pub async fn count<T: Entity>(&mut self, filter: Option<&Expr>) -> RelqResult<u64> {
        match self
            .aggregate_scalar::<T>(AggregateFunc::Count, None, filter)
            .await?
        {
            Value::Int(n) if n >= 0 => Ok(n as u64),
            Value::Null => Ok(0),
            other => Err(RelqError::InvalidValue(format!("COUNT returned {other}"))),
        }
    }

    /// SUM over a member; NULL for an empty input.
    pub async fn sum<T: Entity>(
        &mut self,
        member: &str,
        filter: Option<&Expr>,
    ) -> RelqResult<Value> {
        self.aggregate_scalar::<T>(AggregateFunc::Sum, Some(member), filter)
            .await
    }

    /// MIN over a member.
    pub async fn min<T: Entity>(
        &mut self,
        member: &str,
        filter: Option<&Expr>,
    ) -> RelqResult<Value> {
        self.aggregate_scalar::<T>(AggregateFunc::Min, Some(member), filter)
            .await
    }

    /// MAX over a member.
    pub async fn max<T: Entity>(
        &mut self,
        member: &str,
        filter: Option<&Expr>,
    ) -> RelqResult<Value> {
        self.aggregate_scalar::<T>(AggregateFunc::Max, Some(member), filter)
            .await
    }

    /// AVG over a member.
    pub async fn avg<T: Entity>(
        &mut self,
        member: &str,
        filter: Option<&Expr>,
    ) -> RelqResult<Value> {
        self.aggregate_scalar::<T>(AggregateFunc::Avg, Some(member), filter)
            .await
    }

    /// One aggregate function (by name) over several members.
    pub async fn aggregate<T: Entity>(
        &mut self,
        function: &str,
        members: &[&str],
    ) -> RelqResult<HashMap<String, Value>> {
        let func: AggregateFunc = function.parse()?;
        let calls: Vec<_> = members.iter().map(|m| (func, Some(*m))).collect();
        let (cmd, labels) = plan_aggregate::<T>(&calls, None, &self.config)?;

        let mut cursor = self.run_query(&cmd).await?;
        let row = cursor.advance().await?.unwrap_or_default();
        Ok(labels.into_iter().zip(row).collect())
    }

    /// Several aggregate functions (by name) over several members.
    pub async fn aggregate_all<T: Entity>(
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

        let mut cursor = self.run_query(&cmd).await?;
        let row = cursor.advance().await?.unwrap_or_default();

        let mut out: HashMap<String, Vec<Value>> = HashMap::new();
        for (label, value) in labels.into_iter().zip(row) {
            out.entry(label).or_default().push(value);
        }
        Ok(out)
    }

    /// `ceil(total / page_size)`.
    pub async fn pages_count<T: Entity>(&mut self, page_size: u64) -> RelqResult<u64> {
        if page_size == 0 {
            return Err(RelqError::InvalidValue("page size must be > 0".to_string()));
        }
        let total = self.count::<T>(None).await?;
        Ok(total.div_ceil(page_size))
    }

    /// The full page list for the current row count.
    pub async fn pages<T: Entity>(&mut self, page_size: u64) -> RelqResult<Vec<PageInfo>> {
        if page_size == 0 {
            return Err(RelqError::InvalidValue("page size must be > 0".to_string()));
        }
        let total = self.count::<T>(None).await?;
        Ok(pages_for(total, page_size))
    }
}
