//! Synchronous CRUD operations.

use crate::ast::Value;
use crate::conn::{Connection, ConnectionState, RowCursor};
use crate::entity::Entity;
use crate::error::{RelqError, RelqResult};
use crate::mapper::{MapOptions, map_rows};
use crate::session::plan::{
    plan_delete_by_key, plan_delete_where, plan_insert, plan_select, plan_update_by_key,
    plan_update_where,
};
use crate::session::{InsertOptions, Query, Scope, Session};
use crate::transpiler::SqlCommand;

impl<C: Connection> Session<'_, C> {
    pub(crate) fn ensure_open(&mut self) -> RelqResult<()> {
        if self.conn.state() != ConnectionState::Open {
            let _ = self.conn.close();
            self.conn.open()?;
        }
        Ok(())
    }

    /// Execute a command, transparently reopening a broken connection once.
    /// Never retried inside a transaction: the replay would silently lose
    /// the transaction's earlier statements.
    pub(crate) fn run_execute(&mut self, cmd: &SqlCommand) -> RelqResult<u64> {
        self.ensure_open()?;
        tracing::debug!(sql = %cmd.text, params = cmd.params.len(), "execute");
        match self.conn.execute(cmd) {
            Err(RelqError::Connection(reason)) if !self.conn.in_transaction() => {
                tracing::warn!(%reason, "connection failed; reopening once");
                let _ = self.conn.close();
                self.conn.open()?;
                self.conn.execute(cmd)
            }
            other => other,
        }
    }

    pub(crate) fn run_query(&mut self, cmd: &SqlCommand) -> RelqResult<Box<dyn RowCursor + Send>> {
        self.ensure_open()?;
        tracing::debug!(sql = %cmd.text, params = cmd.params.len(), "query");
        match self.conn.query(cmd) {
            Err(RelqError::Connection(reason)) if !self.conn.in_transaction() => {
                tracing::warn!(%reason, "connection failed; reopening once");
                let _ = self.conn.close();
                self.conn.open()?;
                self.conn.query(cmd)
            }
            other => other,
        }
    }

    /// First column of the first row, or NULL for an empty result.
    pub(crate) fn run_scalar(&mut self, cmd: &SqlCommand) -> RelqResult<Value> {
        let mut cursor = self.run_query(cmd)?;
        Ok(cursor
            .advance()?
            .and_then(|row| row.into_iter().next())
            .unwrap_or(Value::Null))
    }

    /// Run `f` inside a transaction scope. Reuses the caller's transaction
    /// when one is already open; otherwise begins, then commits on success
    /// or rolls back on failure, rethrowing the original error.
    pub(crate) fn in_batch<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> RelqResult<R>,
    ) -> RelqResult<R> {
        let owned = !self.conn.in_transaction();
        if owned {
            self.ensure_open()?;
            self.conn.begin(self.config.isolation)?;
        }
        match f(&mut *self) {
            Ok(value) => {
                if owned {
                    self.conn.commit()?;
                }
                Ok(value)
            }
            Err(err) => {
                if owned {
                    if let Err(rb) = self.conn.rollback() {
                        tracing::warn!(error = %rb, "rollback failed");
                    }
                }
                Err(err)
            }
        }
    }

    /// Insert one entity; returns the affected-row count.
    pub fn insert<T: Entity>(&mut self, entity: &T) -> RelqResult<u64> {
        let cmd = plan_insert(entity, None, &self.config)?;
        self.run_execute(&cmd)
    }

    /// Insert one entity with options. Returns the generated identity when
    /// an `id_query` was supplied.
    pub fn insert_with<T: Entity>(
        &mut self,
        entity: &T,
        opts: &InsertOptions<'_>,
    ) -> RelqResult<Option<Value>> {
        let cmd = plan_insert(entity, opts.columns, &self.config)?;
        self.run_execute(&cmd)?;
        match opts.id_query {
            Some(query) if !query.is_empty() => {
                let id_cmd = SqlCommand::new(query).with_timeout(self.config.timeout);
                Ok(Some(self.run_scalar(&id_cmd)?))
            }
            _ => Ok(None),
        }
    }

    /// Insert a batch inside one transaction; partial inserts are never
    /// left behind. Returns the total affected-row count.
    pub fn insert_range<T: Entity>(&mut self, entities: &[T]) -> RelqResult<u64> {
        self.in_batch(|session| {
            let mut affected = 0;
            for entity in entities {
                affected += session.insert(entity)?;
            }
            Ok(affected)
        })
    }

    /// Batch insert with options; one identity slot per entity.
    pub fn insert_range_with<T: Entity>(
        &mut self,
        entities: &[T],
        opts: &InsertOptions<'_>,
    ) -> RelqResult<Vec<Option<Value>>> {
        self.in_batch(|session| {
            let mut ids = Vec::with_capacity(entities.len());
            for entity in entities {
                ids.push(session.insert_with(entity, opts)?);
            }
            Ok(ids)
        })
    }

    /// Update one entity by its key columns; 0 affected rows means
    /// "nothing matched" and is not an error.
    pub fn update<T: Entity>(&mut self, entity: &T) -> RelqResult<u64> {
        let cmd = plan_update_by_key(entity, None, &self.config)?;
        self.run_execute(&cmd)
    }

    /// Key-scoped update writing only the named members.
    pub fn update_columns<T: Entity>(&mut self, entity: &T, columns: &[&str]) -> RelqResult<u64> {
        let cmd = plan_update_by_key(entity, Some(columns), &self.config)?;
        self.run_execute(&cmd)
    }

    /// Predicate-scoped update taking its values from `entity`.
    pub fn update_where<T: Entity>(
        &mut self,
        entity: &T,
        scope: &Scope,
        columns: Option<&[&str]>,
    ) -> RelqResult<u64> {
        let cmd = plan_update_where(entity, scope, columns, &self.config)?;
        self.run_execute(&cmd)
    }

    /// Batch update inside one transaction; all-or-nothing.
    pub fn update_range<T: Entity>(&mut self, entities: &[T]) -> RelqResult<u64> {
        self.in_batch(|session| {
            let mut affected = 0;
            for entity in entities {
                affected += session.update(entity)?;
            }
            Ok(affected)
        })
    }

    /// Delete one entity by its key columns; the count is returned as-is.
    pub fn delete<T: Entity>(&mut self, entity: &T) -> RelqResult<u64> {
        let cmd = plan_delete_by_key(entity, &self.config)?;
        self.run_execute(&cmd)
    }

    /// Predicate-scoped delete. Deleting every row requires
    /// [`Scope::AllRows`] spelled at the call site.
    pub fn delete_where<T: Entity>(&mut self, scope: &Scope) -> RelqResult<u64> {
        let cmd = plan_delete_where::<T>(scope, &self.config)?;
        self.run_execute(&cmd)
    }

    /// Batch delete inside one transaction; all-or-nothing.
    pub fn delete_range<T: Entity>(&mut self, entities: &[T]) -> RelqResult<u64> {
        self.in_batch(|session| {
            let mut affected = 0;
            for entity in entities {
                affected += session.delete(entity)?;
            }
            Ok(affected)
        })
    }

    /// Fetch entities matching the query.
    pub fn fetch<T: Entity>(&mut self, query: &Query) -> RelqResult<Vec<T>> {
        self.fetch_with(query, &MapOptions::default())
    }

    /// Fetch with explicit mapping options.
    pub fn fetch_with<T: Entity>(
        &mut self,
        query: &Query,
        opts: &MapOptions<'_, T>,
    ) -> RelqResult<Vec<T>> {
        let cmd = plan_select::<T>(query, &self.config)?;
        let mut cursor = self.run_query(&cmd)?;
        map_rows(cursor.as_mut(), opts)
    }

    /// First matching entity, if any.
    pub fn fetch_optional<T: Entity>(&mut self, query: &Query) -> RelqResult<Option<T>> {
        Ok(self
            .fetch_with(query, &MapOptions::first())?
            .into_iter()
            .next())
    }

    /// First matching entity, or `T::default()` when nothing matched.
    pub fn fetch_first<T: Entity>(&mut self, query: &Query) -> RelqResult<T> {
        Ok(self.fetch_optional(query)?.unwrap_or_default())
    }
}
