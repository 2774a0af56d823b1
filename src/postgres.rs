//! PostgreSQL driver binding over sqlx.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Column, Connection as _, Row, TypeInfo};
use uuid::Uuid;

use crate::ast::Value;
use crate::conn::{AsyncConnection, AsyncRowCursor, ConnectionState, IsolationLevel, Rows};
use crate::error::{RelqError, RelqResult};
use crate::transpiler::SqlCommand;

/// A caller-owned PostgreSQL connection.
///
/// Holds the URL so the engine's close-and-reopen-once contract can
/// reconnect; transactions are plain BEGIN/COMMIT/ROLLBACK statements on
/// the connection.
pub struct SqlxConnection {
    url: String,
    inner: Option<sqlx::PgConnection>,
    depth: u32,
}

impl SqlxConnection {
    /// Connect to the given database URL.
    pub async fn connect(url: &str) -> RelqResult<Self> {
        let inner = sqlx::PgConnection::connect(url)
            .await
            .map_err(|e| RelqError::connection(e.to_string()))?;
        Ok(Self {
            url: url.to_string(),
            inner: Some(inner),
            depth: 0,
        })
    }

    fn conn(&mut self) -> RelqResult<&mut sqlx::PgConnection> {
        self.inner
            .as_mut()
            .ok_or_else(|| RelqError::connection("connection is closed"))
    }

    async fn exec_simple(&mut self, sql: &str) -> RelqResult<()> {
        let conn = self.conn()?;
        sqlx::query(sql)
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }
}

#[async_trait]
impl AsyncConnection for SqlxConnection {
    fn state(&self) -> ConnectionState {
        if self.inner.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    async fn open(&mut self) -> RelqResult<()> {
        if self.inner.is_none() {
            let inner = sqlx::PgConnection::connect(&self.url)
                .await
                .map_err(|e| RelqError::connection(e.to_string()))?;
            self.inner = Some(inner);
            self.depth = 0;
        }
        Ok(())
    }

    async fn close(&mut self) -> RelqResult<()> {
        if let Some(conn) = self.inner.take() {
            conn.close()
                .await
                .map_err(|e| RelqError::connection(e.to_string()))?;
        }
        self.depth = 0;
        Ok(())
    }

    async fn execute(&mut self, cmd: &SqlCommand) -> RelqResult<u64> {
        let timeout = cmd.timeout;
        let conn = self.conn()?;
        let mut query = sqlx::query(&cmd.text);
        for param in &cmd.params {
            query = bind_value(query, &param.value);
        }
        match tokio::time::timeout(timeout, query.execute(&mut *conn)).await {
            Err(_) => Err(RelqError::Timeout(timeout)),
            Ok(result) => result.map(|r| r.rows_affected()).map_err(map_sqlx_err),
        }
    }

    async fn query(&mut self, cmd: &SqlCommand) -> RelqResult<Box<dyn AsyncRowCursor>> {
        let timeout = cmd.timeout;
        let conn = self.conn()?;
        let mut query = sqlx::query(&cmd.text);
        for param in &cmd.params {
            query = bind_value(query, &param.value);
        }
        let rows = match tokio::time::timeout(timeout, query.fetch_all(&mut *conn)).await {
            Err(_) => return Err(RelqError::Timeout(timeout)),
            Ok(result) => result.map_err(map_sqlx_err)?,
        };

        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let data = rows
            .iter()
            .map(decode_row)
            .collect::<RelqResult<Vec<_>>>()?;
        Ok(Box::new(Rows::new(columns, data)))
    }

    async fn begin(&mut self, isolation: IsolationLevel) -> RelqResult<()> {
        if self.depth > 0 {
            return Err(RelqError::execution("transaction already open"));
        }
        let sql = format!("BEGIN ISOLATION LEVEL {}", isolation.as_sql());
        self.exec_simple(&sql).await?;
        self.depth = 1;
        Ok(())
    }

    async fn commit(&mut self) -> RelqResult<()> {
        self.exec_simple("COMMIT").await?;
        self.depth = 0;
        Ok(())
    }

    async fn rollback(&mut self) -> RelqResult<()> {
        self.exec_simple("ROLLBACK").await?;
        self.depth = 0;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.depth > 0
    }
}

/// Bind one value onto a sqlx query.
fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    value: &Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(n) => query.bind(*n),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
        Value::Bytes(b) => query.bind(b.clone()),
        Value::Uuid(u) => query.bind(*u),
        Value::DateTime(dt) => query.bind(*dt),
        Value::Decimal(d) => query.bind(*d),
        Value::Json(j) => query.bind(j.clone()),
    }
}

fn decode_row(row: &PgRow) -> RelqResult<Vec<Value>> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| decode_value(row, idx, column.type_info().name()))
        .collect()
}

/// Decode one column into a [`Value`] by its Postgres type name; unknown
/// types fall back to text.
fn decode_value(row: &PgRow, idx: usize, type_name: &str) -> RelqResult<Value> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx).map_err(map_sqlx_err)?.map(Value::Bool),
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)
            .map_err(map_sqlx_err)?
            .map(|n| Value::Int(n as i64)),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)
            .map_err(map_sqlx_err)?
            .map(|n| Value::Int(n as i64)),
        "INT8" => row.try_get::<Option<i64>, _>(idx).map_err(map_sqlx_err)?.map(Value::Int),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)
            .map_err(map_sqlx_err)?
            .map(|n| Value::Float(n as f64)),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx).map_err(map_sqlx_err)?.map(Value::Float),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(idx)
            .map_err(map_sqlx_err)?
            .map(Value::Decimal),
        "UUID" => row.try_get::<Option<Uuid>, _>(idx).map_err(map_sqlx_err)?.map(Value::Uuid),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)
            .map_err(map_sqlx_err)?
            .map(Value::DateTime),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)
            .map_err(map_sqlx_err)?
            .map(|naive| Value::DateTime(naive.and_utc())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(idx)
            .map_err(map_sqlx_err)?
            .map(|date| Value::DateTime(date.and_time(NaiveTime::MIN).and_utc())),
        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(idx)
            .map_err(map_sqlx_err)?
            .map(Value::Json),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(idx)
            .map_err(map_sqlx_err)?
            .map(Value::Bytes),
        _ => row
            .try_get::<Option<String>, _>(idx)
            .map_err(map_sqlx_err)?
            .map(Value::Text),
    };
    Ok(value.unwrap_or(Value::Null))
}

fn map_sqlx_err(err: sqlx::Error) -> RelqError {
    match err {
        sqlx::Error::Io(e) => RelqError::connection(e.to_string()),
        sqlx::Error::Protocol(msg) => RelqError::connection(msg),
        sqlx::Error::PoolClosed => RelqError::connection("pool closed"),
        sqlx::Error::WorkerCrashed => RelqError::connection("worker crashed"),
        other => RelqError::execution(other.to_string()),
    }
}
