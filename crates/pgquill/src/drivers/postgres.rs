//! tokio-postgres driver.
//!
//! [`PgDriver`] owns a single connection behind an async mutex. A
//! transaction takes the connection exclusively for its duration, so
//! statements inside it are serialised and other handles wait at `begin`.

use crate::driver::{Driver, ExecResult, Row};
use crate::error::{QuillError, QuillResult};
use crate::value::Value;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::NoTls;
use uuid::Uuid;

/// A driver over one `tokio_postgres::Client`.
pub struct PgDriver {
    client: Arc<Mutex<tokio_postgres::Client>>,
}

impl PgDriver {
    /// Connect to the given URL and spawn the connection task.
    pub async fn connect(url: &str) -> QuillResult<Self> {
        let (client, connection) = tokio_postgres::connect(url, NoTls)
            .await
            .map_err(from_pg)?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "pgquill", "connection error: {e}");
            }
        });
        Ok(Self {
            client: Arc::new(Mutex::new(client)),
        })
    }

    /// Wrap an already connected client.
    pub fn from_client(client: tokio_postgres::Client) -> Self {
        Self {
            client: Arc::new(Mutex::new(client)),
        }
    }
}

#[async_trait]
impl Driver for PgDriver {
    async fn exec(&self, sql: &str, params: &[Value]) -> QuillResult<ExecResult> {
        let client = self.client.lock().await;
        run_exec(&client, sql, params).await
    }

    async fn begin(&self) -> QuillResult<Arc<dyn Driver>> {
        let guard = self.client.clone().lock_owned().await;
        guard.batch_execute("BEGIN").await.map_err(from_pg)?;
        Ok(Arc::new(PgTxDriver {
            guard: Mutex::new(Some(guard)),
        }))
    }

    async fn commit(&self) -> QuillResult<()> {
        Err(QuillError::driver("COMMIT outside of a transaction"))
    }

    async fn rollback(&self) -> QuillResult<()> {
        Err(QuillError::driver("ROLLBACK outside of a transaction"))
    }

    async fn close(&self) -> QuillResult<()> {
        // The connection task ends when the client is dropped.
        Ok(())
    }
}

/// A driver bound to an open transaction. Holds the connection lock until
/// the transaction is committed, rolled back, or dropped.
struct PgTxDriver {
    guard: Mutex<Option<OwnedMutexGuard<tokio_postgres::Client>>>,
}

impl PgTxDriver {
    async fn finish(&self, statement: &str) -> QuillResult<()> {
        let mut slot = self.guard.lock().await;
        let guard = slot
            .take()
            .ok_or_else(|| QuillError::driver("transaction already closed"))?;
        guard.batch_execute(statement).await.map_err(from_pg)
    }
}

#[async_trait]
impl Driver for PgTxDriver {
    async fn exec(&self, sql: &str, params: &[Value]) -> QuillResult<ExecResult> {
        let slot = self.guard.lock().await;
        let guard = slot
            .as_ref()
            .ok_or_else(|| QuillError::driver("transaction already closed"))?;
        run_exec(guard, sql, params).await
    }

    async fn begin(&self) -> QuillResult<Arc<dyn Driver>> {
        Err(QuillError::driver("already inside a transaction"))
    }

    async fn commit(&self) -> QuillResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(&self) -> QuillResult<()> {
        self.finish("ROLLBACK").await
    }

    async fn close(&self) -> QuillResult<()> {
        Ok(())
    }
}

impl Drop for PgTxDriver {
    fn drop(&mut self) {
        // A transaction unwound without commit/rollback (e.g. cancellation)
        // must not leave the connection mid-transaction.
        if let Ok(mut slot) = self.guard.try_lock() {
            if let Some(guard) = slot.take() {
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(async move {
                        let _ = guard.batch_execute("ROLLBACK").await;
                    });
                }
            }
        }
    }
}

async fn run_exec(
    client: &tokio_postgres::Client,
    sql: &str,
    params: &[Value],
) -> QuillResult<ExecResult> {
    let stmt = client.prepare(sql).await.map_err(from_pg)?;
    let refs: Vec<&(dyn ToSql + Sync)> =
        params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
    if stmt.columns().is_empty() {
        let row_count = client.execute(&stmt, &refs).await.map_err(from_pg)?;
        return Ok(ExecResult {
            rows: Vec::new(),
            row_count,
        });
    }
    let pg_rows = client.query(&stmt, &refs).await.map_err(from_pg)?;
    let mut rows = Vec::with_capacity(pg_rows.len());
    for pg_row in &pg_rows {
        rows.push(decode_row(pg_row)?);
    }
    Ok(ExecResult {
        row_count: rows.len() as u64,
        rows,
    })
}

fn from_pg(err: tokio_postgres::Error) -> QuillError {
    QuillError::driver(err.to_string())
}

fn decode_row(row: &tokio_postgres::Row) -> QuillResult<Row> {
    let mut pairs = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_value(row, idx, column.type_()).map_err(|e| {
            QuillError::driver(format!("decode column '{}': {e}", column.name()))
        })?;
        pairs.push((column.name().to_string(), value));
    }
    Ok(Row::from_pairs(pairs))
}

fn decode_value(
    row: &tokio_postgres::Row,
    idx: usize,
    ty: &Type,
) -> Result<Value, tokio_postgres::Error> {
    let value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)?.map(|v| Value::Int(v as i64))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)?.map(|v| Value::Int(v as i64))
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)?.map(Value::Int)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)?.map(|v| Value::Float(v as f64))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)?.map(Value::Float)
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<NaiveDateTime>>(idx)?.map(Value::Timestamp)
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(|v| Value::Timestamp(v.naive_utc()))
    } else if *ty == Type::UUID {
        row.try_get::<_, Option<Uuid>>(idx)?.map(Value::Uuid)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<serde_json::Value>>(idx)?.map(Value::Json)
    } else if *ty == Type::BOOL_ARRAY {
        row.try_get::<_, Option<Vec<bool>>>(idx)?
            .map(|v| Value::Array(v.into_iter().map(Value::Bool).collect()))
    } else if *ty == Type::INT4_ARRAY {
        row.try_get::<_, Option<Vec<i32>>>(idx)?
            .map(|v| Value::Array(v.into_iter().map(|i| Value::Int(i as i64)).collect()))
    } else if *ty == Type::INT8_ARRAY {
        row.try_get::<_, Option<Vec<i64>>>(idx)?
            .map(|v| Value::Array(v.into_iter().map(Value::Int).collect()))
    } else if *ty == Type::TEXT_ARRAY || *ty == Type::VARCHAR_ARRAY {
        row.try_get::<_, Option<Vec<String>>>(idx)?
            .map(|v| Value::Array(v.into_iter().map(Value::Text).collect()))
    } else if *ty == Type::UUID_ARRAY {
        row.try_get::<_, Option<Vec<Uuid>>>(idx)?
            .map(|v| Value::Array(v.into_iter().map(Value::Uuid).collect()))
    } else if *ty == Type::TIMESTAMP_ARRAY {
        row.try_get::<_, Option<Vec<NaiveDateTime>>>(idx)?
            .map(|v| Value::Array(v.into_iter().map(Value::Timestamp).collect()))
    } else {
        // Fall back to text for types outside the schema model.
        row.try_get::<_, Option<String>>(idx)?.map(Value::Text)
    };
    Ok(value.unwrap_or(Value::Null))
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Int(v) => {
                if *ty == Type::INT2 {
                    i16::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*v)?.to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Float(v) => {
                if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Text(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => {
                if *ty == Type::TIMESTAMPTZ {
                    DateTime::<Utc>::from_naive_utc_and_offset(*v, Utc).to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Uuid(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
            Value::Array(items) => {
                if *ty == Type::INT2_ARRAY || *ty == Type::INT4_ARRAY || *ty == Type::INT8_ARRAY {
                    array_items(items, |v| match v {
                        Value::Int(i) => Some(*i),
                        _ => None,
                    })?
                    .to_sql(ty, out)
                } else if *ty == Type::TEXT_ARRAY || *ty == Type::VARCHAR_ARRAY {
                    array_items(items, |v| match v {
                        Value::Text(s) => Some(s.clone()),
                        _ => None,
                    })?
                    .to_sql(ty, out)
                } else if *ty == Type::BOOL_ARRAY {
                    array_items(items, |v| match v {
                        Value::Bool(b) => Some(*b),
                        _ => None,
                    })?
                    .to_sql(ty, out)
                } else if *ty == Type::FLOAT4_ARRAY || *ty == Type::FLOAT8_ARRAY {
                    array_items(items, |v| match v {
                        Value::Float(f) => Some(*f),
                        Value::Int(i) => Some(*i as f64),
                        _ => None,
                    })?
                    .to_sql(ty, out)
                } else if *ty == Type::UUID_ARRAY {
                    array_items(items, |v| match v {
                        Value::Uuid(u) => Some(*u),
                        _ => None,
                    })?
                    .to_sql(ty, out)
                } else if *ty == Type::TIMESTAMP_ARRAY {
                    array_items(items, |v| match v {
                        Value::Timestamp(t) => Some(*t),
                        _ => None,
                    })?
                    .to_sql(ty, out)
                } else {
                    Err(format!("unsupported array parameter type: {ty}").into())
                }
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn array_items<T>(
    items: &[Value],
    convert: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<T>, Box<dyn std::error::Error + Sync + Send>> {
    items
        .iter()
        .map(|v| convert(v).ok_or_else(|| "mixed element types in array parameter".into()))
        .collect()
}
