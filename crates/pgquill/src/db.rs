//! The database handle: schema + driver + overlays, and the transaction
//! facade.

use crate::ddl;
use crate::driver::{Driver, ExecResult};
use crate::error::{QuillError, QuillResult};
use crate::logger::{LoggedDriver, QueryLogger};
use crate::overlay::SoftDelete;
use crate::qb::QueryBuilder;
use crate::schema::DatabaseSchema;
use crate::value::Value;
use std::future::Future;
use std::sync::Arc;

/// The entry point: a schema, a driver, and optional overlays.
///
/// The handle is cheap to clone and may be shared read-only across tasks;
/// all I/O and concurrency live in the driver. Builders produced by
/// [`query`](Self::query) are single-caller values and must not be shared.
#[derive(Clone)]
pub struct Database {
    schema: Arc<DatabaseSchema>,
    driver: Arc<dyn Driver>,
    soft_delete: Option<Arc<SoftDelete>>,
    in_transaction: bool,
}

impl Database {
    /// Create a handle over a validated schema and a driver.
    pub fn new(schema: DatabaseSchema, driver: Arc<dyn Driver>) -> QuillResult<Self> {
        schema.validate()?;
        Ok(Self {
            schema: Arc::new(schema),
            driver,
            soft_delete: None,
            in_transaction: false,
        })
    }

    /// Enable the soft-delete overlay.
    pub fn with_soft_delete(mut self, overlay: SoftDelete) -> Self {
        self.soft_delete = Some(Arc::new(overlay));
        self
    }

    /// Wrap the driver so every statement is reported to the logger.
    pub fn with_logger(mut self, logger: Arc<dyn QueryLogger>) -> Self {
        self.driver = Arc::new(LoggedDriver::new(self.driver, logger));
        self
    }

    pub fn schema(&self) -> &DatabaseSchema {
        &self.schema
    }

    /// A fresh builder over a base table, bound to this handle's driver
    /// and overlay configuration.
    pub fn query(&self, table: &str) -> QueryBuilder {
        QueryBuilder::bound_table(table, self.soft_delete.clone(), self.driver.clone())
    }

    /// A fresh builder whose FROM source is a subquery.
    pub fn query_from(&self, inner: QueryBuilder, alias: &str) -> QueryBuilder {
        QueryBuilder::bound_subquery(inner, alias, self.soft_delete.clone(), self.driver.clone())
    }

    /// Execute a raw statement with positional `$N` parameters. Also the
    /// route for aggregated counts, which `count()` deliberately does not
    /// cover.
    pub async fn raw(&self, sql: &str, params: Vec<Value>) -> QuillResult<ExecResult> {
        self.driver.exec(sql, &params).await
    }

    /// Emit `CREATE TABLE IF NOT EXISTS` for every table in the schema,
    /// in declaration order.
    pub async fn create_tables(&self) -> QuillResult<()> {
        for (name, table) in self.schema.tables() {
            let sql = ddl::create_table(name, table)?;
            self.driver.exec(&sql, &[]).await?;
        }
        Ok(())
    }

    /// Run `f` inside a transaction.
    ///
    /// The callback receives a handle sharing this one's schema and
    /// overlays but bound to the transaction driver. On `Ok` the
    /// transaction commits; on `Err` (or cancellation unwinding out of the
    /// callback) it rolls back and the error propagates. Nested calls
    /// reuse the existing transaction driver.
    pub async fn transaction<T, F, Fut>(&self, f: F) -> QuillResult<T>
    where
        F: FnOnce(Database) -> Fut,
        Fut: Future<Output = QuillResult<T>>,
    {
        if self.in_transaction {
            return f(self.clone()).await;
        }
        let tx = self.driver.begin().await?;
        let handle = Database {
            schema: self.schema.clone(),
            driver: tx.clone(),
            soft_delete: self.soft_delete.clone(),
            in_transaction: true,
        };
        match f(handle).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(error) => match tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err(QuillError::driver(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }

    /// Close the underlying driver.
    pub async fn close(&self) -> QuillResult<()> {
        self.driver.close().await
    }
}
