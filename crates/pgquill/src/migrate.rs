//! Schema migrations: an explicit registry of named up/down modules, a
//! tracking table with batch semantics, and source-file scaffolding.
//!
//! Migrations are registered as data, a `(name, up, down)` triple, and
//! applied in lexicographic name order. Every `up()` call groups the pending
//! migrations under one batch number; `down()` rolls back the newest batch
//! in reverse name order. The runner does not wrap a batch in a
//! transaction: a migration that needs atomicity opens one through the
//! driver it is handed.
//!
//! # Example
//! ```ignore
//! let migrator = Migrator::new(driver, "migrations")
//!     .register(Migration::new(
//!         "20240501120000_create_users",
//!         |ops| async move {
//!             ops.create_table(
//!                 "users",
//!                 &TableSchema::new().column("id", schema::int().primary_key()),
//!             )
//!             .await
//!         },
//!         |ops| async move { ops.drop_table("users").await },
//!     ));
//! let applied = migrator.up().await?;
//! ```

use crate::ddl;
use crate::driver::{Driver, ExecResult};
use crate::error::{QuillError, QuillResult};
use crate::ident::quote_ident;
use crate::schema::{ColumnDef, TableSchema};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

const DEFAULT_TRACKING_TABLE: &str = "migrations";

const SCAFFOLD: &str = r#"use pgquill::{MigrationOps, QuillResult};

pub async fn up(_ops: MigrationOps) -> QuillResult<()> {
    Ok(())
}

pub async fn down(_ops: MigrationOps) -> QuillResult<()> {
    Ok(())
}
"#;

type MigrationFuture = Pin<Box<dyn Future<Output = QuillResult<()>> + Send>>;
type MigrationFn = Arc<dyn Fn(MigrationOps) -> MigrationFuture + Send + Sync>;

/// One registered migration: a unique name plus its up and down functions.
#[derive(Clone)]
pub struct Migration {
    name: String,
    up: MigrationFn,
    down: MigrationFn,
}

impl Migration {
    pub fn new<U, UF, D, DF>(name: impl Into<String>, up: U, down: D) -> Self
    where
        U: Fn(MigrationOps) -> UF + Send + Sync + 'static,
        UF: Future<Output = QuillResult<()>> + Send + 'static,
        D: Fn(MigrationOps) -> DF + Send + Sync + 'static,
        DF: Future<Output = QuillResult<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            up: Arc::new(move |ops| Box::pin(up(ops))),
            down: Arc::new(move |ops| Box::pin(down(ops))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration").field("name", &self.name).finish()
    }
}

/// The helper handed to each migration's `up`/`down`: raw SQL plus the
/// shared DDL operations.
#[derive(Clone)]
pub struct MigrationOps {
    driver: Arc<dyn Driver>,
}

impl MigrationOps {
    pub(crate) fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    /// Run a raw statement with positional `$N` parameters.
    pub async fn sql(&self, raw: &str, params: Vec<Value>) -> QuillResult<ExecResult> {
        self.driver.exec(raw, &params).await
    }

    pub async fn create_table(&self, name: &str, schema: &TableSchema) -> QuillResult<()> {
        let sql = ddl::create_table(name, schema)?;
        self.driver.exec(&sql, &[]).await?;
        Ok(())
    }

    pub async fn drop_table(&self, name: &str) -> QuillResult<()> {
        self.driver.exec(&ddl::drop_table(name), &[]).await?;
        Ok(())
    }

    pub async fn add_column(&self, table: &str, column: &str, def: &ColumnDef) -> QuillResult<()> {
        let sql = ddl::add_column(table, column, def)?;
        self.driver.exec(&sql, &[]).await?;
        Ok(())
    }

    pub async fn drop_column(&self, table: &str, column: &str) -> QuillResult<()> {
        self.driver.exec(&ddl::drop_column(table, column), &[]).await?;
        Ok(())
    }

    pub async fn rename_table(&self, from: &str, to: &str) -> QuillResult<()> {
        self.driver.exec(&ddl::rename_table(from, to), &[]).await?;
        Ok(())
    }

    pub async fn rename_column(&self, table: &str, from: &str, to: &str) -> QuillResult<()> {
        self.driver
            .exec(&ddl::rename_column(table, from, to), &[])
            .await?;
        Ok(())
    }
}

/// Applied vs pending migration names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub applied: Vec<String>,
    pub pending: Vec<String>,
}

/// The migration runner.
pub struct Migrator {
    driver: Arc<dyn Driver>,
    dir: PathBuf,
    table: String,
    registry: Vec<Migration>,
}

impl Migrator {
    pub fn new(driver: Arc<dyn Driver>, dir: impl Into<PathBuf>) -> Self {
        Self {
            driver,
            dir: dir.into(),
            table: DEFAULT_TRACKING_TABLE.to_string(),
            registry: Vec::new(),
        }
    }

    /// Override the tracking table name (default `migrations`).
    pub fn tracking_table(mut self, name: &str) -> Self {
        self.table = name.to_string();
        self
    }

    /// Register a migration.
    pub fn register(mut self, migration: Migration) -> Self {
        self.registry.push(migration);
        self
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Apply every pending migration, in lexicographic name order, under a
    /// fresh batch number. Returns the applied names.
    pub async fn up(&self) -> QuillResult<Vec<String>> {
        self.ensure_tracking_table().await?;
        let registry = self.sorted_registry()?;
        let executed = self.executed_names().await?;
        let batch = self.max_batch().await? + 1;

        let mut applied = Vec::new();
        for (name, migration) in registry {
            if executed.iter().any(|e| e == name) {
                continue;
            }
            (migration.up.as_ref())(MigrationOps::new(self.driver.clone())).await?;
            self.driver
                .exec(
                    &format!(
                        "INSERT INTO {} (\"name\", \"batch\") VALUES ($1, $2)",
                        quote_ident(&self.table)
                    ),
                    &[Value::Text(name.to_string()), Value::Int(batch)],
                )
                .await
                .map_err(track_err)?;
            applied.push(name.to_string());
        }
        Ok(applied)
    }

    /// Roll back every migration in the newest batch, in reverse
    /// lexicographic name order. Returns the rolled-back names.
    pub async fn down(&self) -> QuillResult<Vec<String>> {
        self.ensure_tracking_table().await?;
        let registry = self.sorted_registry()?;
        let batch = self.max_batch().await?;
        if batch == 0 {
            return Ok(Vec::new());
        }

        let result = self
            .driver
            .exec(
                &format!(
                    "SELECT \"name\" FROM {} WHERE \"batch\" = $1 ORDER BY \"name\" DESC",
                    quote_ident(&self.table)
                ),
                &[Value::Int(batch)],
            )
            .await
            .map_err(track_err)?;

        let mut rolled_back = Vec::new();
        for row in result.rows {
            let Some(Value::Text(name)) = row.get("name") else {
                return Err(QuillError::migration("tracking table row has no name"));
            };
            let migration = registry.get(name.as_str()).ok_or_else(|| {
                QuillError::migration(format!("migration '{name}' is recorded but not registered"))
            })?;
            (migration.down.as_ref())(MigrationOps::new(self.driver.clone())).await?;
            self.driver
                .exec(
                    &format!(
                        "DELETE FROM {} WHERE \"name\" = $1",
                        quote_ident(&self.table)
                    ),
                    &[Value::Text(name.clone())],
                )
                .await
                .map_err(track_err)?;
            rolled_back.push(name.clone());
        }
        Ok(rolled_back)
    }

    /// Applied vs pending names, without running anything.
    pub async fn status(&self) -> QuillResult<MigrationStatus> {
        self.ensure_tracking_table().await?;
        let registry = self.sorted_registry()?;
        let applied = self.executed_names().await?;
        let pending = registry
            .keys()
            .filter(|name| !applied.iter().any(|a| a == *name))
            .map(|name| name.to_string())
            .collect();
        Ok(MigrationStatus { applied, pending })
    }

    /// Scaffold a new migration source file named
    /// `<YYYYMMDDHHMMSS>_<name>.rs` in the migrations directory, creating
    /// the directory if needed. Returns the file path.
    pub fn make(&self, name: &str) -> QuillResult<PathBuf> {
        if !valid_name(name) {
            return Err(QuillError::migration(format!(
                "invalid migration name '{name}': use [A-Za-z_][A-Za-z0-9_]*"
            )));
        }
        fs::create_dir_all(&self.dir).map_err(|e| {
            QuillError::migration(format!(
                "cannot create migrations directory {}: {e}",
                self.dir.display()
            ))
        })?;
        let prefix = chrono::Local::now().format("%Y%m%d%H%M%S");
        let path = self.dir.join(format!("{prefix}_{name}.rs"));
        fs::write(&path, SCAFFOLD)
            .map_err(|e| QuillError::migration(format!("cannot write {}: {e}", path.display())))?;
        Ok(path)
    }

    /// List migration source files on disk, lexicographically sorted, with
    /// extensions stripped. Declaration files (`mod.rs`, `lib.rs`) are
    /// excluded.
    pub fn discover(&self) -> QuillResult<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            QuillError::migration(format!(
                "cannot read migrations directory {}: {e}",
                self.dir.display()
            ))
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                QuillError::migration(format!("cannot read directory entry: {e}"))
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if file_name == "mod.rs" || file_name == "lib.rs" {
                continue;
            }
            if let Some(stem) = file_name.strip_suffix(".rs") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn sorted_registry(&self) -> QuillResult<BTreeMap<&str, &Migration>> {
        let mut map = BTreeMap::new();
        for migration in &self.registry {
            if map.insert(migration.name.as_str(), migration).is_some() {
                return Err(QuillError::migration(format!(
                    "migration '{}' is registered twice",
                    migration.name
                )));
            }
        }
        Ok(map)
    }

    async fn ensure_tracking_table(&self) -> QuillResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             \"id\" SERIAL PRIMARY KEY, \
             \"name\" TEXT UNIQUE NOT NULL, \
             \"batch\" INTEGER NOT NULL, \
             \"executed_at\" TIMESTAMP NOT NULL DEFAULT NOW())",
            quote_ident(&self.table)
        );
        self.driver.exec(&sql, &[]).await.map_err(track_err)?;
        Ok(())
    }

    async fn executed_names(&self) -> QuillResult<Vec<String>> {
        let result = self
            .driver
            .exec(
                &format!(
                    "SELECT \"name\" FROM {} ORDER BY \"name\"",
                    quote_ident(&self.table)
                ),
                &[],
            )
            .await
            .map_err(track_err)?;
        let mut names = Vec::with_capacity(result.rows.len());
        for row in result.rows {
            match row.get("name") {
                Some(Value::Text(name)) => names.push(name.clone()),
                _ => return Err(QuillError::migration("tracking table row has no name")),
            }
        }
        Ok(names)
    }

    async fn max_batch(&self) -> QuillResult<i64> {
        let result = self
            .driver
            .exec(
                &format!(
                    "SELECT MAX(\"batch\") AS \"batch\" FROM {}",
                    quote_ident(&self.table)
                ),
                &[],
            )
            .await
            .map_err(track_err)?;
        Ok(match result.rows.first().and_then(|r| r.value_at(0)) {
            Some(Value::Int(n)) => *n,
            _ => 0,
        })
    }
}

fn track_err(err: QuillError) -> QuillError {
    QuillError::migration(format!("tracking table: {err}"))
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
