//! # pgquill
//!
//! A runtime-defined, type-oriented SQL query builder and lightweight
//! schema-migration engine for PostgreSQL.
//!
//! ## Features
//!
//! - **Runtime schemas**: tables are declared as plain data, no code
//!   generation and no schema file
//! - **Chainable builder**: accumulates an operation and its clauses,
//!   renders to `$N`-parameterized SQL plus a matching argument vector
//! - **Stable placeholders**: subqueries and HAVING fragments are rebased
//!   into one monotonically increasing placeholder sequence
//! - **Pluggable driver**: the core depends on a three-concern contract
//!   (exec, transactions, close); Postgres and in-memory recording drivers
//!   are bundled
//! - **Soft-delete overlay**: per-table predicate injection with
//!   `soft_delete`/`restore`/`with_trashed`/`only_trashed`
//! - **Migrations**: a registry of named up/down modules tracked in a
//!   batch-numbered table, plus source-file scaffolding
//!
//! ## Example
//!
//! ```ignore
//! use pgquill::drivers::PgDriver;
//! use pgquill::schema::{self, DatabaseSchema, TableSchema};
//! use pgquill::{Cond, Database, Filter, SoftDelete, SortDir};
//! use std::sync::Arc;
//!
//! # async fn demo() -> pgquill::QuillResult<()> {
//! let schema = DatabaseSchema::new().table(
//!     "users",
//!     TableSchema::new()
//!         .column("id", schema::int().primary_key())
//!         .column("name", schema::text())
//!         .column("deleted_at", schema::timestamp().nullable()),
//! );
//! let driver = Arc::new(PgDriver::connect("postgres://localhost/app").await?);
//! let db = Database::new(schema, driver)?.with_soft_delete(SoftDelete::new().table("users"));
//! db.create_tables().await?;
//!
//! let adults = db
//!     .query("users")
//!     .where_(Filter::new().field("age", Cond::gt(18)))
//!     .order_by("name", SortDir::Asc)
//!     .limit(5)
//!     .execute()
//!     .await?;
//! # let _ = adults;
//! # Ok(()) }
//! ```

mod db;
mod ddl;
mod driver;
pub mod drivers;
mod error;
mod ident;
mod logger;
mod migrate;
mod overlay;
mod qb;
pub mod schema;
mod value;

pub use db::Database;
pub use driver::{Driver, ExecResult, Row};
pub use error::{QuillError, QuillResult};
pub use logger::{ConsoleLogger, LoggedDriver, NoopLogger, QueryLogger, TracingLogger};
pub use migrate::{Migration, MigrationOps, MigrationStatus, Migrator};
pub use overlay::{SoftDelete, SoftDeleteScope};
pub use qb::{
    Cond, ConflictAction, Connector, Filter, FilterOp, Join, JoinKind, OnConflictBuilder,
    Predicate, QueryBuilder, Record, ReturningPolicy, SortDir,
};
pub use value::Value;
