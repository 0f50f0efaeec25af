//! Error types for pgquill.
//!
//! All fallible operations return [`QuillResult`]. The variants split along
//! the boundary the caller cares about:
//!
//! - [`Configuration`](QuillError::Configuration): the schema or a builder
//!   was used incorrectly; fix the code, retrying will not help.
//! - [`Driver`](QuillError::Driver): the database driver reported a
//!   failure; the driver's message is passed through intact.
//! - [`Migration`](QuillError::Migration): the migration runner could not
//!   do its bookkeeping (registry, scaffolding, tracking table).
//!
//! A `first()` that finds no row is not an error; it returns `Ok(None)`.

use thiserror::Error;

/// Result type alias for pgquill operations.
pub type QuillResult<T> = Result<T, QuillError>;

/// Error type for schema, query, driver, and migration failures.
#[derive(Debug, Error)]
pub enum QuillError {
    /// Invalid schema definition or builder usage.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Failure surfaced by the database driver.
    #[error("driver error: {0}")]
    Driver(String),

    /// Migration registry, scaffolding, or tracking-table failure.
    #[error("migration error: {0}")]
    Migration(String),
}

impl QuillError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a driver error.
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }

    /// Create a migration error.
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration(message.into())
    }

    /// Check if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a driver error.
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver(_))
    }

    /// Check if this is a migration error.
    pub fn is_migration(&self) -> bool {
        matches!(self, Self::Migration(_))
    }
}
