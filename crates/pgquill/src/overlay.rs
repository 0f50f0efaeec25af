//! Soft-delete overlay configuration.
//!
//! Configured per handle with the set of covered tables and the timestamp
//! column name. The query builder consults this at render time and injects
//! the scope predicate as a final pass, so the filter API stays orthogonal
//! to the overlay.

use std::collections::BTreeSet;

/// Soft-delete configuration: which tables are covered and which column
/// holds the deletion timestamp.
#[derive(Debug, Clone)]
pub struct SoftDelete {
    tables: BTreeSet<String>,
    column: String,
}

impl Default for SoftDelete {
    fn default() -> Self {
        Self {
            tables: BTreeSet::new(),
            column: "deleted_at".to_string(),
        }
    }
}

impl SoftDelete {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cover a table.
    pub fn table(mut self, name: &str) -> Self {
        self.tables.insert(name.to_string());
        self
    }

    /// Cover several tables.
    pub fn tables<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self.tables.insert(name.to_string());
        }
        self
    }

    /// Override the timestamp column (default `deleted_at`).
    pub fn column(mut self, name: &str) -> Self {
        self.column = name.to_string();
        self
    }

    /// Whether the overlay applies to this table.
    pub fn covers(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    /// The timestamp column name.
    pub fn column_name(&self) -> &str {
        &self.column
    }
}

/// How a single builder interacts with the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoftDeleteScope {
    /// Honour the overlay: covered SELECT/UPDATE/count get `col IS NULL`.
    #[default]
    Default,
    /// See every row, trashed or not.
    IncludeAll,
    /// See only trashed rows: `col IS NOT NULL`.
    OnlyTrashed,
}
