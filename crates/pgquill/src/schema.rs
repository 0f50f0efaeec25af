//! Runtime schema model: column types, column definitions, and table
//! layouts.
//!
//! Schemas are plain data declared at startup. Column insertion order is
//! preserved and drives DDL column order. A schema is validated when the
//! [`Database`](crate::Database) handle is created and again before any
//! DDL is rendered from it.
//!
//! # Example
//! ```ignore
//! use pgquill::schema::{self, DatabaseSchema, TableSchema};
//!
//! let db_schema = DatabaseSchema::new().table(
//!     "users",
//!     TableSchema::new()
//!         .column("id", schema::uuid().primary_key())
//!         .column("name", schema::text())
//!         .column("role", schema::enum_of(&["admin", "member"]).default_value("member"))
//!         .column("deleted_at", schema::timestamp().nullable()),
//! );
//! ```

use crate::error::{QuillError, QuillResult};
use crate::value::Value;

/// Column type descriptor. Each case maps to exactly one PostgreSQL type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    /// INTEGER
    Int,
    /// TEXT
    Text,
    /// BOOLEAN
    Bool,
    /// TIMESTAMP
    Timestamp,
    /// UUID
    Uuid,
    /// JSONB
    Json,
    /// TEXT constrained to an allowed-values CHECK.
    Enum(Vec<String>),
    /// `T[]`, where the item type must be a scalar case.
    Array(Box<ColumnType>),
}

impl ColumnType {
    /// The PostgreSQL type name this column renders to.
    pub fn pg_type(&self) -> QuillResult<String> {
        Ok(match self {
            ColumnType::Int => "INTEGER".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Bool => "BOOLEAN".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Json => "JSONB".to_string(),
            ColumnType::Enum(_) => "TEXT".to_string(),
            ColumnType::Array(item) => {
                if !item.is_scalar() {
                    return Err(QuillError::configuration(
                        "array columns must hold a scalar item type",
                    ));
                }
                format!("{}[]", item.pg_type()?)
            }
        })
    }

    fn is_scalar(&self) -> bool {
        matches!(
            self,
            ColumnType::Int
                | ColumnType::Text
                | ColumnType::Bool
                | ColumnType::Timestamp
                | ColumnType::Uuid
        )
    }

    fn validate(&self, column: &str) -> QuillResult<()> {
        match self {
            ColumnType::Enum(values) if values.is_empty() => Err(QuillError::configuration(
                format!("enum column '{column}' needs at least one allowed value"),
            )),
            ColumnType::Array(item) if !item.is_scalar() => Err(QuillError::configuration(
                format!("array column '{column}' must hold a scalar item type"),
            )),
            _ => Ok(()),
        }
    }
}

/// A single column: its type plus nullability, primary-key, and default
/// attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub ty: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub default: Option<Value>,
}

impl ColumnDef {
    /// Create a NOT NULL, non-key column of the given type.
    pub fn new(ty: ColumnType) -> Self {
        Self {
            ty,
            nullable: false,
            primary_key: false,
            default: None,
        }
    }

    /// Allow NULL.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark as primary key. A primary key is never nullable.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Set a default. The value must have a literal SQL form.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub(crate) fn validate(&self, column: &str) -> QuillResult<()> {
        self.ty.validate(column)?;
        if self.primary_key && self.nullable {
            return Err(QuillError::configuration(format!(
                "primary key column '{column}' cannot be nullable"
            )));
        }
        if let Some(default) = &self.default {
            if default.to_literal().is_none() {
                return Err(QuillError::configuration(format!(
                    "default for column '{column}' must be a literal value"
                )));
            }
            if let ColumnType::Enum(allowed) = &self.ty {
                match default {
                    Value::Text(s) if allowed.contains(s) => {}
                    _ => {
                        return Err(QuillError::configuration(format!(
                            "default for enum column '{column}' must be one of its allowed values"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Shorthand for an INTEGER column.
pub fn int() -> ColumnDef {
    ColumnDef::new(ColumnType::Int)
}

/// Shorthand for a TEXT column.
pub fn text() -> ColumnDef {
    ColumnDef::new(ColumnType::Text)
}

/// Shorthand for a BOOLEAN column.
pub fn boolean() -> ColumnDef {
    ColumnDef::new(ColumnType::Bool)
}

/// Shorthand for a TIMESTAMP column.
pub fn timestamp() -> ColumnDef {
    ColumnDef::new(ColumnType::Timestamp)
}

/// Shorthand for a UUID column.
pub fn uuid() -> ColumnDef {
    ColumnDef::new(ColumnType::Uuid)
}

/// Shorthand for a JSONB column.
pub fn json() -> ColumnDef {
    ColumnDef::new(ColumnType::Json)
}

/// Shorthand for an enum column with the given allowed values.
pub fn enum_of(values: &[&str]) -> ColumnDef {
    ColumnDef::new(ColumnType::Enum(
        values.iter().map(|v| v.to_string()).collect(),
    ))
}

/// Shorthand for an array column with the given scalar item type.
pub fn array(item: ColumnType) -> ColumnDef {
    ColumnDef::new(ColumnType::Array(Box::new(item)))
}

/// An ordered mapping from column name to column definition.
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    columns: Vec<(String, ColumnDef)>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Insertion order determines DDL column order.
    pub fn column(mut self, name: &str, def: ColumnDef) -> Self {
        self.columns.push((name.to_string(), def));
        self
    }

    /// Iterate columns in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnDef)> {
        self.columns.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Look up a column by name.
    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub(crate) fn validate(&self, table: &str) -> QuillResult<()> {
        if self.columns.is_empty() {
            return Err(QuillError::configuration(format!(
                "table '{table}' has no columns"
            )));
        }
        for (i, (name, def)) in self.columns.iter().enumerate() {
            if name.is_empty() {
                return Err(QuillError::configuration(format!(
                    "table '{table}' has an empty column name"
                )));
            }
            if self.columns[..i].iter().any(|(n, _)| n == name) {
                return Err(QuillError::configuration(format!(
                    "table '{table}' declares column '{name}' twice"
                )));
            }
            def.validate(name)?;
        }
        Ok(())
    }
}

/// An ordered mapping from table name to table schema, built once at
/// startup and immutable for the life of the handle.
#[derive(Debug, Clone, Default)]
pub struct DatabaseSchema {
    tables: Vec<(String, TableSchema)>,
}

impl DatabaseSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table.
    pub fn table(mut self, name: &str, schema: TableSchema) -> Self {
        self.tables.push((name.to_string(), schema));
        self
    }

    /// Iterate tables in insertion order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableSchema)> {
        self.tables.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Look up a table by name.
    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub(crate) fn validate(&self) -> QuillResult<()> {
        for (i, (name, table)) in self.tables.iter().enumerate() {
            if name.is_empty() {
                return Err(QuillError::configuration("table name cannot be empty"));
            }
            if self.tables[..i].iter().any(|(n, _)| n == name) {
                return Err(QuillError::configuration(format!(
                    "table '{name}' is declared twice"
                )));
            }
            table.validate(name)?;
        }
        Ok(())
    }
}
