//! DDL rendering: `CREATE TABLE` plus the alter/drop operations used by
//! the migration runner.

use crate::error::{QuillError, QuillResult};
use crate::ident::quote_ident;
use crate::schema::{ColumnDef, ColumnType, TableSchema};
use crate::value::quote_literal;

/// Render `CREATE TABLE IF NOT EXISTS` for a table schema.
pub(crate) fn create_table(name: &str, schema: &TableSchema) -> QuillResult<String> {
    if name.is_empty() {
        return Err(QuillError::configuration("table name cannot be empty"));
    }
    schema.validate(name)?;
    let mut columns = Vec::new();
    for (column, def) in schema.columns() {
        columns.push(render_column(column, def)?);
    }
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(name),
        columns.join(", ")
    ))
}

/// Render one column definition: name, type, PRIMARY KEY, NOT NULL when
/// neither nullable nor primary key, enum CHECK, default literal.
fn render_column(name: &str, def: &ColumnDef) -> QuillResult<String> {
    def.validate(name)?;
    let mut out = format!("{} {}", quote_ident(name), def.ty.pg_type()?);
    if def.primary_key {
        out.push_str(" PRIMARY KEY");
    } else if !def.nullable {
        out.push_str(" NOT NULL");
    }
    if let ColumnType::Enum(allowed) = &def.ty {
        let list = allowed
            .iter()
            .map(|v| quote_literal(v))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(" CHECK ({} IN ({}))", quote_ident(name), list));
    }
    if let Some(default) = &def.default {
        let literal = default.to_literal().ok_or_else(|| {
            QuillError::configuration(format!(
                "default for column '{name}' must be a literal value"
            ))
        })?;
        out.push_str(&format!(" DEFAULT {literal}"));
    }
    Ok(out)
}

pub(crate) fn add_column(table: &str, column: &str, def: &ColumnDef) -> QuillResult<String> {
    Ok(format!(
        "ALTER TABLE {} ADD COLUMN {}",
        quote_ident(table),
        render_column(column, def)?
    ))
}

pub(crate) fn drop_column(table: &str, column: &str) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN {}",
        quote_ident(table),
        quote_ident(column)
    )
}

pub(crate) fn rename_table(from: &str, to: &str) -> String {
    format!(
        "ALTER TABLE {} RENAME TO {}",
        quote_ident(from),
        quote_ident(to)
    )
}

pub(crate) fn rename_column(table: &str, from: &str, to: &str) -> String {
    format!(
        "ALTER TABLE {} RENAME COLUMN {} TO {}",
        quote_ident(table),
        quote_ident(from),
        quote_ident(to)
    )
}

pub(crate) fn drop_table(name: &str) -> String {
    format!("DROP TABLE IF EXISTS {} CASCADE", quote_ident(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn create_table_renders_columns_in_order() {
        let table = TableSchema::new()
            .column("id", schema::uuid().primary_key())
            .column("name", schema::text())
            .column("age", schema::int().nullable());
        let sql = create_table("users", &table).unwrap();
        assert_eq!(
            sql,
            r#"CREATE TABLE IF NOT EXISTS "users" ("id" UUID PRIMARY KEY, "name" TEXT NOT NULL, "age" INTEGER)"#
        );
    }

    #[test]
    fn enum_column_gets_check_with_escaped_values() {
        let table = TableSchema::new()
            .column("id", schema::int().primary_key())
            .column("mood", schema::enum_of(&["ok", "it's fine"]));
        let sql = create_table("entries", &table).unwrap();
        assert!(sql.contains(r#""mood" TEXT NOT NULL CHECK ("mood" IN ('ok', 'it''s fine'))"#));
    }

    #[test]
    fn defaults_render_as_literals() {
        let table = TableSchema::new()
            .column("active", schema::boolean().default_value(true))
            .column("retries", schema::int().default_value(3))
            .column("label", schema::text().default_value("n/a"));
        let sql = create_table("jobs", &table).unwrap();
        assert!(sql.contains(r#""active" BOOLEAN NOT NULL DEFAULT TRUE"#));
        assert!(sql.contains(r#""retries" INTEGER NOT NULL DEFAULT 3"#));
        assert!(sql.contains(r#""label" TEXT NOT NULL DEFAULT 'n/a'"#));
    }

    #[test]
    fn array_column_renders_suffix() {
        let table = TableSchema::new().column("tags", schema::array(ColumnType::Text));
        let sql = create_table("posts", &table).unwrap();
        assert!(sql.contains(r#""tags" TEXT[] NOT NULL"#));
    }

    #[test]
    fn add_column_reuses_column_rendering() {
        let sql = add_column("users", "bio", &schema::text().nullable()).unwrap();
        assert_eq!(sql, r#"ALTER TABLE "users" ADD COLUMN "bio" TEXT"#);
    }

    #[test]
    fn drop_and_rename_operations() {
        assert_eq!(
            drop_column("users", "bio"),
            r#"ALTER TABLE "users" DROP COLUMN "bio""#
        );
        assert_eq!(
            rename_table("users", "accounts"),
            r#"ALTER TABLE "users" RENAME TO "accounts""#
        );
        assert_eq!(
            rename_column("users", "name", "full_name"),
            r#"ALTER TABLE "users" RENAME COLUMN "name" TO "full_name""#
        );
        assert_eq!(
            drop_table("users"),
            r#"DROP TABLE IF EXISTS "users" CASCADE"#
        );
    }
}
