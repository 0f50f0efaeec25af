//! The chainable query builder: IR, clause methods, SQL renderer, and
//! execution terminals.
//!
//! A builder is a single-caller value. Chain methods append to its clause
//! sequences and return it; the terminal methods (`execute`, `first`,
//! `count`) render `(sql, params)` and run against the bound driver. Pure
//! rendering is available through [`QueryBuilder::build`] and never
//! touches I/O.
//!
//! Predicates from `where_`/`or_where` are kept flat: connectors are
//! emitted verbatim, left to right, with no parentheses. Mixing AND and OR
//! across calls therefore follows SQL's native precedence; use a subquery
//! when strict grouping is needed.
//!
//! # Example
//! ```ignore
//! let users = db
//!     .query("users")
//!     .where_(Filter::new().eq("id", 1).field("age", Cond::gt(18)))
//!     .order_by("name", SortDir::Asc)
//!     .limit(5)
//!     .execute()
//!     .await?;
//! ```

mod expr;
mod filter;
mod param;

#[cfg(test)]
mod tests;

pub use expr::{Connector, FilterOp, Predicate};
pub use filter::{Cond, Filter};

use crate::driver::{Driver, ExecResult, Row};
use crate::error::{QuillError, QuillResult};
use crate::ident::{quote_ident, quote_projection};
use crate::overlay::{SoftDelete, SoftDeleteScope};
use crate::value::Value;
use expr::render_predicates;
use param::{rebase_placeholders, ParamList};
use std::fmt;
use std::sync::Arc;

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    fn keyword(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
        }
    }
}

/// One join clause: kind, joined table, and an `left op right` condition.
#[derive(Debug, Clone)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub on: (String, String, String),
}

/// An ordered column/value mapping used for INSERT rows and UPDATE
/// assignments.
#[derive(Debug, Clone, Default)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column value. Insertion order is preserved.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.entries.push((column.to_string(), value.into()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a builder will do when executed.
#[derive(Debug, Clone)]
enum Operation {
    Select,
    Insert(Vec<Record>),
    Update(Record),
    Delete,
}

/// The builder's FROM source.
#[derive(Debug, Clone)]
enum Source {
    Table(String),
    Subquery {
        builder: Box<QueryBuilder>,
        alias: String,
    },
}

/// RETURNING clause policy for mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturningPolicy {
    /// `RETURNING *` on mutations; nothing on selects.
    Default,
    /// The named columns, quoted.
    Columns(Vec<String>),
    /// No RETURNING clause at all.
    Suppressed,
}

/// ON CONFLICT resolution.
#[derive(Debug, Clone)]
pub enum ConflictAction {
    DoNothing,
    DoUpdate(Record),
}

#[derive(Debug, Clone)]
struct OnConflict {
    columns: Vec<String>,
    action: ConflictAction,
}

/// A pending query. Obtained from [`Database::query`](crate::Database::query)
/// (driver-bound) or [`QueryBuilder::table`] (render-only).
#[derive(Clone)]
pub struct QueryBuilder {
    source: Source,
    op: Option<Operation>,
    projection: Vec<String>,
    predicates: Vec<Predicate>,
    joins: Vec<Join>,
    order_by: Vec<(String, SortDir)>,
    group_by: Vec<String>,
    having: Vec<(String, Vec<Value>)>,
    limit: Option<u64>,
    offset: Option<u64>,
    on_conflict: Option<OnConflict>,
    returning: ReturningPolicy,
    scope: SoftDeleteScope,
    overlay: Option<Arc<SoftDelete>>,
    driver: Option<Arc<dyn Driver>>,
    error: Option<String>,
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("source", &self.source)
            .field("op", &self.op)
            .field("predicates", &self.predicates)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl QueryBuilder {
    /// A render-only builder over a base table, with no driver and no
    /// overlay. Useful for subqueries and SQL inspection.
    pub fn table(name: &str) -> Self {
        Self::with_source(Source::Table(name.to_string()), None, None)
    }

    /// A render-only builder over a subquery source.
    pub fn from_subquery(inner: QueryBuilder, alias: &str) -> Self {
        Self::with_source(
            Source::Subquery {
                builder: Box::new(inner),
                alias: alias.to_string(),
            },
            None,
            None,
        )
    }

    pub(crate) fn bound_table(
        name: &str,
        overlay: Option<Arc<SoftDelete>>,
        driver: Arc<dyn Driver>,
    ) -> Self {
        Self::with_source(Source::Table(name.to_string()), overlay, Some(driver))
    }

    pub(crate) fn bound_subquery(
        inner: QueryBuilder,
        alias: &str,
        overlay: Option<Arc<SoftDelete>>,
        driver: Arc<dyn Driver>,
    ) -> Self {
        Self::with_source(
            Source::Subquery {
                builder: Box::new(inner),
                alias: alias.to_string(),
            },
            overlay,
            Some(driver),
        )
    }

    fn with_source(
        source: Source,
        overlay: Option<Arc<SoftDelete>>,
        driver: Option<Arc<dyn Driver>>,
    ) -> Self {
        Self {
            source,
            op: None,
            projection: Vec::new(),
            predicates: Vec::new(),
            joins: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            limit: None,
            offset: None,
            on_conflict: None,
            returning: ReturningPolicy::Default,
            scope: SoftDeleteScope::Default,
            overlay,
            driver,
            error: None,
        }
    }

    fn fail(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(message.into());
        }
    }

    fn set_operation(mut self, op: Operation) -> Self {
        if self.op.is_some() {
            self.fail("operation already set; a builder runs exactly one of select/insert/update/delete");
        } else {
            self.op = Some(op);
        }
        self
    }

    // ==================== Operations ====================

    /// SELECT the given columns (empty slice means `*`).
    pub fn select(self, columns: &[&str]) -> Self {
        let mut qb = self.set_operation(Operation::Select);
        qb.projection = columns.iter().map(|c| c.to_string()).collect();
        qb
    }

    /// INSERT a single row.
    pub fn insert(self, row: Record) -> Self {
        self.insert_many(vec![row])
    }

    /// INSERT a batch of rows. Columns are taken from the first row and
    /// looked up by name in each subsequent row.
    pub fn insert_many(self, rows: Vec<Record>) -> Self {
        self.set_operation(Operation::Insert(rows))
    }

    /// UPDATE with the given assignments, in their insertion order.
    pub fn update(self, assignments: Record) -> Self {
        self.set_operation(Operation::Update(assignments))
    }

    /// Hard DELETE. Ignores the soft-delete overlay.
    pub fn delete(self) -> Self {
        self.set_operation(Operation::Delete)
    }

    // ==================== Filtering ====================

    /// AND-append the filter's predicates.
    pub fn where_(mut self, filter: Filter) -> Self {
        self.predicates.extend(filter.desugar(Connector::And));
        self
    }

    /// OR-append the filter's predicates.
    pub fn or_where(mut self, filter: Filter) -> Self {
        self.predicates.extend(filter.desugar(Connector::Or));
        self
    }

    // ==================== Joins ====================

    pub fn join(mut self, kind: JoinKind, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.joins.push(Join {
            kind,
            table: table.to_string(),
            on: (left.to_string(), op.to_string(), right.to_string()),
        });
        self
    }

    pub fn inner_join(self, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.join(JoinKind::Inner, table, left, op, right)
    }

    pub fn left_join(self, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.join(JoinKind::Left, table, left, op, right)
    }

    pub fn right_join(self, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.join(JoinKind::Right, table, left, op, right)
    }

    pub fn full_join(self, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.join(JoinKind::Full, table, left, op, right)
    }

    // ==================== Ordering, grouping, paging ====================

    pub fn order_by(mut self, column: &str, dir: SortDir) -> Self {
        self.order_by.push((column.to_string(), dir));
        self
    }

    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }

    /// Append a HAVING fragment. The fragment uses `$1, $2, ...` for its
    /// own values; indices are rebased into the outer query at render
    /// time. Multiple calls join with AND.
    pub fn having(mut self, fragment: &str, values: Vec<Value>) -> Self {
        self.having.push((fragment.to_string(), values));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    // ==================== RETURNING ====================

    /// Return only the named columns from a mutation.
    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.returning = ReturningPolicy::Columns(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Omit the RETURNING clause entirely.
    pub fn returning_none(mut self) -> Self {
        self.returning = ReturningPolicy::Suppressed;
        self
    }

    // ==================== ON CONFLICT ====================

    /// Start an ON CONFLICT clause over the given target columns.
    pub fn on_conflict(self, columns: &[&str]) -> OnConflictBuilder {
        OnConflictBuilder {
            builder: self,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    // ==================== Soft-delete scope ====================

    /// See every row, trashed or not.
    pub fn with_trashed(mut self) -> Self {
        self.scope = SoftDeleteScope::IncludeAll;
        self
    }

    /// See only trashed rows.
    pub fn only_trashed(mut self) -> Self {
        self.scope = SoftDeleteScope::OnlyTrashed;
        self
    }

    /// Stamp matching rows as deleted: an UPDATE setting the overlay
    /// column to now, restricted to rows not already trashed.
    pub async fn soft_delete(mut self) -> QuillResult<ExecResult> {
        let column = self.overlay_column()?;
        let now = chrono::Utc::now().naive_utc();
        self = self.set_operation(Operation::Update(Record::new().set(&column, now)));
        self.predicates.push(Predicate {
            connector: Connector::And,
            column,
            op: FilterOp::IsNull,
        });
        self.scope = SoftDeleteScope::IncludeAll;
        self.execute().await
    }

    /// Clear the deletion stamp on matching trashed rows.
    pub async fn restore(mut self) -> QuillResult<ExecResult> {
        let column = self.overlay_column()?;
        self = self.set_operation(Operation::Update(Record::new().set(&column, Value::Null)));
        self.predicates.push(Predicate {
            connector: Connector::And,
            column,
            op: FilterOp::IsNotNull,
        });
        self.scope = SoftDeleteScope::IncludeAll;
        self.execute().await
    }

    fn overlay_column(&self) -> QuillResult<String> {
        let Source::Table(table) = &self.source else {
            return Err(QuillError::configuration(
                "soft delete requires a base table",
            ));
        };
        let overlay = self
            .overlay
            .as_deref()
            .filter(|o| o.covers(table))
            .ok_or_else(|| {
                QuillError::configuration(format!(
                    "soft delete is not enabled for table '{table}'"
                ))
            })?;
        Ok(overlay.column_name().to_string())
    }

    // ==================== Rendering ====================

    /// Render to `(sql, params)` without executing.
    pub fn build(&self) -> QuillResult<(String, Vec<Value>)> {
        if let Some(message) = &self.error {
            return Err(QuillError::configuration(message.clone()));
        }
        let op = self.op.clone().unwrap_or(Operation::Select);
        if self.on_conflict.is_some() && !matches!(op, Operation::Insert(_)) {
            return Err(QuillError::configuration(
                "ON CONFLICT is only valid for INSERT",
            ));
        }
        let mut params = ParamList::new();
        let sql = match &op {
            Operation::Select => self.render_select(&mut params, false)?,
            Operation::Insert(rows) => self.render_insert(rows, &mut params)?,
            Operation::Update(assignments) => self.render_update(assignments, &mut params)?,
            Operation::Delete => self.render_delete(&mut params)?,
        };
        Ok((sql, params.into_values()))
    }

    /// Render the `SELECT COUNT(*)` form used by [`count`](Self::count):
    /// same source, joins, WHERE, and overlay; projection, GROUP BY,
    /// HAVING, ORDER BY, LIMIT, and OFFSET are dropped.
    pub fn build_count(&self) -> QuillResult<(String, Vec<Value>)> {
        if let Some(message) = &self.error {
            return Err(QuillError::configuration(message.clone()));
        }
        let mut params = ParamList::new();
        let sql = self.render_select(&mut params, true)?;
        Ok((sql, params.into_values()))
    }

    /// The rendered SQL, for inspection.
    pub fn to_sql(&self) -> QuillResult<String> {
        Ok(self.build()?.0)
    }

    /// The rendered COUNT SQL, for inspection.
    pub fn to_count_sql(&self) -> QuillResult<String> {
        Ok(self.build_count()?.0)
    }

    fn render_source(&self, params: &mut ParamList) -> QuillResult<String> {
        match &self.source {
            Source::Table(name) => Ok(quote_ident(name)),
            Source::Subquery { builder, alias } => {
                let (inner_sql, inner_params) = builder.build()?;
                let rebased = rebase_placeholders(&inner_sql, params.len());
                params.extend(inner_params);
                Ok(format!("({rebased}) AS {}", quote_ident(alias)))
            }
        }
    }

    /// The overlay's contribution, applied as a final pass over the IR.
    fn scope_predicate(&self) -> Option<Predicate> {
        let Source::Table(table) = &self.source else {
            return None;
        };
        let overlay = self.overlay.as_deref()?;
        if !overlay.covers(table) {
            return None;
        }
        let op = match self.scope {
            SoftDeleteScope::Default => FilterOp::IsNull,
            SoftDeleteScope::IncludeAll => return None,
            SoftDeleteScope::OnlyTrashed => FilterOp::IsNotNull,
        };
        Some(Predicate {
            connector: Connector::And,
            column: overlay.column_name().to_string(),
            op,
        })
    }

    fn render_where(
        &self,
        sql: &mut String,
        params: &mut ParamList,
        apply_overlay: bool,
    ) -> QuillResult<()> {
        let mut predicates = self.predicates.clone();
        if apply_overlay {
            predicates.extend(self.scope_predicate());
        }
        if !predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&render_predicates(&predicates, params)?);
        }
        Ok(())
    }

    fn render_select(&self, params: &mut ParamList, count: bool) -> QuillResult<String> {
        let projection = if count {
            "COUNT(*)".to_string()
        } else if self.projection.is_empty() {
            "*".to_string()
        } else {
            self.projection
                .iter()
                .map(|c| quote_projection(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut sql = format!("SELECT {projection} FROM {}", self.render_source(params)?);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&render_join(join));
        }
        self.render_where(&mut sql, params, true)?;
        if count {
            return Ok(sql);
        }
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(
                &self
                    .group_by
                    .iter()
                    .map(|c| quote_projection(c))
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
        if !self.having.is_empty() {
            let mut fragments = Vec::with_capacity(self.having.len());
            for (fragment, values) in &self.having {
                fragments.push(rebase_placeholders(fragment, params.len()));
                params.extend(values.iter().cloned());
            }
            sql.push_str(" HAVING ");
            sql.push_str(&fragments.join(" AND "));
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(
                &self
                    .order_by
                    .iter()
                    .map(|(c, dir)| format!("{} {}", quote_projection(c), dir.keyword()))
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(sql)
    }

    fn base_table(&self, what: &str) -> QuillResult<&str> {
        match &self.source {
            Source::Table(name) => Ok(name),
            Source::Subquery { .. } => Err(QuillError::configuration(format!(
                "{what} requires a base table"
            ))),
        }
    }

    fn render_insert(&self, rows: &[Record], params: &mut ParamList) -> QuillResult<String> {
        if !self.joins.is_empty() {
            return Err(QuillError::configuration("INSERT cannot carry joins"));
        }
        let table = self.base_table("INSERT")?;
        let first = rows.first().filter(|r| !r.is_empty()).ok_or_else(|| {
            QuillError::configuration("INSERT requires at least one row with at least one column")
        })?;
        let columns: Vec<&str> = first.columns().collect();
        let column_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut tuples = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let mut slots = Vec::with_capacity(columns.len());
            for column in &columns {
                let value = row.get(column).ok_or_else(|| {
                    QuillError::configuration(format!(
                        "INSERT row {i} is missing column '{column}'"
                    ))
                })?;
                slots.push(format!("${}", params.push(value.clone())));
            }
            tuples.push(format!("({})", slots.join(", ")));
        }
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_ident(table),
            column_list,
            tuples.join(", ")
        );
        if let Some(conflict) = &self.on_conflict {
            if conflict.columns.is_empty() {
                return Err(QuillError::configuration(
                    "ON CONFLICT requires at least one target column",
                ));
            }
            let targets = conflict
                .columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" ON CONFLICT ({targets})"));
            match &conflict.action {
                ConflictAction::DoNothing => sql.push_str(" DO NOTHING"),
                ConflictAction::DoUpdate(assignments) => {
                    if assignments.is_empty() {
                        return Err(QuillError::configuration(
                            "ON CONFLICT DO UPDATE requires at least one assignment",
                        ));
                    }
                    let sets = assignments
                        .entries()
                        .map(|(c, v)| format!("{} = ${}", quote_ident(c), params.push(v.clone())))
                        .collect::<Vec<_>>()
                        .join(", ");
                    sql.push_str(&format!(" DO UPDATE SET {sets}"));
                }
            }
        }
        self.push_returning(&mut sql);
        Ok(sql)
    }

    fn render_update(&self, assignments: &Record, params: &mut ParamList) -> QuillResult<String> {
        if !self.joins.is_empty() {
            return Err(QuillError::configuration("UPDATE cannot carry joins"));
        }
        let table = self.base_table("UPDATE")?;
        if assignments.is_empty() {
            return Err(QuillError::configuration(
                "UPDATE requires at least one assignment",
            ));
        }
        let sets = assignments
            .entries()
            .map(|(c, v)| format!("{} = ${}", quote_ident(c), params.push(v.clone())))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("UPDATE {} SET {}", quote_ident(table), sets);
        self.render_where(&mut sql, params, true)?;
        self.push_returning(&mut sql);
        Ok(sql)
    }

    fn render_delete(&self, params: &mut ParamList) -> QuillResult<String> {
        if !self.joins.is_empty() {
            return Err(QuillError::configuration("DELETE cannot carry joins"));
        }
        let table = self.base_table("DELETE")?;
        let mut sql = format!("DELETE FROM {}", quote_ident(table));
        self.render_where(&mut sql, params, false)?;
        self.push_returning(&mut sql);
        Ok(sql)
    }

    fn push_returning(&self, sql: &mut String) {
        match &self.returning {
            ReturningPolicy::Default => sql.push_str(" RETURNING *"),
            ReturningPolicy::Columns(columns) => {
                sql.push_str(" RETURNING ");
                sql.push_str(
                    &columns
                        .iter()
                        .map(|c| quote_ident(c))
                        .collect::<Vec<_>>()
                        .join(", "),
                );
            }
            ReturningPolicy::Suppressed => {}
        }
    }

    // ==================== Terminals ====================

    fn bound_driver(&self) -> QuillResult<Arc<dyn Driver>> {
        self.driver.clone().ok_or_else(|| {
            QuillError::configuration("builder is not bound to a database handle")
        })
    }

    /// Render and execute, returning rows and the affected count.
    pub async fn execute(self) -> QuillResult<ExecResult> {
        let driver = self.bound_driver()?;
        let (sql, params) = self.build()?;
        driver.exec(&sql, &params).await
    }

    /// Execute with `LIMIT 1`; `None` when nothing matched.
    pub async fn first(mut self) -> QuillResult<Option<Row>> {
        self.limit = Some(1);
        let result = self.execute().await?;
        Ok(result.rows.into_iter().next())
    }

    /// Execute the COUNT form and coerce the returned value to an integer.
    pub async fn count(self) -> QuillResult<i64> {
        let driver = self.bound_driver()?;
        let (sql, params) = self.build_count()?;
        let result = driver.exec(&sql, &params).await?;
        let row = result
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| QuillError::driver("count query returned no rows"))?;
        match row.value_at(0) {
            Some(Value::Int(n)) => Ok(*n),
            Some(Value::Float(f)) => Ok(*f as i64),
            Some(Value::Text(s)) => s
                .trim()
                .parse()
                .map_err(|_| QuillError::driver(format!("count value '{s}' is not an integer"))),
            other => Err(QuillError::driver(format!(
                "unexpected count value: {other:?}"
            ))),
        }
    }
}

fn render_join(join: &Join) -> String {
    let (left, op, right) = &join.on;
    format!(
        "{} {} ON {} {} {}",
        join.kind.keyword(),
        quote_ident(&join.table),
        quote_ident(left),
        op,
        quote_ident(right)
    )
}

/// Second step of [`QueryBuilder::on_conflict`].
pub struct OnConflictBuilder {
    builder: QueryBuilder,
    columns: Vec<String>,
}

impl OnConflictBuilder {
    /// `ON CONFLICT (...) DO NOTHING`.
    pub fn do_nothing(mut self) -> QueryBuilder {
        self.builder.on_conflict = Some(OnConflict {
            columns: self.columns,
            action: ConflictAction::DoNothing,
        });
        self.builder
    }

    /// `ON CONFLICT (...) DO UPDATE SET ...` with the given assignments;
    /// their values are numbered after the row values.
    pub fn do_update(mut self, assignments: Record) -> QueryBuilder {
        self.builder.on_conflict = Some(OnConflict {
            columns: self.columns,
            action: ConflictAction::DoUpdate(assignments),
        });
        self.builder
    }
}
