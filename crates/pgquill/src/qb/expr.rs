//! The predicate IR and its SQL rendering.
//!
//! Filter objects desugar into a flat ordered sequence of [`Predicate`]s.
//! Rendering walks the sequence once: the first predicate's connector is
//! dropped, later connectors are emitted verbatim, and no parentheses are
//! inserted. Callers needing strict precedence use subqueries.

use crate::error::QuillResult;
use crate::ident::quote_ident;
use crate::qb::param::{rebase_placeholders, ParamList};
use crate::qb::QueryBuilder;
use crate::value::Value;

/// Boolean connector joining a predicate to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    fn keyword(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// A single comparison in the operator IR.
#[derive(Debug, Clone)]
pub enum FilterOp {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Like(Value),
    ILike(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Between(Value, Value),
    IsNull,
    IsNotNull,
    /// `col IN (subquery)`; the nested builder is owned by the predicate.
    InSubquery(Box<QueryBuilder>),
}

/// One entry in a builder's predicate sequence.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub connector: Connector,
    pub column: String,
    pub op: FilterOp,
}

/// Render a predicate sequence (without the `WHERE` keyword).
pub(crate) fn render_predicates(
    predicates: &[Predicate],
    params: &mut ParamList,
) -> QuillResult<String> {
    let mut out = String::new();
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            out.push(' ');
            out.push_str(predicate.connector.keyword());
            out.push(' ');
        }
        out.push_str(&render_predicate(predicate, params)?);
    }
    Ok(out)
}

fn render_predicate(predicate: &Predicate, params: &mut ParamList) -> QuillResult<String> {
    let column = quote_ident(&predicate.column);
    Ok(match &predicate.op {
        FilterOp::Eq(v) => binary(&column, "=", v, params),
        FilterOp::Ne(v) => binary(&column, "!=", v, params),
        FilterOp::Gt(v) => binary(&column, ">", v, params),
        FilterOp::Gte(v) => binary(&column, ">=", v, params),
        FilterOp::Lt(v) => binary(&column, "<", v, params),
        FilterOp::Lte(v) => binary(&column, "<=", v, params),
        FilterOp::Like(v) => binary(&column, "LIKE", v, params),
        FilterOp::ILike(v) => binary(&column, "ILIKE", v, params),
        FilterOp::In(values) => {
            if values.is_empty() {
                // An empty IN list can never match.
                "1=0".to_string()
            } else {
                format!("{column} IN ({})", placeholders(values, params))
            }
        }
        FilterOp::NotIn(values) => {
            if values.is_empty() {
                "1=1".to_string()
            } else {
                format!("{column} NOT IN ({})", placeholders(values, params))
            }
        }
        FilterOp::Between(lo, hi) => {
            let lo_idx = params.push(lo.clone());
            let hi_idx = params.push(hi.clone());
            format!("{column} BETWEEN ${lo_idx} AND ${hi_idx}")
        }
        FilterOp::IsNull => format!("{column} IS NULL"),
        FilterOp::IsNotNull => format!("{column} IS NOT NULL"),
        FilterOp::InSubquery(inner) => {
            let (inner_sql, inner_params) = inner.build()?;
            let rebased = rebase_placeholders(&inner_sql, params.len());
            params.extend(inner_params);
            format!("{column} IN ({rebased})")
        }
    })
}

fn binary(column: &str, op: &str, value: &Value, params: &mut ParamList) -> String {
    let idx = params.push(value.clone());
    format!("{column} {op} ${idx}")
}

fn placeholders(values: &[Value], params: &mut ParamList) -> String {
    values
        .iter()
        .map(|v| format!("${}", params.push(v.clone())))
        .collect::<Vec<_>>()
        .join(", ")
}
