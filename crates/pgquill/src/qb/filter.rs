//! User-facing filter objects and their desugaring into the operator IR.
//!
//! A [`Filter`] is an ordered mapping from column name to a [`Cond`]. It
//! can be assembled with the typed chain methods or parsed from a JSON
//! object, in which case the shapes follow the filter grammar:
//!
//! | JSON value | Meaning |
//! |---|---|
//! | `null` | `col IS NULL` |
//! | scalar | `col = $n` |
//! | `{"in": [...]}` / `{"notIn": [...]}` | membership tests |
//! | `{"like": s}` / `{"ilike": s}` | pattern match |
//! | `{"gt"\|"gte"\|"lt"\|"lte"\|"not": v}` | comparisons (`!=` for `not`) |
//! | `{"between": [lo, hi]}` | range, exactly two values |
//!
//! Multiple operator keys in one object expand to multiple predicates in
//! key order.

use crate::error::{QuillError, QuillResult};
use crate::qb::expr::{Connector, FilterOp, Predicate};
use crate::qb::QueryBuilder;
use crate::value::Value;

/// A condition applied to a single column.
#[derive(Debug, Clone)]
pub enum Cond {
    /// Scalar equality; a NULL value desugars to `IS NULL`.
    Value(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// `!=`.
    Not(Value),
    Like(String),
    ILike(String),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Between(Value, Value),
    /// `col IN (subquery)`.
    Subquery(QueryBuilder),
    /// Several conditions on the same column, expanded in order.
    All(Vec<Cond>),
}

impl Cond {
    pub fn gt(value: impl Into<Value>) -> Self {
        Cond::Gt(value.into())
    }

    pub fn gte(value: impl Into<Value>) -> Self {
        Cond::Gte(value.into())
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        Cond::Lt(value.into())
    }

    pub fn lte(value: impl Into<Value>) -> Self {
        Cond::Lte(value.into())
    }

    pub fn not(value: impl Into<Value>) -> Self {
        Cond::Not(value.into())
    }

    pub fn like(pattern: impl Into<String>) -> Self {
        Cond::Like(pattern.into())
    }

    pub fn ilike(pattern: impl Into<String>) -> Self {
        Cond::ILike(pattern.into())
    }

    pub fn in_list<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Cond::In(values.into_iter().map(Into::into).collect())
    }

    pub fn not_in<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Cond::NotIn(values.into_iter().map(Into::into).collect())
    }

    pub fn between(lo: impl Into<Value>, hi: impl Into<Value>) -> Self {
        Cond::Between(lo.into(), hi.into())
    }

    pub fn subquery(builder: QueryBuilder) -> Self {
        Cond::Subquery(builder)
    }

    pub fn all(conds: impl IntoIterator<Item = Cond>) -> Self {
        Cond::All(conds.into_iter().collect())
    }
}

impl From<Value> for Cond {
    fn from(v: Value) -> Self {
        Cond::Value(v)
    }
}

impl From<bool> for Cond {
    fn from(v: bool) -> Self {
        Cond::Value(v.into())
    }
}

impl From<i32> for Cond {
    fn from(v: i32) -> Self {
        Cond::Value(v.into())
    }
}

impl From<i64> for Cond {
    fn from(v: i64) -> Self {
        Cond::Value(v.into())
    }
}

impl From<f64> for Cond {
    fn from(v: f64) -> Self {
        Cond::Value(v.into())
    }
}

impl From<&str> for Cond {
    fn from(v: &str) -> Self {
        Cond::Value(v.into())
    }
}

impl From<String> for Cond {
    fn from(v: String) -> Self {
        Cond::Value(v.into())
    }
}

/// An ordered mapping from column name (possibly dotted) to condition.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    entries: Vec<(String, Cond)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition on a column.
    pub fn field(mut self, column: &str, cond: impl Into<Cond>) -> Self {
        self.entries.push((column.to_string(), cond.into()));
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.field(column, Cond::Value(value.into()))
    }

    pub fn ne(self, column: &str, value: impl Into<Value>) -> Self {
        self.field(column, Cond::not(value))
    }

    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.field(column, Cond::gt(value))
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.field(column, Cond::gte(value))
    }

    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.field(column, Cond::lt(value))
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.field(column, Cond::lte(value))
    }

    pub fn like(self, column: &str, pattern: impl Into<String>) -> Self {
        self.field(column, Cond::like(pattern))
    }

    pub fn ilike(self, column: &str, pattern: impl Into<String>) -> Self {
        self.field(column, Cond::ilike(pattern))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.field(column, Cond::Value(Value::Null))
    }

    pub fn in_list<T: Into<Value>>(
        self,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.field(column, Cond::in_list(values))
    }

    pub fn not_in<T: Into<Value>>(
        self,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.field(column, Cond::not_in(values))
    }

    pub fn between(self, column: &str, lo: impl Into<Value>, hi: impl Into<Value>) -> Self {
        self.field(column, Cond::between(lo, hi))
    }

    pub fn subquery(self, column: &str, builder: QueryBuilder) -> Self {
        self.field(column, Cond::Subquery(builder))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a JSON object into a filter.
    ///
    /// Key order is preserved, so predicates come out in author order.
    pub fn from_json(value: &serde_json::Value) -> QuillResult<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(QuillError::configuration("filter must be a JSON object"));
        };
        let mut filter = Filter::new();
        for (column, condition) in map {
            filter
                .entries
                .push((column.clone(), cond_from_json(column, condition)?));
        }
        Ok(filter)
    }

    /// Flatten into predicates, each carrying the call's connector.
    pub(crate) fn desugar(self, connector: Connector) -> Vec<Predicate> {
        let mut out = Vec::with_capacity(self.entries.len());
        for (column, cond) in self.entries {
            push_cond(&column, cond, connector, &mut out);
        }
        out
    }
}

fn push_cond(column: &str, cond: Cond, connector: Connector, out: &mut Vec<Predicate>) {
    let op = match cond {
        Cond::Value(v) if v.is_null() => FilterOp::IsNull,
        Cond::Value(v) => FilterOp::Eq(v),
        Cond::Gt(v) => FilterOp::Gt(v),
        Cond::Gte(v) => FilterOp::Gte(v),
        Cond::Lt(v) => FilterOp::Lt(v),
        Cond::Lte(v) => FilterOp::Lte(v),
        Cond::Not(v) => FilterOp::Ne(v),
        Cond::Like(p) => FilterOp::Like(Value::Text(p)),
        Cond::ILike(p) => FilterOp::ILike(Value::Text(p)),
        Cond::In(values) => FilterOp::In(values),
        Cond::NotIn(values) => FilterOp::NotIn(values),
        Cond::Between(lo, hi) => FilterOp::Between(lo, hi),
        Cond::Subquery(builder) => FilterOp::InSubquery(Box::new(builder)),
        Cond::All(conds) => {
            for inner in conds {
                push_cond(column, inner, connector, out);
            }
            return;
        }
    };
    out.push(Predicate {
        connector,
        column: column.to_string(),
        op,
    });
}

fn cond_from_json(column: &str, value: &serde_json::Value) -> QuillResult<Cond> {
    match value {
        serde_json::Value::Null => Ok(Cond::Value(Value::Null)),
        serde_json::Value::Bool(_) | serde_json::Value::Number(_) | serde_json::Value::String(_) => {
            Ok(Cond::Value(Value::from_json(value)))
        }
        serde_json::Value::Array(_) => Err(QuillError::configuration(format!(
            "filter on '{column}': bare arrays are not a condition; use {{\"in\": [...]}}"
        ))),
        serde_json::Value::Object(ops) => {
            let mut conds = Vec::with_capacity(ops.len());
            for (op, operand) in ops {
                conds.push(op_from_json(column, op, operand)?);
            }
            match conds.len() {
                0 => Err(QuillError::configuration(format!(
                    "filter on '{column}': empty operator object"
                ))),
                1 => Ok(conds.into_iter().next().unwrap()),
                _ => Ok(Cond::All(conds)),
            }
        }
    }
}

fn op_from_json(column: &str, op: &str, operand: &serde_json::Value) -> QuillResult<Cond> {
    let list = |operand: &serde_json::Value| -> QuillResult<Vec<Value>> {
        match operand {
            serde_json::Value::Array(items) => Ok(items.iter().map(Value::from_json).collect()),
            _ => Err(QuillError::configuration(format!(
                "filter on '{column}': '{op}' takes an array"
            ))),
        }
    };
    let pattern = |operand: &serde_json::Value| -> QuillResult<String> {
        match operand {
            serde_json::Value::String(s) => Ok(s.clone()),
            _ => Err(QuillError::configuration(format!(
                "filter on '{column}': '{op}' takes a string pattern"
            ))),
        }
    };
    Ok(match op {
        "in" => Cond::In(list(operand)?),
        "notIn" => Cond::NotIn(list(operand)?),
        "like" => Cond::Like(pattern(operand)?),
        "ilike" => Cond::ILike(pattern(operand)?),
        "gt" => Cond::Gt(Value::from_json(operand)),
        "gte" => Cond::Gte(Value::from_json(operand)),
        "lt" => Cond::Lt(Value::from_json(operand)),
        "lte" => Cond::Lte(Value::from_json(operand)),
        "not" => Cond::Not(Value::from_json(operand)),
        "between" => {
            let bounds = list(operand)?;
            if bounds.len() != 2 {
                return Err(QuillError::configuration(format!(
                    "filter on '{column}': 'between' requires exactly two values"
                )));
            }
            let mut bounds = bounds.into_iter();
            Cond::Between(bounds.next().unwrap(), bounds.next().unwrap())
        }
        "subquery" => {
            return Err(QuillError::configuration(format!(
                "filter on '{column}': subqueries cannot be expressed in JSON; use Cond::subquery"
            )));
        }
        other => {
            return Err(QuillError::configuration(format!(
                "filter on '{column}': unknown operator '{other}'"
            )));
        }
    })
}
