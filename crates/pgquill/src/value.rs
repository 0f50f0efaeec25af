//! Runtime values carried through query parameters, result rows, and
//! schema defaults.

use chrono::NaiveDateTime;
use uuid::Uuid;

/// A dynamically typed SQL value.
///
/// Parameter vectors, result rows, and column defaults are all expressed
/// in terms of `Value`, so schemas and queries can be assembled entirely
/// at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Text.
    Text(String),
    /// Timestamp without timezone.
    Timestamp(NaiveDateTime),
    /// UUID.
    Uuid(Uuid),
    /// JSON document (JSONB on the wire).
    Json(serde_json::Value),
    /// Homogeneous array of scalar values.
    Array(Vec<Value>),
}

impl Value {
    /// Check whether this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render this value as an inline SQL literal, if it has a literal form.
    ///
    /// Only the kinds accepted as column defaults render: integers and
    /// floats directly, booleans as `TRUE`/`FALSE`, text single-quoted with
    /// embedded quotes doubled, timestamps ISO-8601 single-quoted.
    pub(crate) fn to_literal(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Bool(v) => Some(if *v { "TRUE" } else { "FALSE" }.to_string()),
            Value::Text(s) => Some(quote_literal(s)),
            Value::Timestamp(ts) => Some(format!("'{}'", ts.format("%Y-%m-%dT%H:%M:%S%.f"))),
            _ => None,
        }
    }

    /// Convert a JSON value into a `Value`.
    ///
    /// Objects stay JSON documents; arrays become [`Value::Array`] with
    /// each element converted recursively.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            obj @ serde_json::Value::Object(_) => Value::Json(obj.clone()),
        }
    }
}

/// Single-quote a string literal, doubling embedded single quotes.
pub(crate) fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_literal() {
        assert_eq!(Value::Int(42).to_literal().unwrap(), "42");
    }

    #[test]
    fn bool_literals() {
        assert_eq!(Value::Bool(true).to_literal().unwrap(), "TRUE");
        assert_eq!(Value::Bool(false).to_literal().unwrap(), "FALSE");
    }

    #[test]
    fn text_literal_doubles_quotes() {
        assert_eq!(
            Value::Text("O'Brien".to_string()).to_literal().unwrap(),
            "'O''Brien'"
        );
    }

    #[test]
    fn timestamp_literal_is_iso8601() {
        let ts = NaiveDateTime::parse_from_str("2024-05-01 12:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(
            Value::Timestamp(ts).to_literal().unwrap(),
            "'2024-05-01T12:30:00'"
        );
    }

    #[test]
    fn json_and_array_have_no_literal() {
        assert!(Value::Json(serde_json::json!({})).to_literal().is_none());
        assert!(Value::Array(vec![]).to_literal().is_none());
    }

    #[test]
    fn from_json_scalars() {
        assert_eq!(Value::from_json(&serde_json::json!(null)), Value::Null);
        assert_eq!(Value::from_json(&serde_json::json!(7)), Value::Int(7));
        assert_eq!(
            Value::from_json(&serde_json::json!("x")),
            Value::Text("x".to_string())
        );
    }

    #[test]
    fn option_none_is_null() {
        let v: Value = Option::<i64>::None.into();
        assert!(v.is_null());
    }
}
