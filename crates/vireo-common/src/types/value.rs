//! Dynamically-typed scalar values.
//!
//! [`Value`] is what a single cell looks like once it leaves a column: it is
//! used for constants in expression trees, for the row-at-a-time result of an
//! evaluator, and for building chunks in tests.

use std::fmt;
use std::sync::Arc;

use arcstr::ArcStr;
use chrono::{NaiveDateTime, TimeDelta};
use serde_json::Value as JsonValue;

use super::{Decimal, EvalType};

/// A dynamically-typed scalar value.
///
/// # Examples
///
/// ```
/// use vireo_common::types::Value;
///
/// let n = Value::from(30i64);
/// let s = Value::from("Alice");
///
/// assert_eq!(n.as_int64(), Some(30));
/// assert_eq!(s.as_str(), Some("Alice"));
/// assert!(Value::Null.is_null());
/// ```
#[derive(Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,

    /// 64-bit signed integer (booleans are 0 / 1)
    Int64(i64),

    /// 64-bit floating point
    Float64(f64),

    /// Exact decimal
    Decimal(Decimal),

    /// UTF-8 string (uses ArcStr for cheap cloning)
    String(ArcStr),

    /// Date and time without zone
    DateTime(NaiveDateTime),

    /// Signed time span
    Duration(TimeDelta),

    /// JSON document
    Json(Arc<JsonValue>),
}

impl Value {
    /// Returns `true` if this value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the integer value if this is an Int64, otherwise None.
    #[inline]
    #[must_use]
    pub const fn as_int64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float value if this is a Float64, otherwise None.
    #[inline]
    #[must_use]
    pub const fn as_float64(&self) -> Option<f64> {
        match self {
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the decimal value if this is a Decimal, otherwise None.
    #[inline]
    #[must_use]
    pub const fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the string value if this is a String, otherwise None.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the datetime if this is a DateTime, otherwise None.
    #[inline]
    #[must_use]
    pub const fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(t) => Some(*t),
            _ => None,
        }
    }

    /// Returns the duration if this is a Duration, otherwise None.
    #[inline]
    #[must_use]
    pub const fn as_duration(&self) -> Option<TimeDelta> {
        match self {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the JSON document if this is Json, otherwise None.
    #[inline]
    #[must_use]
    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Value::Json(j) => Some(j),
            _ => None,
        }
    }

    /// Returns the evaluator family of a non-null value.
    #[must_use]
    pub const fn eval_type(&self) -> Option<EvalType> {
        match self {
            Value::Null => None,
            Value::Int64(_) => Some(EvalType::Int),
            Value::Float64(_) => Some(EvalType::Real),
            Value::Decimal(_) => Some(EvalType::Decimal),
            Value::String(_) => Some(EvalType::String),
            Value::DateTime(_) => Some(EvalType::Datetime),
            Value::Duration(_) => Some(EvalType::Duration),
            Value::Json(_) => Some(EvalType::Json),
        }
    }

    /// Returns a short name for the variant, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Int64(_) => "BIGINT",
            Value::Float64(_) => "DOUBLE",
            Value::Decimal(_) => "DECIMAL",
            Value::String(_) => "VARCHAR",
            Value::DateTime(_) => "DATETIME",
            Value::Duration(_) => "TIME",
            Value::Json(_) => "JSON",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Int64(i) => write!(f, "Int64({i})"),
            Value::Float64(v) => write!(f, "Float64({v})"),
            Value::Decimal(d) => write!(f, "Decimal({d})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::DateTime(t) => write!(f, "DateTime({t})"),
            Value::Duration(d) => write!(f, "Duration({d})"),
            Value::Json(j) => write!(f, "Json({j})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::DateTime(t) => write!(f, "{t}"),
            Value::Duration(d) => write!(f, "{d}"),
            Value::Json(j) => write!(f, "{j}"),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Int64(i64::from(b))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float64(f)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(t: NaiveDateTime) -> Self {
        Value::DateTime(t)
    }
}

impl From<TimeDelta> for Value {
    fn from(d: TimeDelta) -> Self {
        Value::Duration(d)
    }
}

impl From<JsonValue> for Value {
    fn from(j: JsonValue) -> Self {
        Value::Json(Arc::new(j))
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::from(42i64).as_int64(), Some(42));
        assert_eq!(Value::from(true).as_int64(), Some(1));
        assert_eq!(Value::from(2.5).as_float64(), Some(2.5));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(
            Value::from(Decimal::from_i64(3)).as_decimal(),
            Some(Decimal::from_i64(3))
        );
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(42i64).as_str(), None);
    }

    #[test]
    fn test_eval_type() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Value::from(dt).eval_type(), Some(EvalType::Datetime));
        assert_eq!(
            Value::from(TimeDelta::seconds(1)).eval_type(),
            Some(EvalType::Duration)
        );
        assert_eq!(
            Value::from(serde_json::json!({"a": 1})).eval_type(),
            Some(EvalType::Json)
        );
        assert_eq!(Value::Null.eval_type(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::from("hi").to_string(), "\"hi\"");
        assert_eq!(
            Value::from(serde_json::json!({"k": 1})).to_string(),
            "{\"k\":1}"
        );
    }
}
