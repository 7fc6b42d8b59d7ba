//! Boolean interpretation of values.
//!
//! Predicates can have any result type. Both filter engines and the logical
//! operators read truth values through these two functions, which agree by
//! construction: the column form only short-cuts fixed-width types.

use serde_json::Value as JsonValue;
use vireo_common::types::{EvalType, Value};
use vireo_common::utils::error::Result;

use crate::execution::Column;

/// Truth value of `value`; `None` for NULL.
///
/// Numbers are true when non-zero. Strings use their leading numeric prefix,
/// so `"3 apples"` is true and `"apple"` is false. Datetimes are always true.
/// JSON numbers and booleans are read as such; any other document is true.
#[must_use]
pub fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Int64(v) => Some(*v != 0),
        Value::Float64(v) => Some(*v != 0.0),
        Value::Decimal(d) => Some(!d.is_zero()),
        Value::String(s) => Some(leading_f64(s) != 0.0),
        Value::DateTime(_) => Some(true),
        Value::Duration(d) => Some(!d.is_zero()),
        Value::Json(j) => Some(json_truthy(j)),
    }
}

/// Truth value of row `index` of `column`.
pub(crate) fn truth_at(column: &Column, index: usize) -> Result<Option<bool>> {
    if column.is_null(index) {
        return Ok(None);
    }
    let truth = match column.data_type().eval_type() {
        EvalType::Int => column.get_int64(index).map(|v| v != 0),
        EvalType::Real => column
            .get_float64(index)
            .or_else(|| column.get_float32(index).map(f64::from))
            .map(|v| v != 0.0),
        EvalType::Decimal => column.get_decimal(index).map(|d| !d.is_zero()),
        EvalType::Duration => column.get_duration(index).map(|d| !d.is_zero()),
        EvalType::String | EvalType::Datetime | EvalType::Json => {
            truthy(&column.get_value(index)?)
        }
    };
    Ok(truth)
}

fn json_truthy(doc: &JsonValue) -> bool {
    match doc {
        JsonValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        JsonValue::Bool(b) => *b,
        _ => true,
    }
}

/// Parses the longest numeric prefix of `s`, ignoring leading whitespace.
/// No numeric prefix reads as zero.
fn leading_f64(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        has_digits |= frac_end > end + 1;
        end = frac_end;
    }
    if !has_digits {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    s[..end].parse().unwrap_or(0.0)
}
