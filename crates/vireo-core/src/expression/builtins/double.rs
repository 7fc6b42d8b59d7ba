//! `double(x)`: one kernel per eval type.
//!
//! | Input | Result |
//! | ----- | ------ |
//! | integer, real | `x * 2` |
//! | decimal | `x + x`, one more digit of precision |
//! | string | `x` concatenated with itself |
//! | datetime | `x` plus its own time of day |
//! | duration | `x + x` |
//! | json | `{"key": 2 * x.key}` |

use std::sync::Arc;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use serde_json::{Value as JsonValue, json};
use vireo_common::types::{Decimal, EvalType, LogicalType, MAX_DECIMAL_PRECISION, Value};
use vireo_common::utils::error::{Error, Result};

use super::{fit_decimal, one, rowwise, unary_fixed};
use crate::execution::{Column, DataChunk};
use crate::expression::context::EvalContext;
use crate::expression::function::{FunctionKind, ScalarFunction};

const JSON_KEY: &str = "key";

pub(super) fn return_type(args: &[LogicalType]) -> Result<LogicalType> {
    let arg = one(FunctionKind::Double, args)?;
    Ok(match *arg {
        LogicalType::Decimal { precision, scale } => {
            LogicalType::decimal((precision + 1).min(MAX_DECIMAL_PRECISION), scale)
        }
        other => other.widened(),
    })
}

fn int(x: i64) -> Result<i64> {
    x.checked_mul(2)
        .ok_or_else(|| Error::overflow("BIGINT", format!("({x} * 2)")))
}

fn real(x: f64) -> Result<f64> {
    let doubled = x * 2.0;
    if doubled.is_finite() {
        Ok(doubled)
    } else {
        Err(Error::overflow("DOUBLE", format!("({x} * 2)")))
    }
}

fn decimal(x: Decimal, ret_type: LogicalType) -> Result<Decimal> {
    let doubled = x
        .checked_add(x)
        .ok_or_else(|| Error::overflow("DECIMAL", format!("({x} + {x})")))?;
    fit_decimal(doubled, ret_type)
}

fn datetime(x: NaiveDateTime) -> Result<NaiveDateTime> {
    let time_of_day = x.time().signed_duration_since(NaiveTime::MIN);
    x.checked_add_signed(time_of_day)
        .ok_or_else(|| Error::InvalidTime(format!("{x} + {time_of_day}")))
}

fn duration(x: TimeDelta) -> Result<TimeDelta> {
    x.checked_add(&x)
        .ok_or_else(|| Error::overflow("TIME", format!("({x} + {x})")))
}

fn json(doc: &JsonValue) -> Result<JsonValue> {
    let field = doc.get(JSON_KEY).ok_or_else(|| Error::PathNotFound {
        path: format!("$.{JSON_KEY}"),
    })?;
    let doubled = if let Some(x) = field.as_i64() {
        json!(int(x)?)
    } else if let Some(x) = field.as_f64() {
        json!(real(x)?)
    } else {
        return Err(Error::Conversion(format!(
            "cannot double non-numeric JSON {field}"
        )));
    };
    Ok(json!({ JSON_KEY: doubled }))
}

pub(super) fn eval_row(args: &[Value], ret_type: LogicalType) -> Result<Value> {
    match one(FunctionKind::Double, args)? {
        Value::Null => Ok(Value::Null),
        Value::Int64(x) => int(*x).map(Value::Int64),
        Value::Float64(x) => real(*x).map(Value::Float64),
        Value::Decimal(x) => decimal(*x, ret_type).map(Value::Decimal),
        Value::String(s) => Ok(Value::from(format!("{s}{s}"))),
        Value::DateTime(x) => datetime(*x).map(Value::DateTime),
        Value::Duration(x) => duration(*x).map(Value::Duration),
        Value::Json(doc) => json(doc).map(|v| Value::Json(Arc::new(v))),
    }
}

pub(super) fn vec_eval(
    func: &ScalarFunction,
    ctx: &EvalContext<'_>,
    chunk: &DataChunk,
    result: &mut Column,
) -> Result<()> {
    let ret_type = func.return_type();
    let arg = one(FunctionKind::Double, func.args())?;
    match ret_type.eval_type() {
        EvalType::Int => unary_fixed::<i64, i64, _>(ctx, chunk, arg, ret_type, result, int),
        EvalType::Real => unary_fixed::<f64, f64, _>(ctx, chunk, arg, ret_type, result, real),
        EvalType::Decimal => {
            unary_fixed::<Decimal, Decimal, _>(ctx, chunk, arg, ret_type, result, |x| {
                decimal(x, ret_type)
            })
        }
        EvalType::Datetime => {
            unary_fixed::<NaiveDateTime, NaiveDateTime, _>(ctx, chunk, arg, ret_type, result, datetime)
        }
        EvalType::Duration => {
            unary_fixed::<TimeDelta, TimeDelta, _>(ctx, chunk, arg, ret_type, result, duration)
        }
        EvalType::String => rowwise(ctx, chunk, func.args(), ret_type, result, |cols, i| {
            let s = cols[0].get_string(i).unwrap_or_default();
            Ok(Value::from(format!("{s}{s}")))
        }),
        EvalType::Json => rowwise(ctx, chunk, func.args(), ret_type, result, |cols, i| {
            match cols[0].get_json(i)? {
                Some(doc) => json(&doc).map(Value::from),
                None => Ok(Value::Null),
            }
        }),
    }
}
