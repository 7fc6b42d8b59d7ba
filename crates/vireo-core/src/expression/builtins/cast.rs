//! Numeric casts and timestamp-to-local conversion.

use chrono::{NaiveDateTime, TimeDelta};
use vireo_common::types::{Decimal, EvalType, LogicalType, MAX_DECIMAL_PRECISION, Value};
use vireo_common::utils::error::{Error, Result};

use super::{fit_decimal, mismatch, one, unary_fixed};
use crate::execution::{Column, DataChunk};
use crate::expression::context::EvalContext;
use crate::expression::function::{FunctionKind, ScalarFunction};

/// Digits in `i64::MIN`.
const INT_DECIMAL_PRECISION: u8 = 20;
const REAL_DECIMAL_SCALE: u8 = 10;

pub(super) fn return_type(kind: FunctionKind, args: &[LogicalType]) -> Result<LogicalType> {
    let arg = *one(kind, args)?;
    let (expected, ret_type) = match kind {
        FunctionKind::CastIntToReal => (EvalType::Int, LogicalType::Float64),
        FunctionKind::CastIntToDecimal => (
            EvalType::Int,
            LogicalType::decimal(INT_DECIMAL_PRECISION, 0),
        ),
        FunctionKind::CastRealToDecimal => (
            EvalType::Real,
            LogicalType::decimal(MAX_DECIMAL_PRECISION, REAL_DECIMAL_SCALE),
        ),
        FunctionKind::CastDecimalToReal => (EvalType::Decimal, LogicalType::Float64),
        _ => {
            if arg != LogicalType::Timestamp {
                return Err(Error::type_mismatch(LogicalType::Timestamp, arg));
            }
            return Ok(LogicalType::DateTime);
        }
    };
    if arg.eval_type() != expected {
        return Err(Error::type_mismatch(expected, arg));
    }
    Ok(ret_type)
}

#[allow(clippy::cast_precision_loss)]
fn int_to_real(x: i64) -> Result<f64> {
    Ok(x as f64)
}

fn int_to_decimal(x: i64, ret_type: LogicalType) -> Result<Decimal> {
    fit_decimal(Decimal::from_i64(x), ret_type)
}

fn real_to_decimal(x: f64, ret_type: LogicalType) -> Result<Decimal> {
    fit_decimal(Decimal::from_f64(x)?, ret_type)
}

fn decimal_to_real(x: Decimal) -> Result<f64> {
    Ok(x.to_f64())
}

/// Shifts a UTC timestamp into the session zone.
fn to_local(ts: NaiveDateTime, offset_secs: i32) -> Result<NaiveDateTime> {
    ts.checked_add_signed(TimeDelta::seconds(i64::from(offset_secs)))
        .ok_or_else(|| Error::InvalidTime(format!("{ts} shifted by {offset_secs}s")))
}

pub(super) fn eval_row(
    kind: FunctionKind,
    ctx: &EvalContext<'_>,
    args: &[Value],
    ret_type: LogicalType,
) -> Result<Value> {
    let arg = one(kind, args)?;
    if arg.is_null() {
        return Ok(Value::Null);
    }
    match (kind, arg) {
        (FunctionKind::CastIntToReal, Value::Int64(x)) => int_to_real(*x).map(Value::Float64),
        (FunctionKind::CastIntToDecimal, Value::Int64(x)) => {
            int_to_decimal(*x, ret_type).map(Value::Decimal)
        }
        (FunctionKind::CastRealToDecimal, Value::Float64(x)) => {
            real_to_decimal(*x, ret_type).map(Value::Decimal)
        }
        (FunctionKind::CastDecimalToReal, Value::Decimal(x)) => {
            decimal_to_real(*x).map(Value::Float64)
        }
        (FunctionKind::ToLocalTime, Value::DateTime(ts)) => {
            to_local(*ts, ctx.time_zone().local_minus_utc()).map(Value::DateTime)
        }
        (FunctionKind::CastIntToReal | FunctionKind::CastIntToDecimal, other) => {
            Err(mismatch(EvalType::Int, other))
        }
        (FunctionKind::CastRealToDecimal, other) => Err(mismatch(EvalType::Real, other)),
        (FunctionKind::CastDecimalToReal, other) => Err(mismatch(EvalType::Decimal, other)),
        (_, other) => Err(mismatch(EvalType::Datetime, other)),
    }
}

pub(super) fn vec_eval(
    func: &ScalarFunction,
    ctx: &EvalContext<'_>,
    chunk: &DataChunk,
    result: &mut Column,
) -> Result<()> {
    let kind = func.kind();
    let ret_type = func.return_type();
    let arg = one(kind, func.args())?;
    match kind {
        FunctionKind::CastIntToReal => {
            unary_fixed::<i64, f64, _>(ctx, chunk, arg, ret_type, result, int_to_real)
        }
        FunctionKind::CastIntToDecimal => {
            unary_fixed::<i64, Decimal, _>(ctx, chunk, arg, ret_type, result, |x| {
                int_to_decimal(x, ret_type)
            })
        }
        FunctionKind::CastRealToDecimal => {
            unary_fixed::<f64, Decimal, _>(ctx, chunk, arg, ret_type, result, |x| {
                real_to_decimal(x, ret_type)
            })
        }
        FunctionKind::CastDecimalToReal => {
            unary_fixed::<Decimal, f64, _>(ctx, chunk, arg, ret_type, result, decimal_to_real)
        }
        _ => {
            let offset = ctx.time_zone().local_minus_utc();
            unary_fixed::<NaiveDateTime, NaiveDateTime, _>(ctx, chunk, arg, ret_type, result, |ts| {
                to_local(ts, offset)
            })
        }
    }
}
