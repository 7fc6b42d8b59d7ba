//! `+`, `-` and `*`.

use chrono::{NaiveDateTime, TimeDelta};
use vireo_common::types::{Decimal, EvalType, LogicalType, MAX_DECIMAL_PRECISION, MAX_DECIMAL_SCALE, Value};
use vireo_common::utils::error::{Error, Result};

use super::{binary_fixed, fit_decimal, not_vectorized, two};
use crate::execution::{Column, DataChunk};
use crate::expression::context::EvalContext;
use crate::expression::function::{FunctionKind, ScalarFunction};

const fn symbol(kind: FunctionKind) -> &'static str {
    match kind {
        FunctionKind::Plus => "+",
        FunctionKind::Minus => "-",
        _ => "*",
    }
}

pub(super) fn return_type(kind: FunctionKind, args: &[LogicalType]) -> Result<LogicalType> {
    let (a, b) = two(kind, args)?;
    let additive = kind != FunctionKind::Multiply;
    match (*a, *b) {
        (LogicalType::Int64, LogicalType::Int64) => Ok(LogicalType::Int64),
        (LogicalType::Float64, LogicalType::Float64) => Ok(LogicalType::Float64),
        (
            LogicalType::Decimal {
                precision: p1,
                scale: s1,
            },
            LogicalType::Decimal {
                precision: p2,
                scale: s2,
            },
        ) => Ok(if additive {
            let scale = s1.max(s2);
            let int_digits = p1.saturating_sub(s1).max(p2.saturating_sub(s2)) + 1;
            LogicalType::decimal((int_digits + scale).min(MAX_DECIMAL_PRECISION), scale)
        } else {
            let scale = (s1 + s2).min(MAX_DECIMAL_SCALE);
            let precision = (p1 + p2).min(MAX_DECIMAL_PRECISION).max(scale);
            LogicalType::decimal(precision, scale)
        }),
        (LogicalType::Duration, LogicalType::Duration) if additive => Ok(LogicalType::Duration),
        (LogicalType::DateTime | LogicalType::Timestamp, LogicalType::Duration) if additive => {
            Ok(*a)
        }
        _ => Err(Error::type_mismatch(
            format!("numeric operands for {kind}"),
            format!("{a}, {b}"),
        )),
    }
}

fn int(kind: FunctionKind, a: i64, b: i64) -> Result<i64> {
    let result = match kind {
        FunctionKind::Plus => a.checked_add(b),
        FunctionKind::Minus => a.checked_sub(b),
        _ => a.checked_mul(b),
    };
    result.ok_or_else(|| Error::overflow("BIGINT", format!("({a} {} {b})", symbol(kind))))
}

fn real(kind: FunctionKind, a: f64, b: f64) -> Result<f64> {
    let result = match kind {
        FunctionKind::Plus => a + b,
        FunctionKind::Minus => a - b,
        _ => a * b,
    };
    if result.is_finite() {
        Ok(result)
    } else {
        Err(Error::overflow("DOUBLE", format!("({a} {} {b})", symbol(kind))))
    }
}

fn decimal(kind: FunctionKind, a: Decimal, b: Decimal, ret_type: LogicalType) -> Result<Decimal> {
    let result = match kind {
        FunctionKind::Plus => a.checked_add(b),
        FunctionKind::Minus => a.checked_sub(b),
        _ => a.checked_mul(b),
    };
    let result =
        result.ok_or_else(|| Error::overflow("DECIMAL", format!("({a} {} {b})", symbol(kind))))?;
    fit_decimal(result, ret_type)
}

fn duration(kind: FunctionKind, a: TimeDelta, b: TimeDelta) -> Result<TimeDelta> {
    let result = match kind {
        FunctionKind::Plus => a.checked_add(&b),
        FunctionKind::Minus => a.checked_sub(&b),
        _ => return Err(Error::Contract(format!("{kind} is not defined on TIME"))),
    };
    result.ok_or_else(|| Error::overflow("TIME", format!("({a} {} {b})", symbol(kind))))
}

fn datetime(kind: FunctionKind, a: NaiveDateTime, b: TimeDelta) -> Result<NaiveDateTime> {
    let result = match kind {
        FunctionKind::Plus => a.checked_add_signed(b),
        FunctionKind::Minus => a.checked_sub_signed(b),
        _ => return Err(Error::Contract(format!("{kind} is not defined on DATETIME"))),
    };
    result.ok_or_else(|| Error::InvalidTime(format!("{a} {} {b}", symbol(kind))))
}

pub(super) fn eval_row(kind: FunctionKind, args: &[Value], ret_type: LogicalType) -> Result<Value> {
    let (a, b) = two(kind, args)?;
    match (a, b) {
        (Value::Int64(a), Value::Int64(b)) => int(kind, *a, *b).map(Value::Int64),
        (Value::Float64(a), Value::Float64(b)) => real(kind, *a, *b).map(Value::Float64),
        (Value::Decimal(a), Value::Decimal(b)) => {
            decimal(kind, *a, *b, ret_type).map(Value::Decimal)
        }
        (Value::Duration(a), Value::Duration(b)) => duration(kind, *a, *b).map(Value::Duration),
        (Value::DateTime(a), Value::Duration(b)) => datetime(kind, *a, *b).map(Value::DateTime),
        (a, b) => Err(Error::type_mismatch(
            ret_type,
            format!("{}, {}", a.type_name(), b.type_name()),
        )),
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
    let args = two(kind, func.args())?;
    match ret_type.eval_type() {
        EvalType::Int => binary_fixed::<i64, i64, i64, _>(ctx, chunk, args, ret_type, result, |a, b| {
            int(kind, a, b)
        }),
        EvalType::Real => binary_fixed::<f64, f64, f64, _>(ctx, chunk, args, ret_type, result, |a, b| {
            real(kind, a, b)
        }),
        EvalType::Decimal => {
            binary_fixed::<Decimal, Decimal, Decimal, _>(ctx, chunk, args, ret_type, result, |a, b| {
                decimal(kind, a, b, ret_type)
            })
        }
        EvalType::Duration => {
            binary_fixed::<TimeDelta, TimeDelta, TimeDelta, _>(ctx, chunk, args, ret_type, result, |a, b| {
                duration(kind, a, b)
            })
        }
        EvalType::Datetime => binary_fixed::<NaiveDateTime, TimeDelta, NaiveDateTime, _>(
            ctx,
            chunk,
            args,
            ret_type,
            result,
            |a, b| datetime(kind, a, b),
        ),
        EvalType::String | EvalType::Json => Err(not_vectorized(func)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use vireo_common::utils::error::ErrorKind;

    #[test]
    fn test_decimal_return_types() {
        let a = LogicalType::decimal(10, 2);
        let b = LogicalType::decimal(5, 4);
        assert_eq!(
            return_type(FunctionKind::Plus, &[a, b]).unwrap(),
            LogicalType::decimal(13, 4)
        );
        assert_eq!(
            return_type(FunctionKind::Multiply, &[a, b]).unwrap(),
            LogicalType::decimal(15, 6)
        );
        let wide = LogicalType::decimal(38, 0);
        assert_eq!(
            return_type(FunctionKind::Minus, &[wide, wide]).unwrap(),
            LogicalType::decimal(38, 0)
        );
    }

    #[test]
    fn test_return_type_rejects_mixed() {
        assert!(return_type(FunctionKind::Plus, &[LogicalType::Int64, LogicalType::Float64]).is_err());
        assert!(
            return_type(FunctionKind::Multiply, &[LogicalType::Duration, LogicalType::Duration])
                .is_err()
        );
        assert_eq!(
            return_type(FunctionKind::Minus, &[LogicalType::Timestamp, LogicalType::Duration])
                .unwrap(),
            LogicalType::Timestamp
        );
    }

    #[test]
    fn test_int_overflow() {
        let err = int(FunctionKind::Plus, i64::MAX, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert_eq!(
            err.to_string(),
            "BIGINT value is out of range in '(9223372036854775807 + 1)'"
        );
        assert_eq!(int(FunctionKind::Multiply, -4, 5).unwrap(), -20);
    }

    #[test]
    fn test_real_overflow() {
        assert!(real(FunctionKind::Multiply, f64::MAX, 2.0).is_err());
        assert_eq!(real(FunctionKind::Minus, 1.5, 0.5).unwrap(), 1.0);
    }

    #[test]
    fn test_decimal_fits_return_type() {
        let a: Decimal = "99.99".parse().unwrap();
        let ret = LogicalType::decimal(5, 2);
        assert_eq!(
            decimal(FunctionKind::Plus, a, a, ret).unwrap().to_string(),
            "199.98"
        );
        assert!(decimal(FunctionKind::Plus, a, a, LogicalType::decimal(4, 2)).is_err());
    }

    #[test]
    fn test_datetime_out_of_range() {
        let max = NaiveDateTime::MAX;
        let err = datetime(FunctionKind::Plus, max, TimeDelta::days(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidTime(_)));

        let t = NaiveDate::from_ymd_opt(2024, 2, 28)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let next = datetime(FunctionKind::Plus, t, TimeDelta::days(1)).unwrap();
        assert_eq!(next.to_string(), "2024-02-29 12:00:00");
    }

    #[test]
    fn test_eval_row_type_mismatch() {
        let args = [Value::from(1i64), Value::from(1.0)];
        assert!(eval_row(FunctionKind::Plus, &args, LogicalType::Int64).is_err());
    }
}
