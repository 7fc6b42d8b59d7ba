//! Comparisons. Results are `BIGINT` 0 / 1.

use std::cmp::Ordering;

use chrono::{NaiveDateTime, TimeDelta};
use vireo_common::types::{Decimal, EvalType, LogicalType, Value};
use vireo_common::utils::error::{Error, Result};

use super::{binary_fixed, mismatch, not_vectorized, rowwise, two};
use crate::execution::{Column, DataChunk};
use crate::expression::context::EvalContext;
use crate::expression::function::{FunctionKind, ScalarFunction};

pub(super) fn return_type(kind: FunctionKind, args: &[LogicalType]) -> Result<LogicalType> {
    let (a, b) = two(kind, args)?;
    let eval_type = a.eval_type();
    if eval_type != b.eval_type() || eval_type == EvalType::Json {
        return Err(Error::type_mismatch(
            format!("comparable operands for {kind}"),
            format!("{a}, {b}"),
        ));
    }
    Ok(LogicalType::Int64)
}

fn apply(kind: FunctionKind, ord: Ordering) -> i64 {
    let holds = match kind {
        FunctionKind::Eq => ord == Ordering::Equal,
        FunctionKind::Ne => ord != Ordering::Equal,
        FunctionKind::Lt => ord == Ordering::Less,
        FunctionKind::Le => ord != Ordering::Greater,
        FunctionKind::Gt => ord == Ordering::Greater,
        _ => ord != Ordering::Less,
    };
    i64::from(holds)
}

/// `-0.0` equals `0.0`; NaN sorts by its bit pattern.
fn cmp_real(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

pub(super) fn eval_row(kind: FunctionKind, args: &[Value]) -> Result<Value> {
    let ord = match two(kind, args)? {
        (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
        (Value::Float64(a), Value::Float64(b)) => cmp_real(*a, *b),
        (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.as_bytes().cmp(b.as_bytes()),
        (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
        (Value::Duration(a), Value::Duration(b)) => a.cmp(b),
        (a, b) => {
            return Err(match a.eval_type() {
                Some(expected) => mismatch(expected, b),
                None => Error::type_mismatch("comparable value", a.type_name()),
            });
        }
    };
    Ok(Value::Int64(apply(kind, ord)))
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
    match args.0.return_type().eval_type() {
        EvalType::Int => binary_fixed::<i64, i64, i64, _>(ctx, chunk, args, ret_type, result, |a, b| {
            Ok(apply(kind, a.cmp(&b)))
        }),
        EvalType::Real => binary_fixed::<f64, f64, i64, _>(ctx, chunk, args, ret_type, result, |a, b| {
            Ok(apply(kind, cmp_real(a, b)))
        }),
        EvalType::Decimal => {
            binary_fixed::<Decimal, Decimal, i64, _>(ctx, chunk, args, ret_type, result, |a, b| {
                Ok(apply(kind, a.cmp(&b)))
            })
        }
        EvalType::Datetime => binary_fixed::<NaiveDateTime, NaiveDateTime, i64, _>(
            ctx,
            chunk,
            args,
            ret_type,
            result,
            |a, b| Ok(apply(kind, a.cmp(&b))),
        ),
        EvalType::Duration => {
            binary_fixed::<TimeDelta, TimeDelta, i64, _>(ctx, chunk, args, ret_type, result, |a, b| {
                Ok(apply(kind, a.cmp(&b)))
            })
        }
        EvalType::String => rowwise(ctx, chunk, func.args(), ret_type, result, |cols, i| {
            let ord = cols[0].get_bytes(i).cmp(&cols[1].get_bytes(i));
            Ok(Value::Int64(apply(kind, ord)))
        }),
        EvalType::Json => Err(not_vectorized(func)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply() {
        let cases = [
            (FunctionKind::Eq, [0, 1, 0]),
            (FunctionKind::Ne, [1, 0, 1]),
            (FunctionKind::Lt, [1, 0, 0]),
            (FunctionKind::Le, [1, 1, 0]),
            (FunctionKind::Gt, [0, 0, 1]),
            (FunctionKind::Ge, [0, 1, 1]),
        ];
        for (kind, expected) in cases {
            let got = [Ordering::Less, Ordering::Equal, Ordering::Greater].map(|o| apply(kind, o));
            assert_eq!(got, expected, "{kind}");
        }
    }

    #[test]
    fn test_real_zero_signs() {
        assert_eq!(cmp_real(-0.0, 0.0), Ordering::Equal);
        assert_eq!(cmp_real(1.0, f64::NAN), Ordering::Less);
    }

    #[test]
    fn test_strings_compare_by_bytes() {
        let args = [Value::from("B"), Value::from("a")];
        assert_eq!(eval_row(FunctionKind::Lt, &args).unwrap(), Value::Int64(1));
    }

    #[test]
    fn test_return_type() {
        assert!(return_type(FunctionKind::Eq, &[LogicalType::Json, LogicalType::Json]).is_err());
        assert!(
            return_type(FunctionKind::Eq, &[LogicalType::Int64, LogicalType::String]).is_err()
        );
        assert_eq!(
            return_type(
                FunctionKind::Ge,
                &[LogicalType::DateTime, LogicalType::Timestamp]
            )
            .unwrap(),
            LogicalType::Int64
        );
    }
}
