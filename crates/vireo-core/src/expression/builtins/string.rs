//! `concat(a, b)`.

use vireo_common::types::{EvalType, LogicalType, Value};
use vireo_common::utils::error::{Error, Result};

use super::{mismatch, rowwise, two};
use crate::execution::{Column, DataChunk};
use crate::expression::context::EvalContext;
use crate::expression::function::{FunctionKind, ScalarFunction};

pub(super) fn return_type(args: &[LogicalType]) -> Result<LogicalType> {
    match two(FunctionKind::Concat, args)? {
        (LogicalType::String, LogicalType::String) => Ok(LogicalType::String),
        (a, b) => Err(Error::type_mismatch("VARCHAR, VARCHAR", format!("{a}, {b}"))),
    }
}

fn concat(a: &str, b: &str) -> Value {
    let mut out = String::with_capacity(a.len() + b.len());
    out.push_str(a);
    out.push_str(b);
    Value::from(out)
}

pub(super) fn eval_row(args: &[Value]) -> Result<Value> {
    match two(FunctionKind::Concat, args)? {
        (Value::String(a), Value::String(b)) => Ok(concat(a, b)),
        (Value::String(_), other) | (other, _) => Err(mismatch(EvalType::String, other)),
    }
}

pub(super) fn vec_eval(
    func: &ScalarFunction,
    ctx: &EvalContext<'_>,
    chunk: &DataChunk,
    result: &mut Column,
) -> Result<()> {
    rowwise(ctx, chunk, func.args(), func.return_type(), result, |cols, i| {
        let a = cols[0].get_string(i).unwrap_or_default();
        let b = cols[1].get_string(i).unwrap_or_default();
        Ok(concat(a, b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat() {
        let args = [Value::from("ab"), Value::from("")];
        assert_eq!(eval_row(&args).unwrap(), Value::from("ab"));
        assert!(eval_row(&[Value::from("a"), Value::from(1i64)]).is_err());
    }

    #[test]
    fn test_return_type() {
        assert!(return_type(&[LogicalType::String, LogicalType::Json]).is_err());
        assert_eq!(
            return_type(&[LogicalType::String, LogicalType::String]).unwrap(),
            LogicalType::String
        );
    }
}
