//! Three-valued logic and NULL tests.
//!
//! Operands of any type are read through [`truthy`] / [`truth_at`]. `AND` and
//! `OR` see NULL operands instead of having them propagated: `NULL AND 0` is
//! `0` and `NULL OR 1` is `1`.

use vireo_common::types::{LogicalType, Value};
use vireo_common::utils::error::Result;

use super::{eval_arg, one, two};
use crate::execution::{Column, DataChunk};
use crate::expression::context::EvalContext;
use crate::expression::function::{FunctionKind, ScalarFunction};
use crate::expression::truth::{truth_at, truthy};

fn and(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn to_value(truth: Option<bool>) -> Value {
    truth.map_or(Value::Null, Value::from)
}

pub(super) fn eval_row(kind: FunctionKind, args: &[Value]) -> Result<Value> {
    let truth = match kind {
        FunctionKind::And => {
            let (a, b) = two(kind, args)?;
            and(truthy(a), truthy(b))
        }
        FunctionKind::Or => {
            let (a, b) = two(kind, args)?;
            or(truthy(a), truthy(b))
        }
        FunctionKind::Not => truthy(one(kind, args)?).map(|t| !t),
        FunctionKind::IsNull => Some(one(kind, args)?.is_null()),
        _ => Some(!one(kind, args)?.is_null()),
    };
    Ok(to_value(truth))
}

pub(super) fn vec_eval(
    func: &ScalarFunction,
    ctx: &EvalContext<'_>,
    chunk: &DataChunk,
    result: &mut Column,
) -> Result<()> {
    let kind = func.kind();
    let bufs = func
        .args()
        .iter()
        .map(|arg| eval_arg(ctx, chunk, arg))
        .collect::<Result<Vec<_>>>()?;
    let n = chunk.row_count();
    result.resize(LogicalType::Int64, n)?;
    let (out, nulls) = result.int64s_mut()?;
    for i in 0..n {
        let truth = match kind {
            FunctionKind::And => {
                let (a, b) = two(kind, &bufs)?;
                and(truth_at(a, i)?, truth_at(b, i)?)
            }
            FunctionKind::Or => {
                let (a, b) = two(kind, &bufs)?;
                or(truth_at(a, i)?, truth_at(b, i)?)
            }
            FunctionKind::Not => truth_at(one(kind, &bufs)?, i)?.map(|t| !t),
            FunctionKind::IsNull => Some(one(kind, &bufs)?.is_null(i)),
            _ => Some(!one(kind, &bufs)?.is_null(i)),
        };
        match truth {
            Some(t) => out[i] = i64::from(t),
            None => nulls.set(i, true),
        }
    }
    Ok(())
}
