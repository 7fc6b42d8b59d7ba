//! Function kernels.
//!
//! Each module owns a family of [`FunctionKind`]s and provides three things:
//! return type inference, a row kernel over [`Value`]s, and batch kernels over
//! columns. Both kernels call the same scalar operation per element, which is
//! what keeps the two paths in agreement.
//!
//! Batch kernels write dense results: slot `k` is the `k`-th visible row.

mod arithmetic;
mod cast;
mod compare;
mod double;
mod json;
mod logic;
mod string;

use chrono::{NaiveDateTime, TimeDelta};
use vireo_common::types::{Decimal, EvalType, LogicalType, Value};
use vireo_common::utils::error::{Error, Result};

use super::Expression;
use super::context::EvalContext;
use super::function::{FunctionKind, ScalarFunction};
use crate::execution::{Column, DataChunk, NullBitmap, ScratchColumn};

pub(crate) fn return_type(kind: FunctionKind, args: &[LogicalType]) -> Result<LogicalType> {
    match kind {
        FunctionKind::Plus | FunctionKind::Minus | FunctionKind::Multiply => {
            arithmetic::return_type(kind, args)
        }
        FunctionKind::Double => double::return_type(args),
        FunctionKind::Eq
        | FunctionKind::Ne
        | FunctionKind::Lt
        | FunctionKind::Le
        | FunctionKind::Gt
        | FunctionKind::Ge => compare::return_type(kind, args),
        FunctionKind::And
        | FunctionKind::Or
        | FunctionKind::Not
        | FunctionKind::IsNull
        | FunctionKind::IsNotNull => Ok(LogicalType::Int64),
        FunctionKind::Concat => string::return_type(args),
        FunctionKind::JsonExtract => json::return_type(args),
        FunctionKind::CastIntToReal
        | FunctionKind::CastIntToDecimal
        | FunctionKind::CastRealToDecimal
        | FunctionKind::CastDecimalToReal
        | FunctionKind::ToLocalTime => cast::return_type(kind, args),
    }
}

/// Row kernel. NULL propagation has already been applied for kinds that use it.
pub(crate) fn eval_row(func: &ScalarFunction, ctx: &EvalContext<'_>, args: &[Value]) -> Result<Value> {
    let ret_type = func.return_type();
    match func.kind() {
        kind @ (FunctionKind::Plus | FunctionKind::Minus | FunctionKind::Multiply) => {
            arithmetic::eval_row(kind, args, ret_type)
        }
        FunctionKind::Double => double::eval_row(args, ret_type),
        kind @ (FunctionKind::Eq
        | FunctionKind::Ne
        | FunctionKind::Lt
        | FunctionKind::Le
        | FunctionKind::Gt
        | FunctionKind::Ge) => compare::eval_row(kind, args),
        kind @ (FunctionKind::And
        | FunctionKind::Or
        | FunctionKind::Not
        | FunctionKind::IsNull
        | FunctionKind::IsNotNull) => logic::eval_row(kind, args),
        FunctionKind::Concat => string::eval_row(args),
        FunctionKind::JsonExtract => json::eval_row(func, args),
        kind @ (FunctionKind::CastIntToReal
        | FunctionKind::CastIntToDecimal
        | FunctionKind::CastRealToDecimal
        | FunctionKind::CastDecimalToReal
        | FunctionKind::ToLocalTime) => cast::eval_row(kind, ctx, args, ret_type),
    }
}

/// Batch kernel for the function's result type.
pub(crate) fn vec_eval(
    func: &ScalarFunction,
    ctx: &EvalContext<'_>,
    chunk: &DataChunk,
    result: &mut Column,
) -> Result<()> {
    match func.kind() {
        FunctionKind::Plus | FunctionKind::Minus | FunctionKind::Multiply => {
            arithmetic::vec_eval(func, ctx, chunk, result)
        }
        FunctionKind::Double => double::vec_eval(func, ctx, chunk, result),
        FunctionKind::Eq
        | FunctionKind::Ne
        | FunctionKind::Lt
        | FunctionKind::Le
        | FunctionKind::Gt
        | FunctionKind::Ge => compare::vec_eval(func, ctx, chunk, result),
        FunctionKind::And
        | FunctionKind::Or
        | FunctionKind::Not
        | FunctionKind::IsNull
        | FunctionKind::IsNotNull => logic::vec_eval(func, ctx, chunk, result),
        FunctionKind::Concat => string::vec_eval(func, ctx, chunk, result),
        FunctionKind::CastIntToReal
        | FunctionKind::CastIntToDecimal
        | FunctionKind::CastRealToDecimal
        | FunctionKind::CastDecimalToReal
        | FunctionKind::ToLocalTime => cast::vec_eval(func, ctx, chunk, result),
        FunctionKind::JsonExtract => Err(not_vectorized(func)),
    }
}

pub(crate) fn not_vectorized(func: &ScalarFunction) -> Error {
    Error::NotVectorized {
        function: func.kind().name(),
        eval_type: func.return_type().eval_type(),
    }
}

fn arity_error(func: FunctionKind, found: usize) -> Error {
    Error::Contract(format!("{func} takes {} arguments, got {found}", func.arity()))
}

/// Splits a two-argument slice.
pub(crate) fn two<T>(kind: FunctionKind, args: &[T]) -> Result<(&T, &T)> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(arity_error(kind, args.len())),
    }
}

/// Splits a one-argument slice.
pub(crate) fn one<T>(kind: FunctionKind, args: &[T]) -> Result<&T> {
    match args {
        [a] => Ok(a),
        _ => Err(arity_error(kind, args.len())),
    }
}

/// Fits a decimal result to the function's declared precision and scale.
pub(crate) fn fit_decimal(value: Decimal, ret_type: LogicalType) -> Result<Decimal> {
    match ret_type {
        LogicalType::Decimal { precision, scale } => value
            .fit(precision, scale)
            .ok_or_else(|| Error::overflow("DECIMAL", value.to_string())),
        other => Err(Error::type_mismatch("DECIMAL", other)),
    }
}

/// A row kernel received a value of the wrong family.
pub(crate) fn mismatch(expected: EvalType, found: &Value) -> Error {
    Error::type_mismatch(expected, found.type_name())
}

/// Fixed-width element types batch kernels can slice.
pub(crate) trait Fixed: Copy {
    fn values(column: &Column) -> Result<&[Self]>;
    fn values_mut(column: &mut Column) -> Result<(&mut [Self], &mut NullBitmap)>;
}

macro_rules! impl_fixed {
    ($($ty:ty => $get:ident, $get_mut:ident;)*) => {
        $(
            impl Fixed for $ty {
                #[inline]
                fn values(column: &Column) -> Result<&[Self]> {
                    column.$get()
                }

                #[inline]
                fn values_mut(column: &mut Column) -> Result<(&mut [Self], &mut NullBitmap)> {
                    column.$get_mut()
                }
            }
        )*
    };
}

impl_fixed! {
    i64 => int64s, int64s_mut;
    f64 => float64s, float64s_mut;
    Decimal => decimals, decimals_mut;
    NaiveDateTime => datetimes, datetimes_mut;
    TimeDelta => durations, durations_mut;
}

/// Evaluates `arg` over the chunk into a scratch column.
pub(crate) fn eval_arg<'a>(
    ctx: &EvalContext<'a>,
    chunk: &DataChunk,
    arg: &Expression,
) -> Result<ScratchColumn<'a>> {
    let mut buf = ctx.scratch(arg.return_type(), chunk.row_count())?;
    arg.vec_eval(ctx, chunk, &mut buf)?;
    Ok(buf)
}

/// Elementwise `op` over one fixed-width argument.
pub(crate) fn unary_fixed<A, R, F>(
    ctx: &EvalContext<'_>,
    chunk: &DataChunk,
    arg: &Expression,
    ret_type: LogicalType,
    result: &mut Column,
    op: F,
) -> Result<()>
where
    A: Fixed,
    R: Fixed,
    F: Fn(A) -> Result<R>,
{
    let buf = eval_arg(ctx, chunk, arg)?;
    result.resize(ret_type, buf.len())?;
    result.merge_nulls(&buf);
    let xs = A::values(&buf)?;
    let (out, nulls) = R::values_mut(result)?;
    for (i, (slot, x)) in out.iter_mut().zip(xs).enumerate() {
        if !nulls.get(i) {
            *slot = op(*x)?;
        }
    }
    Ok(())
}

/// Elementwise `op` over two fixed-width arguments; a NULL in either is NULL.
pub(crate) fn binary_fixed<A, B, R, F>(
    ctx: &EvalContext<'_>,
    chunk: &DataChunk,
    (lhs, rhs): (&Expression, &Expression),
    ret_type: LogicalType,
    result: &mut Column,
    op: F,
) -> Result<()>
where
    A: Fixed,
    B: Fixed,
    R: Fixed,
    F: Fn(A, B) -> Result<R>,
{
    let a = eval_arg(ctx, chunk, lhs)?;
    let b = eval_arg(ctx, chunk, rhs)?;
    result.resize(ret_type, a.len())?;
    result.merge_nulls(&a);
    result.merge_nulls(&b);
    let xs = A::values(&a)?;
    let ys = B::values(&b)?;
    let (out, nulls) = R::values_mut(result)?;
    for (i, slot) in out.iter_mut().enumerate() {
        if !nulls.get(i) {
            *slot = op(xs[i], ys[i])?;
        }
    }
    Ok(())
}

/// Row-by-row kernel over arguments of any layout, appending each result.
///
/// Used by kernels whose inputs or output are variable-length. `op` receives
/// the argument columns and the row, and is only called when no argument is
/// NULL there.
pub(crate) fn rowwise<F>(
    ctx: &EvalContext<'_>,
    chunk: &DataChunk,
    args: &[Expression],
    ret_type: LogicalType,
    result: &mut Column,
    mut op: F,
) -> Result<()>
where
    F: FnMut(&[&Column], usize) -> Result<Value>,
{
    let bufs = args
        .iter()
        .map(|arg| eval_arg(ctx, chunk, arg))
        .collect::<Result<Vec<_>>>()?;
    let columns: Vec<&Column> = bufs.iter().map(|b| &**b).collect();
    let n = chunk.row_count();
    result.reset(ret_type);
    result.reserve(n)?;
    for i in 0..n {
        if columns.iter().any(|c| c.is_null(i)) {
            result.append_null();
        } else {
            result.append_value(&op(&columns, i)?)?;
        }
    }
    Ok(())
}
