//! Typed expression trees and their two evaluation paths.
//!
//! Every [`Expression`] can be evaluated one row at a time ([`Expression::eval`])
//! or over a whole chunk ([`Expression::vec_eval`]). The two must agree on
//! every visible row: same value, same NULL flag, and an error for exactly the
//! rows where the other path errors.
//!
//! | Leaf / node | Row form | Batch form |
//! | ----------- | -------- | ---------- |
//! | [`Constant`] | the literal | broadcast |
//! | [`ColumnRef`] | one cell | copy or gather |
//! | [`CorrelatedColumn`] | the outer value | broadcast |
//! | [`ScalarFunction`] | row kernel | batch kernel, or the per-row loop |

mod builtins;
mod column_ref;
mod constant;
mod context;
mod dispatch;
pub mod evaluator;
mod function;
mod truth;

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use serde_json::Value as JsonValue;
use vireo_common::types::{Decimal, EvalType, LogicalType, Value};
use vireo_common::utils::error::{Error, Result};

pub use column_ref::ColumnRef;
pub use constant::{Constant, CorrelatedColumn};
pub use context::EvalContext;
pub use evaluator::{Evaluator, ExclusiveEvaluator, PooledEvaluator, SessionEvaluator};
pub use function::{BatchTypes, FunctionKind, ScalarFunction};
pub use truth::truthy;
pub(crate) use truth::truth_at;

use crate::execution::{Column, DataChunk, Row};
use crate::schema::Schema;

/// A bound, type-checked expression.
///
/// # Examples
///
/// ```
/// use vireo_common::types::{LogicalType, Value};
/// use vireo_core::expression::{Expression, FunctionKind};
///
/// let next = Expression::function(
///     FunctionKind::Plus,
///     vec![
///         Expression::column(0, LogicalType::Int64),
///         Expression::constant(Value::from(1i64), LogicalType::Int64)?,
///     ],
/// )?;
/// assert_eq!(next.return_type(), LogicalType::Int64);
/// assert_eq!(next.to_string(), "plus(#0, 1)");
/// # Ok::<(), vireo_common::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal.
    Constant(Constant),
    /// An input column by position.
    Column(ColumnRef),
    /// A value supplied by an outer operator.
    Correlated(CorrelatedColumn),
    /// A function call.
    Function(ScalarFunction),
}

impl Expression {
    /// A literal of `data_type`.
    pub fn constant(value: Value, data_type: LogicalType) -> Result<Self> {
        Constant::new(value, data_type).map(Self::Constant)
    }

    /// A reference to input column `index`.
    #[must_use]
    pub fn column(index: usize, data_type: LogicalType) -> Self {
        Self::Column(ColumnRef::new(index, data_type))
    }

    /// A leaf reading `cell`. The expression shares the cell with the caller.
    #[must_use]
    pub fn correlated(cell: &CorrelatedColumn) -> Self {
        Self::Correlated(cell.clone())
    }

    /// A function call with an inferred return type.
    pub fn function(kind: FunctionKind, args: Vec<Expression>) -> Result<Self> {
        ScalarFunction::new(kind, args).map(Self::Function)
    }

    /// Resolves `name` against a plan node's output columns.
    pub fn bind_column(schema: &Schema, name: &str) -> Result<Self> {
        let index = schema
            .index_of(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        let data_type = schema.columns()[index].data_type;
        Ok(Self::column(index, data_type))
    }

    /// Result type. `FLOAT` is reported as `DOUBLE`.
    #[must_use]
    pub fn return_type(&self) -> LogicalType {
        match self {
            Self::Constant(c) => c.return_type(),
            Self::Column(c) => c.return_type(),
            Self::Correlated(c) => c.return_type(),
            Self::Function(f) => f.return_type(),
        }
    }

    /// Evaluator family of the result.
    #[must_use]
    pub fn eval_type(&self) -> EvalType {
        self.return_type().eval_type()
    }

    /// Returns true if batch evaluation runs a native kernel at every node.
    #[must_use]
    pub fn vectorized(&self) -> bool {
        match self {
            Self::Function(f) => f.vectorized(),
            Self::Constant(_) | Self::Column(_) | Self::Correlated(_) => true,
        }
    }

    /// Evaluates one row.
    pub fn eval(&self, ctx: &EvalContext<'_>, row: Row<'_>) -> Result<Value> {
        match self {
            Self::Constant(c) => Ok(c.value().clone()),
            Self::Column(c) => c.eval(row),
            Self::Correlated(c) => Ok(c.get()),
            Self::Function(f) => f.eval(ctx, row),
        }
    }

    /// Evaluates every visible row of `chunk` into `result`.
    ///
    /// `result` is reset to [`Expression::return_type`] and ends up with one
    /// slot per visible row, in visible order.
    pub fn vec_eval(&self, ctx: &EvalContext<'_>, chunk: &DataChunk, result: &mut Column) -> Result<()> {
        match self {
            Self::Constant(c) => c.vec_eval(chunk, result),
            Self::Column(c) => c.vec_eval(chunk, result),
            Self::Correlated(c) => c.vec_eval(chunk, result),
            Self::Function(f) => f.vec_eval(ctx, chunk, result),
        }
    }

    fn expect_type(&self, expected: EvalType) -> Result<()> {
        let found = self.eval_type();
        if found == expected {
            Ok(())
        } else {
            Err(Error::type_mismatch(expected, found))
        }
    }

    fn eval_typed<T>(
        &self,
        expected: EvalType,
        ctx: &EvalContext<'_>,
        row: Row<'_>,
        read: impl FnOnce(Value) -> Option<T>,
    ) -> Result<Option<T>> {
        self.expect_type(expected)?;
        match self.eval(ctx, row)? {
            Value::Null => Ok(None),
            value => {
                let found = value.type_name();
                read(value)
                    .map(Some)
                    .ok_or_else(|| Error::type_mismatch(expected, found))
            }
        }
    }

    /// Row form for `Int` expressions; `None` is NULL.
    pub fn eval_int(&self, ctx: &EvalContext<'_>, row: Row<'_>) -> Result<Option<i64>> {
        self.eval_typed(EvalType::Int, ctx, row, |v| v.as_int64())
    }

    /// Row form for `Real` expressions.
    pub fn eval_real(&self, ctx: &EvalContext<'_>, row: Row<'_>) -> Result<Option<f64>> {
        self.eval_typed(EvalType::Real, ctx, row, |v| v.as_float64())
    }

    /// Row form for `Decimal` expressions.
    pub fn eval_decimal(&self, ctx: &EvalContext<'_>, row: Row<'_>) -> Result<Option<Decimal>> {
        self.eval_typed(EvalType::Decimal, ctx, row, |v| v.as_decimal())
    }

    /// Row form for `String` expressions.
    pub fn eval_string(&self, ctx: &EvalContext<'_>, row: Row<'_>) -> Result<Option<String>> {
        self.eval_typed(EvalType::String, ctx, row, |v| v.as_str().map(str::to_owned))
    }

    /// Row form for `Datetime` expressions.
    pub fn eval_datetime(&self, ctx: &EvalContext<'_>, row: Row<'_>) -> Result<Option<NaiveDateTime>> {
        self.eval_typed(EvalType::Datetime, ctx, row, |v| v.as_datetime())
    }

    /// Row form for `Duration` expressions.
    pub fn eval_duration(&self, ctx: &EvalContext<'_>, row: Row<'_>) -> Result<Option<TimeDelta>> {
        self.eval_typed(EvalType::Duration, ctx, row, |v| v.as_duration())
    }

    /// Row form for `Json` expressions.
    pub fn eval_json(&self, ctx: &EvalContext<'_>, row: Row<'_>) -> Result<Option<JsonValue>> {
        self.eval_typed(EvalType::Json, ctx, row, |v| v.as_json().cloned())
    }

    fn vec_eval_typed(
        &self,
        expected: EvalType,
        ctx: &EvalContext<'_>,
        chunk: &DataChunk,
        result: &mut Column,
    ) -> Result<()> {
        self.expect_type(expected)?;
        self.vec_eval(ctx, chunk, result)
    }

    /// Batch form for `Int` expressions.
    pub fn vec_eval_int(&self, ctx: &EvalContext<'_>, chunk: &DataChunk, result: &mut Column) -> Result<()> {
        self.vec_eval_typed(EvalType::Int, ctx, chunk, result)
    }

    /// Batch form for `Real` expressions.
    pub fn vec_eval_real(&self, ctx: &EvalContext<'_>, chunk: &DataChunk, result: &mut Column) -> Result<()> {
        self.vec_eval_typed(EvalType::Real, ctx, chunk, result)
    }

    /// Batch form for `Decimal` expressions.
    pub fn vec_eval_decimal(
        &self,
        ctx: &EvalContext<'_>,
        chunk: &DataChunk,
        result: &mut Column,
    ) -> Result<()> {
        self.vec_eval_typed(EvalType::Decimal, ctx, chunk, result)
    }

    /// Batch form for `String` expressions.
    pub fn vec_eval_string(
        &self,
        ctx: &EvalContext<'_>,
        chunk: &DataChunk,
        result: &mut Column,
    ) -> Result<()> {
        self.vec_eval_typed(EvalType::String, ctx, chunk, result)
    }

    /// Batch form for `Datetime` expressions.
    pub fn vec_eval_datetime(
        &self,
        ctx: &EvalContext<'_>,
        chunk: &DataChunk,
        result: &mut Column,
    ) -> Result<()> {
        self.vec_eval_typed(EvalType::Datetime, ctx, chunk, result)
    }

    /// Batch form for `Duration` expressions.
    pub fn vec_eval_duration(
        &self,
        ctx: &EvalContext<'_>,
        chunk: &DataChunk,
        result: &mut Column,
    ) -> Result<()> {
        self.vec_eval_typed(EvalType::Duration, ctx, chunk, result)
    }

    /// Batch form for `Json` expressions.
    pub fn vec_eval_json(&self, ctx: &EvalContext<'_>, chunk: &DataChunk, result: &mut Column) -> Result<()> {
        self.vec_eval_typed(EvalType::Json, ctx, chunk, result)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(c) => write!(f, "{}", c.value()),
            Self::Column(c) => write!(f, "#{}", c.index()),
            Self::Correlated(_) => write!(f, "?outer"),
            Self::Function(func) => write!(f, "{func}"),
        }
    }
}
