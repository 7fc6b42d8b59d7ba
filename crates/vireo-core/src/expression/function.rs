//! Scalar function nodes and their capability table.

use std::fmt;

use smallvec::SmallVec;
use vireo_common::types::{EvalType, JsonPath, LogicalType, Value};
use vireo_common::utils::error::{Error, Result};

use super::builtins;
use super::context::EvalContext;
use super::{Expression, dispatch};
use crate::execution::{Column, DataChunk, Row};

/// The closed set of scalar functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// `a + b`; also datetime + duration.
    Plus,
    /// `a - b`; also datetime - duration.
    Minus,
    /// `a * b`.
    Multiply,
    /// Doubles its argument: `x * 2`, `s || s`, `{"key": 2 * $.key}` and so on.
    Double,
    /// `a = b`
    Eq,
    /// `a <> b`
    Ne,
    /// `a < b`
    Lt,
    /// `a <= b`
    Le,
    /// `a > b`
    Gt,
    /// `a >= b`
    Ge,
    /// Three-valued AND.
    And,
    /// Three-valued OR.
    Or,
    /// Three-valued NOT.
    Not,
    /// `x IS NULL`
    IsNull,
    /// `x IS NOT NULL`
    IsNotNull,
    /// String concatenation.
    Concat,
    /// `JSON_EXTRACT(doc, path)` with a constant path.
    JsonExtract,
    /// `CAST(int AS DOUBLE)`
    CastIntToReal,
    /// `CAST(int AS DECIMAL)`
    CastIntToDecimal,
    /// `CAST(real AS DECIMAL)`
    CastRealToDecimal,
    /// `CAST(decimal AS DOUBLE)`
    CastDecimalToReal,
    /// Converts a UTC timestamp to session-local wall-clock time.
    ToLocalTime,
}

impl FunctionKind {
    /// The SQL-facing name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Multiply => "multiply",
            Self::Double => "double",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::IsNull => "isnull",
            Self::IsNotNull => "isnotnull",
            Self::Concat => "concat",
            Self::JsonExtract => "json_extract",
            Self::CastIntToReal => "cast_int_as_real",
            Self::CastIntToDecimal => "cast_int_as_decimal",
            Self::CastRealToDecimal => "cast_real_as_decimal",
            Self::CastDecimalToReal => "cast_decimal_as_real",
            Self::ToLocalTime => "to_local_time",
        }
    }

    /// Number of arguments.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Double
            | Self::Not
            | Self::IsNull
            | Self::IsNotNull
            | Self::CastIntToReal
            | Self::CastIntToDecimal
            | Self::CastRealToDecimal
            | Self::CastDecimalToReal
            | Self::ToLocalTime => 1,
            _ => 2,
        }
    }

    /// Result types with a native batch implementation.
    #[must_use]
    pub const fn batch_types(self) -> BatchTypes {
        match self {
            Self::Plus | Self::Minus => BatchTypes::of(&[
                EvalType::Int,
                EvalType::Real,
                EvalType::Decimal,
                EvalType::Datetime,
                EvalType::Duration,
            ]),
            Self::Multiply => BatchTypes::of(&[EvalType::Int, EvalType::Real, EvalType::Decimal]),
            Self::Double => BatchTypes::ALL,
            Self::Eq
            | Self::Ne
            | Self::Lt
            | Self::Le
            | Self::Gt
            | Self::Ge
            | Self::And
            | Self::Or
            | Self::Not
            | Self::IsNull
            | Self::IsNotNull => BatchTypes::of(&[EvalType::Int]),
            Self::Concat => BatchTypes::of(&[EvalType::String]),
            Self::JsonExtract => BatchTypes::NONE,
            Self::CastIntToReal | Self::CastDecimalToReal => BatchTypes::of(&[EvalType::Real]),
            Self::CastIntToDecimal | Self::CastRealToDecimal => {
                BatchTypes::of(&[EvalType::Decimal])
            }
            Self::ToLocalTime => BatchTypes::of(&[EvalType::Datetime]),
        }
    }

    /// Whether a NULL argument makes the result NULL without calling the kernel.
    pub(crate) const fn propagates_nulls(self) -> bool {
        !matches!(self, Self::And | Self::Or | Self::IsNull | Self::IsNotNull)
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of [`EvalType`]s, one bit each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BatchTypes(u8);

impl BatchTypes {
    /// No batch forms.
    pub const NONE: Self = Self(0);
    /// Every eval type.
    pub const ALL: Self = Self::of(&EvalType::ALL);

    /// The set containing `types`.
    #[must_use]
    pub const fn of(types: &[EvalType]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < types.len() {
            bits |= 1 << types[i].ordinal();
            i += 1;
        }
        Self(bits)
    }

    /// Returns true if `eval_type` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, eval_type: EvalType) -> bool {
        self.0 & (1 << eval_type.ordinal()) != 0
    }
}

/// A function applied to argument expressions.
///
/// The return type and the capability table are settled at construction, so
/// evaluation never re-checks argument types per row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarFunction {
    kind: FunctionKind,
    args: Vec<Expression>,
    ret_type: LogicalType,
    batch_types: BatchTypes,
    json_path: Option<JsonPath>,
}

impl ScalarFunction {
    /// Builds a function, inferring its return type from the arguments.
    pub fn new(kind: FunctionKind, args: Vec<Expression>) -> Result<Self> {
        Self::build(kind, args, None)
    }

    /// Builds a function with an explicit return type.
    ///
    /// Casts use this to choose the target precision and scale. The type must
    /// belong to the same eval type as the inferred one.
    pub fn with_return_type(
        kind: FunctionKind,
        args: Vec<Expression>,
        ret_type: LogicalType,
    ) -> Result<Self> {
        Self::build(kind, args, Some(ret_type))
    }

    fn build(
        kind: FunctionKind,
        args: Vec<Expression>,
        ret_type: Option<LogicalType>,
    ) -> Result<Self> {
        if args.len() != kind.arity() {
            return Err(Error::Contract(format!(
                "{kind} takes {} arguments, got {}",
                kind.arity(),
                args.len()
            )));
        }
        let arg_types: SmallVec<[LogicalType; 2]> = args.iter().map(Expression::return_type).collect();
        let inferred = builtins::return_type(kind, &arg_types)?;
        let ret_type = match ret_type {
            Some(explicit) if explicit.eval_type() == inferred.eval_type() => explicit.widened(),
            Some(explicit) => return Err(Error::type_mismatch(inferred, explicit)),
            None => inferred,
        };

        let json_path = match (kind, args.get(1)) {
            (FunctionKind::JsonExtract, Some(Expression::Constant(c))) => match c.value() {
                Value::String(path) => Some(JsonPath::parse(path)?),
                other => return Err(Error::type_mismatch("VARCHAR path", other.type_name())),
            },
            (FunctionKind::JsonExtract, _) => {
                return Err(Error::Contract("json_extract requires a constant path".into()));
            }
            _ => None,
        };

        Ok(Self {
            kind,
            args,
            ret_type,
            batch_types: kind.batch_types(),
            json_path,
        })
    }

    /// Drops every batch form, forcing the per-row loop.
    #[must_use]
    pub fn without_batch_form(mut self) -> Self {
        self.batch_types = BatchTypes::NONE;
        self
    }

    /// The function.
    #[must_use]
    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// The argument expressions.
    #[must_use]
    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    /// The result type.
    #[must_use]
    pub fn return_type(&self) -> LogicalType {
        self.ret_type
    }

    /// The parsed path of a `json_extract`.
    pub(crate) fn json_path(&self) -> Option<&JsonPath> {
        self.json_path.as_ref()
    }

    /// Returns true if a native batch form exists for `eval_type`.
    #[must_use]
    pub fn has_batch_form(&self, eval_type: EvalType) -> bool {
        self.batch_types.contains(eval_type)
    }

    /// Returns true if this node and all its arguments run natively in batch.
    #[must_use]
    pub fn vectorized(&self) -> bool {
        self.has_batch_form(self.ret_type.eval_type()) && self.args.iter().all(Expression::vectorized)
    }

    /// Per-row form.
    ///
    /// Every argument is evaluated before NULLs are looked at, so an argument
    /// error surfaces on the same rows as in the batch form.
    pub fn eval(&self, ctx: &EvalContext<'_>, row: Row<'_>) -> Result<Value> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.eval(ctx, row))
            .collect::<Result<SmallVec<[Value; 2]>>>()?;
        if self.kind.propagates_nulls() && args.iter().any(Value::is_null) {
            return Ok(Value::Null);
        }
        builtins::eval_row(self, ctx, &args)
    }

    /// Batch form with dispatch: the native kernel when the session allows it
    /// and one exists for the result type, the per-row loop otherwise.
    pub fn vec_eval(&self, ctx: &EvalContext<'_>, chunk: &DataChunk, result: &mut Column) -> Result<()> {
        if ctx.vectorized() && self.has_batch_form(self.ret_type.eval_type()) {
            builtins::vec_eval(self, ctx, chunk, result)
        } else {
            tracing::trace!(function = %self.kind, rows = chunk.row_count(), "row-at-a-time fallback");
            dispatch::row_loop(chunk, self.ret_type, result, |row| self.eval(ctx, row))
        }
    }

    /// Runs the native batch kernel, bypassing dispatch.
    ///
    /// # Errors
    ///
    /// [`Error::NotVectorized`] if there is no kernel for the result type.
    pub fn vec_eval_native(
        &self,
        ctx: &EvalContext<'_>,
        chunk: &DataChunk,
        result: &mut Column,
    ) -> Result<()> {
        let eval_type = self.ret_type.eval_type();
        if !self.has_batch_form(eval_type) {
            return Err(Error::NotVectorized {
                function: self.kind.name(),
                eval_type,
            });
        }
        builtins::vec_eval(self, ctx, chunk, result)
    }
}

impl fmt::Display for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}
