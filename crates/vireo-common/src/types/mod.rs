//! Core types for vireo.
//!
//! | Type | Used for |
//! | ---- | -------- |
//! | [`LogicalType`] | The declared type of a column or expression |
//! | [`EvalType`] | Which evaluator family computes a logical type |
//! | [`Decimal`] | Fixed-scale exact numerics |
//! | [`JsonPath`] | Parsed `$.a[0]` style paths |
//! | [`Value`] | A single dynamically-typed value |

mod decimal;
mod json;
mod value;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use decimal::{Decimal, MAX_DECIMAL_PRECISION, MAX_DECIMAL_SCALE};
pub use json::{JsonLeg, JsonPath};
pub use value::Value;

/// The declared type of a column or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    /// 64-bit signed integer. Also carries booleans (0 / 1).
    Int64,
    /// 32-bit float, widened to `f64` whenever it is evaluated.
    Float32,
    /// 64-bit float.
    Float64,
    /// Exact decimal with a fixed precision and scale.
    Decimal {
        /// Total number of significant digits.
        precision: u8,
        /// Digits after the decimal point.
        scale: u8,
    },
    /// UTF-8 text.
    String,
    /// Calendar date and wall-clock time, no time zone.
    DateTime,
    /// A point in time stored in UTC.
    Timestamp,
    /// A signed span of time.
    Duration,
    /// A JSON document.
    Json,
}

impl LogicalType {
    /// Returns the evaluator family for this type.
    #[must_use]
    pub const fn eval_type(&self) -> EvalType {
        match self {
            Self::Int64 => EvalType::Int,
            Self::Float32 | Self::Float64 => EvalType::Real,
            Self::Decimal { .. } => EvalType::Decimal,
            Self::String => EvalType::String,
            Self::DateTime | Self::Timestamp => EvalType::Datetime,
            Self::Duration => EvalType::Duration,
            Self::Json => EvalType::Json,
        }
    }

    /// Returns true if values are stored as offsets into a byte area.
    #[must_use]
    pub const fn is_var_len(&self) -> bool {
        matches!(self, Self::String | Self::Json)
    }

    /// The type a value of this type has once evaluated.
    ///
    /// `FLOAT` widens to `DOUBLE`; everything else is unchanged.
    #[must_use]
    pub const fn widened(&self) -> Self {
        match self {
            Self::Float32 => Self::Float64,
            other => *other,
        }
    }

    /// A decimal type with the given precision and scale.
    #[must_use]
    pub const fn decimal(precision: u8, scale: u8) -> Self {
        Self::Decimal { precision, scale }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64 => write!(f, "BIGINT"),
            Self::Float32 => write!(f, "FLOAT"),
            Self::Float64 => write!(f, "DOUBLE"),
            Self::Decimal { precision, scale } => write!(f, "DECIMAL({precision},{scale})"),
            Self::String => write!(f, "VARCHAR"),
            Self::DateTime => write!(f, "DATETIME"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
            Self::Duration => write!(f, "TIME"),
            Self::Json => write!(f, "JSON"),
        }
    }
}

/// Evaluator families: every expression is computed by exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvalType {
    /// `i64` results.
    Int,
    /// `f64` results.
    Real,
    /// [`Decimal`] results.
    Decimal,
    /// String results.
    String,
    /// `NaiveDateTime` results.
    Datetime,
    /// `TimeDelta` results.
    Duration,
    /// JSON document results.
    Json,
}

impl EvalType {
    /// All eval types, in declaration order.
    pub const ALL: [EvalType; 7] = [
        Self::Int,
        Self::Real,
        Self::Decimal,
        Self::String,
        Self::Datetime,
        Self::Duration,
        Self::Json,
    ];

    /// Position of this type in [`EvalType::ALL`]; used for capability bitsets.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Int => 0,
            Self::Real => 1,
            Self::Decimal => 2,
            Self::String => 3,
            Self::Datetime => 4,
            Self::Duration => 5,
            Self::Json => 6,
        }
    }
}

impl fmt::Display for EvalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "Int",
            Self::Real => "Real",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::Datetime => "Datetime",
            Self::Duration => "Duration",
            Self::Json => "Json",
        };
        f.write_str(name)
    }
}
