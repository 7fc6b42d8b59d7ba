//! Errors raised while evaluating expressions.
//!
//! Callers branch on [`Error::kind()`] rather than on individual variants:
//! the variants carry detail for messages, the kind carries the contract.

use std::fmt;

use thiserror::Error;

use crate::types::EvalType;

/// Result alias used across vireo.
pub type Result<T> = std::result::Result<T, Error>;

/// Machine-distinguishable error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Arithmetic or cast left the target type's range or precision.
    Conversion,
    /// A structured value (JSON) could not be navigated.
    Extraction,
    /// A scratch buffer could not be allocated.
    Allocation,
    /// The evaluator was driven in a way its contract forbids.
    Contract,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversion => write!(f, "conversion"),
            Self::Extraction => write!(f, "extraction"),
            Self::Allocation => write!(f, "allocation"),
            Self::Contract => write!(f, "contract"),
        }
    }
}

/// Error during expression evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An arithmetic result does not fit its type.
    #[error("{type_name} value is out of range in '{op}'")]
    Overflow {
        /// Operation that overflowed, e.g. `a + b`.
        op: String,
        /// Name of the result type.
        type_name: &'static str,
    },
    /// A value could not be converted to the requested type.
    #[error("conversion error: {0}")]
    Conversion(String),
    /// Datetime arithmetic produced an invalid calendar value.
    #[error("invalid time: {0}")]
    InvalidTime(String),
    /// A JSON path is well formed but does not resolve.
    #[error("JSON path not found: {path}")]
    PathNotFound {
        /// The path that was looked up.
        path: String,
    },
    /// A JSON path expression failed to parse.
    #[error("invalid JSON path '{path}': {reason}")]
    InvalidJsonPath {
        /// The offending path text.
        path: String,
        /// What the parser rejected.
        reason: String,
    },
    /// Stored JSON bytes could not be decoded.
    #[error("invalid JSON document: {0}")]
    InvalidJson(String),
    /// A column buffer could not be allocated.
    #[error("failed to allocate column buffer for {requested} rows")]
    Allocation {
        /// Number of rows requested.
        requested: usize,
    },
    /// A batch evaluator was invoked for a type it does not implement.
    #[error("function '{function}' has no vectorized {eval_type} implementation")]
    NotVectorized {
        /// Function name.
        function: &'static str,
        /// The eval type that was requested.
        eval_type: EvalType,
    },
    /// Value of the wrong type encountered.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected type name.
        expected: String,
        /// Found type name.
        found: String,
    },
    /// Column not found.
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    /// A selection vector violated its ordering or bounds invariant.
    #[error("invalid selection vector: {0}")]
    InvalidSelection(String),
    /// Any other misuse of the evaluation API.
    #[error("contract violation: {0}")]
    Contract(String),
}

impl Error {
    /// Returns the error class callers should branch on.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Overflow { .. } | Self::Conversion(_) | Self::InvalidTime(_) => {
                ErrorKind::Conversion
            }
            Self::PathNotFound { .. } | Self::InvalidJsonPath { .. } | Self::InvalidJson(_) => {
                ErrorKind::Extraction
            }
            Self::Allocation { .. } => ErrorKind::Allocation,
            Self::NotVectorized { .. }
            | Self::TypeMismatch { .. }
            | Self::ColumnNotFound(_)
            | Self::InvalidSelection(_)
            | Self::Contract(_) => ErrorKind::Contract,
        }
    }

    /// Shorthand for an [`Error::Overflow`].
    #[must_use]
    pub fn overflow(type_name: &'static str, op: impl Into<String>) -> Self {
        Self::Overflow {
            op: op.into(),
            type_name,
        }
    }

    /// Shorthand for an [`Error::TypeMismatch`].
    #[must_use]
    pub fn type_mismatch(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
