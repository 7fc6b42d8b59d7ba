//! # vireo-core
//!
//! The evaluation core: columnar chunks, scratch buffer pooling, typed
//! expression trees with matching row and batch evaluators, and predicate
//! filtering.
//!
//! Expressions arrive already bound to column positions and chunks arrive
//! already materialized; nothing here plans or schedules.
//!
//! ## Modules
//!
//! - [`execution`] - Columns, chunks, selection vectors, the buffer pool and the filter engine
//! - [`expression`] - Expression trees, the function catalogue and evaluator front-ends
//! - [`schema`] - Plan-node output schemas that expressions bind against
//! - [`config`] - Session evaluation settings

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod execution;
pub mod expression;
pub mod schema;

// Re-export commonly used types
pub use config::{BufferMode, ConfigError, EvalConfig};
pub use execution::{Column, ColumnPool, DataChunk, FilterOutcome, SelectionVector};
pub use expression::{
    EvalContext, ExclusiveEvaluator, Expression, FunctionKind, PooledEvaluator, ScalarFunction,
};
pub use schema::{OutputColumn, PlanNode, Schema};
