//! Evaluator front-ends.
//!
//! An [`Evaluator`] owns a list of expressions, session settings, and the
//! allocator its scratch columns come from. The allocator decides how it may
//! be shared:
//!
//! - [`PooledEvaluator`] draws from a [`ColumnPool`] and is `Send + Sync`, so
//!   one instance can serve many threads evaluating independent chunks.
//! - [`ExclusiveEvaluator`] keeps its own [`LocalBuffers`]. It never locks,
//!   and it is not `Sync`, so sharing one across threads does not compile:
//!
//! ```compile_fail
//! use vireo_core::expression::ExclusiveEvaluator;
//!
//! fn assert_sync<T: Sync>() {}
//! assert_sync::<ExclusiveEvaluator>();
//! ```
//!
//! [`SessionEvaluator`] picks one of the two from [`EvalConfig::buffer_mode`].

use std::sync::Arc;

use chrono::FixedOffset;
use vireo_common::types::Value;
use vireo_common::utils::error::{Error, Result};

use super::{EvalContext, Expression};
use crate::config::{BufferMode, ConfigError, EvalConfig};
use crate::execution::{
    Column, ColumnAllocator, ColumnPool, DataChunk, FilterOutcome, LocalBuffers, Row,
    vectorized_filter_consider_null,
};

/// Evaluates a fixed list of expressions against rows and chunks.
#[derive(Debug)]
pub struct Evaluator<A> {
    exprs: Vec<Expression>,
    allocator: A,
    vectorized: bool,
    time_zone: FixedOffset,
    chunk_capacity: usize,
}

/// Evaluator backed by a shared, thread-safe pool.
pub type PooledEvaluator = Evaluator<Arc<ColumnPool>>;

/// Evaluator with private, unsynchronized buffers.
pub type ExclusiveEvaluator = Evaluator<LocalBuffers>;

impl Evaluator<Arc<ColumnPool>> {
    /// An evaluator drawing from [`ColumnPool::global`].
    pub fn new(exprs: Vec<Expression>, config: &EvalConfig) -> std::result::Result<Self, ConfigError> {
        Self::with_pool(exprs, config, ColumnPool::global())
    }

    /// An evaluator drawing from `pool`.
    pub fn with_pool(
        exprs: Vec<Expression>,
        config: &EvalConfig,
        pool: Arc<ColumnPool>,
    ) -> std::result::Result<Self, ConfigError> {
        Self::build(exprs, config, pool)
    }

    /// The pool scratch columns come from.
    #[must_use]
    pub fn pool(&self) -> &Arc<ColumnPool> {
        &self.allocator
    }
}

impl Evaluator<LocalBuffers> {
    /// An evaluator with its own buffers.
    pub fn new(exprs: Vec<Expression>, config: &EvalConfig) -> std::result::Result<Self, ConfigError> {
        Self::build(exprs, config, LocalBuffers::new())
    }

    /// The private buffers.
    #[must_use]
    pub fn buffers(&self) -> &LocalBuffers {
        &self.allocator
    }
}

impl<A: ColumnAllocator> Evaluator<A> {
    fn build(
        exprs: Vec<Expression>,
        config: &EvalConfig,
        allocator: A,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            exprs,
            allocator,
            vectorized: config.vectorized,
            time_zone: config.time_zone()?,
            chunk_capacity: config.chunk_capacity,
        })
    }

    /// The expressions, in output order.
    #[must_use]
    pub fn exprs(&self) -> &[Expression] {
        &self.exprs
    }

    /// A context for one call.
    #[must_use]
    pub fn context(&self) -> EvalContext<'_> {
        EvalContext::new(&self.allocator)
            .with_vectorized(self.vectorized)
            .with_time_zone(self.time_zone)
    }

    /// Evaluates every expression on one row.
    pub fn eval_row(&self, row: Row<'_>) -> Result<Vec<Value>> {
        let ctx = self.context();
        self.exprs.iter().map(|e| e.eval(&ctx, row)).collect()
    }

    /// Evaluates expression `i` over `chunk` into `results[i]`.
    pub fn eval_batch(&self, chunk: &DataChunk, results: &mut [Column]) -> Result<()> {
        if results.len() != self.exprs.len() {
            return Err(Error::Contract(format!(
                "{} result columns for {} expressions",
                results.len(),
                self.exprs.len()
            )));
        }
        let ctx = self.context();
        for (expr, result) in self.exprs.iter().zip(results.iter_mut()) {
            if let Err(e) = expr.vec_eval(&ctx, chunk, result) {
                tracing::debug!(error = %e, expr = %expr, "batch evaluation aborted");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Evaluates every expression into a new chunk of visible rows.
    pub fn project(&self, chunk: &DataChunk) -> Result<DataChunk> {
        let capacity = self.chunk_capacity.max(chunk.row_count());
        let mut columns: Vec<Column> = self
            .exprs
            .iter()
            .map(|e| Column::with_capacity(e.return_type(), capacity))
            .collect();
        self.eval_batch(chunk, &mut columns)?;
        DataChunk::from_columns(columns)
    }

    /// Treats the expressions as an AND-ed predicate list and filters `chunk`.
    pub fn filter(
        &self,
        chunk: &mut DataChunk,
        skip: Option<&[bool]>,
        consider_null: bool,
    ) -> Result<FilterOutcome> {
        let ctx = self.context();
        vectorized_filter_consider_null(&ctx, &self.exprs, chunk, skip, consider_null)
    }
}

/// An evaluator in whichever buffer mode the session asked for.
#[derive(Debug)]
pub enum SessionEvaluator {
    /// Shared pool.
    Pooled(PooledEvaluator),
    /// Private buffers.
    Exclusive(ExclusiveEvaluator),
}

impl SessionEvaluator {
    /// Builds the evaluator selected by `config.buffer_mode`.
    pub fn from_config(
        exprs: Vec<Expression>,
        config: &EvalConfig,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(match config.buffer_mode {
            BufferMode::Pooled => Self::Pooled(PooledEvaluator::new(exprs, config)?),
            BufferMode::Exclusive => Self::Exclusive(ExclusiveEvaluator::new(exprs, config)?),
        })
    }

    /// See [`Evaluator::eval_row`].
    pub fn eval_row(&self, row: Row<'_>) -> Result<Vec<Value>> {
        match self {
            Self::Pooled(e) => e.eval_row(row),
            Self::Exclusive(e) => e.eval_row(row),
        }
    }

    /// See [`Evaluator::eval_batch`].
    pub fn eval_batch(&self, chunk: &DataChunk, results: &mut [Column]) -> Result<()> {
        match self {
            Self::Pooled(e) => e.eval_batch(chunk, results),
            Self::Exclusive(e) => e.eval_batch(chunk, results),
        }
    }

    /// See [`Evaluator::project`].
    pub fn project(&self, chunk: &DataChunk) -> Result<DataChunk> {
        match self {
            Self::Pooled(e) => e.project(chunk),
            Self::Exclusive(e) => e.project(chunk),
        }
    }

    /// See [`Evaluator::filter`].
    pub fn filter(
        &self,
        chunk: &mut DataChunk,
        skip: Option<&[bool]>,
        consider_null: bool,
    ) -> Result<FilterOutcome> {
        match self {
            Self::Pooled(e) => e.filter(chunk, skip, consider_null),
            Self::Exclusive(e) => e.filter(chunk, skip, consider_null),
        }
    }
}
