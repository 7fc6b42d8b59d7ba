//! Per-call evaluation context.

use std::fmt;

use chrono::{FixedOffset, Offset, Utc};
use vireo_common::types::LogicalType;
use vireo_common::utils::error::Result;

use crate::config::{ConfigError, EvalConfig};
use crate::execution::{ColumnAllocator, ScratchColumn};

/// Session settings plus the allocator scratch columns come from.
///
/// Cheap to copy; an evaluator builds one per call.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    vectorized: bool,
    time_zone: FixedOffset,
    allocator: &'a dyn ColumnAllocator,
}

impl<'a> EvalContext<'a> {
    /// A vectorized, UTC context drawing scratch columns from `allocator`.
    #[must_use]
    pub fn new(allocator: &'a dyn ColumnAllocator) -> Self {
        Self {
            vectorized: true,
            time_zone: Utc.fix(),
            allocator,
        }
    }

    /// Builds a context from session configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn from_config(
        config: &EvalConfig,
        allocator: &'a dyn ColumnAllocator,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            vectorized: config.vectorized,
            time_zone: config.time_zone()?,
            allocator,
        })
    }

    /// Sets the vectorization switch.
    #[must_use]
    pub fn with_vectorized(mut self, vectorized: bool) -> Self {
        self.vectorized = vectorized;
        self
    }

    /// Sets the session time zone.
    #[must_use]
    pub fn with_time_zone(mut self, time_zone: FixedOffset) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Whether batch forms may be used.
    #[inline]
    #[must_use]
    pub fn vectorized(&self) -> bool {
        self.vectorized
    }

    /// The session time zone.
    #[must_use]
    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }

    /// The scratch column source.
    #[must_use]
    pub fn allocator(&self) -> &'a dyn ColumnAllocator {
        self.allocator
    }

    /// Borrows a scratch column; it goes back when the guard drops.
    pub fn scratch(&self, data_type: LogicalType, capacity: usize) -> Result<ScratchColumn<'a>> {
        ScratchColumn::acquire(self.allocator, data_type, capacity)
    }
}

impl fmt::Debug for EvalContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("vectorized", &self.vectorized)
            .field("time_zone", &self.time_zone)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ColumnPool;

    #[test]
    fn test_from_config() {
        let pool = ColumnPool::new();
        let config = EvalConfig::default()
            .without_vectorization()
            .with_time_zone_offset(3600);
        let ctx = EvalContext::from_config(&config, &pool).unwrap();
        assert!(!ctx.vectorized());
        assert_eq!(ctx.time_zone().local_minus_utc(), 3600);

        let bad = EvalConfig::default().with_chunk_capacity(0);
        assert!(EvalContext::from_config(&bad, &pool).is_err());
    }

    #[test]
    fn test_scratch_returns_to_allocator() {
        let pool = ColumnPool::new();
        let ctx = EvalContext::new(&pool);
        {
            let scratch = ctx.scratch(LogicalType::Float64, 8).unwrap();
            assert_eq!(scratch.data_type(), LogicalType::Float64);
        }
        assert_eq!(pool.stats().idle, 1);
        assert!(ctx.with_vectorized(false).allocator().acquire(LogicalType::Int64, 1).is_ok());
    }
}
