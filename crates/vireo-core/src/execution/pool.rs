//! Scratch column pooling.
//!
//! Intermediate results in batch evaluation live in scratch columns borrowed
//! from a [`ColumnAllocator`]. There are two allocators:
//!
//! - [`ColumnPool`] is a lock-protected free list keyed by storage layout.
//!   It is `Sync`, so one pool can serve any number of threads evaluating
//!   independent chunks.
//! - [`LocalBuffers`] is the same free list behind a `RefCell`. No locking,
//!   and the compiler keeps it on one thread since it is not `Sync`.
//!
//! Borrowing goes through [`ScratchColumn`], which hands the column back when
//! dropped, so an early `?` return never leaks a buffer.
//!
//! The contents of a freshly acquired column are garbage from the caller's
//! point of view. It comes back empty (zero rows) and must be refilled.

use std::cell::{Cell, RefCell};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use vireo_common::collections::{VireoMap, vireo_map};
use vireo_common::types::LogicalType;
use vireo_common::utils::error::Result;

use super::column::Column;

/// Columns with the same storage kind can be reset into one another without
/// reallocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum StorageKind {
    Int64,
    Float32,
    Float64,
    Decimal,
    DateTime,
    Duration,
    VarLen,
}

impl From<LogicalType> for StorageKind {
    fn from(data_type: LogicalType) -> Self {
        match data_type {
            LogicalType::Int64 => Self::Int64,
            LogicalType::Float32 => Self::Float32,
            LogicalType::Float64 => Self::Float64,
            LogicalType::Decimal { .. } => Self::Decimal,
            LogicalType::DateTime | LogicalType::Timestamp => Self::DateTime,
            LogicalType::Duration => Self::Duration,
            LogicalType::String | LogicalType::Json => Self::VarLen,
        }
    }
}

/// Source of scratch columns.
///
/// `acquire` fails only when memory cannot be allocated.
pub trait ColumnAllocator {
    /// Returns an empty column of `data_type` with room for `capacity` rows.
    fn acquire(&self, data_type: LogicalType, capacity: usize) -> Result<Column>;

    /// Takes a column back for later reuse.
    fn release(&self, column: Column);
}

/// Allocation counters for a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Columns created because no idle one was available.
    pub allocated: usize,
    /// Acquisitions served from the free list.
    pub reused: usize,
    /// Columns currently idle in the free list.
    pub idle: usize,
}

/// A thread-safe pool of scratch columns.
///
/// # Examples
///
/// ```
/// use vireo_common::types::LogicalType;
/// use vireo_core::execution::{ColumnPool, ScratchColumn};
///
/// let pool = ColumnPool::new();
/// {
///     let mut scratch = ScratchColumn::acquire(&pool, LogicalType::Int64, 1024).unwrap();
///     scratch.append_int64(1).unwrap();
/// }
/// // Dropping the guard returned the column.
/// assert_eq!(pool.stats().idle, 1);
/// ```
#[derive(Debug, Default)]
pub struct ColumnPool {
    free: Mutex<VireoMap<StorageKind, Vec<Column>>>,
    allocated: AtomicUsize,
    reused: AtomicUsize,
}

static GLOBAL_POOL: OnceLock<Arc<ColumnPool>> = OnceLock::new();

impl ColumnPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            free: Mutex::new(vireo_map()),
            allocated: AtomicUsize::new(0),
            reused: AtomicUsize::new(0),
        }
    }

    /// The process-wide pool.
    #[must_use]
    pub fn global() -> Arc<ColumnPool> {
        Arc::clone(GLOBAL_POOL.get_or_init(|| Arc::new(ColumnPool::new())))
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let idle = self.free.lock().values().map(Vec::len).sum();
        PoolStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            idle,
        }
    }

    /// Drops every idle column.
    pub fn clear(&self) {
        self.free.lock().clear();
    }
}

impl ColumnAllocator for ColumnPool {
    fn acquire(&self, data_type: LogicalType, capacity: usize) -> Result<Column> {
        let idle = self
            .free
            .lock()
            .get_mut(&StorageKind::from(data_type))
            .and_then(Vec::pop);

        match idle {
            Some(mut column) => {
                column.reset(data_type);
                if let Err(e) = column.reserve(capacity) {
                    self.release(column);
                    return Err(e);
                }
                self.reused.fetch_add(1, Ordering::Relaxed);
                Ok(column)
            }
            None => {
                tracing::trace!(%data_type, capacity, "column pool allocating scratch column");
                let column = Column::try_with_capacity(data_type, capacity)?;
                self.allocated.fetch_add(1, Ordering::Relaxed);
                Ok(column)
            }
        }
    }

    fn release(&self, column: Column) {
        self.free
            .lock()
            .entry(StorageKind::from(column.data_type()))
            .or_default()
            .push(column);
    }
}

impl ColumnAllocator for Arc<ColumnPool> {
    fn acquire(&self, data_type: LogicalType, capacity: usize) -> Result<Column> {
        self.as_ref().acquire(data_type, capacity)
    }

    fn release(&self, column: Column) {
        self.as_ref().release(column);
    }
}

/// Single-owner scratch buffers.
///
/// Cheaper than [`ColumnPool`] but confined to one thread: the type is not
/// `Sync`, so an evaluator holding it cannot be shared across threads.
#[derive(Debug, Default)]
pub struct LocalBuffers {
    free: RefCell<Vec<Column>>,
    allocated: Cell<usize>,
}

impl LocalBuffers {
    /// Creates an empty buffer set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of columns ever allocated.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.allocated.get()
    }

    /// Number of idle columns.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.borrow().len()
    }
}

impl ColumnAllocator for LocalBuffers {
    fn acquire(&self, data_type: LogicalType, capacity: usize) -> Result<Column> {
        let kind = StorageKind::from(data_type);
        let idle = {
            let mut free = self.free.borrow_mut();
            free.iter()
                .rposition(|c| StorageKind::from(c.data_type()) == kind)
                .map(|pos| free.swap_remove(pos))
        };
        match idle {
            Some(mut column) => {
                column.reset(data_type);
                if let Err(e) = column.reserve(capacity) {
                    self.release(column);
                    return Err(e);
                }
                Ok(column)
            }
            None => {
                let column = Column::try_with_capacity(data_type, capacity)?;
                self.allocated.set(self.allocated.get() + 1);
                Ok(column)
            }
        }
    }

    fn release(&self, column: Column) {
        self.free.borrow_mut().push(column);
    }
}

/// A scratch column on loan from an allocator.
///
/// Dereferences to [`Column`]. Returned to the allocator on drop.
pub struct ScratchColumn<'a> {
    column: Column,
    allocator: &'a dyn ColumnAllocator,
}

impl<'a> ScratchColumn<'a> {
    /// Borrows an empty column of `data_type` from `allocator`.
    pub fn acquire(
        allocator: &'a dyn ColumnAllocator,
        data_type: LogicalType,
        capacity: usize,
    ) -> Result<Self> {
        let column = allocator.acquire(data_type, capacity)?;
        Ok(Self { column, allocator })
    }
}

impl Deref for ScratchColumn<'_> {
    type Target = Column;

    fn deref(&self) -> &Column {
        &self.column
    }
}

impl DerefMut for ScratchColumn<'_> {
    fn deref_mut(&mut self) -> &mut Column {
        &mut self.column
    }
}

impl Drop for ScratchColumn<'_> {
    fn drop(&mut self) {
        // An empty Int64 column owns no heap memory.
        let column = std::mem::replace(&mut self.column, Column::new(LogicalType::Int64));
        self.allocator.release(column);
    }
}

impl std::fmt::Debug for ScratchColumn<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchColumn")
            .field("column", &self.column)
            .finish_non_exhaustive()
    }
}
