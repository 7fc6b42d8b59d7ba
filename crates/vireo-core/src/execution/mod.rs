//! Columnar storage and the filter engine.
//!
//! - [`column`] - Typed columns with a null bitmap
//! - [`chunk`] - DataChunk and row handles
//! - [`selection`] - SelectionVector for filtering without copying
//! - [`pool`] - Scratch column allocators
//! - [`filter`] - Row-based and vectorized predicate filtering

pub mod bitmap;
pub mod chunk;
pub mod column;
pub mod filter;
pub mod pool;
pub mod selection;

pub use bitmap::NullBitmap;
pub use chunk::{DEFAULT_CHUNK_SIZE, DataChunk, Row, VisibleRows};
pub use column::Column;
pub use filter::{
    FilterOutcome, eval_bool, row_based_filter, vectorized_filter, vectorized_filter_consider_null,
};
pub use pool::{ColumnAllocator, ColumnPool, LocalBuffers, PoolStats, ScratchColumn};
pub use selection::SelectionVector;
