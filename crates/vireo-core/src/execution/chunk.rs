//! DataChunk for batched row processing.

use std::iter::Copied;
use std::ops::Range;
use std::slice;

use vireo_common::types::{LogicalType, Value};
use vireo_common::utils::error::{Error, Result};

use super::column::Column;
use super::selection::SelectionVector;

/// Default chunk size (number of rows).
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// A chunk of data containing multiple columns.
///
/// DataChunk is the unit of work for both evaluators. It holds the columns and
/// an optional [`SelectionVector`]; the selection only changes which rows are
/// visible, never the column contents.
#[derive(Debug, Clone)]
pub struct DataChunk {
    /// Column buffers, all `count` rows long.
    columns: Vec<Column>,
    /// Selection vector (None means all rows are selected).
    selection: Option<SelectionVector>,
    /// Number of rows in this chunk.
    count: usize,
    /// Capacity of this chunk.
    capacity: usize,
}

impl DataChunk {
    /// Creates a new empty data chunk with the given schema.
    #[must_use]
    pub fn new(column_types: &[LogicalType]) -> Self {
        Self::with_capacity(column_types, DEFAULT_CHUNK_SIZE)
    }

    /// Creates a new data chunk with the given schema and capacity.
    #[must_use]
    pub fn with_capacity(column_types: &[LogicalType], capacity: usize) -> Self {
        let columns = column_types
            .iter()
            .map(|t| Column::with_capacity(*t, capacity))
            .collect();

        Self {
            columns,
            selection: None,
            count: 0,
            capacity,
        }
    }

    /// Wraps already-built columns. They must all have the same length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let count = columns.first().map_or(0, Column::len);
        if let Some((i, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != count) {
            return Err(Error::Contract(format!(
                "column {i} has {} rows, expected {count}",
                col.len()
            )));
        }
        Ok(Self {
            columns,
            selection: None,
            count,
            capacity: count,
        })
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the number of rows (considering selection).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.selection.as_ref().map_or(self.count, SelectionVector::len)
    }

    /// Returns the total number of rows (ignoring selection).
    #[must_use]
    pub fn total_row_count(&self) -> usize {
        self.count
    }

    /// Returns true if no rows are visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Returns the capacity of this chunk.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Gets a column by index.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// All columns in schema order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the selection vector.
    #[must_use]
    pub fn selection(&self) -> Option<&SelectionVector> {
        self.selection.as_ref()
    }

    /// Sets the selection vector, checking it against the row count.
    pub fn set_selection(&mut self, selection: SelectionVector) -> Result<()> {
        if let Some(last) = selection.as_slice().last() {
            if *last >= self.count {
                return Err(Error::InvalidSelection(format!(
                    "index {last} out of bounds for {} rows",
                    self.count
                )));
            }
        }
        self.selection = Some(selection);
        Ok(())
    }

    /// Removes and returns the selection vector.
    pub fn take_selection(&mut self) -> Option<SelectionVector> {
        self.selection.take()
    }

    /// Puts back a selection previously obtained from [`take_selection`](Self::take_selection).
    pub(crate) fn restore_selection(&mut self, selection: Option<SelectionVector>) {
        self.selection = selection;
    }

    /// Resets the chunk for reuse.
    pub fn reset(&mut self) {
        for col in &mut self.columns {
            let data_type = col.data_type();
            col.reset(data_type);
        }
        self.selection = None;
        self.count = 0;
    }

    /// Appends one row of values, one per column.
    pub fn append_row(&mut self, values: &[Value]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(Error::Contract(format!(
                "row has {} values, chunk has {} columns",
                values.len(),
                self.columns.len()
            )));
        }
        for (col, value) in self.columns.iter_mut().zip(values) {
            col.append_value(value)?;
        }
        self.count += 1;
        Ok(())
    }

    /// Returns an iterator over visible physical row indices.
    #[must_use]
    pub fn selected_indices(&self) -> VisibleRows<'_> {
        match &self.selection {
            Some(sel) => VisibleRows::Selected(sel.as_slice().iter().copied()),
            None => VisibleRows::All(0..self.count),
        }
    }

    /// Iterates the visible rows.
    ///
    /// This is the one place selection indirection is resolved; both the
    /// row-based and the vectorized paths walk rows through it.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = Row<'_>> + '_ {
        self.selected_indices().map(move |index| Row { chunk: self, index })
    }

    /// A handle on physical row `index`, visible or not.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.count).then_some(Row { chunk: self, index })
    }
}

/// Iterator over the visible physical rows of a chunk.
#[derive(Debug, Clone)]
pub enum VisibleRows<'a> {
    /// No selection: every row in storage order.
    All(Range<usize>),
    /// Rows listed by a selection vector.
    Selected(Copied<slice::Iter<'a, usize>>),
}

impl Iterator for VisibleRows<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        match self {
            Self::All(range) => range.next(),
            Self::Selected(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::All(range) => range.size_hint(),
            Self::Selected(iter) => iter.size_hint(),
        }
    }
}

impl ExactSizeIterator for VisibleRows<'_> {}

/// A borrowed handle on one physical row of a [`DataChunk`].
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    chunk: &'a DataChunk,
    index: usize,
}

impl<'a> Row<'a> {
    /// The physical row index.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The chunk this row belongs to.
    #[must_use]
    pub fn chunk(&self) -> &'a DataChunk {
        self.chunk
    }

    /// The column at `column`, or [`Error::ColumnNotFound`].
    pub fn column(&self, column: usize) -> Result<&'a Column> {
        self.chunk
            .column(column)
            .ok_or_else(|| Error::ColumnNotFound(format!("#{column}")))
    }

    /// The value of this row in `column`.
    pub fn value(&self, column: usize) -> Result<Value> {
        self.column(column)?.get_value(self.index)
    }
}
