//! SelectionVector for filtering without copying.

use vireo_common::utils::error::{Error, Result};

/// The visible subset of a chunk's rows, in storage order.
///
/// Indices are strictly increasing. Applying a selection never touches the
/// underlying columns; it only changes which rows evaluation sees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionVector {
    indices: Vec<usize>,
}

impl SelectionVector {
    /// Builds a selection, checking indices are strictly increasing and below `bound`.
    pub fn new(indices: Vec<usize>, bound: usize) -> Result<Self> {
        if let Some(w) = indices.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::InvalidSelection(format!(
                "indices must be strictly increasing, found {} then {}",
                w[0], w[1]
            )));
        }
        if let Some(&last) = indices.last() {
            if last >= bound {
                return Err(Error::InvalidSelection(format!(
                    "index {last} out of bounds for {bound} rows"
                )));
            }
        }
        Ok(Self { indices })
    }

    /// Selects the rows in `0..count` for which `predicate` holds.
    #[must_use]
    pub fn from_predicate<F>(count: usize, predicate: F) -> Self
    where
        F: Fn(usize) -> bool,
    {
        Self {
            indices: (0..count).filter(|&i| predicate(i)).collect(),
        }
    }

    /// Number of selected rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if nothing is selected.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The selected physical rows.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    /// Iterates the selected physical rows.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}
