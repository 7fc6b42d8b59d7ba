//! Null bitmaps.
//!
//! One bit per row, packed into `u64` words. A set bit means the row is NULL.

/// Packed per-row null flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullBitmap {
    words: Vec<u64>,
    len: usize,
}

impl NullBitmap {
    /// Creates an empty bitmap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty bitmap with room for `capacity` rows.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: Vec::with_capacity(capacity.div_ceil(64)),
            len: 0,
        }
    }

    /// Number of rows tracked.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no rows are tracked.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if row `index` is NULL. Rows past the end read as not null.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        index < self.len && (self.words[index / 64] >> (index % 64)) & 1 == 1
    }

    /// Marks row `index` as NULL or not.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn set(&mut self, index: usize, is_null: bool) {
        assert!(index < self.len, "null bitmap index {index} out of bounds ({})", self.len);
        let mask = 1u64 << (index % 64);
        if is_null {
            self.words[index / 64] |= mask;
        } else {
            self.words[index / 64] &= !mask;
        }
    }

    /// Appends one row.
    pub fn push(&mut self, is_null: bool) {
        if self.len % 64 == 0 {
            self.words.push(0);
        }
        self.len += 1;
        if is_null {
            self.set(self.len - 1, true);
        }
    }

    /// Grows or shrinks to `len` rows; new rows take `is_null`.
    pub fn resize(&mut self, len: usize, is_null: bool) {
        if len < self.len {
            self.truncate(len);
            return;
        }
        let fill = if is_null { u64::MAX } else { 0 };
        // Bits past the old end in the last word are always clear.
        if is_null && self.len % 64 != 0 {
            let last = self.words.len() - 1;
            self.words[last] |= u64::MAX << (self.len % 64);
        }
        self.words.resize(len.div_ceil(64), fill);
        self.len = len;
        self.clear_tail();
    }

    /// Drops all rows past `len`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        self.words.truncate(len.div_ceil(64));
        self.len = len;
        self.clear_tail();
    }

    /// Removes all rows, keeping the allocation.
    pub fn clear(&mut self) {
        self.words.clear();
        self.len = 0;
    }

    /// Reserves room for `additional` more rows.
    pub fn reserve(&mut self, additional: usize) {
        let needed = (self.len + additional).div_ceil(64);
        self.words.reserve(needed.saturating_sub(self.words.len()));
    }

    /// ORs `other` into `self`: a row already NULL stays NULL.
    ///
    /// Only the overlapping prefix is merged.
    pub fn merge(&mut self, other: &NullBitmap) {
        let n = self.len.min(other.len);
        let full = n / 64;
        for (dst, src) in self.words[..full].iter_mut().zip(&other.words[..full]) {
            *dst |= *src;
        }
        if n % 64 != 0 {
            let mask = (1u64 << (n % 64)) - 1;
            self.words[full] |= other.words[full] & mask;
        }
    }

    /// Number of NULL rows.
    #[must_use]
    pub fn count_nulls(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns true if any row is NULL.
    #[must_use]
    pub fn any(&self) -> bool {
        self.words.iter().any(|w| *w != 0)
    }

    /// Iterates the flags in row order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|i| self.get(i))
    }

    fn clear_tail(&mut self) {
        if self.len % 64 != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << (self.len % 64)) - 1;
            }
        }
    }
}
