//! Typed columnar buffers.
//!
//! A [`Column`] stores one logical type. Fixed-width types live in a typed
//! `Vec`, while strings and JSON live in a byte area addressed by
//! monotonically increasing offsets. Appending never rewrites an existing
//! offset, so byte ranges handed out stay valid until the next [`Column::reset`].
//!
//! The value in a NULL slot is unspecified. Arithmetic must check
//! [`Column::is_null`] before reading it.

use chrono::{NaiveDateTime, TimeDelta};
use serde_json::Value as JsonValue;
use vireo_common::types::{Decimal, LogicalType, Value};
use vireo_common::utils::error::{Error, Result};

use super::bitmap::NullBitmap;

#[derive(Debug, Clone)]
enum ColumnData {
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Decimal(Vec<Decimal>),
    DateTime(Vec<NaiveDateTime>),
    Duration(Vec<TimeDelta>),
    VarLen { offsets: Vec<usize>, bytes: Vec<u8> },
}

impl ColumnData {
    fn empty(data_type: LogicalType) -> Self {
        Self::with_capacity(data_type, 0)
    }

    fn with_capacity(data_type: LogicalType, capacity: usize) -> Self {
        match data_type {
            LogicalType::Int64 => Self::Int64(Vec::with_capacity(capacity)),
            LogicalType::Float32 => Self::Float32(Vec::with_capacity(capacity)),
            LogicalType::Float64 => Self::Float64(Vec::with_capacity(capacity)),
            LogicalType::Decimal { .. } => Self::Decimal(Vec::with_capacity(capacity)),
            LogicalType::DateTime | LogicalType::Timestamp => {
                Self::DateTime(Vec::with_capacity(capacity))
            }
            LogicalType::Duration => Self::Duration(Vec::with_capacity(capacity)),
            LogicalType::String | LogicalType::Json => {
                let mut offsets = Vec::with_capacity(capacity + 1);
                offsets.push(0);
                Self::VarLen {
                    offsets,
                    bytes: Vec::new(),
                }
            }
        }
    }

    #[cfg(test)]
    fn allocated(&self) -> usize {
        match self {
            Self::Int64(v) => v.capacity(),
            Self::Float32(v) => v.capacity(),
            Self::Float64(v) => v.capacity(),
            Self::Decimal(v) => v.capacity(),
            Self::DateTime(v) => v.capacity(),
            Self::Duration(v) => v.capacity(),
            Self::VarLen { offsets, .. } => offsets.capacity().saturating_sub(1),
        }
    }

    /// Returns true if `data_type` uses this storage layout.
    fn holds(&self, data_type: LogicalType) -> bool {
        matches!(
            (self, data_type),
            (Self::Int64(_), LogicalType::Int64)
                | (Self::Float32(_), LogicalType::Float32)
                | (Self::Float64(_), LogicalType::Float64)
                | (Self::Decimal(_), LogicalType::Decimal { .. })
                | (
                    Self::DateTime(_),
                    LogicalType::DateTime | LogicalType::Timestamp
                )
                | (Self::Duration(_), LogicalType::Duration)
                | (Self::VarLen { .. }, LogicalType::String | LogicalType::Json)
        )
    }

    fn clear(&mut self) {
        match self {
            Self::Int64(v) => v.clear(),
            Self::Float32(v) => v.clear(),
            Self::Float64(v) => v.clear(),
            Self::Decimal(v) => v.clear(),
            Self::DateTime(v) => v.clear(),
            Self::Duration(v) => v.clear(),
            Self::VarLen { offsets, bytes } => {
                offsets.clear();
                offsets.push(0);
                bytes.clear();
            }
        }
    }

    fn try_reserve(&mut self, additional: usize) -> std::result::Result<(), std::collections::TryReserveError> {
        match self {
            Self::Int64(v) => v.try_reserve(additional),
            Self::Float32(v) => v.try_reserve(additional),
            Self::Float64(v) => v.try_reserve(additional),
            Self::Decimal(v) => v.try_reserve(additional),
            Self::DateTime(v) => v.try_reserve(additional),
            Self::Duration(v) => v.try_reserve(additional),
            Self::VarLen { offsets, .. } => offsets.try_reserve(additional),
        }
    }
}

/// A single typed column with a null bitmap.
///
/// # Examples
///
/// ```
/// use vireo_common::types::LogicalType;
/// use vireo_core::execution::Column;
///
/// let mut col = Column::new(LogicalType::Int64);
/// col.append_int64(7).unwrap();
/// col.append_null();
///
/// assert_eq!(col.len(), 2);
/// assert_eq!(col.get_int64(0), Some(7));
/// assert!(col.is_null(1));
/// assert_eq!(col.get_int64(1), None);
/// ```
#[derive(Debug, Clone)]
pub struct Column {
    data_type: LogicalType,
    data: ColumnData,
    nulls: NullBitmap,
    capacity: usize,
}

impl Column {
    /// Creates an empty column.
    #[must_use]
    pub fn new(data_type: LogicalType) -> Self {
        Self {
            data_type,
            data: ColumnData::empty(data_type),
            nulls: NullBitmap::new(),
            capacity: 0,
        }
    }

    /// Creates an empty column with room for `capacity` rows.
    #[must_use]
    pub fn with_capacity(data_type: LogicalType, capacity: usize) -> Self {
        let mut nulls = NullBitmap::new();
        nulls.reserve(capacity);
        Self {
            data_type,
            data: ColumnData::with_capacity(data_type, capacity),
            nulls,
            capacity,
        }
    }

    /// Creates an empty column, reporting allocation failure instead of aborting.
    pub fn try_with_capacity(data_type: LogicalType, capacity: usize) -> Result<Self> {
        let mut col = Self::new(data_type);
        col.reserve(capacity)?;
        col.capacity = capacity;
        Ok(col)
    }

    /// Builds a column from values, NULLs included.
    pub fn from_values(data_type: LogicalType, values: &[Value]) -> Result<Self> {
        let mut col = Self::try_with_capacity(data_type, values.len())?;
        for value in values {
            col.append_value(value)?;
        }
        Ok(col)
    }

    /// The logical type of the stored values.
    #[inline]
    #[must_use]
    pub fn data_type(&self) -> LogicalType {
        self.data_type
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nulls.len()
    }

    /// Returns true if the column has no rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nulls.is_empty()
    }

    /// The capacity this column was declared with.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if row `index` is NULL.
    #[inline]
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        self.nulls.get(index)
    }

    /// Marks row `index` as NULL or not. The slot's value is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn set_null(&mut self, index: usize, is_null: bool) {
        self.nulls.set(index, is_null);
    }

    /// The null bitmap.
    #[must_use]
    pub fn nulls(&self) -> &NullBitmap {
        &self.nulls
    }

    /// Number of NULL rows.
    #[must_use]
    pub fn null_count(&self) -> usize {
        self.nulls.count_nulls()
    }

    /// ORs `other`'s NULLs into this column.
    ///
    /// Every multi-operand function overlays operand nulls through this; a row
    /// that is already NULL is never cleared by a non-null operand.
    pub fn merge_nulls(&mut self, other: &Column) {
        self.nulls.merge(&other.nulls);
    }

    /// Truncates to zero rows and switches to `data_type`.
    ///
    /// Allocations are kept when the storage layout is unchanged, so a column
    /// can be reused batch after batch.
    pub fn reset(&mut self, data_type: LogicalType) {
        if self.data.holds(data_type) {
            self.data.clear();
        } else {
            self.data = ColumnData::empty(data_type);
        }
        self.data_type = data_type;
        self.nulls.clear();
    }

    /// Reserves room for `additional` more rows.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.data
            .try_reserve(additional)
            .map_err(|_| Error::Allocation {
                requested: self.len().saturating_add(additional),
            })?;
        self.nulls.reserve(additional);
        Ok(())
    }

    /// Resets to `data_type` and fills `len` non-null default slots.
    ///
    /// Batch evaluators use this to get a writable slice for fixed-width
    /// results. Variable-length types cannot be resized.
    pub fn resize(&mut self, data_type: LogicalType, len: usize) -> Result<()> {
        if data_type.is_var_len() {
            return Err(Error::Contract(format!(
                "cannot resize a {data_type} column; append instead"
            )));
        }
        self.reset(data_type);
        self.reserve(len)?;
        match &mut self.data {
            ColumnData::Int64(v) => v.resize(len, 0),
            ColumnData::Float32(v) => v.resize(len, 0.0),
            ColumnData::Float64(v) => v.resize(len, 0.0),
            ColumnData::Decimal(v) => v.resize(len, Decimal::ZERO),
            ColumnData::DateTime(v) => v.resize(len, NaiveDateTime::default()),
            ColumnData::Duration(v) => v.resize(len, TimeDelta::zero()),
            ColumnData::VarLen { .. } => {}
        }
        self.nulls.resize(len, false);
        Ok(())
    }

    /// Appends a NULL row.
    pub fn append_null(&mut self) {
        match &mut self.data {
            ColumnData::Int64(v) => v.push(0),
            ColumnData::Float32(v) => v.push(0.0),
            ColumnData::Float64(v) => v.push(0.0),
            ColumnData::Decimal(v) => v.push(Decimal::ZERO),
            ColumnData::DateTime(v) => v.push(NaiveDateTime::default()),
            ColumnData::Duration(v) => v.push(TimeDelta::zero()),
            ColumnData::VarLen { offsets, bytes } => offsets.push(bytes.len()),
        }
        self.nulls.push(true);
    }

    fn append_bytes(&mut self, value: &[u8], expected: &'static str) -> Result<()> {
        let data_type = self.data_type;
        match &mut self.data {
            ColumnData::VarLen { offsets, bytes } => {
                bytes.extend_from_slice(value);
                offsets.push(bytes.len());
                self.nulls.push(false);
                Ok(())
            }
            _ => Err(Error::type_mismatch(expected, data_type)),
        }
    }

    /// Appends a non-null string.
    pub fn append_string(&mut self, value: &str) -> Result<()> {
        if self.data_type != LogicalType::String {
            return Err(Error::type_mismatch(LogicalType::String, self.data_type));
        }
        self.append_bytes(value.as_bytes(), "VARCHAR")
    }

    /// Appends a non-null JSON document in its serialized form.
    pub fn append_json(&mut self, value: &JsonValue) -> Result<()> {
        if self.data_type != LogicalType::Json {
            return Err(Error::type_mismatch(LogicalType::Json, self.data_type));
        }
        let encoded = serde_json::to_vec(value).map_err(|e| Error::InvalidJson(e.to_string()))?;
        self.append_bytes(&encoded, "JSON")
    }

    /// Raw bytes of a variable-length row, or `None` if NULL.
    #[must_use]
    pub fn get_bytes(&self, index: usize) -> Option<&[u8]> {
        match &self.data {
            ColumnData::VarLen { offsets, bytes } if index < self.len() && !self.is_null(index) => {
                Some(&bytes[offsets[index]..offsets[index + 1]])
            }
            _ => None,
        }
    }

    /// The string at `index`, or `None` if NULL, out of range or not a string column.
    #[must_use]
    pub fn get_string(&self, index: usize) -> Option<&str> {
        if self.data_type != LogicalType::String {
            return None;
        }
        self.get_bytes(index)
            .and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Decodes the JSON document at `index`; `Ok(None)` if NULL.
    pub fn get_json(&self, index: usize) -> Result<Option<JsonValue>> {
        if self.data_type != LogicalType::Json {
            return Err(Error::type_mismatch(LogicalType::Json, self.data_type));
        }
        self.get_bytes(index)
            .map(|b| serde_json::from_slice(b).map_err(|e| Error::InvalidJson(e.to_string())))
            .transpose()
    }

    /// Appends a dynamically-typed value, NULL included.
    ///
    /// Decimals are fitted to the column's precision and scale; a float goes
    /// into a FLOAT column narrowed to `f32`.
    pub fn append_value(&mut self, value: &Value) -> Result<()> {
        match (value, self.data_type) {
            (Value::Null, _) => {
                self.append_null();
                Ok(())
            }
            (Value::Int64(v), LogicalType::Int64) => self.append_int64(*v),
            #[allow(clippy::cast_possible_truncation)]
            (Value::Float64(v), LogicalType::Float32) => self.append_float32(*v as f32),
            (Value::Float64(v), LogicalType::Float64) => self.append_float64(*v),
            (Value::Decimal(d), LogicalType::Decimal { precision, scale }) => {
                let fitted = d
                    .fit(precision, scale)
                    .ok_or_else(|| Error::overflow("DECIMAL", d.to_string()))?;
                self.append_decimal(fitted)
            }
            (Value::String(s), LogicalType::String) => self.append_string(s),
            (Value::DateTime(t), LogicalType::DateTime | LogicalType::Timestamp) => {
                self.append_datetime(*t)
            }
            (Value::Duration(d), LogicalType::Duration) => self.append_duration(*d),
            (Value::Json(j), LogicalType::Json) => self.append_json(j),
            (other, data_type) => Err(Error::type_mismatch(data_type, other.type_name())),
        }
    }

    /// Reads row `index` as a [`Value`]; NULL rows give [`Value::Null`].
    pub fn get_value(&self, index: usize) -> Result<Value> {
        if index >= self.len() {
            return Err(Error::Contract(format!(
                "row {index} out of bounds for column of {} rows",
                self.len()
            )));
        }
        if self.is_null(index) {
            return Ok(Value::Null);
        }
        let value = match &self.data {
            ColumnData::Int64(v) => Value::Int64(v[index]),
            ColumnData::Float32(v) => Value::Float64(f64::from(v[index])),
            ColumnData::Float64(v) => Value::Float64(v[index]),
            ColumnData::Decimal(v) => Value::Decimal(v[index]),
            ColumnData::DateTime(v) => Value::DateTime(v[index]),
            ColumnData::Duration(v) => Value::Duration(v[index]),
            ColumnData::VarLen { .. } if self.data_type == LogicalType::Json => {
                Value::from(self.get_json(index)?.unwrap_or(JsonValue::Null))
            }
            ColumnData::VarLen { .. } => Value::from(self.get_string(index).unwrap_or_default()),
        };
        Ok(value)
    }

    /// Replaces this column's contents with `rows` of `src`, in the given order.
    ///
    /// The allocation is reused when the storage layout matches.
    pub fn gather<I>(&mut self, src: &Column, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        let rows = rows.into_iter();
        self.reset(src.data_type);
        self.reserve(rows.size_hint().0)?;

        macro_rules! gather_fixed {
            ($dst:expr, $values:expr) => {
                for row in rows {
                    $dst.push($values[row]);
                    self.nulls.push(src.nulls.get(row));
                }
            };
        }

        match (&mut self.data, &src.data) {
            (ColumnData::Int64(dst), ColumnData::Int64(v)) => gather_fixed!(dst, v),
            (ColumnData::Float32(dst), ColumnData::Float32(v)) => gather_fixed!(dst, v),
            (ColumnData::Float64(dst), ColumnData::Float64(v)) => gather_fixed!(dst, v),
            (ColumnData::Decimal(dst), ColumnData::Decimal(v)) => gather_fixed!(dst, v),
            (ColumnData::DateTime(dst), ColumnData::DateTime(v)) => gather_fixed!(dst, v),
            (ColumnData::Duration(dst), ColumnData::Duration(v)) => gather_fixed!(dst, v),
            (
                ColumnData::VarLen { offsets, bytes },
                ColumnData::VarLen {
                    offsets: src_offsets,
                    bytes: src_bytes,
                },
            ) => {
                for row in rows {
                    bytes.extend_from_slice(&src_bytes[src_offsets[row]..src_offsets[row + 1]]);
                    offsets.push(bytes.len());
                    self.nulls.push(src.nulls.get(row));
                }
            }
            _ => {
                return Err(Error::Contract(format!(
                    "storage layout mismatch gathering {} rows",
                    src.data_type
                )));
            }
        }
        Ok(())
    }

    /// Replaces this column's contents with a copy of `src`.
    pub fn copy_from(&mut self, src: &Column) {
        self.data_type = src.data_type;
        self.data.clone_from(&src.data);
        self.nulls.clone_from(&src.nulls);
    }
}

macro_rules! fixed_width_accessors {
    ($($variant:ident, $ty:ty, $type_name:literal, $append:ident, $get:ident, $slice:ident, $slice_mut:ident;)*) => {
        impl Column {
            $(
                #[doc = concat!("Appends a non-null `", stringify!($ty), "`.")]
                pub fn $append(&mut self, value: $ty) -> Result<()> {
                    let data_type = self.data_type;
                    match &mut self.data {
                        ColumnData::$variant(values) => {
                            values.push(value);
                            self.nulls.push(false);
                            Ok(())
                        }
                        _ => Err(Error::type_mismatch($type_name, data_type)),
                    }
                }

                #[doc = concat!("The `", stringify!($ty), "` at `index`, or `None` if NULL or out of range.")]
                #[must_use]
                pub fn $get(&self, index: usize) -> Option<$ty> {
                    match &self.data {
                        ColumnData::$variant(values) if !self.nulls.get(index) => values.get(index).copied(),
                        _ => None,
                    }
                }

                #[doc = concat!("All `", stringify!($ty), "` slots, NULL slots included.")]
                pub fn $slice(&self) -> Result<&[$ty]> {
                    match &self.data {
                        ColumnData::$variant(values) => Ok(values),
                        _ => Err(Error::type_mismatch($type_name, self.data_type)),
                    }
                }

                #[doc = concat!("Mutable `", stringify!($ty), "` slots together with the null bitmap.")]
                pub fn $slice_mut(&mut self) -> Result<(&mut [$ty], &mut NullBitmap)> {
                    let data_type = self.data_type;
                    match &mut self.data {
                        ColumnData::$variant(values) => Ok((values.as_mut_slice(), &mut self.nulls)),
                        _ => Err(Error::type_mismatch($type_name, data_type)),
                    }
                }
            )*
        }
    };
}

fixed_width_accessors! {
    Int64, i64, "BIGINT", append_int64, get_int64, int64s, int64s_mut;
    Float32, f32, "FLOAT", append_float32, get_float32, float32s, float32s_mut;
    Float64, f64, "DOUBLE", append_float64, get_float64, float64s, float64s_mut;
    Decimal, Decimal, "DECIMAL", append_decimal, get_decimal, decimals, decimals_mut;
    DateTime, NaiveDateTime, "DATETIME", append_datetime, get_datetime, datetimes, datetimes_mut;
    Duration, TimeDelta, "TIME", append_duration, get_duration, durations, durations_mut;
}
