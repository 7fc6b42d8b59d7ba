//! Constant and correlated-column leaves.
//!
//! Both produce one value for every row. A constant's value is fixed when the
//! tree is built; a correlated column's value is set by an outer operator
//! between chunks (the current outer row of a nested-loop style subquery).

use std::sync::Arc;

use parking_lot::RwLock;
use vireo_common::types::{LogicalType, Value};
use vireo_common::utils::error::{Error, Result};

use crate::execution::{Column, DataChunk};

/// Checks `value` can be stored as `data_type`, fitting decimals to its scale.
fn coerce(value: Value, data_type: LogicalType) -> Result<Value> {
    match (value, data_type) {
        (Value::Decimal(d), LogicalType::Decimal { precision, scale }) => d
            .fit(precision, scale)
            .map(Value::Decimal)
            .ok_or_else(|| Error::overflow("DECIMAL", d.to_string())),
        (value, data_type) => match value.eval_type() {
            None => Ok(value),
            Some(t) if t == data_type.eval_type() => Ok(value),
            Some(_) => Err(Error::type_mismatch(data_type, value.type_name())),
        },
    }
}

/// Fills `result` with `count` copies of `value`.
fn broadcast(value: &Value, data_type: LogicalType, count: usize, result: &mut Column) -> Result<()> {
    result.reset(data_type.widened());
    result.reserve(count)?;
    for _ in 0..count {
        result.append_value(value)?;
    }
    Ok(())
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    value: Value,
    data_type: LogicalType,
}

impl Constant {
    /// A constant of `data_type`. `value` may be NULL.
    pub fn new(value: Value, data_type: LogicalType) -> Result<Self> {
        Ok(Self {
            value: coerce(value, data_type)?,
            data_type,
        })
    }

    /// The literal.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Declared type, widened.
    #[must_use]
    pub fn return_type(&self) -> LogicalType {
        self.data_type.widened()
    }

    pub(crate) fn vec_eval(&self, chunk: &DataChunk, result: &mut Column) -> Result<()> {
        broadcast(&self.value, self.data_type, chunk.row_count(), result)
    }
}

/// A column of an outer row, shared with the operator that sets it.
///
/// Clones share the same cell.
#[derive(Debug, Clone)]
pub struct CorrelatedColumn {
    cell: Arc<RwLock<Value>>,
    data_type: LogicalType,
}

impl CorrelatedColumn {
    /// A correlated column of `data_type`, initially NULL.
    #[must_use]
    pub fn new(data_type: LogicalType) -> Self {
        Self {
            cell: Arc::new(RwLock::new(Value::Null)),
            data_type,
        }
    }

    /// Sets the value seen by subsequent evaluations.
    pub fn set(&self, value: Value) -> Result<()> {
        *self.cell.write() = coerce(value, self.data_type)?;
        Ok(())
    }

    /// The current value.
    #[must_use]
    pub fn get(&self) -> Value {
        self.cell.read().clone()
    }

    /// Declared type, widened.
    #[must_use]
    pub fn return_type(&self) -> LogicalType {
        self.data_type.widened()
    }

    pub(crate) fn vec_eval(&self, chunk: &DataChunk, result: &mut Column) -> Result<()> {
        let value = self.get();
        broadcast(&value, self.data_type, chunk.row_count(), result)
    }
}

impl PartialEq for CorrelatedColumn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}
