//! Positional column references.

use vireo_common::types::{LogicalType, Value};
use vireo_common::utils::error::{Error, Result};

use crate::execution::{Column, DataChunk, Row};

/// Reads one input column by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    index: usize,
    data_type: LogicalType,
}

impl ColumnRef {
    /// A reference to input column `index`, declared as `data_type`.
    #[must_use]
    pub fn new(index: usize, data_type: LogicalType) -> Self {
        Self { index, data_type }
    }

    /// Position in the input chunk.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The declared column type.
    #[must_use]
    pub fn data_type(&self) -> LogicalType {
        self.data_type
    }

    /// Evaluated type: `FLOAT` columns read as `DOUBLE`.
    #[must_use]
    pub fn return_type(&self) -> LogicalType {
        self.data_type.widened()
    }

    fn source<'c>(&self, chunk: &'c DataChunk) -> Result<&'c Column> {
        let column = chunk
            .column(self.index)
            .ok_or_else(|| Error::ColumnNotFound(format!("#{}", self.index)))?;
        if column.data_type().eval_type() != self.data_type.eval_type() {
            return Err(Error::type_mismatch(self.data_type, column.data_type()));
        }
        Ok(column)
    }

    pub(crate) fn eval(&self, row: Row<'_>) -> Result<Value> {
        self.source(row.chunk())?.get_value(row.index())
    }

    pub(crate) fn vec_eval(&self, chunk: &DataChunk, result: &mut Column) -> Result<()> {
        let src = self.source(chunk)?;
        if src.data_type() == LogicalType::Float32 {
            let values = src.float32s()?;
            result.resize(LogicalType::Float64, chunk.row_count())?;
            let (out, nulls) = result.float64s_mut()?;
            for (k, row) in chunk.selected_indices().enumerate() {
                out[k] = f64::from(values[row]);
                nulls.set(k, src.is_null(row));
            }
            return Ok(());
        }
        if chunk.selection().is_none() {
            result.copy_from(src);
            return Ok(());
        }
        result.gather(src, chunk.selected_indices())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::SelectionVector;

    fn chunk() -> DataChunk {
        let mut chunk = DataChunk::new(&[LogicalType::Float32, LogicalType::String]);
        chunk.append_row(&[Value::from(1.5), Value::from("a")]).unwrap();
        chunk.append_row(&[Value::Null, Value::Null]).unwrap();
        chunk.append_row(&[Value::from(-2.0), Value::from("c")]).unwrap();
        chunk
    }

    #[test]
    fn test_float32_widens_in_both_paths() {
        let mut chunk = chunk();
        chunk
            .set_selection(SelectionVector::new(vec![1, 2], 3).unwrap())
            .unwrap();
        let col = ColumnRef::new(0, LogicalType::Float32);
        assert_eq!(col.return_type(), LogicalType::Float64);

        let mut out = Column::new(LogicalType::Int64);
        col.vec_eval(&chunk, &mut out).unwrap();
        assert_eq!(out.data_type(), LogicalType::Float64);
        assert!(out.is_null(0));
        assert_eq!(out.get_float64(1), Some(-2.0));

        let row = chunk.row(2).unwrap();
        assert_eq!(col.eval(row).unwrap(), Value::Float64(-2.0));
    }

    #[test]
    fn test_var_len_gather() {
        let mut chunk = chunk();
        let col = ColumnRef::new(1, LogicalType::String);
        let mut out = Column::new(LogicalType::String);
        col.vec_eval(&chunk, &mut out).unwrap();
        assert_eq!(out.len(), 3);

        chunk
            .set_selection(SelectionVector::new(vec![0, 2], 3).unwrap())
            .unwrap();
        col.vec_eval(&chunk, &mut out).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.get_string(1), Some("c"));
    }

    #[test]
    fn test_bad_reference() {
        let chunk = chunk();
        let mut out = Column::new(LogicalType::Int64);
        assert!(ColumnRef::new(5, LogicalType::Int64).vec_eval(&chunk, &mut out).is_err());
        assert!(ColumnRef::new(1, LogicalType::Int64).vec_eval(&chunk, &mut out).is_err());
        assert!(ColumnRef::new(1, LogicalType::Json).eval(chunk.row(0).unwrap()).is_err());
    }
}
