//! The per-row fallback loop.
//!
//! When a function has no batch kernel for its result type, or the session has
//! batch evaluation switched off, the batch call still has to fill a result
//! column. This loop walks the same visible rows a kernel would and appends
//! one row result at a time, so the output layout is identical.

use vireo_common::types::{LogicalType, Value};
use vireo_common::utils::error::Result;

use crate::execution::{Column, DataChunk, Row};

pub(crate) fn row_loop<F>(
    chunk: &DataChunk,
    ret_type: LogicalType,
    result: &mut Column,
    mut eval_row: F,
) -> Result<()>
where
    F: FnMut(Row<'_>) -> Result<Value>,
{
    result.reset(ret_type);
    result.reserve(chunk.row_count())?;
    for row in chunk.rows() {
        let value = eval_row(row)?;
        result.append_value(&value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::SelectionVector;

    #[test]
    fn test_row_loop_respects_selection() {
        let mut chunk = DataChunk::new(&[LogicalType::Int64]);
        for i in 0..5i64 {
            chunk.append_row(&[Value::from(i)]).unwrap();
        }
        chunk
            .set_selection(SelectionVector::new(vec![1, 3], 5).unwrap())
            .unwrap();

        let mut out = Column::new(LogicalType::String);
        row_loop(&chunk, LogicalType::Int64, &mut out, |row| {
            Ok(match row.value(0)? {
                Value::Int64(3) => Value::Null,
                Value::Int64(v) => Value::from(v * 100),
                other => other,
            })
        })
        .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out.get_int64(0), Some(100));
        assert!(out.is_null(1));
    }
}
