//! `json_extract(doc, path)`. Row form only.

use std::sync::Arc;

use vireo_common::types::{EvalType, LogicalType, Value};
use vireo_common::utils::error::{Error, Result};

use super::{mismatch, two};
use crate::expression::function::{FunctionKind, ScalarFunction};

pub(super) fn return_type(args: &[LogicalType]) -> Result<LogicalType> {
    match two(FunctionKind::JsonExtract, args)? {
        (LogicalType::Json, LogicalType::String) => Ok(LogicalType::Json),
        (a, b) => Err(Error::type_mismatch("JSON, VARCHAR", format!("{a}, {b}"))),
    }
}

/// A path that does not resolve is an error, never NULL.
pub(super) fn eval_row(func: &ScalarFunction, args: &[Value]) -> Result<Value> {
    let path = func
        .json_path()
        .ok_or_else(|| Error::Contract("json_extract without a parsed path".into()))?;
    match two(FunctionKind::JsonExtract, args)?.0 {
        Value::Json(doc) => Ok(Value::Json(Arc::new(path.extract(doc)?.clone()))),
        other => Err(mismatch(EvalType::Json, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{ColumnPool, DataChunk};
    use crate::expression::Expression;
    use crate::expression::context::EvalContext;
    use serde_json::json;
    use vireo_common::utils::error::ErrorKind;

    fn extract(path: &str) -> ScalarFunction {
        let path = Expression::constant(Value::from(path), LogicalType::String).unwrap();
        ScalarFunction::new(
            FunctionKind::JsonExtract,
            vec![Expression::column(0, LogicalType::Json), path],
        )
        .unwrap()
    }

    #[test]
    fn test_extract() {
        let f = extract("$.a[1]");
        let doc = Value::from(json!({"a": [1, {"b": true}]}));
        let out = eval_row(&f, &[doc, Value::from("$.a[1]")]).unwrap();
        assert_eq!(out, Value::from(json!({"b": true})));
    }

    #[test]
    fn test_missing_path_errors_in_both_paths() {
        let f = extract("$.missing");
        let mut chunk = DataChunk::new(&[LogicalType::Json]);
        chunk.append_row(&[Value::from(json!({"a": 1}))]).unwrap();
        chunk.append_row(&[Value::Null]).unwrap();

        let pool = ColumnPool::new();
        let ctx = EvalContext::new(&pool);
        let err = f.eval(&ctx, chunk.row(0).unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Extraction);
        assert_eq!(f.eval(&ctx, chunk.row(1).unwrap()).unwrap(), Value::Null);

        let mut out = crate::execution::Column::new(LogicalType::Json);
        let err = f.vec_eval(&ctx, &chunk, &mut out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Extraction);
    }
}
