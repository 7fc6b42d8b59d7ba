//! Row and batch evaluation must agree.
//!
//! Every function is evaluated over a random 1024-row chunk three ways: row by
//! row, through its batch kernel, and through the per-row fallback loop. All
//! three must produce the same value and NULL flag for every visible row, and
//! either all succeed or all fail.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use vireo_common::types::{Decimal, LogicalType, Value};
use vireo_core::execution::{Column, ColumnPool, DataChunk, SelectionVector};
use vireo_core::expression::{EvalContext, Expression, FunctionKind, ScalarFunction};

const ROWS: usize = 1024;

const A: usize = 0;
const B: usize = 1;
const REAL: usize = 2;
const FLOAT: usize = 3;
const DEC: usize = 4;
const STR: usize = 5;
const DT: usize = 6;
const TS: usize = 7;
const DUR: usize = 8;
const JSON: usize = 9;
const STR2: usize = 10;

fn types() -> Vec<LogicalType> {
    vec![
        LogicalType::Int64,
        LogicalType::Int64,
        LogicalType::Float64,
        LogicalType::Float32,
        LogicalType::decimal(10, 2),
        LogicalType::String,
        LogicalType::DateTime,
        LogicalType::Timestamp,
        LogicalType::Duration,
        LogicalType::Json,
        LogicalType::String,
    ]
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn random_string(rng: &mut StdRng) -> Value {
    const WORDS: [&str; 8] = ["", "abc", "3 apples", "0.0", "-2.5e1x", "zz", "  7", "Ab"];
    Value::from(WORDS[rng.random_range(0..WORDS.len())])
}

fn random_value(rng: &mut StdRng, column: usize) -> Value {
    if rng.random_bool(0.15) {
        return Value::Null;
    }
    match column {
        A | B => Value::from(rng.random_range(-1000i64..1000)),
        REAL | FLOAT => Value::from(rng.random_range(-100.0f64..100.0)),
        DEC => {
            let mantissa = i128::from(rng.random_range(-100_000i64..100_000));
            Value::from(Decimal::new(mantissa, 2).unwrap())
        }
        STR | STR2 => random_string(rng),
        DT | TS => {
            let secs = rng.random_range(0..5 * 365 * 86_400i64);
            Value::from(base_time() + TimeDelta::seconds(secs))
        }
        DUR => Value::from(TimeDelta::seconds(rng.random_range(-86_400i64..86_400))),
        _ => {
            if rng.random_bool(0.5) {
                Value::from(json!({"key": rng.random_range(-50i64..50), "s": "x"}))
            } else {
                Value::from(json!({"key": 0.25 * f64::from(rng.random_range(-8i32..8))}))
            }
        }
    }
}

fn random_chunk(seed: u64) -> DataChunk {
    let mut rng = StdRng::seed_from_u64(seed);
    let types = types();
    let mut chunk = DataChunk::with_capacity(&types, ROWS);
    for _ in 0..ROWS {
        let row: Vec<Value> = (0..types.len()).map(|c| random_value(&mut rng, c)).collect();
        chunk.append_row(&row).unwrap();
    }
    chunk
}

fn random_selection(seed: u64) -> SelectionVector {
    let mut rng = StdRng::seed_from_u64(seed);
    let keep: Vec<bool> = (0..ROWS).map(|_| rng.random_bool(0.4)).collect();
    SelectionVector::from_predicate(ROWS, |i| keep[i])
}

fn col(index: usize) -> Expression {
    Expression::column(index, types()[index])
}

fn call(kind: FunctionKind, args: Vec<Expression>) -> Expression {
    Expression::function(kind, args).unwrap_or_else(|e| panic!("{kind}: {e}"))
}

fn assert_agree_with(expr: &Expression, chunk: &DataChunk, time_zone: FixedOffset) {
    let pool = ColumnPool::new();
    let ctx = EvalContext::new(&pool).with_time_zone(time_zone);
    let expected: vireo_common::Result<Vec<Value>> =
        chunk.rows().map(|row| expr.eval(&ctx, row)).collect();

    for ctx in [ctx, ctx.with_vectorized(false)] {
        let mut out = Column::new(LogicalType::Int64);
        let batch = expr.vec_eval(&ctx, chunk, &mut out);
        match &expected {
            Ok(values) => {
                if let Err(e) = batch {
                    panic!("{expr}: batch failed where rows succeeded: {e}");
                }
                assert_eq!(out.data_type(), expr.return_type(), "{expr}");
                assert_eq!(out.len(), values.len(), "{expr}");
                for (k, value) in values.iter().enumerate() {
                    assert_eq!(&out.get_value(k).unwrap(), value, "{expr} at visible row {k}");
                }
            }
            Err(e) => assert!(batch.is_err(), "{expr}: rows failed ({e}) but batch succeeded"),
        }
    }
}

fn assert_agree(expr: &Expression, chunk: &DataChunk) {
    assert_agree_with(expr, chunk, FixedOffset::east_opt(0).unwrap());
}

fn expressions() -> Vec<Expression> {
    use FunctionKind::*;

    let mut exprs = Vec::new();
    for kind in [Plus, Minus, Multiply] {
        exprs.push(call(kind, vec![col(A), col(B)]));
        exprs.push(call(kind, vec![col(REAL), col(FLOAT)]));
        exprs.push(call(kind, vec![col(DEC), col(DEC)]));
    }
    for kind in [Plus, Minus] {
        exprs.push(call(kind, vec![col(DUR), col(DUR)]));
        exprs.push(call(kind, vec![col(DT), col(DUR)]));
        exprs.push(call(kind, vec![col(TS), col(DUR)]));
    }
    for c in [A, REAL, FLOAT, DEC, STR, DT, TS, DUR, JSON] {
        exprs.push(call(Double, vec![col(c)]));
    }
    for kind in [Eq, Ne, Lt, Le, Gt, Ge] {
        exprs.push(call(kind, vec![col(A), col(B)]));
        exprs.push(call(kind, vec![col(REAL), col(FLOAT)]));
        exprs.push(call(kind, vec![col(DEC), call(Double, vec![col(DEC)])]));
        exprs.push(call(kind, vec![col(STR), col(STR2)]));
        exprs.push(call(kind, vec![col(DT), col(TS)]));
        exprs.push(call(kind, vec![col(DUR), call(Double, vec![col(DUR)])]));
    }
    exprs.push(call(And, vec![col(STR), col(JSON)]));
    exprs.push(call(Or, vec![col(DEC), col(DUR)]));
    exprs.push(call(And, vec![col(A), call(Not, vec![col(B)])]));
    exprs.push(call(Not, vec![col(DT)]));
    exprs.push(call(IsNull, vec![col(FLOAT)]));
    exprs.push(call(IsNotNull, vec![col(JSON)]));
    exprs.push(call(Concat, vec![col(STR), col(STR2)]));
    exprs.push(call(
        JsonExtract,
        vec![
            col(JSON),
            Expression::constant(Value::from("$.key"), LogicalType::String).unwrap(),
        ],
    ));
    exprs.push(call(CastIntToReal, vec![col(A)]));
    exprs.push(call(CastIntToDecimal, vec![col(B)]));
    exprs.push(call(CastRealToDecimal, vec![col(REAL)]));
    exprs.push(call(CastDecimalToReal, vec![col(DEC)]));
    exprs
}

#[test]
fn test_every_function_agrees() {
    let mut chunk = random_chunk(7);
    for expr in expressions() {
        assert_agree(&expr, &chunk);
    }
    chunk.set_selection(random_selection(8)).unwrap();
    for expr in expressions() {
        assert_agree(&expr, &chunk);
    }
}

#[test]
fn test_nested_fallback_agrees() {
    let mut chunk = random_chunk(11);
    chunk.set_selection(random_selection(12)).unwrap();

    let slow = ScalarFunction::new(FunctionKind::Plus, vec![col(A), col(B)])
        .unwrap()
        .without_batch_form();
    let outer = call(FunctionKind::Double, vec![Expression::Function(slow)]);
    assert!(!outer.vectorized());
    assert_agree(&outer, &chunk);

    let three = Value::from(Decimal::from_i64(3));
    let constant = Expression::constant(three, LogicalType::decimal(4, 1)).unwrap();
    let mixed = call(FunctionKind::Multiply, vec![col(DEC), constant]);
    assert_agree(&mixed, &chunk);
}

#[test]
fn test_to_local_time_uses_session_zone() {
    let mut chunk = random_chunk(21);
    chunk.set_selection(random_selection(22)).unwrap();
    let expr = call(FunctionKind::ToLocalTime, vec![col(TS)]);
    for hours in [-5, 0, 8] {
        assert_agree_with(&expr, &chunk, FixedOffset::east_opt(hours * 3600).unwrap());
    }
}

#[test]
fn test_binary_result_null_when_either_operand_null() {
    let chunk = random_chunk(31);
    let pool = ColumnPool::new();
    let ctx = EvalContext::new(&pool);
    let plus = call(FunctionKind::Plus, vec![col(A), col(B)]);

    let mut out = Column::new(LogicalType::Int64);
    plus.vec_eval(&ctx, &chunk, &mut out).unwrap();
    let a = chunk.column(A).unwrap();
    let b = chunk.column(B).unwrap();
    for i in 0..ROWS {
        assert_eq!(out.is_null(i), a.is_null(i) || b.is_null(i), "row {i}");
    }
}

#[test]
fn test_decimal_double_scenario() {
    let ty = LogicalType::decimal(20, 4);
    let values: Vec<Value> = (0..ROWS)
        .map(|i| Value::from(Decimal::from_f64(i as f64).unwrap()))
        .collect();
    let chunk = DataChunk::from_columns(vec![Column::from_values(ty, &values).unwrap()]).unwrap();

    let pool = ColumnPool::new();
    let ctx = EvalContext::new(&pool);
    let double = call(FunctionKind::Double, vec![Expression::column(0, ty)]);
    let mut out = Column::new(LogicalType::Int64);
    double.vec_eval(&ctx, &chunk, &mut out).unwrap();

    for (i, row) in chunk.rows().enumerate() {
        let expected = Decimal::from_i64(2 * i as i64);
        assert_eq!(out.get_decimal(i), Some(expected));
        assert_eq!(double.eval_decimal(&ctx, row).unwrap(), Some(expected));
    }
}

#[test]
fn test_errors_only_on_visible_rows() {
    let values = [Value::from(i64::MAX), Value::from(1i64), Value::Null];
    let column = Column::from_values(LogicalType::Int64, &values).unwrap();
    let mut chunk = DataChunk::from_columns(vec![column]).unwrap();
    let double = call(FunctionKind::Double, vec![Expression::column(0, LogicalType::Int64)]);

    assert_agree(&double, &chunk);
    let pool = ColumnPool::new();
    let ctx = EvalContext::new(&pool);
    let mut out = Column::new(LogicalType::Int64);
    assert!(double.vec_eval(&ctx, &chunk, &mut out).is_err());

    chunk.set_selection(SelectionVector::new(vec![1, 2], 3).unwrap()).unwrap();
    assert_agree(&double, &chunk);
    double.vec_eval(&ctx, &chunk, &mut out).unwrap();
    assert_eq!(out.get_int64(0), Some(2));
    assert!(out.is_null(1));
}

#[test]
fn test_json_missing_key_fails_in_both_paths() {
    let docs = [Value::from(json!({"key": 1})), Value::from(json!({"other": 1}))];
    let column = Column::from_values(LogicalType::Json, &docs).unwrap();
    let mut chunk = DataChunk::from_columns(vec![column]).unwrap();
    let double = call(FunctionKind::Double, vec![Expression::column(0, LogicalType::Json)]);
    assert_agree(&double, &chunk);

    chunk.set_selection(SelectionVector::new(vec![0], 2).unwrap()).unwrap();
    assert_agree(&double, &chunk);
}
