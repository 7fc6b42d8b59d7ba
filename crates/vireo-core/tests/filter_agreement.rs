//! The row and vectorized filter engines must agree.
//!
//! Random predicate lists (one to five predicates, some without batch forms)
//! are run over random chunks, with and without a selection vector and a skip
//! mask. Every engine, and the dispatching entry point in both session modes,
//! must report the same selected and NULL flags for every physical row.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use vireo_common::types::{Decimal, LogicalType, Value};
use vireo_core::execution::{
    DataChunk, FilterOutcome, SelectionVector, eval_bool, row_based_filter, vectorized_filter,
    vectorized_filter_consider_null,
};
use vireo_core::expression::{EvalContext, Expression, FunctionKind, ScalarFunction};
use vireo_core::ColumnPool;

const ITERATIONS: u64 = 16;

fn types() -> [LogicalType; 9] {
    [
        LogicalType::Int64,
        LogicalType::Int64,
        LogicalType::Float64,
        LogicalType::decimal(8, 2),
        LogicalType::String,
        LogicalType::Json,
        LogicalType::DateTime,
        LogicalType::Timestamp,
        LogicalType::Duration,
    ]
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn random_value(rng: &mut StdRng, ty: LogicalType) -> Value {
    if rng.random_bool(0.2) {
        return Value::Null;
    }
    match ty {
        LogicalType::Int64 => Value::from(rng.random_range(-3i64..10)),
        LogicalType::Float64 => Value::from(f64::from(rng.random_range(-4i32..4)) / 2.0),
        LogicalType::Decimal { .. } => {
            Value::from(Decimal::new(i128::from(rng.random_range(-300i64..300)), 2).unwrap())
        }
        LogicalType::String => {
            const WORDS: [&str; 5] = ["", "0", "abc", "2 cats", "-1.5"];
            Value::from(WORDS[rng.random_range(0..WORDS.len())])
        }
        LogicalType::DateTime | LogicalType::Timestamp => {
            Value::from(base_time() + TimeDelta::seconds(rng.random_range(0..86_400i64)))
        }
        LogicalType::Duration => Value::from(TimeDelta::seconds(rng.random_range(-2i64..3))),
        _ => Value::from(json!({"key": rng.random_range(0i64..3)})),
    }
}

fn random_chunk(rng: &mut StdRng, rows: usize) -> DataChunk {
    let types = types();
    let mut chunk = DataChunk::with_capacity(&types, rows);
    for _ in 0..rows {
        let row: Vec<Value> = types.iter().map(|&ty| random_value(rng, ty)).collect();
        chunk.append_row(&row).unwrap();
    }
    chunk
}

fn col(index: usize) -> Expression {
    Expression::column(index, types()[index])
}

fn int(v: i64) -> Expression {
    Expression::constant(Value::from(v), LogicalType::Int64).unwrap()
}

fn call(kind: FunctionKind, args: Vec<Expression>) -> Expression {
    Expression::function(kind, args).unwrap()
}

fn row_only(kind: FunctionKind, args: Vec<Expression>) -> Expression {
    Expression::Function(ScalarFunction::new(kind, args).unwrap().without_batch_form())
}

fn candidate_predicates() -> Vec<Expression> {
    use FunctionKind::*;
    vec![
        col(0),
        col(2),
        col(3),
        col(4),
        col(5),
        call(Gt, vec![col(0), int(2)]),
        call(Le, vec![col(0), col(1)]),
        call(IsNotNull, vec![col(1)]),
        call(IsNull, vec![col(2)]),
        call(Not, vec![col(3)]),
        call(Or, vec![col(0), col(4)]),
        call(And, vec![col(1), col(2)]),
        call(Double, vec![col(1)]),
        call(Minus, vec![col(0), col(1)]),
        call(
            Eq,
            vec![
                col(4),
                Expression::constant(Value::from("abc"), LogicalType::String).unwrap(),
            ],
        ),
        call(
            JsonExtract,
            vec![
                col(5),
                Expression::constant(Value::from("$.key"), LogicalType::String).unwrap(),
            ],
        ),
        col(6),
        col(7),
        col(8),
        call(Double, vec![col(8)]),
        call(ToLocalTime, vec![col(7)]),
        call(Gt, vec![col(6), col(7)]),
        call(Plus, vec![col(6), col(8)]),
        row_only(Ne, vec![col(0), int(0)]),
        row_only(Plus, vec![col(2), col(2)]),
        row_only(Not, vec![col(8)]),
    ]
}

fn pick_predicates(rng: &mut StdRng) -> Vec<Expression> {
    let candidates = candidate_predicates();
    let count = rng.random_range(1..=5);
    (0..count)
        .map(|_| candidates[rng.random_range(0..candidates.len())].clone())
        .collect()
}

/// Checks `outcome` row by row against [`eval_bool`].
fn check_against_rows(
    ctx: &EvalContext<'_>,
    exprs: &[Expression],
    chunk: &DataChunk,
    skip: Option<&[bool]>,
    outcome: &FilterOutcome,
) {
    let total = chunk.total_row_count();
    assert_eq!(outcome.selected.len(), total);
    assert_eq!(outcome.nulls.len(), total);

    let mut candidate = vec![false; total];
    for row in chunk.rows() {
        if skip.is_some_and(|mask| mask[row.index()]) {
            continue;
        }
        candidate[row.index()] = true;
        let (passed, saw_null) = eval_bool(ctx, exprs, row).unwrap();
        assert_eq!(outcome.selected[row.index()], passed, "row {}", row.index());
        assert_eq!(outcome.nulls[row.index()], saw_null, "row {}", row.index());
    }
    for (i, &visible) in candidate.iter().enumerate() {
        if !visible {
            assert!(!outcome.selected[i] && !outcome.nulls[i], "hidden row {i} flagged");
        }
    }
}

fn run_iteration(rng: &mut StdRng, with_selection: bool, with_skip: bool) {
    let rows = rng.random_range(1..200);
    let mut chunk = random_chunk(rng, rows);
    let exprs = pick_predicates(rng);

    let selection = with_selection.then(|| {
        let keep: Vec<bool> = (0..rows).map(|_| rng.random_bool(0.5)).collect();
        SelectionVector::from_predicate(rows, |i| keep[i])
    });
    if let Some(sel) = &selection {
        chunk.set_selection(sel.clone()).unwrap();
    }
    let skip: Option<Vec<bool>> = with_skip.then(|| (0..rows).map(|_| rng.random_bool(0.25)).collect());
    let skip = skip.as_deref();

    let pool = ColumnPool::new();
    let ctx = EvalContext::new(&pool);

    let by_row = row_based_filter(&ctx, &exprs, &chunk, skip).unwrap();
    let by_column = vectorized_filter(&ctx, &exprs, &mut chunk, skip).unwrap();
    assert_eq!(by_row, by_column, "predicates: {exprs:?}");
    assert_eq!(chunk.selection(), selection.as_ref());
    check_against_rows(&ctx, &exprs, &chunk, skip, &by_row);

    let dispatched = vectorized_filter_consider_null(&ctx, &exprs, &mut chunk, skip, true).unwrap();
    assert_eq!(dispatched, by_row);

    let row_session = ctx.with_vectorized(false);
    let forced = vectorized_filter_consider_null(&row_session, &exprs, &mut chunk, skip, true).unwrap();
    assert_eq!(forced, by_row);

    let ignoring = vectorized_filter_consider_null(&ctx, &exprs, &mut chunk, skip, false).unwrap();
    assert_eq!(ignoring.selected, by_row.selected);
    assert!(ignoring.nulls.iter().all(|&n| !n));
}

#[test]
fn test_engines_agree_without_selection() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..ITERATIONS {
        run_iteration(&mut rng, false, false);
    }
}

#[test]
fn test_engines_agree_with_selection() {
    let mut rng = StdRng::seed_from_u64(0x5e1);
    for _ in 0..ITERATIONS {
        run_iteration(&mut rng, true, false);
    }
}

#[test]
fn test_engines_agree_with_skip_mask() {
    let mut rng = StdRng::seed_from_u64(0x5c1);
    for _ in 0..ITERATIONS {
        run_iteration(&mut rng, true, true);
        run_iteration(&mut rng, false, true);
    }
}

#[test]
fn test_selected_rows_are_visible_rows() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut chunk = random_chunk(&mut rng, 64);
    let sel = SelectionVector::from_predicate(64, |i| i % 3 == 0);
    chunk.set_selection(sel.clone()).unwrap();

    let pool = ColumnPool::new();
    let ctx = EvalContext::new(&pool);
    let out = vectorized_filter(&ctx, &[col(0)], &mut chunk, None).unwrap();
    let visible: Vec<usize> = sel.iter().collect();
    for row in out.selection().iter() {
        assert!(visible.contains(&row), "row {row} is not visible");
    }
}

#[test]
fn test_null_guarded_comparison() {
    let a = [Value::Null, Value::from(5i64), Value::from(7i64)];
    let mut chunk = DataChunk::new(&[LogicalType::Int64]);
    for v in a {
        chunk.append_row(&[v]).unwrap();
    }
    let exprs = [
        call(FunctionKind::IsNotNull, vec![Expression::column(0, LogicalType::Int64)]),
        call(FunctionKind::Gt, vec![Expression::column(0, LogicalType::Int64), int(5)]),
    ];

    let pool = ColumnPool::new();
    let ctx = EvalContext::new(&pool);
    let with_nulls = vectorized_filter_consider_null(&ctx, &exprs, &mut chunk, None, true).unwrap();
    assert_eq!(with_nulls.selected, [false, false, true]);
    assert_eq!(with_nulls.nulls, [true, false, false]);

    let without = vectorized_filter_consider_null(&ctx, &exprs, &mut chunk, None, false).unwrap();
    assert_eq!(without.selected, [false, false, true]);
    assert_eq!(without.nulls, [false, false, false]);
}
