//! Shared-pool evaluation across threads.
//!
//! One [`PooledEvaluator`] serves a rayon pool; results must match a serial
//! run and the pool must account for every column it handed out.

use std::sync::Arc;

use rayon::prelude::*;

use vireo_common::types::{LogicalType, Value};
use vireo_core::config::EvalConfig;
use vireo_core::execution::{ColumnPool, DataChunk, SelectionVector};
use vireo_core::expression::{ExclusiveEvaluator, Expression, FunctionKind, PooledEvaluator};

const THREADS: usize = 4;
const CHUNKS: usize = 64;
const ROWS: usize = 512;

fn exprs() -> Vec<Expression> {
    let a = Expression::column(0, LogicalType::Int64);
    let b = Expression::column(1, LogicalType::Float64);
    let s = Expression::column(2, LogicalType::String);
    let sum = Expression::function(
        FunctionKind::Plus,
        vec![
            Expression::function(FunctionKind::Double, vec![a.clone()]).unwrap(),
            a.clone(),
        ],
    )
    .unwrap();
    vec![
        sum,
        Expression::function(FunctionKind::Multiply, vec![b.clone(), b]).unwrap(),
        Expression::function(FunctionKind::Concat, vec![s.clone(), s]).unwrap(),
        Expression::function(
            FunctionKind::Gt,
            vec![
                a,
                Expression::constant(Value::from(100i64), LogicalType::Int64).unwrap(),
            ],
        )
        .unwrap(),
    ]
}

fn chunk(seed: usize) -> DataChunk {
    let mut chunk = DataChunk::with_capacity(
        &[LogicalType::Int64, LogicalType::Float64, LogicalType::String],
        ROWS,
    );
    for i in 0..ROWS {
        let n = i64::try_from(seed * ROWS + i).unwrap();
        let a = if n % 7 == 0 { Value::Null } else { Value::from(n % 300) };
        let b = Value::from(n as f64 / 8.0);
        let s = Value::from(format!("r{}", n % 13));
        chunk.append_row(&[a, b, s]).unwrap();
    }
    if seed % 2 == 1 {
        chunk
            .set_selection(SelectionVector::from_predicate(ROWS, |i| i % 3 != 0))
            .unwrap();
    }
    chunk
}

fn rows_of(chunk: &DataChunk) -> Vec<Vec<Value>> {
    chunk
        .rows()
        .map(|row| (0..chunk.column_count()).map(|c| row.value(c).unwrap()).collect())
        .collect()
}

fn thread_pool() -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(THREADS)
        .build()
        .unwrap()
}

#[test]
fn test_parallel_projection_matches_serial() {
    let chunks: Vec<DataChunk> = (0..CHUNKS).map(chunk).collect();
    let config = EvalConfig::default();

    let serial_pool = Arc::new(ColumnPool::new());
    let serial = PooledEvaluator::with_pool(exprs(), &config, Arc::clone(&serial_pool)).unwrap();
    let expected: Vec<_> = chunks
        .iter()
        .map(|c| rows_of(&serial.project(c).unwrap()))
        .collect();
    let per_thread_peak = serial_pool.stats().allocated;

    let pool = Arc::new(ColumnPool::new());
    let shared = PooledEvaluator::with_pool(exprs(), &config, Arc::clone(&pool)).unwrap();
    let actual: Vec<_> = thread_pool().install(|| {
        chunks
            .par_iter()
            .map(|c| rows_of(&shared.project(c).unwrap()))
            .collect()
    });
    assert_eq!(actual, expected);

    let stats = pool.stats();
    assert_eq!(stats.idle, stats.allocated, "every scratch column came back");
    assert!(stats.allocated <= THREADS * per_thread_peak);
    assert!(stats.reused > 0);
}

#[test]
fn test_parallel_filter_matches_serial() {
    let mut chunks: Vec<DataChunk> = (0..CHUNKS).map(chunk).collect();
    let config = EvalConfig::default();
    let pool = Arc::new(ColumnPool::new());
    let shared = PooledEvaluator::with_pool(exprs(), &config, Arc::clone(&pool)).unwrap();

    let expected: Vec<_> = chunks
        .iter_mut()
        .map(|c| shared.filter(c, None, true).unwrap())
        .collect();
    let actual: Vec<_> = thread_pool().install(|| {
        chunks
            .par_iter_mut()
            .map(|c| shared.filter(c, None, true).unwrap())
            .collect()
    });
    assert_eq!(actual, expected);
    assert!(actual.iter().any(|o| o.selected_count() > 0));
    assert!(actual.iter().any(|o| o.nulls.iter().any(|&n| n)));

    let stats = pool.stats();
    assert_eq!(stats.idle, stats.allocated);
}

#[test]
fn test_exclusive_evaluator_per_worker() {
    let chunks: Vec<DataChunk> = (0..CHUNKS).map(chunk).collect();
    let config = EvalConfig::default();
    let pooled = PooledEvaluator::with_pool(exprs(), &config, Arc::new(ColumnPool::new())).unwrap();
    let expected: Vec<_> = chunks
        .iter()
        .map(|c| rows_of(&pooled.project(c).unwrap()))
        .collect();

    let actual: Vec<_> = thread_pool().install(|| {
        chunks
            .par_iter()
            .map_init(
                || ExclusiveEvaluator::new(exprs(), &config).unwrap(),
                |eval, c| rows_of(&eval.project(c).unwrap()),
            )
            .collect()
    });
    assert_eq!(actual, expected);
}
