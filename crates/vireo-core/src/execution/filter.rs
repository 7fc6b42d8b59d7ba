//! Predicate filtering over chunks.
//!
//! A filter is a list of predicates combined with AND. Evaluating it over a
//! chunk yields two flags per physical row:
//!
//! - `selected`: every predicate was definitely true.
//! - `nulls`: at least one predicate was NULL. Outer joins need this to tell
//!   "unknown" apart from "no".
//!
//! Rows hidden by the chunk's selection vector, or listed in the caller's
//! skip mask, are never selected and never flagged. Every other row sees every
//! predicate, so the two engines raise errors on the same rows.
//!
//! [`row_based_filter`] walks rows and evaluates the predicate list per row.
//! [`vectorized_filter`] evaluates one predicate at a time over all candidate
//! rows.

use vireo_common::types::LogicalType;
use vireo_common::utils::error::{Error, Result};

use super::chunk::{DataChunk, Row};
use super::selection::SelectionVector;
use crate::expression::{EvalContext, Expression, truth_at, truthy};

/// Per-row result of a filter pass, indexed by physical row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Rows that passed every predicate.
    pub selected: Vec<bool>,
    /// Rows on which some predicate was NULL.
    pub nulls: Vec<bool>,
}

impl FilterOutcome {
    fn new(rows: usize) -> Self {
        Self {
            selected: vec![false; rows],
            nulls: vec![false; rows],
        }
    }

    /// Number of selected rows.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|&&s| s).count()
    }

    /// The selected rows as a selection vector.
    #[must_use]
    pub fn selection(&self) -> SelectionVector {
        SelectionVector::from_predicate(self.selected.len(), |i| self.selected[i])
    }
}

/// Evaluates the predicate list on one row.
///
/// Returns `(passed, saw_null)`: whether every predicate was true, and
/// whether any was NULL.
pub fn eval_bool(ctx: &EvalContext<'_>, exprs: &[Expression], row: Row<'_>) -> Result<(bool, bool)> {
    let mut passed = true;
    let mut saw_null = false;
    for expr in exprs {
        match truthy(&expr.eval(ctx, row)?) {
            Some(true) => {}
            Some(false) => passed = false,
            None => {
                passed = false;
                saw_null = true;
            }
        }
    }
    Ok((passed, saw_null))
}

fn check_skip(chunk: &DataChunk, skip: Option<&[bool]>) -> Result<()> {
    match skip {
        Some(mask) if mask.len() != chunk.total_row_count() => Err(Error::Contract(format!(
            "skip mask has {} entries, chunk has {} rows",
            mask.len(),
            chunk.total_row_count()
        ))),
        _ => Ok(()),
    }
}

fn skipped(skip: Option<&[bool]>, row: usize) -> bool {
    skip.is_some_and(|mask| mask[row])
}

/// Filters row by row.
pub fn row_based_filter(
    ctx: &EvalContext<'_>,
    exprs: &[Expression],
    chunk: &DataChunk,
    skip: Option<&[bool]>,
) -> Result<FilterOutcome> {
    check_skip(chunk, skip)?;
    let mut outcome = FilterOutcome::new(chunk.total_row_count());
    for row in chunk.rows() {
        let index = row.index();
        if skipped(skip, index) {
            continue;
        }
        let (passed, saw_null) = eval_bool(ctx, exprs, row)?;
        outcome.selected[index] = passed;
        outcome.nulls[index] = saw_null;
    }
    Ok(outcome)
}

/// Filters one predicate at a time over the whole chunk.
///
/// The chunk's selection is replaced while predicates run and put back before
/// returning, on success or error.
pub fn vectorized_filter(
    ctx: &EvalContext<'_>,
    exprs: &[Expression],
    chunk: &mut DataChunk,
    skip: Option<&[bool]>,
) -> Result<FilterOutcome> {
    check_skip(chunk, skip)?;
    let original = chunk.take_selection();
    let candidates: Vec<usize> = match &original {
        Some(sel) => sel.iter().filter(|&row| !skipped(skip, row)).collect(),
        None => (0..chunk.total_row_count())
            .filter(|&row| !skipped(skip, row))
            .collect(),
    };
    let result = evaluate_candidates(ctx, exprs, chunk, candidates);
    chunk.restore_selection(original);
    result
}

fn evaluate_candidates(
    ctx: &EvalContext<'_>,
    exprs: &[Expression],
    chunk: &mut DataChunk,
    candidates: Vec<usize>,
) -> Result<FilterOutcome> {
    let rows = chunk.total_row_count();
    let mut outcome = FilterOutcome::new(rows);
    let mut passed = vec![true; candidates.len()];
    if !candidates.is_empty() {
        let mut truth = ctx.scratch(LogicalType::Int64, candidates.len())?;
        chunk.set_selection(SelectionVector::new(candidates, rows)?)?;
        for expr in exprs {
            expr.vec_eval(ctx, chunk, &mut truth)?;
            for (k, row) in chunk.selected_indices().enumerate() {
                match truth_at(&truth, k)? {
                    Some(true) => {}
                    Some(false) => passed[k] = false,
                    None => {
                        passed[k] = false;
                        outcome.nulls[row] = true;
                    }
                }
            }
        }
    }
    for (row, ok) in chunk.selected_indices().zip(passed) {
        outcome.selected[row] = ok;
    }
    Ok(outcome)
}

/// Filters with whichever engine the context and predicates allow.
///
/// The vectorized engine runs when the context has batch evaluation on and
/// every predicate is fully vectorized. With `consider_null` off the null
/// flags are cleared; predicates are still evaluated the same way.
pub fn vectorized_filter_consider_null(
    ctx: &EvalContext<'_>,
    exprs: &[Expression],
    chunk: &mut DataChunk,
    skip: Option<&[bool]>,
    consider_null: bool,
) -> Result<FilterOutcome> {
    let vectorized = ctx.vectorized() && exprs.iter().all(Expression::vectorized);
    let result = if vectorized {
        vectorized_filter(ctx, exprs, chunk, skip)
    } else {
        row_based_filter(ctx, exprs, chunk, skip)
    };
    let mut outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::debug!(error = %e, vectorized, "filter aborted");
            return Err(e);
        }
    };
    if !consider_null {
        outcome.nulls.fill(false);
    }
    tracing::debug!(
        predicates = exprs.len(),
        rows = chunk.row_count(),
        selected = outcome.selected_count(),
        vectorized,
        "filter pass"
    );
    Ok(outcome)
}
