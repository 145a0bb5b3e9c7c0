//! Recommendation policy: next difficulty tier and focus operations.

use crate::model::{Difficulty, Operation, ProgressRecord};

/// Strength at or above which the learner is promoted one tier.
pub const PROMOTE_AT: f64 = 80.0;
/// Strength below which the learner is demoted one tier.
pub const DEMOTE_BELOW: f64 = 60.0;
/// How many of the weakest operations are recommended.
pub const FOCUS_COUNT: usize = 2;

/// Next difficulty tier, never more than one step from the current one.
#[must_use]
pub fn recommend_difficulty(progress: &ProgressRecord) -> Difficulty {
    let current = progress.recommended_difficulty;
    let strength = progress.difficulty_strength(current);

    if strength >= PROMOTE_AT {
        if let Some(next) = current.next() {
            return next;
        }
    } else if strength < DEMOTE_BELOW {
        if let Some(previous) = current.previous() {
            return previous;
        }
    }
    current
}

/// The weakest operations, ascending by strength; ties keep operation order.
///
/// Always returns at least one operation, defaulting to addition.
#[must_use]
pub fn recommend_operations(progress: &ProgressRecord) -> Vec<Operation> {
    let mut ranked: Vec<(Operation, f64)> = Operation::ALL
        .iter()
        .map(|op| (*op, progress.operation_strength(*op)))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    let focus: Vec<Operation> = ranked
        .into_iter()
        .take(FOCUS_COUNT)
        .map(|(op, _)| op)
        .collect();

    if focus.is_empty() {
        vec![Operation::Addition]
    } else {
        focus
    }
}
