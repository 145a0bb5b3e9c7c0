use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::ProblemId;
use crate::model::problem::Problem;

/// Record of a single attempt at a problem.
///
/// Created once per attempt and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub problem_id: ProblemId,
    pub submitted_value: i64,
    pub correct_answer: u32,
    pub is_correct: bool,
    pub elapsed_millis: u64,
    pub submitted_at: DateTime<Utc>,
}

impl AnswerRecord {
    /// Grades `submitted_value` against the problem's answer.
    #[must_use]
    pub fn new(
        problem: &Problem,
        submitted_value: i64,
        elapsed_millis: u64,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            problem_id: problem.id().clone(),
            submitted_value,
            correct_answer: problem.correct_answer(),
            is_correct: problem.is_correct(submitted_value),
            elapsed_millis,
            submitted_at,
        }
    }

    /// Time spent on the attempt, in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_millis as f64 / 1000.0
    }
}
