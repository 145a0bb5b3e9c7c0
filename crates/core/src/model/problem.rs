use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ProblemId;
use crate::model::operation::{Difficulty, Operation};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProblemError {
    #[error("{operand1} {symbol} {operand2} does not produce a whole non-negative result")]
    Unrepresentable {
        operand1: u32,
        symbol: &'static str,
        operand2: u32,
    },

    #[error("stored answer {stored} does not match computed answer {computed}")]
    AnswerMismatch { stored: u32, computed: u32 },

    #[error("operator symbol {found:?} does not match operation {operation}")]
    SymbolMismatch { operation: Operation, found: String },
}

//
// ─── PROBLEM ───────────────────────────────────────────────────────────────────
//

/// A single arithmetic exercise.
///
/// The answer is always exact: subtraction never goes negative and division
/// never leaves a remainder. Fields are private so the invariant cannot be
/// broken after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProblemRecord", into = "ProblemRecord")]
pub struct Problem {
    id: ProblemId,
    operation: Operation,
    difficulty: Difficulty,
    operand1: u32,
    operand2: u32,
    correct_answer: u32,
    created_at: DateTime<Utc>,
}

impl Problem {
    /// Builds a problem and computes its answer.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError::Unrepresentable` when the result would be
    /// negative, fractional, or overflow `u32`.
    pub fn new(
        id: ProblemId,
        operation: Operation,
        difficulty: Difficulty,
        operand1: u32,
        operand2: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ProblemError> {
        let correct_answer = evaluate(operation, operand1, operand2).ok_or(
            ProblemError::Unrepresentable {
                operand1,
                symbol: operation.symbol(),
                operand2,
            },
        )?;

        Ok(Self {
            id,
            operation,
            difficulty,
            operand1,
            operand2,
            correct_answer,
            created_at,
        })
    }

    /// Assemble a problem whose answer the caller already derived.
    ///
    /// Only the generator uses this; its draws satisfy the invariant by
    /// construction.
    pub(crate) fn from_generated(
        id: ProblemId,
        operation: Operation,
        difficulty: Difficulty,
        operands: (u32, u32),
        correct_answer: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        debug_assert_eq!(
            evaluate(operation, operands.0, operands.1),
            Some(correct_answer)
        );
        Self {
            id,
            operation,
            difficulty,
            operand1: operands.0,
            operand2: operands.1,
            correct_answer,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ProblemId {
        &self.id
    }

    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn operand1(&self) -> u32 {
        self.operand1
    }

    #[must_use]
    pub fn operand2(&self) -> u32 {
        self.operand2
    }

    #[must_use]
    pub fn operator_symbol(&self) -> &'static str {
        self.operation.symbol()
    }

    #[must_use]
    pub fn correct_answer(&self) -> u32 {
        self.correct_answer
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true when `value` is the exact answer.
    #[must_use]
    pub fn is_correct(&self, value: i64) -> bool {
        value == i64::from(self.correct_answer)
    }

    /// Renders the prompt, e.g. `15 ÷ 3 = `.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "{} {} {} = ",
            self.operand1,
            self.operator_symbol(),
            self.operand2
        )
    }
}

/// Exact result of `lhs op rhs`, or `None` if it is not a whole non-negative `u32`.
#[must_use]
pub fn evaluate(operation: Operation, lhs: u32, rhs: u32) -> Option<u32> {
    match operation {
        Operation::Addition => lhs.checked_add(rhs),
        Operation::Subtraction => lhs.checked_sub(rhs),
        Operation::Multiplication => lhs.checked_mul(rhs),
        Operation::Division => {
            if rhs == 0 || lhs % rhs != 0 {
                None
            } else {
                Some(lhs / rhs)
            }
        }
    }
}

//
// ─── PERSISTED SHAPE ───────────────────────────────────────────────────────────
//

/// Wire shape of a problem; rehydration re-checks the arithmetic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProblemRecord {
    id: ProblemId,
    operation: Operation,
    difficulty: Difficulty,
    operand1: u32,
    operand2: u32,
    operator_symbol: String,
    correct_answer: u32,
    created_at: DateTime<Utc>,
}

impl From<Problem> for ProblemRecord {
    fn from(problem: Problem) -> Self {
        Self {
            operator_symbol: problem.operator_symbol().to_string(),
            id: problem.id,
            operation: problem.operation,
            difficulty: problem.difficulty,
            operand1: problem.operand1,
            operand2: problem.operand2,
            correct_answer: problem.correct_answer,
            created_at: problem.created_at,
        }
    }
}

impl TryFrom<ProblemRecord> for Problem {
    type Error = ProblemError;

    fn try_from(record: ProblemRecord) -> Result<Self, Self::Error> {
        if record.operator_symbol != record.operation.symbol() {
            return Err(ProblemError::SymbolMismatch {
                operation: record.operation,
                found: record.operator_symbol,
            });
        }

        let problem = Problem::new(
            record.id,
            record.operation,
            record.difficulty,
            record.operand1,
            record.operand2,
            record.created_at,
        )?;
        if problem.correct_answer != record.correct_answer {
            return Err(ProblemError::AnswerMismatch {
                stored: record.correct_answer,
                computed: problem.correct_answer,
            });
        }
        Ok(problem)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn build(op: Operation, a: u32, b: u32) -> Result<Problem, ProblemError> {
        Problem::new(ProblemId::new("q_1_test"), op, Difficulty::Beginner, a, b, fixed_now())
    }

    #[test]
    fn computes_exact_answers() {
        assert_eq!(build(Operation::Addition, 7, 4).unwrap().correct_answer(), 11);
        assert_eq!(build(Operation::Subtraction, 9, 9).unwrap().correct_answer(), 0);
        assert_eq!(build(Operation::Multiplication, 6, 7).unwrap().correct_answer(), 42);
        assert_eq!(build(Operation::Division, 15, 3).unwrap().correct_answer(), 5);
    }

    #[test]
    fn rejects_negative_and_fractional_results() {
        assert!(matches!(
            build(Operation::Subtraction, 3, 4),
            Err(ProblemError::Unrepresentable { .. })
        ));
        assert!(build(Operation::Division, 7, 2).is_err());
        assert!(build(Operation::Division, 7, 0).is_err());
    }

    #[test]
    fn prompt_uses_operator_symbol() {
        let p = build(Operation::Division, 15, 3).unwrap();
        assert_eq!(p.prompt(), "15 ÷ 3 = ");
        assert!(p.is_correct(5));
        assert!(!p.is_correct(-5));
    }

    #[test]
    fn deserialize_rejects_tampered_answer() {
        let p = build(Operation::Addition, 2, 2).unwrap();
        let mut value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["operatorSymbol"], "+");
        value["correctAnswer"] = serde_json::json!(5);
        let err = serde_json::from_value::<Problem>(value).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn serde_round_trip_keeps_problem() {
        let p = build(Operation::Multiplication, 3, 5).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: Problem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
