use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ProblemId, SessionId};
use crate::model::operation::{Difficulty, Operation};
use crate::model::{AnswerRecord, Problem};

/// Share of the score taken by accuracy; the rest is the speed bonus.
const ACCURACY_WEIGHT: f64 = 0.7;
/// Each second of average answer time costs this many bonus points.
const SPEED_PENALTY_PER_SECOND: f64 = 2.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("end_time is before start_time")]
    InvalidTimeRange,

    #[error("session has {answers} answers for {problems} problems")]
    AnswerCountMismatch { problems: usize, answers: usize },

    #[error("session must practice at least one operation")]
    NoOperations,

    #[error("answer refers to unknown problem {0}")]
    UnknownProblem(ProblemId),
}

/// A completed (or persisted) practice session.
///
/// Score, accuracy, and average time are derived from the answers when the
/// session is built, so they can never disagree with the recorded attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SessionRecord", into = "SessionRecord")]
pub struct Session {
    id: SessionId,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    difficulty: Difficulty,
    operations: Vec<Operation>,
    problems: Vec<Problem>,
    answers: Vec<AnswerRecord>,
    score: u32,
    accuracy: f64,
    average_time_seconds: f64,
}

impl Session {
    /// Build a finished session from its problems and answers.
    ///
    /// # Errors
    ///
    /// - `InvalidTimeRange` if `end_time` is before `start_time`
    /// - `AnswerCountMismatch` unless every problem has exactly one answer
    /// - `NoOperations` if `operations` is empty
    /// - `UnknownProblem` if an answer does not belong to this session
    #[allow(clippy::too_many_arguments)]
    pub fn complete(
        id: SessionId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        difficulty: Difficulty,
        operations: Vec<Operation>,
        problems: Vec<Problem>,
        answers: Vec<AnswerRecord>,
    ) -> Result<Self, SessionError> {
        if answers.len() != problems.len() {
            return Err(SessionError::AnswerCountMismatch {
                problems: problems.len(),
                answers: answers.len(),
            });
        }
        Self::build(
            id,
            start_time,
            Some(end_time),
            difficulty,
            operations,
            problems,
            answers,
        )
    }

    fn build(
        id: SessionId,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        difficulty: Difficulty,
        operations: Vec<Operation>,
        problems: Vec<Problem>,
        answers: Vec<AnswerRecord>,
    ) -> Result<Self, SessionError> {
        if end_time.is_some_and(|end| end < start_time) {
            return Err(SessionError::InvalidTimeRange);
        }
        if operations.is_empty() {
            return Err(SessionError::NoOperations);
        }
        if let Some(stray) = answers
            .iter()
            .find(|a| !problems.iter().any(|p| p.id() == &a.problem_id))
        {
            return Err(SessionError::UnknownProblem(stray.problem_id.clone()));
        }

        let accuracy = accuracy_percent(&problems, &answers);
        let average_time_seconds = average_seconds(&answers);
        let score = weighted_score(accuracy, average_time_seconds);

        Ok(Self {
            id,
            start_time,
            end_time,
            difficulty,
            operations,
            problems,
            answers,
            score,
            accuracy,
            average_time_seconds,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// The operation a session is filed under in reports (the first one requested).
    #[must_use]
    pub fn primary_operation(&self) -> Operation {
        self.operations
            .first()
            .copied()
            .unwrap_or(Operation::Addition)
    }

    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn problem(&self, id: &ProblemId) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id() == id)
    }

    /// Answers paired with the problem they belong to.
    pub fn answered_problems(&self) -> impl Iterator<Item = (&Problem, &AnswerRecord)> {
        self.answers
            .iter()
            .filter_map(|a| self.problem(&a.problem_id).map(|p| (p, a)))
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Percentage of problems answered correctly, rounded to a whole number.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn average_time_seconds(&self) -> f64 {
        self.average_time_seconds
    }

    /// Wall-clock length, if the session has an end time.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.start_time)
    }
}

#[allow(clippy::cast_precision_loss)]
fn accuracy_percent(problems: &[Problem], answers: &[AnswerRecord]) -> f64 {
    if problems.is_empty() {
        return 0.0;
    }
    let correct = answers.iter().filter(|a| a.is_correct).count();
    (correct as f64 / problems.len() as f64 * 100.0).round()
}

#[allow(clippy::cast_precision_loss)]
fn average_seconds(answers: &[AnswerRecord]) -> f64 {
    if answers.is_empty() {
        return 0.0;
    }
    let total: u64 = answers.iter().map(|a| a.elapsed_millis).sum();
    total as f64 / answers.len() as f64 / 1000.0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn weighted_score(accuracy: f64, average_time_seconds: f64) -> u32 {
    let speed_bonus = (100.0 - average_time_seconds.round() * SPEED_PENALTY_PER_SECOND).max(0.0);
    let score = accuracy * ACCURACY_WEIGHT + speed_bonus * (1.0 - ACCURACY_WEIGHT);
    score.round().clamp(0.0, 100.0) as u32
}

//
// ─── PERSISTED SHAPE ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    id: SessionId,
    start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<DateTime<Utc>>,
    difficulty: Difficulty,
    operations: Vec<Operation>,
    problems: Vec<Problem>,
    answers: Vec<AnswerRecord>,
    #[serde(default)]
    score: u32,
    #[serde(default)]
    accuracy: f64,
    #[serde(default)]
    average_time_seconds: f64,
}

impl From<Session> for SessionRecord {
    fn from(s: Session) -> Self {
        Self {
            id: s.id,
            start_time: s.start_time,
            end_time: s.end_time,
            difficulty: s.difficulty,
            operations: s.operations,
            problems: s.problems,
            answers: s.answers,
            score: s.score,
            accuracy: s.accuracy,
            average_time_seconds: s.average_time_seconds,
        }
    }
}

impl TryFrom<SessionRecord> for Session {
    type Error = SessionError;

    // Derived fields are recomputed; the stored copies are informational only.
    fn try_from(r: SessionRecord) -> Result<Self, Self::Error> {
        if r.end_time.is_some() && r.answers.len() != r.problems.len() {
            return Err(SessionError::AnswerCountMismatch {
                problems: r.problems.len(),
                answers: r.answers.len(),
            });
        }
        Session::build(
            r.id,
            r.start_time,
            r.end_time,
            r.difficulty,
            r.operations,
            r.problems,
            r.answers,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn problem(n: u32) -> Problem {
        Problem::new(
            ProblemId::new(format!("q_{n}")),
            Operation::Addition,
            Difficulty::Beginner,
            n,
            1,
            fixed_now(),
        )
        .unwrap()
    }

    fn session_with(correct: u32, total: u32, millis: u64) -> Result<Session, SessionError> {
        let problems: Vec<Problem> = (1..=total).map(problem).collect();
        let answers = problems
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let idx = u32::try_from(i).unwrap();
                let value = if idx < correct {
                    i64::from(p.correct_answer())
                } else {
                    -1
                };
                AnswerRecord::new(p, value, millis, fixed_now())
            })
            .collect();
        Session::complete(
            SessionId::new(uuid::Uuid::nil()),
            fixed_now(),
            fixed_now() + Duration::minutes(3),
            Difficulty::Beginner,
            vec![Operation::Addition],
            problems,
            answers,
        )
    }

    #[test]
    fn derives_accuracy_time_and_score() {
        let s = session_with(8, 10, 5_000).unwrap();
        assert_eq!(s.correct_count(), 8);
        assert!((s.accuracy() - 80.0).abs() < f64::EPSILON);
        assert!((s.average_time_seconds() - 5.0).abs() < f64::EPSILON);
        // 0.7 * 80 + 0.3 * (100 - 10) = 56 + 27
        assert_eq!(s.score(), 83);
        assert_eq!(s.duration(), Some(Duration::minutes(3)));
    }

    #[test]
    fn slow_answers_lose_the_speed_bonus() {
        let s = session_with(10, 10, 90_000).unwrap();
        assert_eq!(s.score(), 70);
    }

    #[test]
    fn complete_requires_one_answer_per_problem() {
        let mut s = session_with(1, 2, 1_000).unwrap();
        let problems = s.problems.clone();
        s.answers.pop();
        let err = Session::complete(
            s.id,
            s.start_time,
            fixed_now(),
            s.difficulty,
            s.operations.clone(),
            problems,
            s.answers.clone(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SessionError::AnswerCountMismatch {
                problems: 2,
                answers: 1
            }
        );
    }

    #[test]
    fn rejects_inverted_time_range_and_missing_operations() {
        let p = problem(1);
        let a = AnswerRecord::new(&p, 2, 1, fixed_now());
        let err = Session::complete(
            SessionId::new(uuid::Uuid::nil()),
            fixed_now(),
            fixed_now() - Duration::seconds(1),
            Difficulty::Beginner,
            vec![Operation::Addition],
            vec![p.clone()],
            vec![a.clone()],
        )
        .unwrap_err();
        assert_eq!(err, SessionError::InvalidTimeRange);

        let err = Session::complete(
            SessionId::new(uuid::Uuid::nil()),
            fixed_now(),
            fixed_now(),
            Difficulty::Beginner,
            Vec::new(),
            vec![p],
            vec![a],
        )
        .unwrap_err();
        assert_eq!(err, SessionError::NoOperations);
    }

    #[test]
    fn persisted_session_without_end_time_loads() {
        let s = session_with(3, 4, 2_000).unwrap();
        let mut value = serde_json::to_value(&s).unwrap();
        value.as_object_mut().unwrap().remove("endTime");
        value["answers"].as_array_mut().unwrap().pop();
        let loaded: Session = serde_json::from_value(value).unwrap();
        assert_eq!(loaded.end_time(), None);
        assert_eq!(loaded.duration(), None);
        assert_eq!(loaded.answers().len(), 3);
    }

    #[test]
    fn empty_session_has_zero_accuracy() {
        let s = Session::complete(
            SessionId::new(uuid::Uuid::nil()),
            fixed_now(),
            fixed_now(),
            Difficulty::Basic,
            vec![Operation::Division],
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        assert!(s.accuracy().abs() < f64::EPSILON);
        assert_eq!(s.primary_operation(), Operation::Division);
    }
}
