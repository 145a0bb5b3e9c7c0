use chrono::{DateTime, Utc};
use drill_core::Clock;
use drill_core::generator::ProblemGenerator;
use drill_core::model::{AnswerRecord, Difficulty, Operation, Problem, Session, SessionId};
use std::fmt;
use tracing::debug;

use crate::error::PracticeError;

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Aggregated view of an in-flight practice session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeProgress {
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub remaining: usize,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Problems being worked through one at a time.
///
/// Answer time is measured from when the current problem was first shown,
/// which is the session start for the first problem and the previous
/// submission afterwards.
pub struct PracticeSession {
    id: SessionId,
    difficulty: Difficulty,
    operations: Vec<Operation>,
    problems: Vec<Problem>,
    answers: Vec<AnswerRecord>,
    started_at: DateTime<Utc>,
    shown_at: DateTime<Utc>,
    clock: Clock,
}

impl PracticeSession {
    fn new(
        id: SessionId,
        difficulty: Difficulty,
        operations: Vec<Operation>,
        problems: Vec<Problem>,
        clock: Clock,
    ) -> Self {
        let started_at = clock.now();
        Self {
            id,
            difficulty,
            operations,
            answers: Vec::with_capacity(problems.len()),
            problems,
            started_at,
            shown_at: started_at,
            clock,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
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
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The problem awaiting an answer, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Problem> {
        self.problems.get(self.answers.len())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answers.len() >= self.problems.len()
    }

    #[must_use]
    pub fn progress(&self) -> PracticeProgress {
        let answered = self.answers.len();
        PracticeProgress {
            total: self.problems.len(),
            answered,
            correct: self.answers.iter().filter(|a| a.is_correct).count(),
            remaining: self.problems.len().saturating_sub(answered),
        }
    }

    /// Answer the current problem, timed by the session clock.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Completed` if every problem is answered.
    pub fn submit(&mut self, value: i64) -> Result<&AnswerRecord, PracticeError> {
        let now = self.clock.now();
        self.submit_at(value, now)
    }

    /// Answer the current problem as of `at`.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Completed` if every problem is answered.
    pub fn submit_at(
        &mut self,
        value: i64,
        at: DateTime<Utc>,
    ) -> Result<&AnswerRecord, PracticeError> {
        let Some(problem) = self.current() else {
            return Err(PracticeError::Completed);
        };

        let elapsed = u64::try_from((at - self.shown_at).num_milliseconds()).unwrap_or(0);
        let answer = AnswerRecord::new(problem, value, elapsed, at);
        debug!(
            problem = %answer.problem_id,
            correct = answer.is_correct,
            elapsed_ms = elapsed,
            "answer submitted"
        );

        self.answers.push(answer);
        self.shown_at = at;
        self.answers.last().ok_or(PracticeError::Completed)
    }

    /// Close the session now.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Incomplete` unless every problem is answered.
    pub fn finish(self) -> Result<Session, PracticeError> {
        let now = self.clock.now();
        self.finish_at(now)
    }

    /// Close the session as of `ended_at`.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Incomplete` unless every problem is answered,
    /// or `PracticeError::Session` if `ended_at` precedes the start.
    pub fn finish_at(self, ended_at: DateTime<Utc>) -> Result<Session, PracticeError> {
        if !self.is_complete() {
            return Err(PracticeError::Incomplete {
                answered: self.answers.len(),
                total: self.problems.len(),
            });
        }
        Ok(Session::complete(
            self.id,
            self.started_at,
            ended_at,
            self.difficulty,
            self.operations,
            self.problems,
            self.answers,
        )?)
    }
}

impl fmt::Debug for PracticeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticeSession")
            .field("id", &self.id)
            .field("difficulty", &self.difficulty)
            .field("problems_len", &self.problems.len())
            .field("answers_len", &self.answers.len())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Starts practice sessions from the problem generator.
pub struct PracticeService {
    generator: ProblemGenerator,
}

impl PracticeService {
    #[must_use]
    pub fn new(generator: ProblemGenerator) -> Self {
        Self { generator }
    }

    /// Service with a reproducible problem stream.
    #[must_use]
    pub fn seeded(seed: u64, clock: Clock) -> Self {
        Self::new(ProblemGenerator::seeded(seed, clock))
    }

    #[must_use]
    pub fn from_entropy(clock: Clock) -> Self {
        Self::new(ProblemGenerator::from_entropy(clock))
    }

    /// Generate `count` problems over `operations` and start timing.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Empty` for a zero count, or
    /// `PracticeError::Generator` if `operations` is empty.
    pub fn start(
        &mut self,
        difficulty: Difficulty,
        operations: &[Operation],
        count: usize,
    ) -> Result<PracticeSession, PracticeError> {
        if count == 0 {
            return Err(PracticeError::Empty);
        }
        let problems = self
            .generator
            .generate_mixed(difficulty, count, operations)?;
        let id = SessionId::generate(self.generator.rng_mut());
        Ok(PracticeSession::new(
            id,
            difficulty,
            operations.to_vec(),
            problems,
            self.generator.clock(),
        ))
    }
}

impl fmt::Debug for PracticeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticeService").finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
