use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::model::{ProgressRecord, Session, clamp_strength};
use crate::recommend::{recommend_difficulty, recommend_operations};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressSettingsError {
    #[error("smoothing factor must be in (0, 1], got {provided}")]
    InvalidSmoothing { provided: f64 },

    #[error("strength step must be in [0, 100], got {provided}")]
    InvalidStrengthStep { provided: f64 },

    #[error("recent session capacity must be > 0")]
    InvalidRecentCapacity,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Tunable parameters of the progress update.
///
/// The defaults reproduce the classic behavior: `+5` per correct answer,
/// `-2` per mistake, an equal-weight blend (factor 0.5) for the smoothed
/// signals, and the ten most recent sessions kept on the record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSettings {
    strength_gain: f64,
    strength_penalty: f64,
    smoothing: f64,
    recent_capacity: usize,
}

impl ProgressSettings {
    /// Validate a full set of parameters.
    ///
    /// # Errors
    ///
    /// - `InvalidStrengthStep` if gain or penalty fall outside `[0, 100]`
    /// - `InvalidSmoothing` if `smoothing` is not in `(0, 1]`
    /// - `InvalidRecentCapacity` if `recent_capacity` is zero
    pub fn new(
        strength_gain: f64,
        strength_penalty: f64,
        smoothing: f64,
        recent_capacity: usize,
    ) -> Result<Self, ProgressSettingsError> {
        for step in [strength_gain, strength_penalty] {
            if !(0.0..=100.0).contains(&step) {
                return Err(ProgressSettingsError::InvalidStrengthStep { provided: step });
            }
        }
        if !(smoothing > 0.0 && smoothing <= 1.0) {
            return Err(ProgressSettingsError::InvalidSmoothing {
                provided: smoothing,
            });
        }
        if recent_capacity == 0 {
            return Err(ProgressSettingsError::InvalidRecentCapacity);
        }

        Ok(Self {
            strength_gain,
            strength_penalty,
            smoothing,
            recent_capacity,
        })
    }

    #[must_use]
    pub fn strength_gain(&self) -> f64 {
        self.strength_gain
    }

    #[must_use]
    pub fn strength_penalty(&self) -> f64 {
        self.strength_penalty
    }

    #[must_use]
    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    #[must_use]
    pub fn recent_capacity(&self) -> usize {
        self.recent_capacity
    }
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            strength_gain: 5.0,
            strength_penalty: 2.0,
            smoothing: 0.5,
            recent_capacity: 10,
        }
    }
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Folds completed sessions into a learner's `ProgressRecord`.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    settings: ProgressSettings,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(settings: ProgressSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &ProgressSettings {
        &self.settings
    }

    /// Apply one completed session to the record.
    ///
    /// Updates cumulative counters, per-operation strength and time, the
    /// strength of the session's tier, both recommendations, the recent
    /// session buffer, and finally bumps `version`.
    #[allow(clippy::cast_precision_loss)]
    pub fn apply_session(&self, record: &mut ProgressRecord, session: &Session, now: DateTime<Utc>) {
        let problems = u32::try_from(session.problems().len()).unwrap_or(u32::MAX);
        let correct = u32::try_from(session.correct_count()).unwrap_or(u32::MAX);

        record.total_sessions = record.total_sessions.saturating_add(1);
        record.total_problems = record.total_problems.saturating_add(problems);
        record.total_correct = record.total_correct.saturating_add(correct);
        record.overall_accuracy = if record.total_problems == 0 {
            0.0
        } else {
            f64::from(record.total_correct) / f64::from(record.total_problems) * 100.0
        };

        for (problem, answer) in session.answered_problems() {
            let op = problem.operation();

            let strength = self.adjust_strength(record.operation_strength(op), answer.is_correct);
            record.strength_by_operation.insert(op, strength);

            let seconds = answer.elapsed_seconds();
            let average = self.smooth(record.average_time(op), seconds);
            record.avg_time_by_operation.insert(op, average);
        }

        let tier = session.difficulty();
        let blended = clamp_strength(
            self.smooth(Some(record.difficulty_strength(tier)), session.accuracy()),
        );
        record.strength_by_difficulty.insert(tier, blended);

        record.recommended_difficulty = recommend_difficulty(record);
        record.recommended_operations = recommend_operations(record);

        record.recent_sessions.insert(0, session.clone());
        record.recent_sessions.truncate(self.settings.recent_capacity);

        record.last_active_date = now;
        record.version = record.version.saturating_add(1);

        debug!(
            session = %session.id(),
            accuracy = session.accuracy(),
            tier_strength = blended,
            recommended = record.recommended_difficulty.level(),
            "applied session to progress"
        );
    }

    /// One answer's effect on a strength score, kept inside `[0, 100]`.
    #[must_use]
    pub fn adjust_strength(&self, current: f64, correct: bool) -> f64 {
        let current = clamp_strength(current);
        if correct {
            clamp_strength(current + self.settings.strength_gain)
        } else {
            clamp_strength(current - self.settings.strength_penalty)
        }
    }

    /// Exponential moving average; the first sample seeds the signal.
    #[must_use]
    pub fn smooth(&self, previous: Option<f64>, sample: f64) -> f64 {
        match previous {
            None => sample,
            Some(old) => old + self.settings.smoothing * (sample - old),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerRecord, Difficulty, Operation, Problem, ProblemId, SessionId};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn session(
        difficulty: Difficulty,
        specs: &[(Operation, bool, u64)],
    ) -> Session {
        let now = fixed_now();
        let mut problems = Vec::new();
        let mut answers = Vec::new();
        for (i, (op, correct, millis)) in specs.iter().enumerate() {
            let (a, b) = match op {
                Operation::Division => (6, 2),
                _ => (4, 2),
            };
            let p = Problem::new(ProblemId::new(format!("q_{i}")), *op, difficulty, a, b, now)
                .unwrap();
            let value = if *correct {
                i64::from(p.correct_answer())
            } else {
                i64::from(p.correct_answer()) + 1
            };
            answers.push(AnswerRecord::new(&p, value, *millis, now));
            problems.push(p);
        }
        let mut ops: Vec<Operation> = specs.iter().map(|s| s.0).collect();
        ops.dedup();
        Session::complete(
            SessionId::new(uuid::Uuid::nil()),
            now,
            now + Duration::minutes(1),
            difficulty,
            ops,
            problems,
            answers,
        )
        .unwrap()
    }

    #[test]
    fn correct_answer_adds_five_and_mistake_removes_two() {
        let tracker = ProgressTracker::default();
        assert!((tracker.adjust_strength(50.0, true) - 55.0).abs() < f64::EPSILON);
        assert!((tracker.adjust_strength(50.0, false) - 48.0).abs() < f64::EPSILON);
    }

    #[test]
    fn strength_stays_in_bounds_for_any_start() {
        let tracker = ProgressTracker::default();
        for start in [-50.0, 0.0, 1.0, 97.0, 100.0, 250.0] {
            let mut s: f64 = start;
            for i in 0..200 {
                s = tracker.adjust_strength(s, i % 3 != 0);
                assert!((0.0..=100.0).contains(&s));
            }
            let mut s: f64 = start;
            for _ in 0..200 {
                s = tracker.adjust_strength(s, false);
                assert!((0.0..=100.0).contains(&s));
            }
        }
    }

    #[test]
    fn smoothing_seeds_then_blends_equally_by_default() {
        let tracker = ProgressTracker::default();
        assert!((tracker.smooth(None, 4.0) - 4.0).abs() < f64::EPSILON);
        assert!((tracker.smooth(Some(4.0), 8.0) - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn custom_smoothing_factor_is_applied() {
        let tracker = ProgressTracker::new(ProgressSettings::new(5.0, 2.0, 0.25, 10).unwrap());
        assert!((tracker.smooth(Some(4.0), 8.0) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn settings_validation() {
        assert!(matches!(
            ProgressSettings::new(5.0, 2.0, 0.0, 10),
            Err(ProgressSettingsError::InvalidSmoothing { .. })
        ));
        assert!(matches!(
            ProgressSettings::new(5.0, 2.0, 1.5, 10),
            Err(ProgressSettingsError::InvalidSmoothing { .. })
        ));
        assert!(matches!(
            ProgressSettings::new(-1.0, 2.0, 0.5, 10),
            Err(ProgressSettingsError::InvalidStrengthStep { .. })
        ));
        assert!(matches!(
            ProgressSettings::new(5.0, 2.0, 0.5, 0),
            Err(ProgressSettingsError::InvalidRecentCapacity)
        ));
        assert!(ProgressSettings::new(5.0, 2.0, 1.0, 1).is_ok());
    }

    #[test]
    fn apply_session_updates_counters_and_strengths() {
        let tracker = ProgressTracker::default();
        let mut record = ProgressRecord::new(fixed_now());
        let s = session(
            Difficulty::Beginner,
            &[
                (Operation::Addition, true, 2_000),
                (Operation::Addition, true, 4_000),
                (Operation::Subtraction, false, 3_000),
                (Operation::Subtraction, true, 1_000),
            ],
        );

        tracker.apply_session(&mut record, &s, fixed_now());

        assert_eq!(record.total_sessions, 1);
        assert_eq!(record.total_problems, 4);
        assert_eq!(record.total_correct, 3);
        assert!((record.overall_accuracy - 75.0).abs() < 1e-9);
        assert!((record.operation_strength(Operation::Addition) - 10.0).abs() < 1e-9);
        // 0 - 2 floors at 0, then + 5
        assert!((record.operation_strength(Operation::Subtraction) - 5.0).abs() < 1e-9);
        // seeded with 2s, then (2 + 4) / 2
        assert_eq!(record.average_time(Operation::Addition), Some(3.0));
        assert_eq!(record.average_time(Operation::Subtraction), Some(2.0));
        assert_eq!(record.average_time(Operation::Division), None);
        // (0 + 75) / 2
        assert!((record.difficulty_strength(Difficulty::Beginner) - 37.5).abs() < 1e-9);
        assert_eq!(record.recommended_difficulty, Difficulty::Beginner);
        assert_eq!(
            record.recommended_operations,
            vec![Operation::Multiplication, Operation::Division]
        );
        assert_eq!(record.recent_sessions.len(), 1);
        assert_eq!(record.version, 1);
    }

    #[test]
    fn counters_are_cumulative_not_blended() {
        let tracker = ProgressTracker::default();
        let mut record = ProgressRecord::new(fixed_now());
        let all_right = session(Difficulty::Basic, &[(Operation::Addition, true, 1_000); 4]);
        let all_wrong = session(Difficulty::Basic, &[(Operation::Addition, false, 1_000); 2]);

        tracker.apply_session(&mut record, &all_right, fixed_now());
        tracker.apply_session(&mut record, &all_wrong, fixed_now());

        assert_eq!(record.total_problems, 6);
        assert_eq!(record.total_correct, 4);
        assert!((record.overall_accuracy - 400.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn mastering_a_tier_promotes_once_per_session() {
        let tracker = ProgressTracker::default();
        let mut record = ProgressRecord::new(fixed_now());
        record.recommended_difficulty = Difficulty::Basic;
        record.strength_by_difficulty.insert(Difficulty::Basic, 64.0);

        let perfect = session(Difficulty::Basic, &[(Operation::Multiplication, true, 1_000); 5]);
        tracker.apply_session(&mut record, &perfect, fixed_now());

        // (64 + 100) / 2 = 82
        assert!((record.difficulty_strength(Difficulty::Basic) - 82.0).abs() < 1e-9);
        assert_eq!(record.recommended_difficulty, Difficulty::Intermediate);
    }

    #[test]
    fn recent_sessions_are_capped_most_recent_first() {
        let tracker = ProgressTracker::default();
        let mut record = ProgressRecord::new(fixed_now());
        let mut last = None;
        for i in 0..12_u64 {
            let s = session(Difficulty::Beginner, &[(Operation::Addition, true, 1_000 + i)]);
            tracker.apply_session(&mut record, &s, fixed_now());
            last = Some(s);
        }
        assert_eq!(record.recent_sessions.len(), 10);
        assert_eq!(record.recent_sessions.first(), last.as_ref());
        assert_eq!(record.total_sessions, 12);
        assert_eq!(record.version, 12);
    }
}
