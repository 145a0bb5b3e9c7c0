//! Per-session breakdown shown on the results screen.

use std::collections::BTreeMap;

use crate::model::{Difficulty, Operation, Session};

/// Accuracy below which a hint suggests easier problems or more practice.
pub const STRUGGLING_ACCURACY: f64 = 70.0;
/// Average seconds per answer above which a speed hint is given.
pub const SLOW_ANSWER_SECONDS: f64 = 30.0;
/// Accuracy at which the next session can move up a tier.
pub const CHALLENGE_ACCURACY: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTally {
    pub total: u32,
    pub correct: u32,
}

impl OperationTally {
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total) * 100.0
    }
}

/// Letter grade derived from the session score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    C,
    B,
    BPlus,
    A,
    APlus,
}

impl Grade {
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Grade::APlus,
            80..=89 => Grade::A,
            70..=79 => Grade::BPlus,
            60..=69 => Grade::B,
            _ => Grade::C,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    LowerDifficulty,
    PracticeSpeed,
    Reinforce(Operation),
    TryHarder,
}

impl Feedback {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Feedback::LowerDifficulty => {
                "Try an easier level first and master the basics.".to_string()
            }
            Feedback::PracticeSpeed => "More practice will improve your speed.".to_string(),
            Feedback::Reinforce(op) => format!("{op} needs more practice."),
            Feedback::TryHarder => "Great work! Try a harder level next.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnalysis {
    pub by_operation: BTreeMap<Operation, OperationTally>,
    pub grade: Grade,
    pub feedback: Vec<Feedback>,
    pub suggested_difficulty: Difficulty,
}

impl SessionAnalysis {
    #[must_use]
    pub fn of(session: &Session) -> Self {
        let mut by_operation: BTreeMap<Operation, OperationTally> = BTreeMap::new();
        for (problem, answer) in session.answered_problems() {
            let tally = by_operation
                .entry(problem.operation())
                .or_insert(OperationTally { total: 0, correct: 0 });
            tally.total += 1;
            if answer.is_correct {
                tally.correct += 1;
            }
        }

        let mut feedback = Vec::new();
        if session.accuracy() < STRUGGLING_ACCURACY {
            feedback.push(Feedback::LowerDifficulty);
        }
        if session.average_time_seconds() > SLOW_ANSWER_SECONDS {
            feedback.push(Feedback::PracticeSpeed);
        }
        feedback.extend(
            by_operation
                .iter()
                .filter(|(_, tally)| tally.accuracy() < STRUGGLING_ACCURACY)
                .map(|(op, _)| Feedback::Reinforce(*op)),
        );
        if feedback.is_empty() {
            feedback.push(Feedback::TryHarder);
        }

        let suggested_difficulty = if session.accuracy() >= CHALLENGE_ACCURACY {
            session.difficulty().next().unwrap_or(session.difficulty())
        } else {
            session.difficulty()
        };

        Self {
            by_operation,
            grade: Grade::from_score(session.score()),
            feedback,
            suggested_difficulty,
        }
    }
}
