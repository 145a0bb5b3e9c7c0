use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::operation::{Difficulty, Operation};
use crate::model::session::Session;

/// Lowest possible strength score.
pub const MIN_STRENGTH: f64 = 0.0;
/// Highest possible strength score.
pub const MAX_STRENGTH: f64 = 100.0;

/// Per-learner proficiency record, rewritten after every completed session.
///
/// Created lazily on the first completion. `version` increases with each save
/// and is compared on write to detect concurrent completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default)]
    pub version: u64,
    pub total_sessions: u32,
    pub total_problems: u32,
    pub total_correct: u32,
    pub overall_accuracy: f64,
    pub strength_by_operation: BTreeMap<Operation, f64>,
    pub strength_by_difficulty: BTreeMap<Difficulty, f64>,
    #[serde(default)]
    pub avg_time_by_operation: BTreeMap<Operation, f64>,
    #[serde(default)]
    pub recent_sessions: Vec<Session>,
    pub recommended_difficulty: Difficulty,
    pub recommended_operations: Vec<Operation>,
    pub last_active_date: DateTime<Utc>,
}

impl ProgressRecord {
    /// First-run record: every strength at zero, Beginner, focus on addition.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            version: 0,
            total_sessions: 0,
            total_problems: 0,
            total_correct: 0,
            overall_accuracy: 0.0,
            strength_by_operation: Operation::ALL.iter().map(|op| (*op, 0.0)).collect(),
            strength_by_difficulty: Difficulty::ALL.iter().map(|d| (*d, 0.0)).collect(),
            avg_time_by_operation: BTreeMap::new(),
            recent_sessions: Vec::new(),
            recommended_difficulty: Difficulty::Beginner,
            recommended_operations: vec![Operation::Addition],
            last_active_date: now,
        }
    }

    /// Strength for an operation, clamped into `[0, 100]`.
    #[must_use]
    pub fn operation_strength(&self, operation: Operation) -> f64 {
        clamp_strength(
            self.strength_by_operation
                .get(&operation)
                .copied()
                .unwrap_or(MIN_STRENGTH),
        )
    }

    /// Strength for a difficulty tier, clamped into `[0, 100]`.
    #[must_use]
    pub fn difficulty_strength(&self, difficulty: Difficulty) -> f64 {
        clamp_strength(
            self.strength_by_difficulty
                .get(&difficulty)
                .copied()
                .unwrap_or(MIN_STRENGTH),
        )
    }

    /// Smoothed seconds per answer, or `None` before the first sample.
    #[must_use]
    pub fn average_time(&self, operation: Operation) -> Option<f64> {
        self.avg_time_by_operation.get(&operation).copied()
    }
}

/// Clamp into `[MIN_STRENGTH, MAX_STRENGTH]`; NaN maps to the minimum.
#[must_use]
pub fn clamp_strength(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_STRENGTH;
    }
    value.clamp(MIN_STRENGTH, MAX_STRENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn new_record_starts_at_zero() {
        let record = ProgressRecord::new(fixed_now());
        assert_eq!(record.strength_by_operation.len(), 4);
        assert_eq!(record.strength_by_difficulty.len(), 5);
        assert!(record.operation_strength(Operation::Division).abs() < f64::EPSILON);
        assert_eq!(record.average_time(Operation::Addition), None);
        assert_eq!(record.recommended_difficulty, Difficulty::Beginner);
        assert_eq!(record.recommended_operations, vec![Operation::Addition]);
    }

    #[test]
    fn out_of_range_stored_values_are_clamped_on_read() {
        let mut record = ProgressRecord::new(fixed_now());
        record.strength_by_operation.insert(Operation::Addition, 140.0);
        record.strength_by_difficulty.insert(Difficulty::Basic, -3.0);
        assert!((record.operation_strength(Operation::Addition) - 100.0).abs() < f64::EPSILON);
        assert!(record.difficulty_strength(Difficulty::Basic).abs() < f64::EPSILON);
        assert!(clamp_strength(f64::NAN).abs() < f64::EPSILON);
    }

    #[test]
    fn json_uses_camel_case_and_level_keys() {
        let record = ProgressRecord::new(fixed_now());
        let value = serde_json::to_value(&record).unwrap();
        assert!(value["strengthByOperation"]["addition"].is_number());
        assert!(value["strengthByDifficulty"]["3"].is_number());
        let back: ProgressRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
