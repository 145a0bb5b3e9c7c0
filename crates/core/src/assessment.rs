use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, Operation, ProgressRecord};
use crate::recommend::{DEMOTE_BELOW, PROMOTE_AT};
use crate::report::Trend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Practice,
    Review,
    Challenge,
}

/// One actionable suggestion; `priority` runs from 1 (low) to 5 (urgent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub operation: Operation,
    pub difficulty: Difficulty,
    pub reason: String,
    pub priority: u8,
}

/// Snapshot evaluation of a learner, stored in the assessment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub date: DateTime<Utc>,
    pub overall_score: u32,
    pub strengths: Vec<Operation>,
    pub weaknesses: Vec<Operation>,
    pub recommendations: Vec<Recommendation>,
    pub progress_trend: Trend,
}

impl Assessment {
    /// Evaluate the record: strong operations are at the promotion threshold
    /// or above, weak ones below the demotion threshold.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn evaluate(progress: &ProgressRecord, trend: Trend, date: DateTime<Utc>) -> Self {
        let tier = progress.recommended_difficulty;
        let mut strengths = Vec::new();
        let mut weaknesses = Vec::new();
        let mut recommendations = Vec::new();

        for op in Operation::ALL {
            let strength = progress.operation_strength(op);
            if strength >= PROMOTE_AT {
                strengths.push(op);
            } else if strength < DEMOTE_BELOW {
                weaknesses.push(op);
                recommendations.push(Recommendation {
                    kind: RecommendationKind::Practice,
                    operation: op,
                    difficulty: tier,
                    reason: format!("{op} strength is {strength:.0}, below {DEMOTE_BELOW:.0}"),
                    priority: 5,
                });
            } else {
                recommendations.push(Recommendation {
                    kind: RecommendationKind::Review,
                    operation: op,
                    difficulty: tier,
                    reason: format!("{op} is close to mastery ({strength:.0})"),
                    priority: 3,
                });
            }
        }

        if weaknesses.is_empty() {
            let next = tier.next().unwrap_or(tier);
            let focus = progress
                .recommended_operations
                .first()
                .copied()
                .unwrap_or(Operation::Addition);
            recommendations.push(Recommendation {
                kind: RecommendationKind::Challenge,
                operation: focus,
                difficulty: next,
                reason: "no weak operations left at this level".to_string(),
                priority: 2,
            });
        }

        recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));

        Self {
            date,
            overall_score: progress.overall_accuracy.round().clamp(0.0, 100.0) as u32,
            strengths,
            weaknesses,
            recommendations,
            progress_trend: trend,
        }
    }
}
