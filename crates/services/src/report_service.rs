use std::sync::Arc;

use chrono::{TimeZone, Utc};
use drill_core::Clock;
use drill_core::assessment::Assessment;
use drill_core::model::{LearnerId, Session};
use drill_core::report::LearningReport;
use storage::repository::{AssessmentRepository, SessionHistoryRepository};

use crate::error::ReportError;

#[derive(Clone)]
pub struct ReportService {
    clock: Clock,
    sessions: Arc<dyn SessionHistoryRepository>,
    assessments: Arc<dyn AssessmentRepository>,
}

impl ReportService {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn SessionHistoryRepository>,
        assessments: Arc<dyn AssessmentRepository>,
    ) -> Self {
        Self {
            clock,
            sessions,
            assessments,
        }
    }

    /// Report with streak days counted in UTC.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` on storage failures.
    pub async fn learning_report(&self, learner: LearnerId) -> Result<LearningReport, ReportError> {
        self.learning_report_in(learner, &Utc).await
    }

    /// Report with streak days counted in the learner's time zone.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` on storage failures.
    pub async fn learning_report_in<Tz: TimeZone>(
        &self,
        learner: LearnerId,
        tz: &Tz,
    ) -> Result<LearningReport, ReportError> {
        let history = self.sessions.list_sessions(learner).await?;
        Ok(LearningReport::from_history(&history, &self.clock.now_in(tz)))
    }

    /// Up to `limit` sessions, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` on storage failures.
    pub async fn recent_sessions(
        &self,
        learner: LearnerId,
        limit: usize,
    ) -> Result<Vec<Session>, ReportError> {
        let mut history = self.sessions.list_sessions(learner).await?;
        history.truncate(limit);
        Ok(history)
    }

    /// Stored assessments, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` on storage failures.
    pub async fn assessments(&self, learner: LearnerId) -> Result<Vec<Assessment>, ReportError> {
        Ok(self.assessments.list_assessments(learner).await?)
    }
}
