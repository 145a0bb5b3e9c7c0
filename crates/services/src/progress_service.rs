use std::sync::Arc;

use drill_core::Clock;
use drill_core::assessment::Assessment;
use drill_core::model::{Difficulty, LearnerId, Operation, ProgressRecord, Session};
use drill_core::progress::ProgressTracker;
use drill_core::report;
use storage::repository::{AssessmentRepository, ProgressRepository, SessionHistoryRepository};
use tracing::{debug, info};

use crate::error::ProgressError;

/// Outcome of recording a finished session.
#[derive(Debug, Clone)]
pub struct RecordedSession {
    pub progress: ProgressRecord,
    pub assessment: Assessment,
}

/// Folds finished sessions into stored progress, history, and assessments.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    tracker: ProgressTracker,
    progress: Arc<dyn ProgressRepository>,
    sessions: Arc<dyn SessionHistoryRepository>,
    assessments: Arc<dyn AssessmentRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Arc<dyn ProgressRepository>,
        sessions: Arc<dyn SessionHistoryRepository>,
        assessments: Arc<dyn AssessmentRepository>,
    ) -> Self {
        Self {
            clock,
            tracker: ProgressTracker::default(),
            progress,
            sessions,
            assessments,
        }
    }

    #[must_use]
    pub fn with_tracker(mut self, tracker: ProgressTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Apply a finished session to the learner's progress, then append the
    /// same session to history and store a fresh assessment.
    ///
    /// The progress write is a compare-and-swap against the version that was
    /// loaded; history and assessments are only touched once it succeeds.
    /// Recording is keyed by session id: a session already counted in
    /// progress is not applied again, and one already in history is not
    /// appended again, so retrying after a failed write converges. A full
    /// replay of a recorded session stores no new assessment.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Unfinished` for a session without an end time,
    /// `ProgressError::Storage` wrapping `StorageError::Conflict` when another
    /// completion won the race, or other storage errors.
    pub async fn record_session(
        &self,
        learner: LearnerId,
        session: &Session,
    ) -> Result<RecordedSession, ProgressError> {
        if session.end_time().is_none() {
            return Err(ProgressError::Unfinished);
        }
        let now = self.clock.now();

        let loaded = self.progress.load_progress(learner).await?;
        let expected_version = loaded.as_ref().map_or(0, |record| record.version);
        let mut record = loaded.unwrap_or_else(|| ProgressRecord::new(now));

        let applied = record
            .recent_sessions
            .iter()
            .any(|recent| recent.id() == session.id());
        if applied {
            debug!(%learner, session = %session.id(), "session already counted in progress");
        } else {
            self.tracker.apply_session(&mut record, session, now);
            self.progress
                .save_progress(learner, &record, expected_version)
                .await?;
        }

        let listed = self
            .sessions
            .list_sessions(learner)
            .await?
            .iter()
            .any(|stored| stored.id() == session.id());
        if !listed {
            self.sessions.append_session(learner, session).await?;
        }

        let history = self.sessions.list_sessions(learner).await?;
        let assessment = Assessment::evaluate(&record, report::trend(&history), now);
        if applied && listed {
            info!(%learner, session = %session.id(), "session was already recorded");
        } else {
            self.assessments
                .append_assessment(learner, &assessment)
                .await?;
            info!(
                %learner,
                session = %session.id(),
                total_sessions = record.total_sessions,
                score = session.score(),
                "session recorded"
            );
        }

        Ok(RecordedSession {
            progress: record,
            assessment,
        })
    }

    /// Stored progress, if the learner has completed a session.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on storage failures.
    pub async fn progress(
        &self,
        learner: LearnerId,
    ) -> Result<Option<ProgressRecord>, ProgressError> {
        Ok(self.progress.load_progress(learner).await?)
    }

    /// Recommended tier and focus operations; first-run defaults when no
    /// progress exists.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on storage failures.
    pub async fn recommendation(
        &self,
        learner: LearnerId,
    ) -> Result<(Difficulty, Vec<Operation>), ProgressError> {
        let record = self
            .progress
            .load_progress(learner)
            .await?
            .unwrap_or_else(|| ProgressRecord::new(self.clock.now()));
        Ok((record.recommended_difficulty, record.recommended_operations))
    }

    /// Forget progress, history, and assessments. Settings are kept.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on storage failures.
    pub async fn reset(&self, learner: LearnerId) -> Result<(), ProgressError> {
        self.progress.delete_progress(learner).await?;
        self.sessions.clear_sessions(learner).await?;
        self.assessments.clear_assessments(learner).await?;
        info!(%learner, "progress reset");
        Ok(())
    }
}
