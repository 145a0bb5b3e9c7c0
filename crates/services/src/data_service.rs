use chrono::{DateTime, Utc};
use drill_core::Clock;
use drill_core::assessment::Assessment;
use drill_core::model::{LearnerId, ProgressRecord, Session, UserSettings};
use serde::{Deserialize, Serialize};
use storage::repository::Storage;
use tracing::info;

use crate::error::DataError;

/// Everything stored for one learner, as written by [`DataService::export`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExport {
    pub progress: Option<ProgressRecord>,
    pub settings: Option<UserSettings>,
    pub sessions: Vec<Session>,
    pub assessments: Vec<Assessment>,
    pub export_date: DateTime<Utc>,
}

/// Import document; sections that are absent or `null` are left alone.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DataImport {
    progress: Option<ProgressRecord>,
    settings: Option<UserSettings>,
    sessions: Option<Vec<Session>>,
    assessments: Option<Vec<Assessment>>,
}

/// Which sections an import replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub progress: bool,
    pub settings: bool,
    pub sessions: Option<usize>,
    pub assessments: Option<usize>,
}

#[derive(Clone)]
pub struct DataService {
    clock: Clock,
    storage: Storage,
}

impl DataService {
    #[must_use]
    pub fn new(clock: Clock, storage: Storage) -> Self {
        Self { clock, storage }
    }

    /// Gather every stored section for `learner`.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Storage` on storage failures.
    pub async fn snapshot(&self, learner: LearnerId) -> Result<DataExport, DataError> {
        Ok(DataExport {
            progress: self.storage.progress.load_progress(learner).await?,
            settings: self.storage.settings.load_settings(learner).await?,
            sessions: self.storage.sessions.list_sessions(learner).await?,
            assessments: self.storage.assessments.list_assessments(learner).await?,
            export_date: self.clock.now(),
        })
    }

    /// Pretty-printed JSON backup of everything stored for `learner`.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Storage` on storage failures or `DataError::Export`
    /// if serialization fails.
    pub async fn export(&self, learner: LearnerId) -> Result<String, DataError> {
        let snapshot = self.snapshot(learner).await?;
        serde_json::to_string_pretty(&snapshot).map_err(DataError::Export)
    }

    /// Restore a backup produced by [`export`](Self::export).
    ///
    /// Each section present in `json` replaces the stored one. The document
    /// is fully parsed and validated before anything is written. An imported
    /// progress record takes the version after the stored one so later
    /// optimistic saves keep working.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Import` if `json` is malformed or fails
    /// validation, or `DataError::Storage` on storage failures.
    pub async fn import(
        &self,
        learner: LearnerId,
        json: &str,
    ) -> Result<ImportSummary, DataError> {
        let data: DataImport = serde_json::from_str(json).map_err(DataError::Import)?;
        let mut summary = ImportSummary::default();

        if let Some(mut progress) = data.progress {
            let current = self
                .storage
                .progress
                .load_progress(learner)
                .await?
                .map_or(0, |stored| stored.version);
            progress.version = current.saturating_add(1);
            self.storage
                .progress
                .save_progress(learner, &progress, current)
                .await?;
            summary.progress = true;
        }
        if let Some(settings) = data.settings {
            self.storage
                .settings
                .save_settings(learner, &settings)
                .await?;
            summary.settings = true;
        }
        if let Some(sessions) = data.sessions {
            self.storage
                .sessions
                .replace_sessions(learner, &sessions)
                .await?;
            summary.sessions = Some(sessions.len());
        }
        if let Some(assessments) = data.assessments {
            self.storage
                .assessments
                .replace_assessments(learner, &assessments)
                .await?;
            summary.assessments = Some(assessments.len());
        }

        info!(
            %learner,
            progress = summary.progress,
            settings = summary.settings,
            sessions = ?summary.sessions,
            assessments = ?summary.assessments,
            "data imported"
        );
        Ok(summary)
    }

    /// Remove every stored section for `learner`.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Storage` on storage failures.
    pub async fn clear(&self, learner: LearnerId) -> Result<(), DataError> {
        self.storage.progress.delete_progress(learner).await?;
        self.storage.settings.clear_settings(learner).await?;
        self.storage.sessions.clear_sessions(learner).await?;
        self.storage.assessments.clear_assessments(learner).await?;
        info!(%learner, "all learner data cleared");
        Ok(())
    }
}
