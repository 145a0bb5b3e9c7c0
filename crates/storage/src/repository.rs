use async_trait::async_trait;
use drill_core::assessment::Assessment;
use drill_core::model::{LearnerId, ProgressRecord, Session, UserSettings};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::kv::KvRepository;

/// Most-recent-first session history is cut to this many entries.
pub const SESSION_HISTORY_CAP: usize = 50;
/// Stored assessments are cut to this many entries.
pub const ASSESSMENT_HISTORY_CAP: usize = 20;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── KEY-VALUE SUBSTRATE ───────────────────────────────────────────────────────
//

/// Opaque string store the JSON repositories are layered on.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the raw value under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Write `value` only if the current value equals `expected`, where
    /// `None` means the key must be absent. Returns whether the write happened.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or written.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, StorageError>;
}

//
// ─── REPOSITORIES ──────────────────────────────────────────────────────────────
//

/// Repository contract for the per-learner progress record.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the progress record, or `None` if missing or unreadable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load_progress(&self, learner: LearnerId)
    -> Result<Option<ProgressRecord>, StorageError>;

    /// Store `record` if the stored version still equals `expected_version`.
    ///
    /// A learner with no stored record is at version 0.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if another write got there first, or
    /// other storage errors.
    async fn save_progress(
        &self,
        learner: LearnerId,
        record: &ProgressRecord,
        expected_version: u64,
    ) -> Result<(), StorageError>;

    /// Delete the progress record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn delete_progress(&self, learner: LearnerId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SessionHistoryRepository: Send + Sync {
    /// Prepend a completed session, dropping the oldest beyond
    /// [`SESSION_HISTORY_CAP`]. A session whose id is already stored is left
    /// where it is.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be stored.
    async fn append_session(&self, learner: LearnerId, session: &Session)
    -> Result<(), StorageError>;

    /// Sessions most recent first; empty if missing or unreadable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_sessions(&self, learner: LearnerId) -> Result<Vec<Session>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear_sessions(&self, learner: LearnerId) -> Result<(), StorageError>;

    /// Overwrite the history, keeping at most [`SESSION_HISTORY_CAP`] entries.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be stored.
    async fn replace_sessions(
        &self,
        learner: LearnerId,
        sessions: &[Session],
    ) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load_settings(&self, learner: LearnerId)
    -> Result<Option<UserSettings>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be stored.
    async fn save_settings(
        &self,
        learner: LearnerId,
        settings: &UserSettings,
    ) -> Result<(), StorageError>;

    /// Forget stored settings so the next load falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear_settings(&self, learner: LearnerId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// Prepend an assessment, dropping the oldest beyond
    /// [`ASSESSMENT_HISTORY_CAP`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be stored.
    async fn append_assessment(
        &self,
        learner: LearnerId,
        assessment: &Assessment,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_assessments(&self, learner: LearnerId)
    -> Result<Vec<Assessment>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear_assessments(&self, learner: LearnerId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be stored.
    async fn replace_assessments(
        &self,
        learner: LearnerId,
        assessments: &[Assessment],
    ) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY STORE ───────────────────────────────────────────────────────────
//

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        guard.insert(key.to_owned(), value.to_owned());
        Ok(true)
    }
}

/// Aggregates the learner repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub sessions: Arc<dyn SessionHistoryRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub assessments: Arc<dyn AssessmentRepository>,
}

impl Storage {
    /// Wire every repository to one key-value backend.
    #[must_use]
    pub fn over<S>(store: S) -> Self
    where
        S: KeyValueStore + Clone + 'static,
    {
        let repo = KvRepository::new(store);
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let sessions: Arc<dyn SessionHistoryRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(repo.clone());
        let assessments: Arc<dyn AssessmentRepository> = Arc::new(repo);
        Self {
            progress,
            sessions,
            settings,
            assessments,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::over(InMemoryStore::new())
    }
}
