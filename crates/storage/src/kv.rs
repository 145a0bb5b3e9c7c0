//! JSON repositories over a [`KeyValueStore`].
//!
//! Each learner owns four keys, `math_learn/<learner>/{progress,settings,
//! sessions,assessments}`, each holding one JSON document. Anything that is
//! absent or fails to decode reads as "no data".

use async_trait::async_trait;
use drill_core::assessment::Assessment;
use drill_core::model::{LearnerId, ProgressRecord, Session, UserSettings};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::repository::{
    ASSESSMENT_HISTORY_CAP, AssessmentRepository, KeyValueStore, ProgressRepository,
    SESSION_HISTORY_CAP, SessionHistoryRepository, SettingsRepository, StorageError,
};

pub const KEY_PREFIX: &str = "math_learn";

/// Logical documents stored per learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Progress,
    Settings,
    Sessions,
    Assessments,
}

impl Slot {
    pub const ALL: [Slot; 4] = [
        Slot::Progress,
        Slot::Settings,
        Slot::Sessions,
        Slot::Assessments,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Slot::Progress => "progress",
            Slot::Settings => "settings",
            Slot::Sessions => "sessions",
            Slot::Assessments => "assessments",
        }
    }

    #[must_use]
    pub fn key(self, learner: LearnerId) -> String {
        format!("{KEY_PREFIX}/{learner}/{}", self.name())
    }
}

#[derive(Clone)]
pub struct KvRepository<S> {
    store: S,
}

impl<S: KeyValueStore> KvRepository<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn read<T>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        T: DeserializeOwned + Send,
    {
        let raw = self.store.get(key).await?;
        Ok(raw.and_then(|raw| decode(key, &raw)))
    }

    async fn write<T>(&self, key: &str, value: &T) -> Result<(), StorageError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let json = encode(value)?;
        self.store.set(key, &json).await
    }

    async fn prepend<T>(&self, key: &str, item: &T, cap: usize) -> Result<(), StorageError>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        let mut items: Vec<T> = self.read(key).await?.unwrap_or_default();
        items.insert(0, item.clone());
        items.truncate(cap);
        self.write(key, &items).await
    }

    async fn overwrite<T>(&self, key: &str, items: &[T], cap: usize) -> Result<(), StorageError>
    where
        T: Serialize + Sync,
    {
        let kept = &items[..items.len().min(cap)];
        self.write(key, kept).await
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "ignoring unreadable stored document");
            None
        }
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|err| StorageError::Serialization(err.to_string()))
}

#[async_trait]
impl<S: KeyValueStore> ProgressRepository for KvRepository<S> {
    async fn load_progress(
        &self,
        learner: LearnerId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        self.read(&Slot::Progress.key(learner)).await
    }

    async fn save_progress(
        &self,
        learner: LearnerId,
        record: &ProgressRecord,
        expected_version: u64,
    ) -> Result<(), StorageError> {
        let key = Slot::Progress.key(learner);
        let current_raw = self.store.get(&key).await?;
        let stored_version = current_raw
            .as_deref()
            .and_then(|raw| decode::<ProgressRecord>(&key, raw))
            .map_or(0, |stored| stored.version);

        if stored_version != expected_version {
            warn!(
                %learner,
                stored_version,
                expected_version,
                "progress version mismatch"
            );
            return Err(StorageError::Conflict);
        }

        let json = encode(record)?;
        if !self
            .store
            .compare_and_swap(&key, current_raw.as_deref(), &json)
            .await?
        {
            warn!(%learner, expected_version, "progress changed during save");
            return Err(StorageError::Conflict);
        }
        debug!(%learner, version = record.version, "progress saved");
        Ok(())
    }

    async fn delete_progress(&self, learner: LearnerId) -> Result<(), StorageError> {
        self.store.remove(&Slot::Progress.key(learner)).await
    }
}

#[async_trait]
impl<S: KeyValueStore> SessionHistoryRepository for KvRepository<S> {
    async fn append_session(
        &self,
        learner: LearnerId,
        session: &Session,
    ) -> Result<(), StorageError> {
        let key = Slot::Sessions.key(learner);
        let mut history: Vec<Session> = self.read(&key).await?.unwrap_or_default();
        if history.iter().any(|stored| stored.id() == session.id()) {
            debug!(%learner, session = %session.id(), "session already in history");
            return Ok(());
        }
        history.insert(0, session.clone());
        history.truncate(SESSION_HISTORY_CAP);
        self.write(&key, &history).await
    }

    async fn list_sessions(&self, learner: LearnerId) -> Result<Vec<Session>, StorageError> {
        Ok(self
            .read(&Slot::Sessions.key(learner))
            .await?
            .unwrap_or_default())
    }

    async fn clear_sessions(&self, learner: LearnerId) -> Result<(), StorageError> {
        self.store.remove(&Slot::Sessions.key(learner)).await
    }

    async fn replace_sessions(
        &self,
        learner: LearnerId,
        sessions: &[Session],
    ) -> Result<(), StorageError> {
        self.overwrite(&Slot::Sessions.key(learner), sessions, SESSION_HISTORY_CAP)
            .await
    }
}

#[async_trait]
impl<S: KeyValueStore> SettingsRepository for KvRepository<S> {
    async fn load_settings(
        &self,
        learner: LearnerId,
    ) -> Result<Option<UserSettings>, StorageError> {
        self.read(&Slot::Settings.key(learner)).await
    }

    async fn save_settings(
        &self,
        learner: LearnerId,
        settings: &UserSettings,
    ) -> Result<(), StorageError> {
        self.write(&Slot::Settings.key(learner), settings).await
    }

    async fn clear_settings(&self, learner: LearnerId) -> Result<(), StorageError> {
        self.store.remove(&Slot::Settings.key(learner)).await
    }
}

#[async_trait]
impl<S: KeyValueStore> AssessmentRepository for KvRepository<S> {
    async fn append_assessment(
        &self,
        learner: LearnerId,
        assessment: &Assessment,
    ) -> Result<(), StorageError> {
        self.prepend(
            &Slot::Assessments.key(learner),
            assessment,
            ASSESSMENT_HISTORY_CAP,
        )
        .await
    }

    async fn list_assessments(&self, learner: LearnerId) -> Result<Vec<Assessment>, StorageError> {
        Ok(self
            .read(&Slot::Assessments.key(learner))
            .await?
            .unwrap_or_default())
    }

    async fn clear_assessments(&self, learner: LearnerId) -> Result<(), StorageError> {
        self.store.remove(&Slot::Assessments.key(learner)).await
    }

    async fn replace_assessments(
        &self,
        learner: LearnerId,
        assessments: &[Assessment],
    ) -> Result<(), StorageError> {
        self.overwrite(
            &Slot::Assessments.key(learner),
            assessments,
            ASSESSMENT_HISTORY_CAP,
        )
        .await
    }
}
