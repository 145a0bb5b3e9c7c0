use std::sync::Arc;

use drill_core::model::{LearnerId, UserSettings, UserSettingsDraft};
use storage::repository::SettingsRepository;

use crate::error::SettingsServiceError;

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn load(&self, learner: LearnerId) -> Result<UserSettings, SettingsServiceError> {
        let settings = self.repo.load_settings(learner).await?;
        Ok(settings.unwrap_or_default())
    }

    /// Validate and persist new settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if validation fails or persistence fails.
    pub async fn save(
        &self,
        learner: LearnerId,
        draft: UserSettingsDraft,
    ) -> Result<UserSettings, SettingsServiceError> {
        let settings = draft.validate()?;
        self.repo.save_settings(learner, &settings).await?;
        Ok(settings)
    }
}
