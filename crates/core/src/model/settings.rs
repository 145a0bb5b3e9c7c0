use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LEARNER_NAME: &str = "Learner";
pub const DEFAULT_PROBLEMS_PER_SESSION: u32 = 10;
pub const DEFAULT_TIME_LIMIT_SECONDS: u32 = 60;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("problems per session must be between 1 and 100, got {0}")]
    InvalidProblemsPerSession(u32),

    #[error("grade must be between 1 and 12, got {0}")]
    InvalidGrade(u8),

    #[error("time limit must be > 0 seconds")]
    InvalidTimeLimit,
}

//
// ─── THEME ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Colorful,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Learner preferences persisted alongside progress.
///
/// Only obtainable through [`UserSettingsDraft::validate`] or `Default`, so
/// every instance satisfies the range checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserSettingsDraft", into = "UserSettingsDraft")]
pub struct UserSettings {
    name: String,
    grade: u8,
    problems_per_session: u32,
    time_limit_seconds: u32,
    enable_sound: bool,
    enable_animation: bool,
    theme: Theme,
}

/// Unvalidated settings as typed by a user or read from storage.
///
/// Missing fields fall back to their defaults on validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettingsDraft {
    pub name: Option<String>,
    pub grade: Option<u8>,
    #[serde(alias = "questionsPerSession")]
    pub problems_per_session: Option<u32>,
    #[serde(alias = "timeLimit")]
    pub time_limit_seconds: Option<u32>,
    pub enable_sound: Option<bool>,
    pub enable_animation: Option<bool>,
    pub theme: Option<Theme>,
}

impl UserSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft into settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a numeric field is out of range.
    pub fn validate(self) -> Result<UserSettings, SettingsError> {
        let defaults = UserSettings::default();

        let name = self
            .name
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or(defaults.name);

        let grade = self.grade.unwrap_or(defaults.grade);
        if !(1..=12).contains(&grade) {
            return Err(SettingsError::InvalidGrade(grade));
        }

        let problems_per_session = self
            .problems_per_session
            .unwrap_or(defaults.problems_per_session);
        if !(1..=100).contains(&problems_per_session) {
            return Err(SettingsError::InvalidProblemsPerSession(
                problems_per_session,
            ));
        }

        let time_limit_seconds = self
            .time_limit_seconds
            .unwrap_or(defaults.time_limit_seconds);
        if time_limit_seconds == 0 {
            return Err(SettingsError::InvalidTimeLimit);
        }

        Ok(UserSettings {
            name,
            grade,
            problems_per_session,
            time_limit_seconds,
            enable_sound: self.enable_sound.unwrap_or(defaults.enable_sound),
            enable_animation: self.enable_animation.unwrap_or(defaults.enable_animation),
            theme: self.theme.unwrap_or(defaults.theme),
        })
    }
}

impl TryFrom<UserSettingsDraft> for UserSettings {
    type Error = SettingsError;

    fn try_from(draft: UserSettingsDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<UserSettings> for UserSettingsDraft {
    fn from(settings: UserSettings) -> Self {
        Self {
            name: Some(settings.name),
            grade: Some(settings.grade),
            problems_per_session: Some(settings.problems_per_session),
            time_limit_seconds: Some(settings.time_limit_seconds),
            enable_sound: Some(settings.enable_sound),
            enable_animation: Some(settings.enable_animation),
            theme: Some(settings.theme),
        }
    }
}

impl UserSettings {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn grade(&self) -> u8 {
        self.grade
    }

    #[must_use]
    pub fn problems_per_session(&self) -> u32 {
        self.problems_per_session
    }

    #[must_use]
    pub fn time_limit_seconds(&self) -> u32 {
        self.time_limit_seconds
    }

    #[must_use]
    pub fn enable_sound(&self) -> bool {
        self.enable_sound
    }

    #[must_use]
    pub fn enable_animation(&self) -> bool {
        self.enable_animation
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Start a draft pre-filled with these settings.
    #[must_use]
    pub fn to_draft(&self) -> UserSettingsDraft {
        self.clone().into()
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_LEARNER_NAME.to_string(),
            grade: 1,
            problems_per_session: DEFAULT_PROBLEMS_PER_SESSION,
            time_limit_seconds: DEFAULT_TIME_LIMIT_SECONDS,
            enable_sound: true,
            enable_animation: true,
            theme: Theme::Colorful,
        }
    }
}
