mod answer;
mod ids;
mod operation;
mod problem;
mod progress;
mod session;
mod settings;
mod worksheet;

pub use ids::{LearnerId, ParseIdError, ProblemId, SessionId};
pub use operation::{Difficulty, OperandRange, Operation, OperationError};

pub use answer::AnswerRecord;
pub use problem::{Problem, ProblemError, evaluate};
pub use progress::{MAX_STRENGTH, MIN_STRENGTH, ProgressRecord, clamp_strength};
pub use session::{Session, SessionError};
pub use settings::{
    DEFAULT_LEARNER_NAME, DEFAULT_PROBLEMS_PER_SESSION, DEFAULT_TIME_LIMIT_SECONDS, SettingsError,
    Theme, UserSettings, UserSettingsDraft,
};
pub use worksheet::{
    Layout, MAX_FONT_SIZE, MAX_MARGIN_MM, MAX_WORKSHEET_PROBLEMS, MIN_FONT_SIZE, MIN_MARGIN_MM,
    Worksheet, WorksheetConfig, WorksheetConfigDraft, WorksheetError, WorksheetPreset,
};
