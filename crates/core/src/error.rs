use thiserror::Error;

use crate::generator::GeneratorError;
use crate::model::{OperationError, ProblemError, SessionError, SettingsError, WorksheetError};
use crate::progress::ProgressSettingsError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    ProgressSettings(#[from] ProgressSettingsError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Worksheet(#[from] WorksheetError),
}
