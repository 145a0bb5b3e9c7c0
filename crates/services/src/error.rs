//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::generator::GeneratorError;
use drill_core::model::{SessionError, SettingsError, WorksheetError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `PracticeService` and `PracticeSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("a practice session needs at least one problem")]
    Empty,
    #[error("every problem in this session has been answered")]
    Completed,
    #[error("session incomplete: {answered} of {total} problems answered")]
    Incomplete { answered: usize, total: usize },
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("only finished sessions can be recorded")]
    Unfinished,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReportService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `WorksheetService` and renderers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WorksheetServiceError {
    #[error(transparent)]
    Worksheet(#[from] WorksheetError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error("failed to render worksheet")]
    Render(#[from] std::fmt::Error),
}

/// Errors emitted by `DataService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DataError {
    #[error("import failed: {0}")]
    Import(#[source] serde_json::Error),
    #[error("export failed: {0}")]
    Export(#[source] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
