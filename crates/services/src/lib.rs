#![forbid(unsafe_code)]

pub mod app_services;
pub mod data_service;
pub mod error;
pub mod practice;
pub mod progress_service;
pub mod report_service;
pub mod settings_service;
pub mod worksheet_service;

pub use drill_core::Clock;

pub use app_services::AppServices;
pub use data_service::{DataExport, DataService, ImportSummary};
pub use error::{
    AppServicesError, DataError, PracticeError, ProgressError, ReportError, SettingsServiceError,
    WorksheetServiceError,
};
pub use practice::{PracticeProgress, PracticeService, PracticeSession};
pub use progress_service::{ProgressService, RecordedSession};
pub use report_service::ReportService;
pub use settings_service::SettingsService;
pub use worksheet_service::{
    PlainTextRenderer, TextWorksheet, WorksheetRenderer, WorksheetService,
};
