use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::data_service::DataService;
use crate::error::AppServicesError;
use crate::practice::PracticeService;
use crate::progress_service::ProgressService;
use crate::report_service::ReportService;
use crate::settings_service::SettingsService;
use crate::worksheet_service::WorksheetService;

/// Offset applied to the practice seed for the worksheet generator so the two
/// never replay the same problem stream.
const WORKSHEET_SEED_OFFSET: u64 = 0x9e37_79b9_7f4a_7c15;

/// Assembles app-facing services over one storage backend.
pub struct AppServices {
    pub practice: PracticeService,
    pub progress: Arc<ProgressService>,
    pub reports: Arc<ReportService>,
    pub settings: Arc<SettingsService>,
    pub worksheets: WorksheetService,
    pub data: Arc<DataService>,
}

impl AppServices {
    /// Wire every service to `storage`.
    ///
    /// With a `seed` both generators are deterministic; without one they draw
    /// from OS entropy.
    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, seed: Option<u64>) -> Self {
        let (practice, worksheets) = match seed {
            Some(seed) => (
                PracticeService::seeded(seed, clock),
                WorksheetService::seeded(seed.wrapping_add(WORKSHEET_SEED_OFFSET), clock),
            ),
            None => (
                PracticeService::from_entropy(clock),
                WorksheetService::from_entropy(clock),
            ),
        };

        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.progress),
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.assessments),
        ));
        let reports = Arc::new(ReportService::new(
            clock,
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.assessments),
        ));
        let settings = Arc::new(SettingsService::new(Arc::clone(&storage.settings)));
        let data = Arc::new(DataService::new(clock, storage));

        Self {
            practice,
            progress,
            reports,
            settings,
            worksheets,
            data,
        }
    }

    /// Services over a fresh in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock, seed: Option<u64>) -> Self {
        Self::from_storage(Storage::in_memory(), clock, seed)
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        seed: Option<u64>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, seed))
    }
}
