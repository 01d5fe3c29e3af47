// crates/locref-core/src/lib.rs

pub mod convert; // Raw row -> stored record mapping
pub mod error;
pub mod fetch; // Dataset retrieval (HTTP and local)
pub mod import; // The orchestrator
pub mod model;
pub mod queue; // Background job and notification seams
pub mod resolver;
pub mod store;
pub mod validate; // Save pipeline, run by every GeoStore::save

// Shared Raw Input (upstream JSON row shapes)
pub mod raw;

// Re-exports
pub use crate::error::{
    FetchError, ImportError, ImportResult, QueueError, StoreError, StoreResult, ValidationError,
};
// Export the Model Types
pub use crate::model::{City, Country, EntityKind, GeoRecord, Region, State, Subregion};
pub use crate::raw::DatasetFile;
pub use crate::store::{Filter, FilterField, GeoStore, MemoryStore, RecordKey};
// Export the Pipeline (Crucial for users!)
pub use crate::import::{
    refresh_location_data, refresh_location_data_chunked, CommitCadence, ImportOptions,
    ImportReport, Importer, LevelReport, RecordFailure,
};
pub use crate::fetch::{fetch_records, DatasetSource, DirSource, DATA_BASE_URL};
#[cfg(feature = "fetch")]
pub use crate::fetch::HttpSource;
pub use crate::queue::{
    queue_location_refresh, ImportJob, JobQueue, LogNotifier, Notifier,
};
