//! Core domain logic for pocketnote.
//! This crate is the single source of truth for note invariants.

pub mod autosave;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;
pub mod storage;

pub use autosave::debounce::{Debouncer, DEFAULT_QUIET_PERIOD};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AutosaveConfig, ConfigError, StoreConfig, DEFAULT_MAX_BLOB_BYTES};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteCollection, NoteDraft, NoteId};
pub use service::exchange::export_file_name;
pub use service::listing::NoteSummary;
pub use service::note_store::{
    load_collection, save_collection, NoteStore, NoteStoreError, NoteStoreResult,
    DEFAULT_STORAGE_KEY,
};
pub use session::{AutosaveStatus, EditorSession, PendingEdit};
pub use storage::{BlobStorage, MemoryBlobStorage, SqliteBlobStorage, StorageError, StorageResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
