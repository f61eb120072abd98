//! Core domain logic for Random Walk notes.
//! This crate is the single source of truth for note-store and walk invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteId, NoteValidationError, MANUAL_ENTRY_SOURCE, UNKNOWN_SOURCE};
pub use repo::kv_repo::{KvStore, MemoryKvStore, RepoError, RepoResult, SqliteKvStore};
pub use service::display::{count_label, meta_line, preview};
pub use service::import::{import_batch, FileSource, ImportReport, ImportSource, SkippedSource};
pub use service::note_store::{NoteStore, NoteStoreError, NoteStoreResult, NOTES_STORAGE_KEY};
pub use service::picker::{pick_next, DisplayState, Picker};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
