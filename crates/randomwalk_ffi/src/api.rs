//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose note-store and walk operations to Dart via FRB.
//! - Keep error semantics simple: every call returns an envelope.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Store operations are serialized by one process-wide lock, so each call
//!   sees the previous call's committed state.
//! - The walk picker outlives individual calls; the last shown note is
//!   remembered for the whole process.

use log::warn;
use once_cell::sync::Lazy;
use randomwalk_core::db::open_db;
use randomwalk_core::{
    core_version as core_version_inner, count_label, import_batch,
    init_logging as init_logging_inner, meta_line, preview, FileSource, Note, NoteId, NoteStore,
    Picker, SqliteKvStore,
};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

const STORE_DB_FILE_NAME: &str = "randomwalk_notes.sqlite3";
const STORE_DB_PATH_ENV: &str = "RANDOMWALK_DB_PATH";

static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static WALK_SESSION: Lazy<Mutex<Picker>> = Lazy::new(|| Mutex::new(Picker::new()));

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Fixes the note database path for this process.
///
/// Must be called before the first store operation to take effect; otherwise
/// `RANDOMWALK_DB_PATH` or a temp-dir default has already been chosen.
///
/// # FFI contract
/// - Returns empty string on success (including a repeat of the active path).
/// - Returns an error message when another path is already active.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_store(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = STORE_DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "store already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// One list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: String,
    /// Single-line content preview.
    pub preview: String,
    /// `From: <source> • <date>` line.
    pub meta: String,
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResponse {
    /// Notes newest first.
    pub items: Vec<NoteItem>,
    /// `N notes` label.
    pub count_label: String,
    /// Empty on success, error text otherwise.
    pub message: String,
}

/// Generic action response envelope for add/delete flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Created note id; `None` for deletes and blank input.
    pub note_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl NoteActionResponse {
    fn success(message: impl Into<String>, note_id: Option<String>) -> Self {
        Self {
            ok: true,
            note_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note_id: None,
            message: message.into(),
        }
    }
}

/// Batch import response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResponse {
    pub ok: bool,
    /// Ids of created notes.
    pub imported_ids: Vec<String>,
    /// Names of files that could not be read.
    pub skipped: Vec<String>,
    pub message: String,
}

/// Walk response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkResponse {
    /// `false` when there is nothing to show.
    pub shown: bool,
    pub note_id: Option<String>,
    pub content: Option<String>,
    pub meta: Option<String>,
    pub message: String,
}

impl WalkResponse {
    fn nothing(message: impl Into<String>) -> Self {
        Self {
            shown: false,
            note_id: None,
            content: None,
            meta: None,
            message: message.into(),
        }
    }
}

/// Lists all notes newest first.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; errors surface as an empty list plus `message`.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_list() -> NotesListResponse {
    match with_store(|store, _| store.list().iter().map(to_note_item).collect::<Vec<_>>()) {
        Ok(items) => NotesListResponse {
            count_label: count_label(items.len()),
            items,
            message: String::new(),
        },
        Err(err) => NotesListResponse {
            items: Vec::new(),
            count_label: count_label(0),
            message: format!("notes_list failed: {err}"),
        },
    }
}

/// Adds one typed note.
///
/// # FFI contract
/// - Blank input succeeds without creating a note (`note_id = None`).
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn note_add(text: String) -> NoteActionResponse {
    let result = with_store(|store, _| store.add_manual(text.as_str()));
    match result {
        Ok(Ok(Some(note))) => NoteActionResponse::success("Added!", Some(note.id.to_string())),
        Ok(Ok(None)) => NoteActionResponse::success("Nothing to add.", None),
        Ok(Err(err)) => NoteActionResponse::failure(format!("note_add failed: {err}")),
        Err(err) => NoteActionResponse::failure(format!("note_add failed: {err}")),
    }
}

/// Imports text files as notes in one batch.
///
/// # FFI contract
/// - Unreadable files are skipped and listed in `skipped`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_import(paths: Vec<String>) -> ImportResponse {
    let sources: Vec<FileSource> = paths
        .iter()
        .map(|path| FileSource::new(path.as_str()))
        .collect();
    let result = with_store(|store, _| import_batch(store, &sources));
    match result {
        Ok(Ok(report)) => {
            let skipped: Vec<String> = report.skipped.into_iter().map(|s| s.name).collect();
            let message = if skipped.is_empty() {
                format!("Imported {} note(s).", report.imported.len())
            } else {
                format!(
                    "Imported {} note(s); skipped {} unreadable file(s).",
                    report.imported.len(),
                    skipped.len()
                )
            };
            ImportResponse {
                ok: true,
                imported_ids: report
                    .imported
                    .iter()
                    .map(|note| note.id.to_string())
                    .collect(),
                skipped,
                message,
            }
        }
        Ok(Err(err)) => import_failure(format!("notes_import failed: {err}")),
        Err(err) => import_failure(format!("notes_import failed: {err}")),
    }
}

/// Deletes one note by id.
///
/// # FFI contract
/// - Deleting an unknown id succeeds with a "not found" message.
/// - Resets the walk when the last note is deleted.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(note_id: String) -> NoteActionResponse {
    let id = NoteId::from(note_id);
    let result = with_store(|store, picker| {
        let removed = store.remove(&id);
        picker.sync(store.list());
        removed
    });
    match result {
        Ok(Ok(true)) => NoteActionResponse::success("Note forgotten.", None),
        Ok(Ok(false)) => NoteActionResponse::success("Note not found.", None),
        Ok(Err(err)) => NoteActionResponse::failure(format!("note_delete failed: {err}")),
        Err(err) => NoteActionResponse::failure(format!("note_delete failed: {err}")),
    }
}

/// Shows a random note different from the previous one.
///
/// # FFI contract
/// - `shown = false` when no notes exist.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn walk_next() -> WalkResponse {
    let result = with_store(|store, picker| {
        picker.pick(store.list()).map(|note| WalkResponse {
            shown: true,
            note_id: Some(note.id.to_string()),
            content: Some(note.content.clone()),
            meta: Some(meta_line(note)),
            message: String::new(),
        })
    });
    match result {
        Ok(Some(response)) => response,
        Ok(None) => WalkResponse::nothing("No notes yet."),
        Err(err) => WalkResponse::nothing(format!("walk_next failed: {err}")),
    }
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(STORE_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(STORE_DB_FILE_NAME)
        })
        .clone()
}

fn lock_session() -> MutexGuard<'static, Picker> {
    WALK_SESSION.lock().unwrap_or_else(|poisoned| {
        warn!("event=session_lock module=ffi status=recovered reason=poisoned");
        poisoned.into_inner()
    })
}

fn with_store<T>(
    f: impl FnOnce(&mut NoteStore<SqliteKvStore<'_>>, &mut Picker) -> T,
) -> Result<T, String> {
    let mut picker = lock_session();
    let db_path = resolve_store_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("store DB open failed: {err}"))?;
    // A failed read must not yield an empty store: the next write would
    // replace every saved note.
    let mut store = NoteStore::try_load(SqliteKvStore::new(&conn))
        .map_err(|err| format!("store load failed: {err}"))?;
    Ok(f(&mut store, &mut *picker))
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        id: note.id.to_string(),
        preview: preview(&note.content),
        meta: meta_line(note),
    }
}

fn import_failure(message: String) -> ImportResponse {
    ImportResponse {
        ok: false,
        imported_ids: Vec::new(),
        skipped: Vec::new(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        configure_store, core_version, init_logging, note_add, note_delete, notes_import,
        notes_list, walk_next,
    };
    use once_cell::sync::Lazy;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempfile::tempdir().expect("tempdir"));

    fn use_test_store() {
        let path = TEST_DIR.path().join("ffi.sqlite3");
        let error = configure_store(path.to_string_lossy().into_owned());
        assert!(error.is_empty(), "{error}");
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn configure_store_rejects_switching_paths() {
        use_test_store();
        let error = configure_store(
            TEST_DIR
                .path()
                .join("other.sqlite3")
                .to_string_lossy()
                .into_owned(),
        );
        assert!(error.contains("refusing to switch"));
    }

    #[test]
    fn note_add_then_list_shows_note_first() {
        use_test_store();
        let token = unique_token("add");
        let created = note_add(format!("  {token}  "));
        assert!(created.ok, "{}", created.message);
        let id = created.note_id.expect("created note should return id");

        let listed = notes_list();
        assert!(listed.message.is_empty(), "{}", listed.message);
        let item = listed
            .items
            .iter()
            .find(|item| item.id == id)
            .expect("created note listed");
        assert_eq!(item.preview, token);
        assert!(item.meta.starts_with("From: Manual Entry"));
    }

    #[test]
    fn note_add_blank_creates_nothing() {
        use_test_store();
        let response = note_add("   ".to_string());
        assert!(response.ok);
        assert!(response.note_id.is_none());
    }

    #[test]
    fn note_delete_removes_and_tolerates_unknown_ids() {
        use_test_store();
        let created = note_add(unique_token("delete"));
        let id = created.note_id.expect("created note should return id");

        let deleted = note_delete(id.clone());
        assert!(deleted.ok, "{}", deleted.message);
        assert!(notes_list().items.iter().all(|item| item.id != id));

        let again = note_delete(id);
        assert!(again.ok);
        assert_eq!(again.message, "Note not found.");
    }

    #[test]
    fn notes_import_reports_skipped_files() {
        use_test_store();
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("walk.txt");
        std::fs::write(&good, unique_token("import")).expect("write file");

        let response = notes_import(vec![
            good.to_string_lossy().into_owned(),
            dir.path().join("gone.txt").to_string_lossy().into_owned(),
        ]);
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.imported_ids.len(), 1);
        assert_eq!(response.skipped, vec!["gone.txt".to_string()]);
    }

    #[test]
    fn walk_next_shows_a_listed_note() {
        use_test_store();
        note_add(unique_token("walk-a"));
        note_add(unique_token("walk-b"));

        let walked = walk_next();
        assert!(walked.shown, "{}", walked.message);
        assert!(walked.content.is_some());
        assert!(walked.meta.is_some());
    }
}
