//! Note store: ordered, persisted note collection.
//!
//! # Responsibility
//! - Own the newest-first note sequence and its add/remove/list APIs.
//! - Keep the persisted blob in step with in-memory state.
//! - Recover from absent or malformed persisted state with an empty store.
//!
//! # Invariants
//! - Every new note is inserted at index 0.
//! - Note ids are pairwise distinct at all times.
//! - A mutation is applied in memory only after its persistence write succeeds.
//! - Blank text never creates a note and never writes.

use crate::model::note::{Note, NoteId, NoteValidationError, MANUAL_ENTRY_SOURCE, UNKNOWN_SOURCE};
use crate::repo::kv_repo::{KvStore, RepoError};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key holding the serialized note sequence.
pub const NOTES_STORAGE_KEY: &str = "randomWalkNotes";

/// Error returned by store mutations.
#[derive(Debug)]
pub enum NoteStoreError {
    /// Persistence write failed; the mutation was not applied.
    Repo(RepoError),
    /// The note sequence could not be serialized.
    Serialize(serde_json::Error),
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "failed to persist notes: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize notes: {err}"),
        }
    }
}

impl Error for NoteStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<RepoError> for NoteStoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for NoteStoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

pub type NoteStoreResult<T> = Result<T, NoteStoreError>;

/// Persisted, newest-first collection of notes.
pub struct NoteStore<S: KvStore> {
    backend: S,
    notes: Vec<Note>,
}

impl<S: KvStore> NoteStore<S> {
    /// Loads persisted notes at process start.
    ///
    /// Absent, unreadable, or malformed state yields an empty store; this
    /// never fails. Callers that reload mid-session use [`NoteStore::try_load`].
    pub fn load(backend: S) -> Self {
        match backend.get(NOTES_STORAGE_KEY) {
            Ok(raw) => Self::from_payload(backend, raw),
            Err(err) => {
                warn!(
                    "event=notes_load module=store status=recovered reason=read_failed error={}",
                    err
                );
                Self {
                    backend,
                    notes: Vec::new(),
                }
            }
        }
    }

    /// Loads persisted notes, surfacing backend read failures.
    ///
    /// Absent or malformed payloads still recover to an empty store. A failed
    /// read is returned as an error so no later write can overwrite notes that
    /// were never seen.
    ///
    /// # Errors
    /// - `NoteStoreError::Repo` when the backend read fails.
    pub fn try_load(backend: S) -> NoteStoreResult<Self> {
        match backend.get(NOTES_STORAGE_KEY) {
            Ok(raw) => Ok(Self::from_payload(backend, raw)),
            Err(err) => {
                warn!(
                    "event=notes_load module=store status=error reason=read_failed error={}",
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Adds a typed note. Returns `None` when `text` is blank.
    pub fn add_manual(&mut self, text: &str) -> NoteStoreResult<Option<Note>> {
        self.add_one(text, MANUAL_ENTRY_SOURCE)
    }

    /// Adds one note read from a file named `source_name`.
    pub fn add_imported(&mut self, text: &str, source_name: &str) -> NoteStoreResult<Option<Note>> {
        self.add_one(text, source_name)
    }

    /// Adds a batch of imported texts with a single persistence write.
    ///
    /// Items are applied in order, each to the front, so the last item ends up
    /// at index 0. Blank items are skipped. An empty batch does nothing; a
    /// non-empty batch always writes, even when every item was blank.
    pub fn add_imported_batch<I, T, N>(&mut self, items: I) -> NoteStoreResult<Vec<Note>>
    where
        I: IntoIterator<Item = (T, N)>,
        T: AsRef<str>,
        N: AsRef<str>,
    {
        let now = Utc::now();
        let mut next = self.notes.clone();
        let mut created = Vec::new();
        let mut seen_items = 0usize;

        for (text, source_name) in items {
            seen_items += 1;
            if let Some(note) = build_note(&next, text.as_ref(), source_name.as_ref(), now) {
                next.insert(0, note.clone());
                created.push(note);
            }
        }

        if seen_items == 0 {
            return Ok(created);
        }

        self.commit(next)?;
        info!(
            "event=notes_import module=store status=ok items={} created={} count={}",
            seen_items,
            created.len(),
            self.notes.len()
        );
        Ok(created)
    }

    /// Removes the note with `id`. Persists even when nothing matched.
    ///
    /// Returns whether a note was removed.
    pub fn remove(&mut self, id: &NoteId) -> NoteStoreResult<bool> {
        let next: Vec<Note> = self
            .notes
            .iter()
            .filter(|note| &note.id != id)
            .cloned()
            .collect();
        let removed = next.len() != self.notes.len();

        self.commit(next)?;
        info!(
            "event=note_remove module=store status=ok note_id={} removed={} count={}",
            id,
            removed,
            self.notes.len()
        );
        Ok(removed)
    }

    /// Current notes, newest first.
    pub fn list(&self) -> &[Note] {
        &self.notes
    }

    pub fn count(&self) -> usize {
        self.notes.len()
    }

    /// Looks up one note by id.
    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    fn from_payload(backend: S, raw: Option<String>) -> Self {
        let notes = match raw {
            None => {
                info!("event=notes_load module=store status=ok count=0 reason=absent");
                Vec::new()
            }
            Some(raw) => match parse_notes(&raw) {
                Ok(notes) => {
                    info!(
                        "event=notes_load module=store status=ok count={}",
                        notes.len()
                    );
                    notes
                }
                Err(reason) => {
                    warn!(
                        "event=notes_load module=store status=recovered reason=malformed detail={}",
                        reason
                    );
                    Vec::new()
                }
            },
        };

        Self { backend, notes }
    }

    fn add_one(&mut self, text: &str, source_name: &str) -> NoteStoreResult<Option<Note>> {
        let Some(note) = build_note(&self.notes, text, source_name, Utc::now()) else {
            debug!("event=note_add module=store status=skipped reason=blank_content");
            return Ok(None);
        };

        let mut next = Vec::with_capacity(self.notes.len() + 1);
        next.push(note.clone());
        next.extend(self.notes.iter().cloned());

        self.commit(next)?;
        info!(
            "event=note_add module=store status=ok note_id={} manual={} count={}",
            note.id,
            note.is_manual(),
            self.notes.len()
        );
        Ok(Some(note))
    }

    fn commit(&mut self, next: Vec<Note>) -> NoteStoreResult<()> {
        let payload = serde_json::to_string(&next)?;
        if let Err(err) = self.backend.set(NOTES_STORAGE_KEY, &payload) {
            warn!(
                "event=notes_save module=store status=error count={} error={}",
                next.len(),
                err
            );
            return Err(err.into());
        }
        self.notes = next;
        Ok(())
    }
}

/// Builds a note whose id is distinct from every id in `existing`.
fn build_note(
    existing: &[Note],
    text: &str,
    source_name: &str,
    now: DateTime<Utc>,
) -> Option<Note> {
    if text.trim().is_empty() {
        return None;
    }

    let source = if source_name.trim().is_empty() {
        UNKNOWN_SOURCE
    } else {
        source_name
    };

    let mut id = NoteId::generate(now);
    while existing.iter().any(|note| note.id == id) {
        id = NoteId::generate(now);
    }

    match Note::new(id, text, source, now) {
        Ok(note) => Some(note),
        Err(err) => {
            debug!("event=note_add module=store status=skipped reason={}", err);
            None
        }
    }
}

fn parse_notes(raw: &str) -> Result<Vec<Note>, String> {
    let notes: Vec<Note> = serde_json::from_str(raw).map_err(|err| err.to_string())?;

    let mut ids = HashSet::with_capacity(notes.len());
    for note in &notes {
        note.validate()
            .map_err(|err: NoteValidationError| format!("note {}: {err}", note.id))?;
        if !ids.insert(&note.id) {
            return Err(format!("duplicate note id {}", note.id));
        }
    }

    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::{parse_notes, NoteStore, NOTES_STORAGE_KEY};
    use crate::repo::kv_repo::{KvStore, MemoryKvStore};

    #[test]
    fn parse_notes_rejects_duplicate_ids() {
        let raw = r#"[
            {"id":"a","content":"one","date":"2024-01-01T00:00:00Z","source":"x"},
            {"id":"a","content":"two","date":"2024-01-01T00:00:00Z","source":"x"}
        ]"#;
        let err = parse_notes(raw).expect_err("duplicates must be rejected");
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn parse_notes_rejects_blank_content() {
        let raw = r#"[{"id":"a","content":"  ","date":"2024-01-01T00:00:00Z","source":"x"}]"#;
        assert!(parse_notes(raw).is_err());
    }

    #[test]
    fn parse_notes_rejects_non_array_payload() {
        assert!(parse_notes(r#"{"id":"a"}"#).is_err());
    }

    #[test]
    fn empty_batch_does_not_write() {
        let backend = MemoryKvStore::new();
        let mut store = NoteStore::load(&backend);
        let created = store
            .add_imported_batch(Vec::<(String, String)>::new())
            .expect("empty batch");
        assert!(created.is_empty());
        assert_eq!(backend.writes(), 0);
    }

    #[test]
    fn blank_only_batch_still_writes_once() {
        let backend = MemoryKvStore::new();
        let mut store = NoteStore::load(&backend);
        let created = store
            .add_imported_batch([("  ", "a.txt"), ("\n", "b.txt")])
            .expect("blank batch");
        assert!(created.is_empty());
        assert_eq!(store.count(), 0);
        assert_eq!(backend.writes(), 1);
        assert_eq!(
            backend.get(NOTES_STORAGE_KEY).expect("get").as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn blank_import_source_falls_back_to_unknown() {
        let backend = MemoryKvStore::new();
        let mut store = NoteStore::load(&backend);
        let note = store
            .add_imported("body", " ")
            .expect("add")
            .expect("note created");
        assert_eq!(note.source, "Unknown");
    }
}
