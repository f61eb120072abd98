//! File import boundary.
//!
//! # Responsibility
//! - Read a batch of file-like sources concurrently.
//! - Commit every readable source to the store in one persistence write.
//!
//! # Invariants
//! - All reads in a batch finish before the commit; no partial batch is visible.
//! - A failed read is skipped and reported; it never blocks the commit.
//! - Content is not validated; invalid UTF-8 is decoded lossily.

use crate::model::note::Note;
use crate::repo::kv_repo::KvStore;
use crate::service::note_store::{NoteStore, NoteStoreResult};
use log::{info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

/// A named input whose full text can be read.
pub trait ImportSource: Sync {
    /// Label recorded as the note source.
    fn name(&self) -> String;
    /// Reads the full text content.
    fn read_text(&self) -> io::Result<String>;
}

/// Filesystem-backed import source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImportSource for FileSource {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn read_text(&self) -> io::Result<String> {
        let bytes = std::fs::read(&self.path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// One source that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSource {
    pub name: String,
    pub reason: String,
}

/// Outcome of one batch import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Created notes in commit order; the last one is now at the list front.
    pub imported: Vec<Note>,
    /// Sources whose read failed.
    pub skipped: Vec<SkippedSource>,
}

/// Reads `sources` concurrently and commits them as one batch.
///
/// Sources are applied in input order. Blank texts create no note.
///
/// # Errors
/// Returns the store error when the single batch write fails; in that case
/// no note from the batch is kept.
pub fn import_batch<S, I>(store: &mut NoteStore<S>, sources: &[I]) -> NoteStoreResult<ImportReport>
where
    S: KvStore,
    I: ImportSource,
{
    if sources.is_empty() {
        return Ok(ImportReport::default());
    }

    let reads: Vec<(String, io::Result<String>)> = thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|source| scope.spawn(move || (source.name(), source.read_text())))
            .collect();
        handles
            .into_iter()
            .zip(sources)
            .map(|(handle, source)| {
                handle.join().unwrap_or_else(|_| {
                    (
                        source.name(),
                        Err(io::Error::other("reader thread panicked")),
                    )
                })
            })
            .collect()
    });

    let mut texts = Vec::with_capacity(reads.len());
    let mut skipped = Vec::new();
    for (name, result) in reads {
        match result {
            Ok(text) => texts.push((text, name)),
            Err(err) => {
                warn!(
                    "event=file_read module=import status=error source={} error={}",
                    name, err
                );
                skipped.push(SkippedSource {
                    name,
                    reason: err.to_string(),
                });
            }
        }
    }

    let imported = if texts.is_empty() {
        Vec::new()
    } else {
        store.add_imported_batch(texts)?
    };

    info!(
        "event=import_batch module=import status=ok sources={} imported={} skipped={}",
        sources.len(),
        imported.len(),
        skipped.len()
    );
    Ok(ImportReport { imported, skipped })
}

#[cfg(test)]
mod tests {
    use super::{FileSource, ImportSource};

    #[test]
    fn file_source_name_is_file_name_component() {
        let source = FileSource::new("/tmp/some/dir/ideas.txt");
        assert_eq!(source.name(), "ideas.txt");
    }

    #[test]
    fn file_source_decodes_invalid_utf8_lossily() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [b'o', b'k', 0xff, b'!']).expect("write file");

        let text = FileSource::new(&path).read_text().expect("read");
        assert!(text.starts_with("ok"));
        assert!(text.ends_with('!'));
        assert!(text.contains('\u{fffd}'));
    }
}
