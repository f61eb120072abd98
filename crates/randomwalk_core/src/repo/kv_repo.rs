//! Key-value storage contracts, SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Provide one-key-one-blob persistence for serialized note sequences.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `set` replaces the whole value for a key (upsert).
//! - `get` on an absent key returns `Ok(None)`, never an error.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage backend error.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Backend refused the read (used by non-SQLite backends).
    ReadRejected(String),
    /// Backend refused the write (used by non-SQLite backends).
    WriteRejected(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ReadRejected(key) => write!(f, "read rejected for key `{key}`"),
            Self::WriteRejected(key) => write!(f, "write rejected for key `{key}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::ReadRejected(_) | Self::WriteRejected(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Blob store keyed by text.
pub trait KvStore {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    /// Replaces the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> RepoResult<()>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        (**self).set(key, value)
    }
}

/// SQLite-backed key-value store over the `kv_entries` table.
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl KvStore for SqliteKvStore<'_> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Process-local store for tests and ephemeral sessions.
///
/// Counts successful writes so callers can observe persistence side effects.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RefCell<HashMap<String, String>>,
    writes: Cell<usize>,
    reject_reads: Cell<bool>,
    reject_writes: Cell<bool>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Makes every following `get` fail with `ReadRejected`.
    pub fn reject_reads(&self, reject: bool) {
        self.reject_reads.set(reject);
    }

    /// Makes every following `set` fail with `WriteRejected`.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        if self.reject_reads.get() {
            return Err(RepoError::ReadRejected(key.to_string()));
        }
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        if self.reject_writes.get() {
            return Err(RepoError::WriteRejected(key.to_string()));
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{KvStore, MemoryKvStore, RepoError, SqliteKvStore};
    use crate::db::open_db_in_memory;

    #[test]
    fn sqlite_get_missing_key_returns_none() {
        let conn = open_db_in_memory().expect("open db");
        let store = SqliteKvStore::new(&conn);
        assert_eq!(store.get("absent").expect("get"), None);
    }

    #[test]
    fn sqlite_set_upserts_value() {
        let conn = open_db_in_memory().expect("open db");
        let store = SqliteKvStore::new(&conn);
        store.set("k", "one").expect("first set");
        store.set("k", "two").expect("second set");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("two"));

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_entries;", [], |row| row.get(0))
            .expect("count rows");
        assert_eq!(rows, 1);
    }

    #[test]
    fn memory_store_counts_writes_and_can_reject() {
        let store = MemoryKvStore::new();
        store.set("k", "v").expect("set");
        assert_eq!(store.writes(), 1);

        store.reject_writes(true);
        let err = store.set("k", "w").expect_err("write should be rejected");
        assert!(matches!(err, RepoError::WriteRejected(_)));
        assert_eq!(store.writes(), 1);
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v"));
    }
}
