//! SQLite-backed slot storage.
//!
//! # Invariants
//! - Each write is a single upsert statement, so a slot is either fully
//!   replaced or left untouched.

use super::{check_quota, BlobStorage, StorageResult};
use crate::db::{open_db, open_db_in_memory};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Slot storage over the `kv_store` table.
pub struct SqliteBlobStorage {
    conn: Connection,
    quota_bytes: Option<usize>,
}

impl SqliteBlobStorage {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection already bootstrapped by `crate::db`.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            quota_bytes: None,
        }
    }

    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }
}

impl BlobStorage for SqliteBlobStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> StorageResult<()> {
        check_quota(key, value, self.quota_bytes)?;
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value, epoch_ms()],
        )?;
        Ok(())
    }
}

fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::SqliteBlobStorage;
    use crate::storage::{BlobStorage, StorageError};

    #[test]
    fn missing_slot_reads_none() {
        let storage = SqliteBlobStorage::open_in_memory().expect("in-memory storage");
        assert!(storage.read("absent").expect("read").is_none());
    }

    #[test]
    fn write_replaces_slot_value() {
        let mut storage = SqliteBlobStorage::open_in_memory().expect("in-memory storage");
        storage.write("notes", "[1]").expect("first write");
        storage.write("notes", "[1,2]").expect("second write");
        assert_eq!(storage.read("notes").expect("read").as_deref(), Some("[1,2]"));
        assert!(storage.read("other").expect("read").is_none());
    }

    #[test]
    fn quota_is_enforced_before_sql() {
        let mut storage = SqliteBlobStorage::open_in_memory()
            .expect("in-memory storage")
            .with_quota(Some(2));
        let err = storage.write("notes", "[1,2]").expect_err("over quota");
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(storage.read("notes").expect("read").is_none());
    }
}
