//! Single-slot blob persistence.
//!
//! # Responsibility
//! - Define the `BlobStorage` contract: named slots holding one text blob.
//! - Enforce an optional per-slot byte quota before writes.
//!
//! # Invariants
//! - `write` replaces the whole slot value; there is no partial patching.
//! - A rejected write leaves the previous slot value intact.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryBlobStorage;
pub use sqlite::SqliteBlobStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer failure.
#[derive(Debug)]
pub enum StorageError {
    /// Backend transport failure.
    Db(DbError),
    /// Value does not fit the configured slot quota.
    QuotaExceeded { key: String, needed: usize, limit: usize },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded { key, needed, limit } => write!(
                f,
                "storage quota exceeded for slot `{key}`: {needed} bytes > {limit} bytes"
            ),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::QuotaExceeded { .. } => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value slot storage holding whole serialized blobs.
pub trait BlobStorage {
    /// Reads the slot value, `None` when the slot was never written.
    fn read(&self, key: &str) -> StorageResult<Option<String>>;
    /// Replaces the slot value in one step.
    fn write(&mut self, key: &str, value: &str) -> StorageResult<()>;
}

impl<S: BlobStorage + ?Sized> BlobStorage for Box<S> {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).write(key, value)
    }
}

pub(crate) fn check_quota(key: &str, value: &str, limit: Option<usize>) -> StorageResult<()> {
    match limit {
        Some(limit) if value.len() > limit => Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            needed: value.len(),
            limit,
        }),
        _ => Ok(()),
    }
}
