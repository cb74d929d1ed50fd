//! In-process slot storage, used by tests and ephemeral sessions.

use super::{check_quota, BlobStorage, StorageResult};
use std::collections::HashMap;

/// `HashMap`-backed slot storage with an optional per-slot quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStorage {
    slots: HashMap<String, String>,
    quota_bytes: Option<usize>,
    writes: usize,
}

impl MemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits every slot value to `quota_bytes` bytes.
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Seeds a slot without counting it as a write.
    pub fn with_slot(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots.insert(key.into(), value.into());
        self
    }

    /// Number of successful writes since construction.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl BlobStorage for MemoryBlobStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> StorageResult<()> {
        check_quota(key, value, self.quota_bytes)?;
        self.slots.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryBlobStorage;
    use crate::storage::BlobStorage;

    #[test]
    fn rejected_write_keeps_previous_value() {
        let mut storage = MemoryBlobStorage::new().with_quota(4);
        storage.write("k", "ok").expect("small write fits");
        storage
            .write("k", "too large")
            .expect_err("oversized write must fail");
        assert_eq!(storage.read("k").expect("read").as_deref(), Some("ok"));
        assert_eq!(storage.write_count(), 1);
    }
}
