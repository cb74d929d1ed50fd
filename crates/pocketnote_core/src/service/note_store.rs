//! Note store: the authoritative in-memory collection and its slot.
//!
//! # Responsibility
//! - Provide create/update/delete/list/import/export over one collection.
//! - Write the whole collection back to its storage slot after every
//!   mutation.
//!
//! # Invariants
//! - Ids are unique within the collection at all times.
//! - `updated_at >= created_at` for every note.
//! - Loading never fails; a damaged slot degrades to an empty collection.
//! - Import never overwrites an existing note; incoming notes are rekeyed.
//! - A failed import parse leaves the collection untouched.

use crate::clock::Clock;
use crate::model::note::{Note, NoteCollection};
use crate::service::exchange::{materialize_drafts, parse_note_records, parse_stored_records};
use crate::service::listing::{sorted_matches, NoteSummary};
use crate::storage::{BlobStorage, StorageError};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default slot name for the note collection.
pub const DEFAULT_STORAGE_KEY: &str = "online_notebook_notes_v1";

pub type NoteStoreResult<T> = Result<T, NoteStoreError>;

/// Note store error taxonomy.
#[derive(Debug)]
pub enum NoteStoreError {
    /// Persisted write failed; in-memory state is kept but not persisted.
    StorageUnavailable(StorageError),
    /// Stored slot could not be parsed. Only ever logged by `load`.
    MalformedStoredData(String),
    /// Import payload rejected; nothing was merged.
    MalformedImportData(String),
    /// Collection could not be serialized.
    Encoding(serde_json::Error),
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::MalformedStoredData(reason) => write!(f, "malformed stored notes: {reason}"),
            Self::MalformedImportData(reason) => write!(f, "invalid import data: {reason}"),
            Self::Encoding(err) => write!(f, "failed to encode notes: {err}"),
        }
    }
}

impl Error for NoteStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            Self::Encoding(err) => Some(err),
            Self::MalformedStoredData(_) | Self::MalformedImportData(_) => None,
        }
    }
}

impl From<StorageError> for NoteStoreError {
    fn from(value: StorageError) -> Self {
        Self::StorageUnavailable(value)
    }
}

impl From<serde_json::Error> for NoteStoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encoding(value)
    }
}

/// Reads the collection stored under `key`.
///
/// Absent slot -> empty collection. Unreadable slot, or a slot that is not a
/// JSON array -> logs a `MalformedStoredData` diagnostic and returns an empty
/// collection. Array elements that are not objects are skipped; incomplete
/// or oddly typed records are repaired with the import defaulting rules.
pub fn load_collection<S, C>(storage: &S, key: &str, clock: &C) -> NoteCollection
where
    S: BlobStorage + ?Sized,
    C: Clock + ?Sized,
{
    let raw = match storage.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            info!("event=notes_load module=store status=ok source=empty_slot count=0");
            return Vec::new();
        }
        Err(err) => {
            error!(
                "event=notes_load module=store status=error error_code=storage_read_failed error={}",
                err
            );
            return Vec::new();
        }
    };

    let drafts = match parse_stored_records(&raw) {
        Ok((drafts, skipped)) => {
            if skipped > 0 {
                warn!(
                    "event=notes_load module=store status=repaired skipped_non_objects={}",
                    skipped
                );
            }
            drafts
        }
        Err(reason) => {
            let err = NoteStoreError::MalformedStoredData(reason);
            warn!(
                "event=notes_load module=store status=degraded error_code=malformed_stored_data error={}",
                err
            );
            return Vec::new();
        }
    };

    let outcome = materialize_drafts(drafts, &mut HashSet::new(), clock.now_ms());
    if outcome.repaired() > 0 {
        warn!(
            "event=notes_load module=store status=repaired generated_ids={} rekeyed={} defaulted_timestamps={}",
            outcome.generated_ids, outcome.rekeyed, outcome.defaulted_timestamps
        );
    }
    info!(
        "event=notes_load module=store status=ok count={}",
        outcome.notes.len()
    );
    outcome.notes
}

/// Serializes `notes` and replaces the slot under `key`.
pub fn save_collection<S>(storage: &mut S, key: &str, notes: &[Note]) -> NoteStoreResult<()>
where
    S: BlobStorage + ?Sized,
{
    let raw = serde_json::to_string(notes)?;
    storage.write(key, &raw).map_err(|err| {
        error!(
            "event=notes_save module=store status=error error_code=storage_unavailable count={} bytes={} error={}",
            notes.len(),
            raw.len(),
            err
        );
        NoteStoreError::from(err)
    })?;
    debug!(
        "event=notes_save module=store status=ok count={} bytes={}",
        notes.len(),
        raw.len()
    );
    Ok(())
}

/// Owner of the note collection, with injected storage and clock.
pub struct NoteStore<S: BlobStorage, C: Clock> {
    storage: S,
    clock: C,
    key: String,
    notes: NoteCollection,
}

impl<S: BlobStorage, C: Clock> NoteStore<S, C> {
    /// Opens the store and loads the collection from `key`.
    pub fn open(storage: S, clock: C, key: impl Into<String>) -> Self {
        let key = key.into();
        let notes = load_collection(&storage, &key, &clock);
        Self {
            storage,
            clock,
            key,
            notes,
        }
    }

    /// Opens the store under [`DEFAULT_STORAGE_KEY`].
    pub fn open_default(storage: S, clock: C) -> Self {
        Self::open(storage, clock, DEFAULT_STORAGE_KEY)
    }

    /// Writes the current collection to the slot.
    pub fn persist(&mut self) -> NoteStoreResult<()> {
        save_collection(&mut self.storage, &self.key, &self.notes)
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Notes in stored (insertion) order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Creates an empty note, persists, and returns it.
    ///
    /// On `StorageUnavailable` the note stays in memory.
    pub fn create(&mut self) -> NoteStoreResult<Note> {
        let mut note = Note::new(self.clock.now_ms());
        while self.contains(&note.id) {
            note = Note::new(note.created_at);
        }
        self.notes.push(note.clone());
        info!("event=note_create module=store status=ok note_id={}", note.id);
        self.persist()?;
        Ok(note)
    }

    /// Replaces title/body of `id` and bumps `updated_at`.
    ///
    /// Returns `Ok(None)` without touching storage when `id` is unknown.
    pub fn update(
        &mut self,
        id: &str,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> NoteStoreResult<Option<Note>> {
        let now_ms = self.clock.now_ms();
        let Some(note) = self.notes.iter_mut().find(|note| note.id == id) else {
            debug!("event=note_update module=store status=skipped reason=not_found note_id={id}");
            return Ok(None);
        };
        note.apply_edit(title, body, now_ms);
        let updated = note.clone();
        self.persist()?;
        info!("event=note_update module=store status=ok note_id={id}");
        Ok(Some(updated))
    }

    /// Removes `id` and persists.
    ///
    /// Returns `Ok(None)` without touching storage when `id` is unknown.
    pub fn delete(&mut self, id: &str) -> NoteStoreResult<Option<Note>> {
        let Some(index) = self.notes.iter().position(|note| note.id == id) else {
            debug!("event=note_delete module=store status=skipped reason=not_found note_id={id}");
            return Ok(None);
        };
        let removed = self.notes.remove(index);
        self.persist()?;
        info!("event=note_delete module=store status=ok note_id={id}");
        Ok(Some(removed))
    }

    /// Notes matching `filter`, newest first.
    pub fn list(&self, filter: &str) -> Vec<Note> {
        sorted_matches(&self.notes, filter)
            .into_iter()
            .cloned()
            .collect()
    }

    /// List rows matching `filter`, newest first.
    pub fn list_summaries(&self, filter: &str) -> Vec<NoteSummary> {
        sorted_matches(&self.notes, filter)
            .into_iter()
            .map(NoteSummary::from_note)
            .collect()
    }

    /// Most recently updated note, if any.
    pub fn newest(&self) -> Option<&Note> {
        sorted_matches(&self.notes, "").into_iter().next()
    }

    /// Pretty-printed JSON array of every note.
    pub fn export_all(&self) -> NoteStoreResult<String> {
        let data = serde_json::to_string_pretty(&self.notes)?;
        info!(
            "event=notes_export module=store status=ok count={} bytes={}",
            self.notes.len(),
            data.len()
        );
        Ok(data)
    }

    /// Appends the notes in `raw`, rekeying id collisions, and persists.
    ///
    /// Returns the number of notes added.
    ///
    /// # Errors
    /// - `MalformedImportData` when `raw` is not a JSON array of note-like
    ///   records; the collection is left unmodified.
    /// - `StorageUnavailable` when the merged collection cannot be written;
    ///   the merged notes stay in memory.
    pub fn import_merge(&mut self, raw: &str) -> NoteStoreResult<usize> {
        let drafts = parse_note_records(raw).map_err(|reason| {
            warn!(
                "event=notes_import module=store status=rejected error_code=malformed_import_data reason={}",
                reason
            );
            NoteStoreError::MalformedImportData(reason)
        })?;

        let mut taken: HashSet<String> = self.notes.iter().map(|note| note.id.clone()).collect();
        let outcome = materialize_drafts(drafts, &mut taken, self.clock.now_ms());
        let added = outcome.notes.len();
        self.notes.extend(outcome.notes);
        info!(
            "event=notes_import module=store status=ok added={} generated_ids={} rekeyed={} defaulted_timestamps={}",
            added, outcome.generated_ids, outcome.rekeyed, outcome.defaulted_timestamps
        );
        self.persist()?;
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::{load_collection, save_collection, NoteStore, NoteStoreError};
    use crate::clock::ManualClock;
    use crate::model::note::Note;
    use crate::storage::{BlobStorage, MemoryBlobStorage};

    const KEY: &str = "notes";

    #[test]
    fn unparseable_slot_loads_empty() {
        let storage = MemoryBlobStorage::new().with_slot(KEY, "{not json");
        let clock = ManualClock::new(1);
        assert!(load_collection(&storage, KEY, &clock).is_empty());

        let storage = MemoryBlobStorage::new().with_slot(KEY, r#"{"id":"a"}"#);
        assert!(load_collection(&storage, KEY, &clock).is_empty());
    }

    #[test]
    fn load_repairs_incomplete_records() {
        let storage = MemoryBlobStorage::new()
            .with_slot(KEY, r#"[{"id":"a","title":"t"},{"id":"a","createdAt":5}]"#);
        let clock = ManualClock::new(10);
        let notes = load_collection(&storage, KEY, &clock);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, "a");
        assert_eq!(notes[0].created_at, 10);
        assert_ne!(notes[1].id, "a");
        assert_eq!(notes[1].updated_at, 5);
    }

    #[test]
    fn load_keeps_records_with_odd_types_and_skips_non_objects() {
        let storage = MemoryBlobStorage::new()
            .with_slot(KEY, r#"[{"id":7,"createdAt":2.5,"updatedAt":9.0}, "junk"]"#);
        let notes = load_collection(&storage, KEY, &ManualClock::new(100));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "7");
        assert_eq!(notes[0].created_at, 2);
        assert_eq!(notes[0].updated_at, 9);
    }

    #[test]
    fn save_collection_writes_compact_array() {
        let mut storage = MemoryBlobStorage::new();
        save_collection(&mut storage, KEY, &[Note::with_id("a", 3)]).expect("save");
        let raw = storage.read(KEY).expect("read").expect("slot written");
        assert_eq!(
            raw,
            r#"[{"id":"a","title":"","body":"","createdAt":3,"updatedAt":3}]"#
        );
    }

    #[test]
    fn update_unknown_id_does_not_write() {
        let mut store = NoteStore::open(MemoryBlobStorage::new(), ManualClock::new(1), KEY);
        store.create().expect("create");
        let writes = store.storage().write_count();
        assert!(store.update("missing", "t", "b").expect("no-op").is_none());
        assert!(store.delete("missing").expect("no-op").is_none());
        assert_eq!(store.storage().write_count(), writes);
    }

    #[test]
    fn storage_failure_surfaces_but_keeps_memory() {
        let mut store = NoteStore::open(
            MemoryBlobStorage::new().with_quota(10),
            ManualClock::new(1),
            KEY,
        );
        let err = store.create().expect_err("quota must reject the write");
        assert!(matches!(err, NoteStoreError::StorageUnavailable(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn failed_import_leaves_collection_untouched() {
        let mut store = NoteStore::open(MemoryBlobStorage::new(), ManualClock::new(1), KEY);
        store.create().expect("create");
        let err = store
            .import_merge(r#"{"notes":[]}"#)
            .expect_err("object payload must be rejected");
        assert!(matches!(err, NoteStoreError::MalformedImportData(_)));
        assert!(err.to_string().contains("expected a JSON array"));
        assert_eq!(store.len(), 1);
    }
}
