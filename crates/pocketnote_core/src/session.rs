//! Editor session: selection and autosave around one `NoteStore`.
//!
//! # Responsibility
//! - Track the currently selected note for a presentation layer.
//! - Debounce edit notifications into single `update` calls.
//! - Flush pending edits before switching notes and on teardown.
//!
//! # Invariants
//! - A pending edit always targets the current selection.
//! - No pending edit survives `close()` or `Drop`.

use crate::autosave::debounce::Debouncer;
use crate::clock::Clock;
use crate::config::AutosaveConfig;
use crate::model::note::{Note, NoteId};
use crate::service::note_store::{NoteStore, NoteStoreResult};
use crate::storage::BlobStorage;
use log::{debug, error, info};

const SAVED_STATUS_MS: i64 = 1_500;

/// Unsaved title/body for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub note_id: NoteId,
    pub title: String,
    pub body: String,
}

/// Autosave indicator for status bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveStatus {
    Off,
    On,
    /// Last autosave commit, epoch milliseconds.
    SavedAt(i64),
}

pub struct EditorSession<S: BlobStorage, C: Clock + Clone> {
    store: NoteStore<S, C>,
    autosave: Debouncer<PendingEdit, C>,
    autosave_enabled: bool,
    selection: Option<NoteId>,
    last_autosave_at: Option<i64>,
}

impl<S: BlobStorage, C: Clock + Clone> EditorSession<S, C> {
    /// Wraps `store`, selecting the most recently updated note.
    pub fn open(store: NoteStore<S, C>, config: &AutosaveConfig) -> Self {
        let autosave = Debouncer::new(config.quiet_period(), store.clock().clone());
        let selection = store.newest().map(|note| note.id.clone());
        Self {
            store,
            autosave,
            autosave_enabled: config.enabled,
            selection,
            last_autosave_at: None,
        }
    }

    pub fn store(&self) -> &NoteStore<S, C> {
        &self.store
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.selection.as_deref().and_then(|id| self.store.get(id))
    }

    /// Whether an edit is waiting to be committed.
    pub fn is_dirty(&self) -> bool {
        self.autosave.is_pending()
    }

    pub fn set_autosave_enabled(&mut self, enabled: bool) {
        self.autosave_enabled = enabled;
    }

    /// `SavedAt` for 1.5 s after an autosave commit, then back to `On`.
    pub fn autosave_status(&self) -> AutosaveStatus {
        if !self.autosave_enabled {
            return AutosaveStatus::Off;
        }
        match self.last_autosave_at {
            Some(at) if self.store.clock().now_ms() < at.saturating_add(SAVED_STATUS_MS) => {
                AutosaveStatus::SavedAt(at)
            }
            _ => AutosaveStatus::On,
        }
    }

    /// Flushes pending work, then selects `id` when it exists.
    ///
    /// Unknown ids leave the selection unchanged and return `Ok(None)`.
    pub fn select(&mut self, id: &str) -> NoteStoreResult<Option<&Note>> {
        self.flush()?;
        if !self.store.contains(id) {
            return Ok(None);
        }
        self.selection = Some(id.to_string());
        Ok(self.store.get(id))
    }

    /// Flushes pending work, creates a note and selects it.
    pub fn new_note(&mut self) -> NoteStoreResult<NoteId> {
        self.flush()?;
        let note = self.store.create()?;
        self.selection = Some(note.id.clone());
        Ok(note.id)
    }

    /// Records an edit of the selected note and restarts the quiet window.
    ///
    /// Returns `false` when nothing is selected.
    pub fn edit(&mut self, title: impl Into<String>, body: impl Into<String>) -> bool {
        let Some(note_id) = self.selection.clone() else {
            return false;
        };
        self.autosave.notify(PendingEdit {
            note_id,
            title: title.into(),
            body: body.into(),
        });
        true
    }

    /// Commits the pending edit once the quiet window has elapsed.
    ///
    /// Returns whether a commit happened.
    pub fn tick(&mut self) -> NoteStoreResult<bool> {
        if !self.autosave_enabled {
            return Ok(false);
        }
        let Some(edit) = self.autosave.poll() else {
            return Ok(false);
        };
        self.commit(edit)?;
        let saved_at = self.store.clock().now_ms();
        self.last_autosave_at = Some(saved_at);
        debug!("event=autosave module=session status=ok saved_at={saved_at}");
        Ok(true)
    }

    /// Saves immediately.
    ///
    /// Commits the pending edit, or re-saves the selected note as-is when
    /// nothing is pending.
    pub fn save_now(&mut self) -> NoteStoreResult<Option<Note>> {
        if let Some(edit) = self.autosave.flush_pending() {
            return self.commit(edit);
        }
        let Some(note) = self.selected_note().cloned() else {
            return Ok(None);
        };
        self.store.update(&note.id, note.title, note.body)
    }

    /// Deletes the selected note and selects the newest remaining one.
    ///
    /// A pending edit for the deleted note is discarded.
    pub fn delete_selected(&mut self) -> NoteStoreResult<Option<Note>> {
        let Some(id) = self.selection.clone() else {
            return Ok(None);
        };
        if self.autosave.peek().is_some_and(|edit| edit.note_id == id) {
            self.autosave.cancel();
        }
        let removed = self.store.delete(&id);
        self.selection = self.store.newest().map(|note| note.id.clone());
        removed
    }

    /// Flushes pending work, then merges `raw` into the store.
    pub fn import_merge(&mut self, raw: &str) -> NoteStoreResult<usize> {
        self.flush()?;
        self.store.import_merge(raw)
    }

    /// Flushes the pending edit. Call before process teardown.
    pub fn close(&mut self) -> NoteStoreResult<()> {
        if self.flush()? {
            info!("event=session_close module=session status=ok flushed=true");
        }
        Ok(())
    }

    fn flush(&mut self) -> NoteStoreResult<bool> {
        match self.autosave.flush_pending() {
            Some(edit) => {
                self.commit(edit)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn commit(&mut self, edit: PendingEdit) -> NoteStoreResult<Option<Note>> {
        self.store.update(&edit.note_id, edit.title, edit.body)
    }
}

impl<S: BlobStorage, C: Clock + Clone> Drop for EditorSession<S, C> {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            error!(
                "event=session_close module=session status=error error_code=flush_failed error={}",
                err
            );
        }
    }
}
