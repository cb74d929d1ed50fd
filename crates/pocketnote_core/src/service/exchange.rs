//! JSON exchange helpers shared by load, import and export.
//!
//! # Responsibility
//! - Parse note-like record arrays with per-record error reasons.
//! - Turn drafts into notes with unique ids (import-merge defaulting rules).
//! - Name export files.
//!
//! # Invariants
//! - Drafts are processed in input order; an earlier record keeps its id and
//!   later duplicates are rekeyed.
//! - Ids already in `taken` are never reassigned.

use crate::model::note::{generate_note_id, rekey_with_suffix, Note, NoteDraft};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;

const EXPORT_FILE_PREFIX: &str = "notes_export_";

/// Result of turning drafts into notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializedDrafts {
    /// Notes in input order.
    pub notes: Vec<Note>,
    /// Drafts that had no usable id.
    pub generated_ids: usize,
    /// Drafts whose id collided and received a suffix.
    pub rekeyed: usize,
    /// Drafts missing at least one timestamp.
    pub defaulted_timestamps: usize,
}

impl MaterializedDrafts {
    /// Whether any draft needed defaulting or rekeying.
    pub fn repaired(&self) -> usize {
        self.generated_ids + self.rekeyed + self.defaulted_timestamps
    }
}

/// Parses `raw` as a JSON array of note-like records.
///
/// Field types are read leniently (see [`NoteDraft`]).
///
/// # Errors
/// Returns a human-readable reason when `raw` is not JSON, not an array, or
/// when an element is not an object.
pub fn parse_note_records(raw: &str) -> Result<Vec<NoteDraft>, String> {
    parse_record_array(raw)?
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            draft_from_value(item).map_err(|reason| format!("record {index}: {reason}"))
        })
        .collect()
}

/// Parses a stored slot, skipping elements that are not objects.
///
/// Returns the drafts and the number of skipped elements. Fails only when
/// `raw` is not a JSON array.
pub fn parse_stored_records(raw: &str) -> Result<(Vec<NoteDraft>, usize), String> {
    let items = parse_record_array(raw)?;
    let total = items.len();
    let drafts: Vec<NoteDraft> = items
        .into_iter()
        .filter_map(|item| draft_from_value(item).ok())
        .collect();
    let skipped = total - drafts.len();
    Ok((drafts, skipped))
}

fn parse_record_array(raw: &str) -> Result<Vec<Value>, String> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| format!("not valid JSON: {err}"))?;
    match value {
        Value::Array(items) => Ok(items),
        other => Err(format!(
            "expected a JSON array of notes, found {}",
            json_kind(&other)
        )),
    }
}

fn draft_from_value(item: Value) -> Result<NoteDraft, String> {
    if !item.is_object() {
        return Err(format!("expected an object, found {}", json_kind(&item)));
    }
    serde_json::from_value::<NoteDraft>(item).map_err(|err| err.to_string())
}

/// Assigns final ids and timestamps to `drafts`.
///
/// `taken` holds ids already present in the target collection; accepted ids
/// are added to it as drafts are processed.
pub fn materialize_drafts(
    drafts: Vec<NoteDraft>,
    taken: &mut HashSet<String>,
    now_ms: i64,
) -> MaterializedDrafts {
    let mut outcome = MaterializedDrafts::default();
    for draft in drafts {
        let mut id = match draft.usable_id() {
            Some(existing) => existing.to_string(),
            None => {
                outcome.generated_ids += 1;
                generate_note_id()
            }
        };
        if taken.contains(&id) {
            outcome.rekeyed += 1;
            while taken.contains(&id) {
                id = rekey_with_suffix(&id);
            }
        }
        if draft.created_at.is_none() || draft.updated_at.is_none() {
            outcome.defaulted_timestamps += 1;
        }
        taken.insert(id.clone());
        outcome.notes.push(draft.into_note(id, now_ms));
    }
    outcome
}

/// Suggested export file name, e.g. `notes_export_2024-05-01-13-45-10.json`.
pub fn export_file_name(now_ms: i64) -> String {
    let at: DateTime<Utc> = DateTime::from_timestamp_millis(now_ms).unwrap_or_default();
    format!("{EXPORT_FILE_PREFIX}{}.json", at.format("%Y-%m-%d-%H-%M-%S"))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
