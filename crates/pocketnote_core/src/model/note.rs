//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical `Note` record and its JSON field naming.
//! - Define `NoteDraft`, the partial record accepted from outside sources.
//! - Generate ids and collision suffixes.
//!
//! # Invariants
//! - `id` never changes after the note enters a collection.
//! - `updated_at >= created_at`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Stable identifier of a note.
///
/// Opaque string; generated ids are UUID v4 text, imported ids are kept
/// verbatim unless they collide.
pub type NoteId = String;

/// Whole-collection shape persisted in the storage slot.
pub type NoteCollection = Vec<Note>;

const COLLISION_SUFFIX_LEN: usize = 8;

/// Canonical note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    /// Unix epoch milliseconds, set once at creation.
    pub created_at: i64,
    /// Unix epoch milliseconds, bumped on every successful save.
    pub updated_at: i64,
}

impl Note {
    /// Creates an empty note stamped with `now_ms` and a generated id.
    pub fn new(now_ms: i64) -> Self {
        Self::with_id(generate_note_id(), now_ms)
    }

    /// Creates an empty note with a caller-provided id.
    pub fn with_id(id: impl Into<NoteId>, now_ms: i64) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            body: String::new(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Replaces title and body and bumps `updated_at`.
    ///
    /// `updated_at` never drops below `created_at`, even when the clock moved
    /// backwards since creation.
    pub fn apply_edit(&mut self, title: impl Into<String>, body: impl Into<String>, now_ms: i64) {
        self.title = title.into();
        self.body = body.into();
        self.updated_at = now_ms.max(self.created_at);
    }

    /// Returns whether title or body contains `needle`.
    ///
    /// `needle` must already be case-folded.
    pub fn matches_folded(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.body.to_lowercase().contains(needle)
    }
}

/// Note-like record from an import payload or a damaged stored blob.
///
/// Every field is optional and read leniently; missing values are filled in
/// by [`NoteDraft::into_note`]. Unknown fields are ignored.
///
/// - `id`: strings kept verbatim, numbers and booleans stringified
/// - `title`/`body`: non-strings read as missing
/// - timestamps: any JSON number, floats truncated; other types read as
///   missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<NoteId>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<i64>,
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NoteId>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => Some(value),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => Some(value),
        _ => None,
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        // `as` saturates out-of-range floats at the i64 bounds.
        Value::Number(value) => value
            .as_i64()
            .or_else(|| value.as_f64().map(|float| float.trunc() as i64)),
        _ => None,
    })
}

impl NoteDraft {
    /// Materializes the draft under `id`, defaulting timestamps to `now_ms`.
    ///
    /// - missing `created_at` -> `now_ms`
    /// - missing `updated_at` -> `created_at`
    /// - `updated_at < created_at` -> clamped to `created_at`
    pub fn into_note(self, id: NoteId, now_ms: i64) -> Note {
        let created_at = self.created_at.unwrap_or(now_ms);
        let updated_at = self.updated_at.unwrap_or(created_at).max(created_at);
        Note {
            id,
            title: self.title.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            created_at,
            updated_at,
        }
    }

    /// Returns the draft id when present and non-empty.
    pub fn usable_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|value| !value.is_empty())
    }
}

/// Generates a fresh note id.
pub fn generate_note_id() -> NoteId {
    Uuid::new_v4().to_string()
}

/// Appends a random suffix to `id`, used to rekey colliding imports.
pub fn rekey_with_suffix(id: &str) -> NoteId {
    let random = Uuid::new_v4().simple().to_string();
    format!("{id}_{}", &random[..COLLISION_SUFFIX_LEN])
}
