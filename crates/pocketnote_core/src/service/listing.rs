//! List ordering, filtering and summary projections.
//!
//! # Invariants
//! - Display order is `updated_at DESC, id ASC`.
//! - Filters are trimmed and case-folded; an empty filter matches all notes.

use crate::model::note::{Note, NoteId};
use once_cell::sync::Lazy;
use regex::Regex;

const PREVIEW_MAX_CHARS: usize = 120;
const UNTITLED: &str = "Untitled";

static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r\n|\r|\n").expect("valid line break regex"));

/// Row model for note list views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    pub id: NoteId,
    /// Title, or `Untitled` when empty.
    pub display_title: String,
    /// First 120 body characters on a single line.
    pub preview: String,
    pub updated_at: i64,
}

impl NoteSummary {
    pub fn from_note(note: &Note) -> Self {
        Self {
            id: note.id.clone(),
            display_title: display_title(&note.title).to_string(),
            preview: preview_text(&note.body),
            updated_at: note.updated_at,
        }
    }
}

/// Trims and case-folds a filter; `None` means "no filtering".
pub fn normalize_filter(filter: &str) -> Option<String> {
    let trimmed = filter.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Returns matching notes in display order without touching stored order.
pub fn sorted_matches<'a>(notes: &'a [Note], filter: &str) -> Vec<&'a Note> {
    let needle = normalize_filter(filter);
    let mut matches: Vec<&Note> = notes
        .iter()
        .filter(|note| needle.as_deref().map_or(true, |value| note.matches_folded(value)))
        .collect();
    matches.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    matches
}

pub fn display_title(title: &str) -> &str {
    if title.is_empty() {
        UNTITLED
    } else {
        title
    }
}

/// Single-line body preview capped at 120 characters.
pub fn preview_text(body: &str) -> String {
    let head: String = body.chars().take(PREVIEW_MAX_CHARS).collect();
    LINE_BREAK_RE.replace_all(&head, " ").into_owned()
}
