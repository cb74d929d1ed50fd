//! Domain model for notes.
//!
//! # Responsibility
//! - Define the persisted note record and its lenient import shape.
//! - Own the id generation scheme shared by create and import paths.
//!
//! # Invariants
//! - Every note is identified by a stable, collection-unique `NoteId`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod note;
