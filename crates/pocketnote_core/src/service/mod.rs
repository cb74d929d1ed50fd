//! Core use-case services.
//!
//! # Responsibility
//! - Own the note collection and its synchronization with storage.
//! - Keep presentation layers decoupled from serialization details.

pub mod exchange;
pub mod listing;
pub mod note_store;
