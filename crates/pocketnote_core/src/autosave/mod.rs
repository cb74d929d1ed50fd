//! Autosave scheduling primitives.

pub mod debounce;
