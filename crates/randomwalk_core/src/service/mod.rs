//! Core use-case services.
//!
//! # Responsibility
//! - Own the note collection, the walk picker and the import flow.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod display;
pub mod import;
pub mod note_store;
pub mod picker;
