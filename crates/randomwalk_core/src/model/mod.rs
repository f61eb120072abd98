//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record shared by store, picker and FFI.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod note;
