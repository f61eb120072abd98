//! Storage layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the key-value contract the note store persists through.
//! - Isolate SQLite query details from store/business orchestration.
//!
//! # Invariants
//! - A successful `set` is visible to every later `get` on the same backend.
//! - Backends store opaque text; they never interpret payloads.

pub mod kv_repo;
