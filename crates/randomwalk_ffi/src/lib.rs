//! Flutter-facing bindings for Random Walk notes.

pub mod api;
