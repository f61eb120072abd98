//! Text projections rendered by the UI layer.
//!
//! # Responsibility
//! - Derive list previews, meta lines and count labels from notes.
//!
//! # Invariants
//! - Previews are single-line and at most `PREVIEW_MAX_CHARS` chars plus `...`.

use crate::model::note::{Note, UNKNOWN_SOURCE};
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;

pub const PREVIEW_MAX_CHARS: usize = 50;
const PREVIEW_ELLIPSIS: &str = "...";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Single-line list preview of note content.
pub fn preview(content: &str) -> String {
    let normalized = WHITESPACE_RE.replace_all(content.trim(), " ");
    let mut truncated = normalized.chars().take(PREVIEW_MAX_CHARS).collect::<String>();
    if normalized.chars().count() > PREVIEW_MAX_CHARS {
        truncated.push_str(PREVIEW_ELLIPSIS);
    }
    truncated
}

/// `From: <source> • <local date>` line shown under a walked note.
pub fn meta_line(note: &Note) -> String {
    let source = if note.source.trim().is_empty() {
        UNKNOWN_SOURCE
    } else {
        note.source.as_str()
    };
    let date = note.created_at.with_timezone(&Local).format("%Y-%m-%d");
    format!("From: {source} \u{2022} {date}")
}

/// `1 note` / `N notes`.
pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 note".to_string()
    } else {
        format!("{count} notes")
    }
}
