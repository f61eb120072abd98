//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and its identifier.
//! - Validate content/source at construction time.
//!
//! # Invariants
//! - `content` is trimmed and never empty.
//! - `id` is stable for the note lifetime and never reused by the store.
//! - Notes are immutable after creation; there is no edit path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Source label for notes typed by the user.
pub const MANUAL_ENTRY_SOURCE: &str = "Manual Entry";
/// Fallback label for legacy records that carry no source.
pub const UNKNOWN_SOURCE: &str = "Unknown";

const ID_SUFFIX_LEN: usize = 8;

/// Stable note identifier.
///
/// New ids are `<epoch-millis>-<hex>`. Legacy payloads stored numeric ids,
/// which deserialize into their decimal text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generates a candidate id for a note created at `created_at`.
    ///
    /// Two candidates for the same millisecond differ in their random
    /// suffix; callers holding other ids must still check for collisions.
    pub fn generate(created_at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}-{}",
            created_at.timestamp_millis(),
            &suffix[..ID_SUFFIX_LEN]
        ))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawNoteId {
            Text(String),
            Number(serde_json::Number),
        }

        match RawNoteId::deserialize(deserializer)? {
            RawNoteId::Text(value) => Ok(Self(value)),
            RawNoteId::Number(value) => Ok(Self(value.to_string())),
        }
    }
}

/// Validation error for note construction and loaded records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Content is empty after trimming.
    EmptyContent,
    /// Source label is empty after trimming.
    EmptySource,
    /// Id is empty.
    EmptyId,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "note content cannot be empty"),
            Self::EmptySource => write!(f, "note source cannot be empty"),
            Self::EmptyId => write!(f, "note id cannot be empty"),
        }
    }
}

impl Error for NoteValidationError {}

/// One stored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Trimmed text body.
    pub content: String,
    /// Creation time. Serialized as `date` to match the stored layout.
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
    /// Origin label: `Manual Entry` or the imported file name.
    ///
    /// Missing, null, or blank in stored records loads as `Unknown`.
    #[serde(default = "unknown_source", deserialize_with = "deserialize_source")]
    pub source: String,
}

impl Note {
    /// Builds a note from raw user or file text.
    ///
    /// # Errors
    /// - `EmptyContent` when `text` is blank after trimming.
    /// - `EmptySource` when `source` is blank.
    pub fn new(
        id: NoteId,
        text: &str,
        source: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, NoteValidationError> {
        let note = Self {
            id,
            content: text.trim().to_string(),
            created_at,
            source: source.into(),
        };
        note.validate()?;
        Ok(note)
    }

    /// Checks record invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.as_str().is_empty() {
            return Err(NoteValidationError::EmptyId);
        }
        if self.content.trim().is_empty() {
            return Err(NoteValidationError::EmptyContent);
        }
        if self.source.trim().is_empty() {
            return Err(NoteValidationError::EmptySource);
        }
        Ok(())
    }

    /// Returns whether this note was typed rather than imported.
    pub fn is_manual(&self) -> bool {
        self.source == MANUAL_ENTRY_SOURCE
    }
}

fn unknown_source() -> String {
    UNKNOWN_SOURCE.to_string()
}

fn deserialize_source<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|source| !source.trim().is_empty())
        .unwrap_or_else(unknown_source))
}
