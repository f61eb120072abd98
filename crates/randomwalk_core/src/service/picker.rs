//! Random note selection with a no-immediate-repeat rule.
//!
//! # Responsibility
//! - Pick the next note to display uniformly at random.
//! - Track the last shown note and the display state derived from it.
//!
//! # Invariants
//! - With two or more notes, the picked note never has `last_shown` id.
//! - With exactly one note, that note is picked unconditionally.
//! - Selection on an empty list yields nothing and leaves state untouched.

use crate::model::note::{Note, NoteId};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Display-side state derived from the note list and the last pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    /// No notes exist.
    Empty,
    /// Notes exist but none has been shown yet.
    Hidden,
    /// The note with this id is on screen.
    Shown(NoteId),
}

/// Chooses the index of the next note to show.
///
/// Returns `None` when `notes` is empty. Re-draws while the drawn note has
/// `last_shown` id; when no note differs from `last_shown`, index 0 is
/// returned instead of looping.
pub fn pick_next<R: Rng>(
    notes: &[Note],
    last_shown: Option<&NoteId>,
    rng: &mut R,
) -> Option<usize> {
    match notes.len() {
        0 => None,
        1 => Some(0),
        len => {
            let Some(last) = last_shown else {
                return Some(rng.gen_range(0..len));
            };
            if notes.iter().all(|note| &note.id == last) {
                return Some(0);
            }
            loop {
                let index = rng.gen_range(0..len);
                if &notes[index].id != last {
                    return Some(index);
                }
            }
        }
    }
}

/// Stateful picker remembering the last shown note.
#[derive(Debug)]
pub struct Picker<R = StdRng> {
    last_shown: Option<NoteId>,
    rng: R,
}

impl Picker<StdRng> {
    /// Creates a picker seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for Picker<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Picker<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            last_shown: None,
            rng,
        }
    }

    /// Picks the next note and records it as shown.
    pub fn pick<'a>(&mut self, notes: &'a [Note]) -> Option<&'a Note> {
        let index = pick_next(notes, self.last_shown.as_ref(), &mut self.rng)?;
        let note = &notes[index];
        debug!(
            "event=walk_pick module=picker status=ok note_id={} pool={}",
            note.id,
            notes.len()
        );
        self.last_shown = Some(note.id.clone());
        Some(note)
    }

    pub fn last_shown(&self) -> Option<&NoteId> {
        self.last_shown.as_ref()
    }

    /// Reconciles picker state after the note list changed.
    ///
    /// An empty list resets to no last shown note. Otherwise the last shown
    /// id is kept, even if deleted, so the next pick still differs from what
    /// the user just saw.
    pub fn sync(&mut self, notes: &[Note]) {
        if notes.is_empty() && self.last_shown.take().is_some() {
            debug!("event=walk_reset module=picker status=ok reason=empty");
        }
    }

    /// Current display state for `notes`.
    pub fn state(&self, notes: &[Note]) -> DisplayState {
        if notes.is_empty() {
            return DisplayState::Empty;
        }
        match &self.last_shown {
            Some(id) if notes.iter().any(|note| &note.id == id) => DisplayState::Shown(id.clone()),
            _ => DisplayState::Hidden,
        }
    }
}
