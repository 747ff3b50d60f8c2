//! Canonical keys that merge permutations of interchangeable pieces.
//!
//! Within each declared group the anchors are sorted, so two states that only
//! differ in which identical piece sits where share one key. Because grouped
//! pieces have identical shapes, the key is itself a valid placement with the
//! same occupancy, and the search engines expand it directly.

use std::ops::Deref;

use crate::pieces::{Cell, Puzzle, State};

/// A state with interchangeable-piece symmetry removed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(State);

impl CanonicalKey {
    /// The representative placement for this key.
    #[inline]
    pub fn as_state(&self) -> &State {
        &self.0
    }

    #[inline]
    pub fn into_state(self) -> State {
        self.0
    }
}

impl Deref for CanonicalKey {
    type Target = State;

    #[inline]
    fn deref(&self) -> &State {
        &self.0
    }
}

impl Puzzle {
    /// Computes the canonical key of a state.
    ///
    /// Slots outside any group keep their anchors; each group's anchors are
    /// written back in ascending order over the group's slots.
    pub fn canonical_key(&self, state: &State) -> CanonicalKey {
        let mut canonical = state.clone();
        self.canonicalize_in_place(&mut canonical);
        CanonicalKey(canonical)
    }

    /// Canonicalizes a state that is no longer needed in raw form.
    pub fn into_canonical(&self, mut state: State) -> CanonicalKey {
        self.canonicalize_in_place(&mut state);
        CanonicalKey(state)
    }

    fn canonicalize_in_place(&self, state: &mut State) {
        let positions = state.positions_mut();
        let mut scratch: Vec<Cell> = Vec::new();
        for group in self.groups() {
            scratch.clear();
            scratch.extend(group.iter().map(|&slot| positions[slot]));
            scratch.sort_unstable();
            for (&slot, &anchor) in group.iter().zip(&scratch) {
                positions[slot] = anchor;
            }
        }
    }
}
