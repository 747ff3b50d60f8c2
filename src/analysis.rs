//! Read-only analysis of solution paths.
//!
//! Free-cell modes along a path, the phase structure around target-piece
//! turns, a few named milestones, and how often the target piece is boxed
//! in. None of this affects the searches.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::geometry::{self, Direction};
use crate::moves::Move;
use crate::path::Path;
use crate::pieces::{FreeMode, Puzzle, State};

/// Free-cell mode of a state reached by legal moves.
fn mode_of(puzzle: &Puzzle, state: &State) -> Option<FreeMode> {
    let free = puzzle.board().full_mask() & !puzzle.occupied_mask(state);
    FreeMode::classify(&geometry::mask_cells(puzzle.board(), free))
}

/// How many path states fall in each free-cell mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeCounts {
    pub horizontal: usize,
    pub vertical: usize,
    pub separated: usize,
    /// States without exactly two free cells.
    pub other: usize,
}

impl ModeCounts {
    fn add(&mut self, mode: Option<FreeMode>) {
        match mode {
            Some(FreeMode::Horizontal) => self.horizontal += 1,
            Some(FreeMode::Vertical) => self.vertical += 1,
            Some(FreeMode::Separated) => self.separated += 1,
            None => self.other += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.horizontal + self.vertical + self.separated + self.other
    }
}

/// Mode of the state after each move.
pub fn path_modes(puzzle: &Puzzle, path: &Path) -> Vec<Option<FreeMode>> {
    path.steps()
        .iter()
        .map(|step| mode_of(puzzle, &step.state))
        .collect()
}

pub fn mode_counts(puzzle: &Puzzle, path: &Path) -> ModeCounts {
    let mut counts = ModeCounts::default();
    for mode in path_modes(puzzle, path) {
        counts.add(mode);
    }
    counts
}

/// Counts of mode changes between consecutive moves, including repeats.
pub fn mode_transitions(
    puzzle: &Puzzle,
    path: &Path,
) -> BTreeMap<(Option<FreeMode>, Option<FreeMode>), usize> {
    let modes = path_modes(puzzle, path);
    let mut transitions = BTreeMap::new();
    for pair in modes.windows(2) {
        *transitions.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    transitions
}

/// Turns of other pieces followed by one turn of the target piece.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Phase {
    /// Turns of pieces other than slot 0 before the target turn.
    pub filler_turns: usize,
    /// Index into [`Path::turns`]; `None` for a trailing filler run.
    pub target_turn: Option<usize>,
    /// Directions of the target's moves in that turn.
    pub target_moves: Vec<Direction>,
}

/// Splits a path at every turn of slot 0.
pub fn phases(path: &Path) -> Vec<Phase> {
    let mut phases = Vec::new();
    let mut filler = 0;
    for (index, turn) in path.turns().into_iter().enumerate() {
        if turn.piece != 0 {
            filler += 1;
            continue;
        }
        phases.push(Phase {
            filler_turns: filler,
            target_turn: Some(index),
            target_moves: path.steps()[turn.steps]
                .iter()
                .map(|step| step.mv.direction)
                .collect(),
        });
        filler = 0;
    }
    if filler > 0 {
        phases.push(Phase {
            filler_turns: filler,
            target_turn: None,
            target_moves: Vec::new(),
        });
    }
    phases
}

/// Milestones of a path, as indices into [`Path::steps`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseMarkers {
    /// First move of the blocker piece.
    pub blocker_first_move: Option<usize>,
    /// First move after which the blocker does not span the corridor, even
    /// if it did not span it at the start.
    pub corridor_open: Option<usize>,
    /// First move of the target in the descent direction.
    pub target_descends: Option<usize>,
}

/// Whether `slot` covers every column of `corridor`.
fn spans_corridor(puzzle: &Puzzle, state: &State, slot: usize, corridor: &Range<i32>) -> bool {
    let col = state[slot].0;
    let width = puzzle.shape(slot).0 as i32;
    col <= corridor.start && col + width >= corridor.end
}

/// Locates the milestones of `path` for a blocker piece and corridor columns.
///
/// On the classic boards the blocker is the horizontal general in slot 1,
/// the corridor is columns `1..3` under the 2x2 piece and the descent is
/// [`Direction::Down`]. A `blocker` slot the puzzle does not have yields no
/// markers.
pub fn phase_markers(
    puzzle: &Puzzle,
    path: &Path,
    blocker: usize,
    corridor: Range<i32>,
    descent: Direction,
) -> PhaseMarkers {
    if blocker >= puzzle.num_pieces() {
        return PhaseMarkers::default();
    }
    let steps = path.steps();
    let blocker_first_move = steps.iter().position(|step| step.mv.piece == blocker);
    let corridor_open = steps
        .iter()
        .position(|step| !spans_corridor(puzzle, &step.state, blocker, &corridor));
    let target_descends = steps
        .iter()
        .position(|step| step.mv.piece == 0 && step.mv.direction == descent);

    PhaseMarkers {
        blocker_first_move,
        corridor_open,
        target_descends,
    }
}

/// Number of single-cell moves available to the target piece.
pub fn target_mobility(puzzle: &Puzzle, state: &State) -> usize {
    Direction::ALL
        .into_iter()
        .filter(|&direction| Move::new(0, direction, 1).apply(puzzle, state).is_some())
        .count()
}

/// Path states after which the target piece cannot move at all.
pub fn stuck_steps(puzzle: &Puzzle, path: &Path) -> usize {
    path.steps()
        .iter()
        .filter(|step| target_mobility(puzzle, &step.state) == 0)
        .count()
}
