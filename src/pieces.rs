//! Board, piece and state definitions.
//!
//! A puzzle is a fixed-size board, an ordered list of rectangular pieces and
//! the groups of pieces that are physically interchangeable. Slot 0 is always
//! the distinguished target piece. A [`State`] places every piece by the
//! bottom-left corner of its rectangle.

use std::fmt;
use std::ops::Index;

use crate::error::{PuzzleError, Result};
use crate::geometry::{self, Mask, MAX_CELLS};

/// A board cell as `(col, row)`, row 0 at the bottom.
pub type Cell = (i32, i32);

/// Piece extent as `(width, height)` in cells.
pub type Shape = (u8, u8);

/// Board dimensions in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    pub width: u8,
    pub height: u8,
}

impl Board {
    pub const fn new(width: u8, height: u8) -> Self {
        Self { width, height }
    }

    /// Total number of cells.
    #[inline]
    pub const fn area(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Mask with every board cell set.
    #[inline]
    pub fn full_mask(self) -> Mask {
        Mask::MAX >> (MAX_CELLS - self.area())
    }

    #[inline]
    pub fn contains(self, cell: Cell) -> bool {
        (0..self.width as i32).contains(&cell.0) && (0..self.height as i32).contains(&cell.1)
    }
}

/// Static description of one piece slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PieceSpec {
    pub name: String,
    pub shape: Shape,
    /// Anchor of the piece in the initial placement.
    pub start: Cell,
}

impl PieceSpec {
    pub fn new(name: impl Into<String>, width: u8, height: u8, col: i32, row: i32) -> Self {
        Self {
            name: name.into(),
            shape: (width, height),
            start: (col, row),
        }
    }
}

/// Piece anchors, one per slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State(Vec<Cell>);

impl State {
    pub fn new(positions: Vec<Cell>) -> Self {
        Self(positions)
    }

    #[inline]
    pub fn positions(&self) -> &[Cell] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Slot whose piece is anchored at `cell`, if any.
    pub fn slot_at(&self, cell: Cell) -> Option<usize> {
        self.0.iter().position(|&anchor| anchor == cell)
    }

    /// Copy of this state with one slot re-anchored.
    #[inline]
    pub fn with_anchor(&self, slot: usize, anchor: Cell) -> State {
        let mut positions = self.0.clone();
        positions[slot] = anchor;
        State(positions)
    }

    pub(crate) fn positions_mut(&mut self) -> &mut [Cell] {
        &mut self.0
    }
}

impl Index<usize> for State {
    type Output = Cell;

    #[inline]
    fn index(&self, slot: usize) -> &Cell {
        &self.0[slot]
    }
}

impl From<Vec<Cell>> for State {
    fn from(positions: Vec<Cell>) -> Self {
        Self(positions)
    }
}

/// Adjacency of the free cells when exactly two are free.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FreeMode {
    /// Same row, adjacent columns.
    Horizontal,
    /// Same column, adjacent rows.
    Vertical,
    Separated,
}

impl FreeMode {
    /// Classifies a free-cell set; `None` unless it has exactly two cells.
    pub fn classify(free: &[Cell]) -> Option<FreeMode> {
        let [(c0, r0), (c1, r1)] = free else {
            return None;
        };
        if r0 == r1 && (c0 - c1).abs() == 1 {
            Some(FreeMode::Horizontal)
        } else if c0 == c1 && (r0 - r1).abs() == 1 {
            Some(FreeMode::Vertical)
        } else {
            Some(FreeMode::Separated)
        }
    }

    pub const fn letter(self) -> char {
        match self {
            FreeMode::Horizontal => 'H',
            FreeMode::Vertical => 'V',
            FreeMode::Separated => 'S',
        }
    }
}

impl fmt::Display for FreeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Validated puzzle definition.
///
/// Immutable once built: the board, pieces and groups never change, and the
/// initial placement is guaranteed to be in bounds and non-overlapping.
#[derive(Clone, Debug)]
pub struct Puzzle {
    board: Board,
    pieces: Vec<PieceSpec>,
    groups: Vec<Vec<usize>>,
    initial: State,
}

impl Puzzle {
    /// Builds a puzzle with explicitly declared interchangeable groups.
    pub fn new(board: Board, pieces: Vec<PieceSpec>, groups: Vec<Vec<usize>>) -> Result<Self> {
        if board.width == 0 || board.height == 0 {
            return Err(PuzzleError::InvalidConfig(format!(
                "board must be non-empty, got {}x{}",
                board.width, board.height
            )));
        }
        if board.area() > MAX_CELLS {
            return Err(PuzzleError::InvalidConfig(format!(
                "board has {} cells, at most {MAX_CELLS} are supported",
                board.area()
            )));
        }
        if pieces.is_empty() {
            return Err(PuzzleError::InvalidConfig(
                "puzzle needs at least the target piece".into(),
            ));
        }
        if let Some(piece) = pieces.iter().find(|p| p.shape.0 == 0 || p.shape.1 == 0) {
            return Err(PuzzleError::InvalidConfig(format!(
                "piece {:?} has an empty shape",
                piece.name
            )));
        }

        let groups = normalize_groups(&pieces, groups)?;
        let initial = State::new(pieces.iter().map(|p| p.start).collect());
        let puzzle = Self {
            board,
            pieces,
            groups,
            initial,
        };

        puzzle
            .validate_state(&puzzle.initial)
            .map_err(|e| match e {
                PuzzleError::InvalidState(msg) => {
                    PuzzleError::InvalidConfig(format!("initial placement: {msg}"))
                }
                other => other,
            })?;

        Ok(puzzle)
    }

    /// Builds a puzzle whose groups are all same-shape slots other than the target.
    pub fn with_shape_groups(board: Board, pieces: Vec<PieceSpec>) -> Result<Self> {
        let groups = shape_groups(&pieces);
        Self::new(board, pieces, groups)
    }

    #[inline]
    pub fn board(&self) -> Board {
        self.board
    }

    #[inline]
    pub fn pieces(&self) -> &[PieceSpec] {
        &self.pieces
    }

    #[inline]
    pub fn num_pieces(&self) -> usize {
        self.pieces.len()
    }

    #[inline]
    pub fn shape(&self, slot: usize) -> Shape {
        self.pieces[slot].shape
    }

    /// Interchangeable groups, each sorted by slot.
    #[inline]
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// The initial placement.
    #[inline]
    pub fn initial(&self) -> &State {
        &self.initial
    }

    /// Footprint of one slot; `None` if it leaves the board.
    #[inline]
    pub fn footprint(&self, state: &State, slot: usize) -> Option<Mask> {
        geometry::footprint(self.board, state[slot], self.shape(slot))
    }

    /// Union of footprints for a state already known to be valid.
    ///
    /// Every state reachable from the initial placement through generated
    /// moves is valid, so the search loops use this instead of
    /// [`Puzzle::occupancy`].
    #[inline]
    pub fn occupied_mask(&self, state: &State) -> Mask {
        (0..state.len())
            .filter_map(|slot| self.footprint(state, slot))
            .fold(0, |acc, mask| acc | mask)
    }

    /// Union of footprints, checking arity, bounds and overlap.
    pub fn occupancy(&self, state: &State) -> Result<Mask> {
        if state.len() != self.pieces.len() {
            return Err(PuzzleError::InvalidState(format!(
                "expected {} positions, got {}",
                self.pieces.len(),
                state.len()
            )));
        }

        let mut occupied: Mask = 0;
        for slot in 0..state.len() {
            let mask = self.footprint(state, slot).ok_or_else(|| {
                PuzzleError::InvalidState(format!(
                    "piece {} ({}) at {:?} leaves the {}x{} board",
                    slot, self.pieces[slot].name, state[slot], self.board.width, self.board.height
                ))
            })?;
            if occupied & mask != 0 {
                let other = (0..slot)
                    .find(|&o| self.footprint(state, o).is_some_and(|m| m & mask != 0))
                    .unwrap_or(0);
                return Err(PuzzleError::InvalidState(format!(
                    "piece {} ({}) overlaps piece {} ({})",
                    slot, self.pieces[slot].name, other, self.pieces[other].name
                )));
            }
            occupied |= mask;
        }
        Ok(occupied)
    }

    /// Checks the non-overlap and in-bounds invariants.
    pub fn validate_state(&self, state: &State) -> Result<()> {
        self.occupancy(state).map(|_| ())
    }

    /// Every cell covered by some piece, row-major from the bottom.
    pub fn occupied_cells(&self, state: &State) -> Result<Vec<Cell>> {
        Ok(geometry::mask_cells(self.board, self.occupancy(state)?))
    }

    /// Board cells covered by no piece, row-major from the bottom.
    pub fn free_cells(&self, state: &State) -> Result<Vec<Cell>> {
        let free = self.board.full_mask() & !self.occupancy(state)?;
        Ok(geometry::mask_cells(self.board, free))
    }

    /// Free-cell adjacency of a state; `None` when not exactly two cells are free.
    pub fn free_mode(&self, state: &State) -> Result<Option<FreeMode>> {
        Ok(FreeMode::classify(&self.free_cells(state)?))
    }
}

/// Validates declared groups and sorts each by slot.
fn normalize_groups(pieces: &[PieceSpec], groups: Vec<Vec<usize>>) -> Result<Vec<Vec<usize>>> {
    let mut seen = vec![false; pieces.len()];
    let mut normalized = Vec::with_capacity(groups.len());

    for mut group in groups {
        group.sort_unstable();
        if group.len() < 2 {
            return Err(PuzzleError::InvalidConfig(format!(
                "group {group:?} needs at least two slots"
            )));
        }
        for &slot in &group {
            if slot >= pieces.len() {
                return Err(PuzzleError::InvalidConfig(format!(
                    "group {group:?} names slot {slot}, but there are {} pieces",
                    pieces.len()
                )));
            }
            if slot == 0 {
                return Err(PuzzleError::InvalidConfig(
                    "the target piece (slot 0) cannot be interchangeable".into(),
                ));
            }
            if seen[slot] {
                return Err(PuzzleError::InvalidConfig(format!(
                    "slot {slot} belongs to more than one group"
                )));
            }
            seen[slot] = true;
        }
        let shape = pieces[group[0]].shape;
        if let Some(&odd) = group.iter().find(|&&slot| pieces[slot].shape != shape) {
            return Err(PuzzleError::InvalidConfig(format!(
                "group {group:?} mixes shapes: slot {odd} is not {}x{}",
                shape.0, shape.1
            )));
        }
        normalized.push(group);
    }

    Ok(normalized)
}

/// Groups every shape shared by two or more non-target slots.
pub fn shape_groups(pieces: &[PieceSpec]) -> Vec<Vec<usize>> {
    let mut groups: Vec<(Shape, Vec<usize>)> = Vec::new();
    for (slot, piece) in pieces.iter().enumerate().skip(1) {
        match groups.iter_mut().find(|(shape, _)| *shape == piece.shape) {
            Some((_, slots)) => slots.push(slot),
            None => groups.push((piece.shape, vec![slot])),
        }
    }
    groups
        .into_iter()
        .map(|(_, slots)| slots)
        .filter(|slots| slots.len() > 1)
        .collect()
}

/// Goal test: the target piece (slot 0) anchored at a given cell.
///
/// Slot 0 never belongs to an interchangeable group, so the test gives the
/// same answer for a state and its canonical key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Goal {
    pub anchor: Cell,
}

impl Goal {
    pub const fn new(anchor: Cell) -> Self {
        Self { anchor }
    }

    #[inline]
    pub fn is_met(&self, state: &State) -> bool {
        state[0] == self.anchor
    }
}

/// One piece row of a preset: `(name, width, height, col, row)`.
pub type PieceRow = (&'static str, u8, u8, i32, i32);

/// A built-in board with its goal.
pub struct Preset {
    /// Command-line identifier.
    pub name: &'static str,
    /// Traditional title.
    pub title: &'static str,
    pub board: Board,
    pub pieces: &'static [PieceRow],
    pub groups: &'static [&'static [usize]],
    /// Goal anchor for slot 0.
    pub target: Cell,
}

impl Preset {
    /// Builds and validates the puzzle.
    pub fn puzzle(&self) -> Result<Puzzle> {
        let pieces = self
            .pieces
            .iter()
            .map(|&(name, w, h, col, row)| PieceSpec::new(name, w, h, col, row))
            .collect();
        let groups = self.groups.iter().map(|g| g.to_vec()).collect();
        Puzzle::new(self.board, pieces, groups)
    }

    pub const fn goal(&self) -> Goal {
        Goal::new(self.target)
    }
}

/// Generals (1x2) and soldiers (1x1) of the classic 4x5 board.
const CLASSIC_GROUPS: &[&[usize]] = &[&[2, 3, 4, 5], &[6, 7, 8, 9]];

const CLASSIC_BOARD: Board = Board::new(4, 5);

/// Goal for the classic boards: the 2x2 piece at the bottom exit.
pub const CLASSIC_TARGET: Cell = (1, 0);

/// 横刀立马, the reference board.
pub const HENG_DAO_LI_MA: Preset = Preset {
    name: "heng-dao-li-ma",
    title: "横刀立马",
    board: CLASSIC_BOARD,
    pieces: &[
        ("操", 2, 2, 1, 3),
        ("羽", 2, 1, 1, 2),
        ("飞", 1, 2, 0, 3),
        ("云", 1, 2, 3, 3),
        ("超", 1, 2, 0, 1),
        ("忠", 1, 2, 3, 1),
        ("①", 1, 1, 1, 1),
        ("②", 1, 1, 2, 1),
        ("③", 1, 1, 0, 0),
        ("④", 1, 1, 3, 0),
    ],
    groups: CLASSIC_GROUPS,
    target: CLASSIC_TARGET,
};

/// The reference board with its soldiers listed in a different order.
pub const HENG_DAO_LI_MA_A: Preset = Preset {
    name: "heng-dao-li-ma-a",
    title: "横刀立马 (soldiers reordered)",
    board: CLASSIC_BOARD,
    pieces: &[
        ("操", 2, 2, 1, 3),
        ("羽", 2, 1, 1, 2),
        ("飞", 1, 2, 0, 3),
        ("云", 1, 2, 3, 3),
        ("超", 1, 2, 0, 1),
        ("忠", 1, 2, 3, 1),
        ("①", 1, 1, 0, 0),
        ("②", 1, 1, 3, 0),
        ("③", 1, 1, 1, 1),
        ("④", 1, 1, 2, 1),
    ],
    groups: CLASSIC_GROUPS,
    target: CLASSIC_TARGET,
};

/// 近在咫尺: generals low, free cells in row 1.
pub const JIN_ZAI_ZHI_CHI: Preset = Preset {
    name: "jin-zai-zhi-chi",
    title: "近在咫尺",
    board: CLASSIC_BOARD,
    pieces: &[
        ("操", 2, 2, 1, 3),
        ("羽", 2, 1, 1, 2),
        ("飞", 1, 2, 0, 3),
        ("云", 1, 2, 3, 3),
        ("超", 1, 2, 0, 0),
        ("忠", 1, 2, 3, 0),
        ("①", 1, 1, 1, 0),
        ("②", 1, 1, 2, 0),
        ("③", 1, 1, 0, 2),
        ("④", 1, 1, 3, 2),
    ],
    groups: CLASSIC_GROUPS,
    target: CLASSIC_TARGET,
};

/// 兵临城下: the horizontal piece at the exit.
pub const BING_LIN_CHENG_XIA: Preset = Preset {
    name: "bing-lin-cheng-xia",
    title: "兵临城下",
    board: CLASSIC_BOARD,
    pieces: &[
        ("操", 2, 2, 1, 3),
        ("羽", 2, 1, 1, 0),
        ("飞", 1, 2, 0, 3),
        ("云", 1, 2, 3, 3),
        ("超", 1, 2, 0, 1),
        ("忠", 1, 2, 3, 1),
        ("①", 1, 1, 1, 1),
        ("②", 1, 1, 2, 1),
        ("③", 1, 1, 0, 0),
        ("④", 1, 1, 3, 0),
    ],
    groups: CLASSIC_GROUPS,
    target: CLASSIC_TARGET,
};

/// 水泄不通: all soldiers on the bottom row.
pub const SHUI_XIE_BU_TONG: Preset = Preset {
    name: "shui-xie-bu-tong",
    title: "水泄不通",
    board: CLASSIC_BOARD,
    pieces: &[
        ("操", 2, 2, 1, 3),
        ("羽", 2, 1, 1, 2),
        ("飞", 1, 2, 0, 3),
        ("云", 1, 2, 3, 3),
        ("超", 1, 2, 0, 1),
        ("忠", 1, 2, 3, 1),
        ("①", 1, 1, 1, 0),
        ("②", 1, 1, 2, 0),
        ("③", 1, 1, 0, 0),
        ("④", 1, 1, 3, 0),
    ],
    groups: CLASSIC_GROUPS,
    target: CLASSIC_TARGET,
};

/// All built-in boards; the first is the default.
pub const PRESETS: &[&Preset] = &[
    &HENG_DAO_LI_MA,
    &HENG_DAO_LI_MA_A,
    &JIN_ZAI_ZHI_CHI,
    &BING_LIN_CHENG_XIA,
    &SHUI_XIE_BU_TONG,
];

/// Looks up a preset by its command-line name.
pub fn preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().copied().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for preset in PRESETS {
            let puzzle = preset
                .puzzle()
                .unwrap_or_else(|e| panic!("{} is invalid: {e}", preset.name));
            let free = puzzle.free_cells(puzzle.initial()).unwrap();
            assert_eq!(free.len(), 2, "{} should leave two cells free", preset.name);
        }
    }

    #[test]
    fn test_reference_free_cells() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let free = puzzle.free_cells(puzzle.initial()).unwrap();
        assert_eq!(free, vec![(1, 0), (2, 0)]);
        assert_eq!(
            puzzle.free_mode(puzzle.initial()).unwrap(),
            Some(FreeMode::Horizontal)
        );
        assert_eq!(puzzle.occupied_cells(puzzle.initial()).unwrap().len(), 18);
    }

    #[test]
    fn test_free_mode_classification() {
        assert_eq!(
            FreeMode::classify(&[(0, 0), (1, 0)]),
            Some(FreeMode::Horizontal)
        );
        assert_eq!(
            FreeMode::classify(&[(2, 1), (2, 2)]),
            Some(FreeMode::Vertical)
        );
        assert_eq!(
            FreeMode::classify(&[(0, 0), (1, 1)]),
            Some(FreeMode::Separated)
        );
        assert_eq!(FreeMode::classify(&[(0, 0)]), None);
        assert_eq!(FreeMode::classify(&[(0, 0), (1, 0), (2, 0)]), None);
    }

    #[test]
    fn test_overlap_is_rejected() {
        let pieces = vec![
            PieceSpec::new("a", 2, 2, 0, 0),
            PieceSpec::new("b", 1, 1, 1, 1),
        ];
        let err = Puzzle::new(Board::new(3, 3), pieces, vec![]).unwrap_err();
        assert!(matches!(err, PuzzleError::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let pieces = vec![PieceSpec::new("a", 2, 1, 2, 0)];
        let err = Puzzle::new(Board::new(3, 3), pieces, vec![]).unwrap_err();
        assert!(matches!(err, PuzzleError::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn test_invalid_state_is_reported() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let clash = puzzle.initial().with_anchor(6, (1, 0)).with_anchor(7, (1, 0));
        assert!(matches!(
            puzzle.free_cells(&clash),
            Err(PuzzleError::InvalidState(_))
        ));

        let short = State::new(vec![(1, 0)]);
        assert!(matches!(
            puzzle.occupied_cells(&short),
            Err(PuzzleError::InvalidState(_))
        ));
    }

    #[test]
    fn test_group_validation() {
        let pieces = || {
            vec![
                PieceSpec::new("t", 1, 1, 0, 0),
                PieceSpec::new("a", 1, 1, 1, 0),
                PieceSpec::new("b", 2, 1, 0, 1),
            ]
        };
        let board = Board::new(2, 3);

        let mixed = Puzzle::new(board, pieces(), vec![vec![1, 2]]);
        assert!(matches!(mixed, Err(PuzzleError::InvalidConfig(_))));

        let target = Puzzle::new(board, pieces(), vec![vec![0, 1]]);
        assert!(matches!(target, Err(PuzzleError::InvalidConfig(_))));

        let singleton = Puzzle::new(board, pieces(), vec![vec![1]]);
        assert!(matches!(singleton, Err(PuzzleError::InvalidConfig(_))));
    }

    #[test]
    fn test_board_size_limit() {
        let pieces = vec![PieceSpec::new("t", 1, 1, 0, 0)];
        let err = Puzzle::new(Board::new(9, 8), pieces, vec![]).unwrap_err();
        assert!(matches!(err, PuzzleError::InvalidConfig(_)));
    }

    #[test]
    fn test_shape_groups_match_classic_declaration() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let derived = shape_groups(puzzle.pieces());
        assert_eq!(derived, vec![vec![2, 3, 4, 5], vec![6, 7, 8, 9]]);
        assert_eq!(puzzle.groups(), derived.as_slice());
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(preset("shui-xie-bu-tong").unwrap().title, "水泄不通");
        assert!(preset("nope").is_none());
    }
}
