//! Flat occupancy grid and the brute-force verification search.
//!
//! The grid is a flat array, row-major from the bottom row, where each cell
//! holds a piece number (slot + 1) or 0 for empty. Every piece is its own
//! number, so no two placements are ever merged: this is the independent
//! oracle for the canonical engines, trading a much larger visited set for
//! having nothing in common with them beyond the puzzle definition.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{PuzzleError, Result};
use crate::geometry::Direction;
use crate::moves::MoveModel;
use crate::pieces::{Board, Cell, Goal, Puzzle, State};
use crate::CostModel;

const EMPTY: u8 = 0;

/// Converts a cell to its index in the flat grid.
#[inline(always)]
pub const fn cell_to_idx(board: Board, cell: Cell) -> usize {
    cell.1 as usize * board.width as usize + cell.0 as usize
}

/// Converts a flat grid index back to a cell.
#[inline(always)]
pub const fn idx_to_cell(board: Board, cell_index: usize) -> Cell {
    (
        (cell_index % board.width as usize) as i32,
        (cell_index / board.width as usize) as i32,
    )
}

/// Paints every piece of `state` that lies on the board, without checks.
fn paint(puzzle: &Puzzle, state: &State) -> Vec<u8> {
    let board = puzzle.board();
    let mut cells = vec![EMPTY; board.area()];
    for (slot, &(col, row)) in state.positions().iter().enumerate() {
        let (w, h) = puzzle.shape(slot);
        for y in row..row + h as i32 {
            for x in col..col + w as i32 {
                if board.contains((x, y)) {
                    cells[cell_to_idx(board, (x, y))] = slot as u8 + 1;
                }
            }
        }
    }
    cells
}

/// A placement with every piece individually identified.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    board: Board,
    cells: Vec<u8>,
}

impl Grid {
    /// Paints a valid state.
    pub fn from_state(puzzle: &Puzzle, state: &State) -> Result<Self> {
        puzzle.validate_state(state)?;
        Ok(Self {
            board: puzzle.board(),
            cells: paint(puzzle, state),
        })
    }

    /// Piece number at `cell` (slot + 1, or 0 when free); `None` off the board.
    pub fn get(&self, cell: Cell) -> Option<u8> {
        self.board
            .contains(cell)
            .then(|| self.cells[cell_to_idx(self.board, cell)])
    }

    /// Bottom-left cell of `slot`, found by scanning.
    ///
    /// The first cell of a rectangle in row-major order from the bottom is its
    /// anchor.
    pub fn anchor(&self, slot: usize) -> Option<Cell> {
        let number = slot as u8 + 1;
        self.cells
            .iter()
            .position(|&c| c == number)
            .map(|i| idx_to_cell(self.board, i))
    }

    /// Reads the anchors of `num_pieces` slots back into a state.
    pub fn to_state(&self, num_pieces: usize) -> Option<State> {
        (0..num_pieces)
            .map(|slot| self.anchor(slot))
            .collect::<Option<Vec<_>>>()
            .map(State::new)
    }

    /// Shifts every cell of `slot` by `distance`, checking each destination cell.
    fn shifted(&self, slot: usize, direction: Direction, distance: i32) -> Option<Grid> {
        let number = slot as u8 + 1;
        let (dc, dr) = direction.delta();
        let mut next: Vec<u8> = self
            .cells
            .iter()
            .map(|&c| if c == number { EMPTY } else { c })
            .collect();

        for (i, &c) in self.cells.iter().enumerate() {
            if c != number {
                continue;
            }
            let (col, row) = idx_to_cell(self.board, i);
            let target = (col + dc * distance, row + dr * distance);
            if !self.board.contains(target) {
                return None;
            }
            let t = cell_to_idx(self.board, target);
            if self.cells[t] != EMPTY && self.cells[t] != number {
                return None;
            }
            next[t] = number;
        }

        Some(Grid {
            board: self.board,
            cells: next,
        })
    }

    /// Every legal slide as `(slot, resulting grid)`.
    ///
    /// Longer slides are only tried while every shorter one in the same
    /// direction is legal, so pieces never pass through each other.
    pub fn neighbors(&self, num_pieces: usize, model: MoveModel) -> Vec<(usize, Grid)> {
        let max_distance = match model {
            MoveModel::SingleCell => 1,
            MoveModel::MultiCellSlide => self.board.width.max(self.board.height) as i32,
        };
        let mut out = Vec::new();
        for slot in 0..num_pieces {
            for direction in Direction::ALL {
                for k in 1..=max_distance {
                    match self.shifted(slot, direction, k) {
                        Some(grid) => out.push((slot, grid)),
                        None => break,
                    }
                }
            }
        }
        out
    }
}

/// Result of a brute-force search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BruteForce {
    /// Minimal cost, or `None` when the goal is unreachable.
    pub distance: Option<usize>,
    /// Distinct search nodes discovered.
    pub explored: usize,
}

/// Minimal cost to the goal over raw grids, with no equivalence merging.
///
/// Both cost models run through one deque search: unit-cost edges go to the
/// back, and under [`CostModel::TurnCount`] continuing with the last piece is
/// a zero-cost edge pushed to the front. The last piece is only part of the
/// node for the turn model.
pub fn brute_force_distance(
    puzzle: &Puzzle,
    start: &State,
    goal: &Goal,
    move_model: MoveModel,
    cost_model: CostModel,
) -> Result<BruteForce> {
    let root = Grid::from_state(puzzle, start)?;
    if !puzzle.board().contains(goal.anchor) {
        return Err(PuzzleError::InvalidConfig(format!(
            "target {:?} is off the board",
            goal.anchor
        )));
    }
    let num_pieces = puzzle.num_pieces();
    let track_last = cost_model == CostModel::TurnCount;

    let mut best: FxHashMap<(Grid, Option<usize>), usize> = FxHashMap::default();
    let mut deque: VecDeque<(Grid, Option<usize>, usize)> = VecDeque::new();
    best.insert((root.clone(), None), 0);
    deque.push_back((root, None, 0));

    while let Some((grid, last, cost)) = deque.pop_front() {
        if best.get(&(grid.clone(), last)).is_some_and(|&known| known < cost) {
            continue;
        }
        if grid.anchor(0) == Some(goal.anchor) {
            debug!(
                model = %move_model,
                cost,
                explored = best.len(),
                "brute force reached goal"
            );
            return Ok(BruteForce {
                distance: Some(cost),
                explored: best.len(),
            });
        }

        for (slot, next) in grid.neighbors(num_pieces, move_model) {
            let edge = match cost_model {
                CostModel::UnitMoveCount => 1,
                CostModel::TurnCount => usize::from(last != Some(slot)),
            };
            let next_cost = cost + edge;
            let next_last = track_last.then_some(slot);
            let key = (next, next_last);
            if best.get(&key).is_some_and(|&known| known <= next_cost) {
                continue;
            }
            best.insert(key.clone(), next_cost);
            let (next, next_last) = key;
            if edge == 0 {
                deque.push_front((next, next_last, next_cost));
            } else {
                deque.push_back((next, next_last, next_cost));
            }
        }
    }

    debug!(model = %move_model, explored = best.len(), "brute force exhausted");
    Ok(BruteForce {
        distance: None,
        explored: best.len(),
    })
}

/// Character for a piece number in [`format_state`].
fn piece_char(number: u8) -> char {
    match number {
        EMPTY => '.',
        1..=10 => char::from(b'0' + number - 1),
        11..=36 => char::from(b'A' + number - 11),
        37..=62 => char::from(b'a' + number - 37),
        _ => '#',
    }
}

/// Formats a state as text, top row first.
///
/// Each cell shows the slot of the piece covering it (`0-9`, then `A-Z`) or
/// `.` when free.
pub fn format_state(puzzle: &Puzzle, state: &State) -> String {
    let board = puzzle.board();
    let cells = paint(puzzle, state);

    let mut output = String::with_capacity(board.area() + board.height as usize);
    for row in (0..board.height as i32).rev() {
        for col in 0..board.width as i32 {
            output.push(piece_char(cells[cell_to_idx(board, (col, row))]));
        }
        output.push('\n');
    }
    output
}
