//! Neighbor generation under the single-cell and multi-cell slide models.

use std::fmt;

use crate::geometry::{self, Direction, Mask};
use crate::pieces::{Puzzle, State};

/// Which slides count as one move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveModel {
    /// A move slides one piece exactly one cell.
    SingleCell,
    /// A move slides one piece any number of cells in one direction.
    MultiCellSlide,
}

impl MoveModel {
    /// Longest slide considered on `puzzle`'s board.
    #[inline]
    pub fn max_distance(self, puzzle: &Puzzle) -> i32 {
        match self {
            MoveModel::SingleCell => 1,
            MoveModel::MultiCellSlide => {
                let board = puzzle.board();
                board.width.max(board.height) as i32
            }
        }
    }
}

impl fmt::Display for MoveModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveModel::SingleCell => write!(f, "single-cell"),
            MoveModel::MultiCellSlide => write!(f, "multi-cell"),
        }
    }
}

/// A slide of one piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub piece: usize,
    pub direction: Direction,
    pub distance: u8,
}

impl Move {
    pub const fn new(piece: usize, direction: Direction, distance: u8) -> Self {
        Self {
            piece,
            direction,
            distance,
        }
    }

    /// The slide that undoes this one.
    pub const fn reversed(self) -> Move {
        Move::new(self.piece, self.direction.opposite(), self.distance)
    }

    /// Applies the move if every intermediate position is free and on the board.
    pub fn apply(&self, puzzle: &Puzzle, state: &State) -> Option<State> {
        if self.piece >= state.len() || self.distance == 0 {
            return None;
        }
        let occupied = puzzle.occupied_mask(state);
        let anchor = state[self.piece];
        let shape = puzzle.shape(self.piece);
        for k in 1..=self.distance as i32 {
            let strip = geometry::frontier(puzzle.board(), anchor, shape, self.direction, k)?;
            if strip & occupied != 0 {
                return None;
            }
        }
        let target = geometry::offset(anchor, self.direction, self.distance as i32);
        Some(state.with_anchor(self.piece, target))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}{}", self.piece, self.direction)?;
        if self.distance > 1 {
            write!(f, "{}", self.distance)?;
        }
        Ok(())
    }
}

/// A state one move away, with the move that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighbor {
    pub state: State,
    pub mv: Move,
}

impl Puzzle {
    /// Appends every legal neighbor of `state` to `out`.
    ///
    /// For each piece and direction, slides of increasing distance are tried
    /// until the frontier strip is blocked or the piece would leave the board,
    /// so a piece never jumps over an obstruction. `state` must be valid.
    pub fn neighbors_into(&self, state: &State, model: MoveModel, out: &mut Vec<Neighbor>) {
        let occupied: Mask = self.occupied_mask(state);
        let max_distance = model.max_distance(self);
        let board = self.board();

        for piece in 0..state.len() {
            let anchor = state[piece];
            let shape = self.shape(piece);
            for direction in Direction::ALL {
                for k in 1..=max_distance {
                    let Some(strip) = geometry::frontier(board, anchor, shape, direction, k)
                    else {
                        break;
                    };
                    if strip & occupied != 0 {
                        break;
                    }
                    out.push(Neighbor {
                        state: state.with_anchor(piece, geometry::offset(anchor, direction, k)),
                        mv: Move::new(piece, direction, k as u8),
                    });
                }
            }
        }
    }

    /// Collects every legal neighbor of `state`.
    pub fn neighbors(&self, state: &State, model: MoveModel) -> Vec<Neighbor> {
        let mut out = Vec::new();
        self.neighbors_into(state, model, &mut out);
        out
    }
}
