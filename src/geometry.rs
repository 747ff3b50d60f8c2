//! Axis directions and rectangle footprints on a bounded grid.
//!
//! Cells are addressed as `(col, row)` with row 0 at the bottom. Footprints are
//! `u64` bitmasks with bit `row * width + col` set for every covered cell, which
//! caps boards at 64 cells and turns collision checks into a single AND.

use std::fmt;

use crate::pieces::{Board, Cell, Shape};

/// Bitmask over board cells.
pub type Mask = u64;

/// Largest board the bitmask representation supports.
pub const MAX_CELLS: usize = 64;

/// One of the four axis directions a piece can slide in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Right,
    Left,
    Up,
    Down,
}

impl Direction {
    /// All directions, in the order neighbors are generated.
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Up,
        Direction::Down,
    ];

    /// Unit step `(dcol, drow)`; `Up` increases the row.
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
        }
    }

    /// The direction that undoes a slide in this one.
    #[inline]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Arrow glyph used in move listings.
    pub const fn arrow(self) -> char {
        match self {
            Direction::Right => '→',
            Direction::Left => '←',
            Direction::Up => '↑',
            Direction::Down => '↓',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.arrow())
    }
}

/// Translates `cell` by `distance` steps in `direction`.
#[inline]
pub fn offset(cell: Cell, direction: Direction, distance: i32) -> Cell {
    let (dc, dr) = direction.delta();
    (cell.0 + dc * distance, cell.1 + dr * distance)
}

/// Returns true if a rectangle of `shape` anchored at `anchor` fits on the board.
#[inline]
pub fn fits(board: Board, anchor: Cell, shape: Shape) -> bool {
    let (col, row) = anchor;
    col >= 0
        && row >= 0
        && col + shape.0 as i32 <= board.width as i32
        && row + shape.1 as i32 <= board.height as i32
}

/// Bit index of a cell inside the board.
#[inline(always)]
pub fn cell_bit(board: Board, cell: Cell) -> u32 {
    (cell.1 as u32) * board.width as u32 + cell.0 as u32
}

/// Inverse of [`cell_bit`].
#[inline(always)]
pub fn bit_cell(board: Board, bit: u32) -> Cell {
    (
        (bit % board.width as u32) as i32,
        (bit / board.width as u32) as i32,
    )
}

/// Footprint of a rectangle, or `None` if any part of it leaves the board.
pub fn footprint(board: Board, anchor: Cell, shape: Shape) -> Option<Mask> {
    if !fits(board, anchor, shape) {
        return None;
    }

    // one row strip of the shape's width, shifted up row by row
    let row_strip: Mask = (Mask::MAX >> (64 - shape.0 as u32)) << anchor.0;
    let mut mask = 0;
    for dr in 0..shape.1 as i32 {
        mask |= row_strip << ((anchor.1 + dr) as u32 * board.width as u32);
    }
    Some(mask)
}

/// Cells a piece would newly cover after sliding `distance` steps.
///
/// This is the new footprint minus the old one: for a slide shorter than the
/// piece's extent along the axis it is only the leading strips. Returns `None`
/// if the slid rectangle leaves the board.
pub fn frontier(
    board: Board,
    anchor: Cell,
    shape: Shape,
    direction: Direction,
    distance: i32,
) -> Option<Mask> {
    let old = footprint(board, anchor, shape)?;
    let new = footprint(board, offset(anchor, direction, distance), shape)?;
    Some(new & !old)
}

/// Expands a mask into its cells, lowest bit first (row-major from the bottom).
pub fn mask_cells(board: Board, mut mask: Mask) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(mask.count_ones() as usize);
    while mask != 0 {
        let bit = mask.trailing_zeros();
        cells.push(bit_cell(board, bit));
        mask &= mask - 1;
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: Board = Board {
        width: 4,
        height: 5,
    };

    #[test]
    fn test_opposite_is_involution() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            let (dc, dr) = direction.delta();
            let (oc, or) = direction.opposite().delta();
            assert_eq!((dc + oc, dr + or), (0, 0));
        }
    }

    #[test]
    fn test_footprint_of_square() {
        let mask = footprint(BOARD, (1, 3), (2, 2)).unwrap();
        let cells = mask_cells(BOARD, mask);
        assert_eq!(cells, vec![(1, 3), (2, 3), (1, 4), (2, 4)]);
    }

    #[test]
    fn test_footprint_rejects_out_of_bounds() {
        assert!(footprint(BOARD, (3, 0), (2, 1)).is_none());
        assert!(footprint(BOARD, (0, 4), (1, 2)).is_none());
        assert!(footprint(BOARD, (-1, 0), (1, 1)).is_none());
    }

    #[test]
    fn test_frontier_is_leading_strip() {
        // a 2x2 sliding down one row only needs the row below it
        let strip = frontier(BOARD, (1, 2), (2, 2), Direction::Down, 1).unwrap();
        assert_eq!(mask_cells(BOARD, strip), vec![(1, 1), (2, 1)]);

        // sliding two rows needs both rows below
        let strip = frontier(BOARD, (1, 2), (2, 2), Direction::Down, 2).unwrap();
        assert_eq!(
            mask_cells(BOARD, strip),
            vec![(1, 0), (2, 0), (1, 1), (2, 1)]
        );
    }

    #[test]
    fn test_cell_bit_roundtrip() {
        for bit in 0..20 {
            let cell = bit_cell(BOARD, bit);
            assert!(cell.0 < 4 && cell.1 < 5, "bit {bit} left the board");
            assert_eq!(cell_bit(BOARD, cell), bit);
        }
    }
}
