//! Sliding-Block Puzzle Solver Library
//!
//! Exact solvers for rectangular sliding-block puzzles in the Klotski /
//! Huarong Dao family: canonical breadth-first search for the fewest moves,
//! a 0/1 search for the fewest piece turns, a bidirectional saddle analysis
//! of a solution, and a brute-force oracle used to verify all of them.

pub mod analysis;
pub mod canonical;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod moves;
pub mod path;
pub mod pieces;
pub mod saddle;
pub mod solver;
pub mod turns;

use std::fmt;

pub use canonical::CanonicalKey;
pub use error::{PuzzleError, Result};
pub use moves::{Move, MoveModel};
pub use path::{Outcome, Path, Solution};
pub use pieces::{Board, Goal, PieceSpec, Puzzle, State};

use grid::BruteForce;

/// What a solution minimizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CostModel {
    /// Every move costs one.
    UnitMoveCount,
    /// Each maximal run of moves of one piece costs one.
    TurnCount,
}

impl fmt::Display for CostModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostModel::UnitMoveCount => write!(f, "moves"),
            CostModel::TurnCount => write!(f, "turns"),
        }
    }
}

/// A move model and a cost model, chosen independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SolveOptions {
    pub move_model: MoveModel,
    pub cost_model: CostModel,
}

impl SolveOptions {
    pub const fn new(move_model: MoveModel, cost_model: CostModel) -> Self {
        Self {
            move_model,
            cost_model,
        }
    }
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self::new(MoveModel::SingleCell, CostModel::UnitMoveCount)
    }
}

/// Finds a minimal-cost path from `start` to `goal`.
///
/// A `start` with overlapping or off-board pieces is rejected with
/// [`PuzzleError::InvalidState`] before any search runs.
pub fn solve(
    puzzle: &Puzzle,
    start: &State,
    goal: &Goal,
    options: SolveOptions,
) -> Result<Outcome> {
    let is_goal = |state: &State| goal.is_met(state);
    match options.cost_model {
        CostModel::UnitMoveCount => {
            solver::shortest_path(puzzle, start, options.move_model, is_goal)
        }
        CostModel::TurnCount => turns::fewest_turns(puzzle, start, options.move_model, is_goal),
    }
}

/// Canonical optimum next to the brute-force optimum for the same problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verification {
    pub canonical: Outcome,
    pub brute_force: BruteForce,
}

impl Verification {
    pub fn agrees(&self) -> bool {
        self.canonical.cost() == self.brute_force.distance
    }
}

/// Solves once with the canonical engines and once without any merging.
pub fn verify(
    puzzle: &Puzzle,
    start: &State,
    goal: &Goal,
    options: SolveOptions,
) -> Result<Verification> {
    let brute_force =
        grid::brute_force_distance(puzzle, start, goal, options.move_model, options.cost_model)?;
    Ok(Verification {
        canonical: solve(puzzle, start, goal, options)?,
        brute_force,
    })
}
