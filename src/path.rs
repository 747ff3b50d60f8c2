//! Solution paths and search outcomes.

use std::ops::Range;

use crate::geometry::{self, Direction};
use crate::moves::Move;
use crate::pieces::{Cell, Puzzle, State};

/// One move of a path with the state it produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub mv: Move,
    pub state: State,
}

/// A maximal run of consecutive moves of one piece.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub piece: usize,
    /// Indices into [`Path::steps`].
    pub steps: Range<usize>,
}

impl Turn {
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// An ordered sequence of moves from a start state.
///
/// Piece indices refer to the slots of the start state as given by the
/// caller, and follow each physical piece through the whole path even when
/// interchangeable pieces were merged during the search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    start: State,
    steps: Vec<Step>,
}

impl Path {
    pub fn new(start: State) -> Self {
        Self {
            start,
            steps: Vec::new(),
        }
    }

    #[inline]
    pub fn start(&self) -> &State {
        &self.start
    }

    #[inline]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of moves.
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// State after the last move, or the start of an empty path.
    pub fn final_state(&self) -> &State {
        self.steps.last().map_or(&self.start, |step| &step.state)
    }

    /// State after `moves` moves; `state_at(0)` is the start.
    pub fn state_at(&self, moves: usize) -> Option<&State> {
        match moves {
            0 => Some(&self.start),
            n => self.steps.get(n - 1).map(|step| &step.state),
        }
    }

    /// Appends a move and the state it produced.
    pub fn push(&mut self, mv: Move, state: State) {
        self.steps.push(Step { mv, state });
    }

    /// Groups consecutive moves of the same piece.
    pub fn turns(&self) -> Vec<Turn> {
        let mut turns: Vec<Turn> = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            match turns.last_mut() {
                Some(turn) if turn.piece == step.mv.piece => turn.steps.end = index + 1,
                _ => turns.push(Turn {
                    piece: step.mv.piece,
                    steps: index..index + 1,
                }),
            }
        }
        turns
    }

    /// Number of piece engagements along this path.
    ///
    /// For a path that minimizes moves this is only an upper bound on the
    /// fewest turns needed to reach the same goal.
    pub fn turn_count(&self) -> usize {
        self.steps
            .iter()
            .zip(self.steps.iter().skip(1))
            .filter(|(a, b)| a.mv.piece != b.mv.piece)
            .count()
            + usize::from(!self.steps.is_empty())
    }

    /// Rebuilds a path from slides recorded by the position they started at.
    ///
    /// Search engines work on canonical keys where interchangeable pieces may
    /// change slots from one state to the next. Anchors are unique within a
    /// state, so each slide is resolved to the slot of `start` that physically
    /// sits at the recorded cell.
    pub(crate) fn replay(puzzle: &Puzzle, start: &State, slides: &[Slide]) -> Path {
        let mut path = Path::new(start.clone());
        let mut current = start.clone();
        for slide in slides {
            let piece = current
                .slot_at(slide.from)
                .expect("search recorded a slide from a cell with no anchor");
            let mv = Move::new(piece, slide.direction, slide.distance);
            debug_assert!(
                mv.apply(puzzle, &current).is_some(),
                "replayed move {mv} is illegal"
            );
            let target = geometry::offset(slide.from, slide.direction, slide.distance as i32);
            current = current.with_anchor(piece, target);
            path.push(mv, current.clone());
        }
        path
    }
}

/// A move recorded by the anchor it started from rather than by slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Slide {
    pub from: Cell,
    pub direction: Direction,
    pub distance: u8,
}

impl Slide {
    #[inline]
    pub fn of(state: &State, mv: Move) -> Self {
        Self {
            from: state[mv.piece],
            direction: mv.direction,
            distance: mv.distance,
        }
    }
}

/// A minimal-cost solution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    /// Moves or turns, depending on the cost model searched.
    pub cost: usize,
    pub path: Path,
    /// Search nodes discovered before the goal was reached.
    pub explored: usize,
}

/// Result of an exhaustive search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Solved(Solution),
    /// The goal is not reachable from the start state.
    Unreachable,
}

impl Outcome {
    /// Minimal cost, or `None` when unreachable.
    pub fn cost(&self) -> Option<usize> {
        self.solution().map(|s| s.cost)
    }

    pub fn solution(&self) -> Option<&Solution> {
        match self {
            Outcome::Solved(solution) => Some(solution),
            Outcome::Unreachable => None,
        }
    }

    pub fn into_solution(self) -> Option<Solution> {
        match self {
            Outcome::Solved(solution) => Some(solution),
            Outcome::Unreachable => None,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Outcome::Unreachable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::HENG_DAO_LI_MA;

    fn sample_path() -> Path {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let slides = [Slide {
            from: (1, 1),
            direction: Direction::Down,
            distance: 1,
        }];
        Path::replay(&puzzle, puzzle.initial(), &slides)
    }

    #[test]
    fn test_replay_resolves_slots_by_anchor() {
        let path = sample_path();
        assert_eq!(path.len(), 1);
        assert_eq!(path.steps()[0].mv, Move::new(6, Direction::Down, 1));
        assert_eq!(path.final_state()[6], (1, 0));
        assert_eq!(path.state_at(0), Some(path.start()));
        assert_eq!(path.state_at(1), Some(path.final_state()));
        assert_eq!(path.state_at(2), None);
    }

    #[test]
    fn test_turn_grouping() {
        let start = State::new(vec![(0, 0), (2, 0)]);
        let mut path = Path::new(start);
        let moves = [
            Move::new(0, Direction::Up, 1),
            Move::new(0, Direction::Right, 1),
            Move::new(1, Direction::Up, 1),
            Move::new(0, Direction::Down, 1),
            Move::new(0, Direction::Down, 1),
        ];
        for mv in moves {
            path.push(mv, State::new(vec![(0, 0), (2, 0)]));
        }

        let turns = path.turns();
        assert_eq!(
            turns,
            vec![
                Turn {
                    piece: 0,
                    steps: 0..2
                },
                Turn {
                    piece: 1,
                    steps: 2..3
                },
                Turn {
                    piece: 0,
                    steps: 3..5
                },
            ]
        );
        assert_eq!(path.turn_count(), 3);
        assert_eq!(turns.iter().map(Turn::len).sum::<usize>(), path.len());
    }

    #[test]
    fn test_empty_path() {
        let path = Path::new(State::new(vec![(0, 0)]));
        assert!(path.is_empty());
        assert_eq!(path.turn_count(), 0);
        assert!(path.turns().is_empty());
        assert_eq!(path.final_state(), path.start());
    }
}
