//! Breadth-first search over canonical states.
//!
//! Every edge costs one move, so the first goal state taken off the FIFO
//! frontier is at minimal distance. Key choices:
//! - Nodes are canonical keys, so permutations of identical pieces are
//!   explored once
//! - Parents live in a flat arena indexed by `u32`, with only the slide that
//!   reached each node; states are rebuilt by replaying from the start
//! - FxHashMap for the visited set
//! - One reusable neighbor buffer for the whole run

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::canonical::CanonicalKey;
use crate::error::Result;
use crate::geometry::Mask;
use crate::moves::{MoveModel, Neighbor};
use crate::path::{Outcome, Path, Slide, Solution};
use crate::pieces::{Puzzle, State};

/// Arena entry: how a canonical state was first reached.
struct Node {
    parent: Option<u32>,
    slide: Option<Slide>,
}

/// Finds a path with the fewest moves to a state satisfying `is_goal`.
///
/// `is_goal` is evaluated on canonical keys, so it must not distinguish
/// between interchangeable pieces. Returns [`Outcome::Unreachable`] once the
/// reachable space is exhausted without meeting the goal, and
/// [`crate::PuzzleError::InvalidState`] if `start` is not a legal placement.
pub fn shortest_path<G>(
    puzzle: &Puzzle,
    start: &State,
    model: MoveModel,
    is_goal: G,
) -> Result<Outcome>
where
    G: Fn(&State) -> bool,
{
    puzzle.validate_state(start)?;
    let root = puzzle.canonical_key(start);

    let mut index: FxHashMap<CanonicalKey, u32> = FxHashMap::default();
    let mut nodes: Vec<Node> = Vec::new();
    let mut frontier: VecDeque<(u32, CanonicalKey)> = VecDeque::new();
    let mut buffer: Vec<Neighbor> = Vec::new();

    index.insert(root.clone(), 0);
    nodes.push(Node {
        parent: None,
        slide: None,
    });
    frontier.push_back((0, root));

    while let Some((id, key)) = frontier.pop_front() {
        if is_goal(key.as_state()) {
            let path = Path::replay(puzzle, start, &trace_back(&nodes, id));
            debug!(
                model = %model,
                moves = path.len(),
                explored = nodes.len(),
                "shortest path found"
            );
            return Ok(Outcome::Solved(Solution {
                cost: path.len(),
                path,
                explored: nodes.len(),
            }));
        }

        buffer.clear();
        puzzle.neighbors_into(key.as_state(), model, &mut buffer);
        for neighbor in buffer.drain(..) {
            let slide = Slide::of(key.as_state(), neighbor.mv);
            let child = puzzle.into_canonical(neighbor.state);
            if index.contains_key(&child) {
                continue;
            }
            let child_id = nodes.len() as u32;
            nodes.push(Node {
                parent: Some(id),
                slide: Some(slide),
            });
            index.insert(child.clone(), child_id);
            frontier.push_back((child_id, child));
        }
    }

    debug!(model = %model, explored = nodes.len(), "goal unreachable");
    Ok(Outcome::Unreachable)
}

/// Collects the slides leading to `id`, first move first.
fn trace_back(nodes: &[Node], mut id: u32) -> Vec<Slide> {
    let mut slides = Vec::new();
    while let Node {
        parent: Some(parent),
        slide: Some(slide),
    } = nodes[id as usize]
    {
        slides.push(slide);
        id = parent;
    }
    slides.reverse();
    slides
}

/// Distances from one start state to every reachable canonical state.
pub struct DistanceMap<'p> {
    puzzle: &'p Puzzle,
    model: MoveModel,
    distances: FxHashMap<CanonicalKey, u32>,
}

impl<'p> DistanceMap<'p> {
    /// Runs a full breadth-first traversal from `start`, which must be a
    /// legal placement.
    pub fn build(puzzle: &'p Puzzle, start: &State, model: MoveModel) -> Result<Self> {
        puzzle.validate_state(start)?;
        let root = puzzle.canonical_key(start);
        let mut distances: FxHashMap<CanonicalKey, u32> = FxHashMap::default();
        let mut frontier: VecDeque<(CanonicalKey, u32)> = VecDeque::new();
        let mut buffer: Vec<Neighbor> = Vec::new();
        let mut layer = 0;

        distances.insert(root.clone(), 0);
        frontier.push_back((root, 0));

        while let Some((key, distance)) = frontier.pop_front() {
            if distance > layer {
                trace!(depth = distance, discovered = distances.len(), "bfs layer");
                layer = distance;
            }

            buffer.clear();
            puzzle.neighbors_into(key.as_state(), model, &mut buffer);
            for neighbor in buffer.drain(..) {
                let child = puzzle.into_canonical(neighbor.state);
                if !distances.contains_key(&child) {
                    distances.insert(child.clone(), distance + 1);
                    frontier.push_back((child, distance + 1));
                }
            }
        }

        debug!(
            model = %model,
            states = distances.len(),
            eccentricity = layer,
            "distance map complete"
        );

        Ok(Self {
            puzzle,
            model,
            distances,
        })
    }

    #[inline]
    pub fn model(&self) -> MoveModel {
        self.model
    }

    /// Distance to `state` in moves, or `None` if it is not reachable.
    pub fn distance(&self, state: &State) -> Option<usize> {
        self.distances
            .get(&self.puzzle.canonical_key(state))
            .map(|&d| d as usize)
    }

    /// Distance to an already canonical key.
    #[inline]
    pub fn distance_to_key(&self, key: &CanonicalKey) -> Option<usize> {
        self.distances.get(key).map(|&d| d as usize)
    }

    /// Number of reachable canonical states, including the start.
    #[inline]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Largest distance from the start to any reachable state.
    pub fn eccentricity(&self) -> usize {
        self.distances.values().copied().max().unwrap_or(0) as usize
    }

    /// Number of distinct free-cell sets over all reachable states.
    pub fn free_cell_sets(&self) -> usize {
        let full = self.puzzle.board().full_mask();
        self.distances
            .keys()
            .map(|key| full & !self.puzzle.occupied_mask(key.as_state()))
            .collect::<FxHashSet<Mask>>()
            .len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalKey, usize)> {
        self.distances.iter().map(|(key, &d)| (key, d as usize))
    }
}

/// Convenience wrapper for [`DistanceMap::build`].
pub fn distance_map<'p>(
    puzzle: &'p Puzzle,
    start: &State,
    model: MoveModel,
) -> Result<DistanceMap<'p>> {
    DistanceMap::build(puzzle, start, model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PuzzleError;
    use crate::pieces::{
        Board, Goal, PieceSpec, BING_LIN_CHENG_XIA, HENG_DAO_LI_MA, HENG_DAO_LI_MA_A,
        JIN_ZAI_ZHI_CHI, SHUI_XIE_BU_TONG,
    };
    use crate::test_boards;

    #[test]
    fn test_reference_single_cell_minimum() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let goal = HENG_DAO_LI_MA.goal();
        let outcome = shortest_path(&puzzle, puzzle.initial(), MoveModel::SingleCell, |s| {
            goal.is_met(s)
        })
        .unwrap();
        let solution = outcome.solution().expect("reference board is solvable");
        assert_eq!(solution.cost, 116);
        assert_eq!(solution.path.len(), 116);
        assert!(goal.is_met(solution.path.final_state()));
    }

    #[test]
    fn test_reference_multi_cell_minimum() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let goal = HENG_DAO_LI_MA.goal();
        let outcome = shortest_path(&puzzle, puzzle.initial(), MoveModel::MultiCellSlide, |s| {
            goal.is_met(s)
        })
        .unwrap();
        assert_eq!(outcome.cost(), Some(90));
    }

    #[test]
    fn test_preset_minimums() {
        let expected = [
            (&HENG_DAO_LI_MA_A, 116, 90),
            (&JIN_ZAI_ZHI_CHI, 100, 79),
            (&BING_LIN_CHENG_XIA, 98, 75),
            (&SHUI_XIE_BU_TONG, 118, 90),
        ];
        for (preset, single, multi) in expected {
            let puzzle = preset.puzzle().unwrap();
            let goal = preset.goal();
            let run = |model| {
                shortest_path(&puzzle, puzzle.initial(), model, |s| goal.is_met(s))
                    .unwrap()
                    .cost()
            };
            assert_eq!(run(MoveModel::SingleCell), Some(single), "{}", preset.name);
            assert_eq!(run(MoveModel::MultiCellSlide), Some(multi), "{}", preset.name);
        }
    }

    #[test]
    fn test_path_replays_legally() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let goal = HENG_DAO_LI_MA.goal();
        for model in [MoveModel::SingleCell, MoveModel::MultiCellSlide] {
            let solution = shortest_path(&puzzle, puzzle.initial(), model, |s| goal.is_met(s))
                .unwrap()
                .into_solution()
                .unwrap();
            let mut current = puzzle.initial().clone();
            for step in solution.path.steps() {
                if model == MoveModel::SingleCell {
                    assert_eq!(step.mv.distance, 1);
                }
                current = step
                    .mv
                    .apply(&puzzle, &current)
                    .unwrap_or_else(|| panic!("illegal move {}", step.mv));
                assert_eq!(current, step.state);
            }
        }
    }

    #[test]
    fn test_reference_state_space() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let single = distance_map(&puzzle, puzzle.initial(), MoveModel::SingleCell).unwrap();
        assert_eq!(single.len(), 25955);
        assert_eq!(single.eccentricity(), 167);

        let multi = distance_map(&puzzle, puzzle.initial(), MoveModel::MultiCellSlide).unwrap();
        assert_eq!(multi.len(), 25955);
        assert_eq!(multi.eccentricity(), 133);
    }

    #[test]
    fn test_permuted_states_share_key_and_occupancy() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let map = distance_map(&puzzle, puzzle.initial(), MoveModel::SingleCell).unwrap();
        for (key, _) in map.iter() {
            // reverse every group: a different raw assignment of the same pieces
            let mut positions = key.positions().to_vec();
            for group in puzzle.groups() {
                let anchors: Vec<_> = group.iter().map(|&slot| positions[slot]).collect();
                for (&slot, &anchor) in group.iter().zip(anchors.iter().rev()) {
                    positions[slot] = anchor;
                }
            }
            let permuted = State::new(positions);

            assert_eq!(&puzzle.canonical_key(&permuted), key);
            assert_eq!(
                puzzle.occupancy(&permuted).unwrap(),
                puzzle.occupancy(key.as_state()).unwrap(),
                "one key maps to two occupancies"
            );
        }
    }

    #[test]
    fn test_distance_map_agrees_with_search() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let goal = HENG_DAO_LI_MA.goal();
        let solution = shortest_path(&puzzle, puzzle.initial(), MoveModel::SingleCell, |s| {
            goal.is_met(s)
        })
        .unwrap()
        .into_solution()
        .unwrap();
        let map = distance_map(&puzzle, puzzle.initial(), MoveModel::SingleCell).unwrap();
        for (moves, step) in solution.path.steps().iter().enumerate() {
            assert_eq!(map.distance(&step.state), Some(moves + 1));
        }
    }

    #[test]
    fn test_reachability_is_symmetric() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let goal = HENG_DAO_LI_MA.goal();
        for model in [MoveModel::SingleCell, MoveModel::MultiCellSlide] {
            let solution = shortest_path(&puzzle, puzzle.initial(), model, |s| goal.is_met(s))
                .unwrap()
                .into_solution()
                .unwrap();
            let end = solution.path.final_state();
            let forward = distance_map(&puzzle, puzzle.initial(), model).unwrap();
            let backward = distance_map(&puzzle, end, model).unwrap();
            assert_eq!(forward.distance(end), backward.distance(puzzle.initial()));
            assert_eq!(forward.distance(end), Some(solution.cost));
        }
    }

    #[test]
    fn test_search_is_deterministic() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let goal = HENG_DAO_LI_MA.goal();
        let run = || {
            shortest_path(&puzzle, puzzle.initial(), MoveModel::MultiCellSlide, |s| {
                goal.is_met(s)
            })
            .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_start_at_goal() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let goal = Goal::new(puzzle.initial()[0]);
        let outcome = shortest_path(&puzzle, puzzle.initial(), MoveModel::SingleCell, |s| {
            goal.is_met(s)
        })
        .unwrap();
        let solution = outcome.solution().unwrap();
        assert_eq!(solution.cost, 0);
        assert!(solution.path.is_empty());
    }

    #[test]
    fn test_unreachable_is_reported() {
        // nothing can move on a full board
        let pieces = vec![
            PieceSpec::new("t", 2, 1, 0, 1),
            PieceSpec::new("b", 2, 1, 0, 0),
        ];
        let puzzle = Puzzle::new(Board::new(2, 2), pieces, vec![]).unwrap();
        let outcome = shortest_path(&puzzle, puzzle.initial(), MoveModel::SingleCell, |s| {
            s[0] == (0, 0)
        })
        .unwrap();
        assert!(outcome.is_unreachable());
        assert_eq!(outcome.cost(), None);

        // the target cannot pass the blocker in a single-row corridor
        let puzzle = test_boards::corridor();
        for model in [MoveModel::SingleCell, MoveModel::MultiCellSlide] {
            let outcome =
                shortest_path(&puzzle, puzzle.initial(), model, |s| s[0] == (2, 0)).unwrap();
            assert!(outcome.is_unreachable());
            assert_eq!(distance_map(&puzzle, puzzle.initial(), model).unwrap().len(), 3);
        }
    }

    #[test]
    fn test_small_board_minimums() {
        let cases = [
            (test_boards::three_by_four(), (1, 2), 5, 4),
            (test_boards::four_by_four(), (2, 2), 7, 5),
            (test_boards::eight_soldiers(), (2, 0), 13, 13),
        ];
        for (puzzle, target, single, multi) in cases {
            let goal = Goal::new(target);
            let run = |model| {
                shortest_path(&puzzle, puzzle.initial(), model, |s| goal.is_met(s))
                    .unwrap()
                    .cost()
            };
            assert_eq!(run(MoveModel::SingleCell), Some(single));
            assert_eq!(run(MoveModel::MultiCellSlide), Some(multi));
        }
    }

    #[test]
    fn test_overlapping_start_is_rejected() {
        let puzzle = HENG_DAO_LI_MA.puzzle().unwrap();
        let goal = HENG_DAO_LI_MA.goal();
        let stacked = puzzle.initial().with_anchor(7, puzzle.initial()[6]);
        let outcome = shortest_path(&puzzle, &stacked, MoveModel::SingleCell, |s| goal.is_met(s));
        assert!(matches!(outcome, Err(PuzzleError::InvalidState(_))));
        assert!(matches!(
            distance_map(&puzzle, &stacked, MoveModel::MultiCellSlide),
            Err(PuzzleError::InvalidState(_))
        ));

        let off_board = puzzle.initial().with_anchor(6, (4, 0));
        assert!(distance_map(&puzzle, &off_board, MoveModel::SingleCell).is_err());
    }
}
