//! Fewest piece engagements via 0/1 breadth-first search.
//!
//! A turn is a maximal run of moves of one piece. Moving the piece that moved
//! last is free; moving any other piece costs one. The search state is a
//! canonical key plus the slot (in that key's numbering) of the piece that
//! moved last, which makes the edge cost a function of the edge alone.
//! Zero-cost edges go to the front of the deque and unit-cost edges to the
//! back, so nodes leave the deque in nondecreasing cost order.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::canonical::CanonicalKey;
use crate::error::Result;
use crate::geometry;
use crate::moves::{MoveModel, Neighbor};
use crate::path::{Outcome, Path, Slide, Solution};
use crate::pieces::{Puzzle, State};

/// Canonical key augmented with the last piece moved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TurnNode {
    key: CanonicalKey,
    /// `None` only at the start, so the first move always opens a turn.
    last: Option<usize>,
}

struct Entry {
    node: TurnNode,
    cost: usize,
    parent: Option<u32>,
    slide: Option<Slide>,
    settled: bool,
}

/// Finds a path with the fewest turns to a state satisfying `is_goal`.
///
/// The goal test ignores which piece moved last. As with
/// [`crate::solver::shortest_path`], `is_goal` sees canonical keys and must
/// not distinguish interchangeable pieces. An illegal `start` is rejected
/// before any search runs.
pub fn fewest_turns<G>(
    puzzle: &Puzzle,
    start: &State,
    model: MoveModel,
    is_goal: G,
) -> Result<Outcome>
where
    G: Fn(&State) -> bool,
{
    puzzle.validate_state(start)?;
    let root = TurnNode {
        key: puzzle.canonical_key(start),
        last: None,
    };

    let mut index: FxHashMap<TurnNode, u32> = FxHashMap::default();
    let mut entries: Vec<Entry> = Vec::new();
    let mut deque: VecDeque<(u32, usize)> = VecDeque::new();
    let mut buffer: Vec<Neighbor> = Vec::new();

    index.insert(root.clone(), 0);
    entries.push(Entry {
        node: root,
        cost: 0,
        parent: None,
        slide: None,
        settled: false,
    });
    deque.push_back((0, 0));

    while let Some((id, cost)) = deque.pop_front() {
        let entry = &mut entries[id as usize];
        // stale: a cheaper route was found after this one was queued
        if entry.settled || cost > entry.cost {
            continue;
        }
        entry.settled = true;

        let state = entry.node.key.as_state().clone();
        let last = entry.node.last;

        if is_goal(&state) {
            let path = Path::replay(puzzle, start, &trace_back(&entries, id));
            debug!(
                model = %model,
                turns = cost,
                moves = path.len(),
                explored = entries.len(),
                "fewest turns found"
            );
            return Ok(Outcome::Solved(Solution {
                cost,
                path,
                explored: entries.len(),
            }));
        }

        buffer.clear();
        puzzle.neighbors_into(&state, model, &mut buffer);
        for neighbor in buffer.drain(..) {
            let mv = neighbor.mv;
            let edge = usize::from(last != Some(mv.piece));
            let next_cost = cost + edge;

            // follow the moved piece into the child's canonical numbering
            let landed = geometry::offset(state[mv.piece], mv.direction, mv.distance as i32);
            let key = puzzle.into_canonical(neighbor.state);
            let Some(moved) = key.slot_at(landed) else {
                continue;
            };
            let child = TurnNode {
                key,
                last: Some(moved),
            };
            let slide = Slide::of(&state, mv);

            let child_id = match index.get(&child) {
                Some(&existing) => {
                    let known = &mut entries[existing as usize];
                    if known.settled || known.cost <= next_cost {
                        continue;
                    }
                    known.cost = next_cost;
                    known.parent = Some(id);
                    known.slide = Some(slide);
                    existing
                }
                None => {
                    let new_id = entries.len() as u32;
                    index.insert(child.clone(), new_id);
                    entries.push(Entry {
                        node: child,
                        cost: next_cost,
                        parent: Some(id),
                        slide: Some(slide),
                        settled: false,
                    });
                    new_id
                }
            };

            if edge == 0 {
                deque.push_front((child_id, next_cost));
            } else {
                deque.push_back((child_id, next_cost));
            }
        }
    }

    debug!(model = %model, explored = entries.len(), "goal unreachable");
    Ok(Outcome::Unreachable)
}

fn trace_back(entries: &[Entry], mut id: u32) -> Vec<Slide> {
    let mut slides = Vec::new();
    while let Entry {
        parent: Some(parent),
        slide: Some(slide),
        ..
    } = entries[id as usize]
    {
        slides.push(slide);
        id = parent;
    }
    slides.reverse();
    slides
}
