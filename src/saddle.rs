//! Saddle state of a solution path from forward and backward distance maps.

use tracing::debug;

use crate::error::Result;
use crate::moves::MoveModel;
use crate::path::Path;
use crate::pieces::{Puzzle, State};
use crate::solver::DistanceMap;

/// The step of a path where forward and backward distances balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Saddle {
    /// Index into [`Path::steps`]; the saddle is the state after move `index + 1`.
    pub index: usize,
    /// Distance from the path's start.
    pub forward: usize,
    /// Distance from the path's final state.
    pub backward: usize,
    pub state: State,
    /// `false` when no step splits the path exactly and the midpoint was used.
    pub exact: bool,
}

impl Saddle {
    #[inline]
    pub fn gap(&self) -> usize {
        self.forward.abs_diff(self.backward)
    }
}

/// Picks the saddle of `path` given distance maps rooted at its two ends.
///
/// A step qualifies when `forward + backward` equals the path length; among
/// those the smallest gap wins and the earliest step breaks ties. States
/// missing from a map count as the full path length away. Without any exact
/// split the step at `len / 2` is reported. Returns `None` for an empty path.
pub fn find_saddle(path: &Path, forward: &DistanceMap, backward: &DistanceMap) -> Option<Saddle> {
    let n = path.len();
    if n == 0 {
        return None;
    }

    let distances = |state: &State| {
        (
            forward.distance(state).unwrap_or(n),
            backward.distance(state).unwrap_or(n),
        )
    };

    let mut best: Option<(usize, usize, usize)> = None;
    for (index, step) in path.steps().iter().enumerate() {
        let (d_plus, d_minus) = distances(&step.state);
        if d_plus + d_minus != n {
            continue;
        }
        let gap = d_plus.abs_diff(d_minus);
        if best.map_or(true, |(_, f, b)| gap < f.abs_diff(b)) {
            best = Some((index, d_plus, d_minus));
        }
    }

    let exact = best.is_some();
    let (index, forward, backward) = best.unwrap_or_else(|| {
        let mid = n / 2;
        let (f, b) = distances(&path.steps()[mid].state);
        (mid, f, b)
    });

    Some(Saddle {
        index,
        forward,
        backward,
        state: path.steps()[index].state.clone(),
        exact,
    })
}

/// Builds both distance maps for `path` and locates its saddle.
///
/// The backward map is a full search from the path's final state under the
/// same move model, which relies on every move being reversible. Fails if
/// either end of the path is not a legal placement.
pub fn analyze_saddle(
    puzzle: &Puzzle,
    path: &Path,
    model: MoveModel,
) -> Result<Option<Saddle>> {
    if path.is_empty() {
        return Ok(None);
    }
    let forward = DistanceMap::build(puzzle, path.start(), model)?;
    let backward = DistanceMap::build(puzzle, path.final_state(), model)?;
    let Some(saddle) = find_saddle(path, &forward, &backward) else {
        return Ok(None);
    };
    debug!(
        model = %model,
        index = saddle.index,
        forward = saddle.forward,
        backward = saddle.backward,
        exact = saddle.exact,
        "saddle located"
    );
    Ok(Some(saddle))
}
