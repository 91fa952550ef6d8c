//! Crash resolution: ignite crash gems, flood-fill their colour group, shatter adjacent counters.

use crate::board::Board;
use crate::power::PowerGem;
use std::collections::BTreeSet;

pub type CellSet = BTreeSet<(usize, usize)>;

/// Cells to clear in one pass plus the areas of power gems fully inside them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrashOutcome {
    pub cells: CellSet,
    pub power_areas: Vec<usize>,
}

impl CrashOutcome {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A crash gem ignites when an orthogonal neighbour is a normal gem of its colour.
fn ignites(board: &Board, row: usize, col: usize) -> bool {
    let Some(gem) = board.get(row, col) else {
        return false;
    };
    gem.is_crash()
        && Board::neighbours(row, col)
            .filter_map(|(r, c)| board.get(r, c))
            .any(|n| n.is_normal() && n.color == gem.color)
}

/// 4-connected fill through normal/crash gems of the starting gem's colour.
fn flood_fill(board: &Board, start: (usize, usize), visited: &mut CellSet) -> Vec<(usize, usize)> {
    let mut group = Vec::new();
    let Some(color) = board.get(start.0, start.1).map(|g| g.color) else {
        return group;
    };
    if !visited.insert(start) {
        return group;
    }
    let mut stack = vec![start];
    while let Some((r, c)) = stack.pop() {
        group.push((r, c));
        for (nr, nc) in Board::neighbours(r, c) {
            let joins = board.get(nr, nc).is_some_and(|g| g.joins_group(color));
            if joins && visited.insert((nr, nc)) {
                stack.push((nr, nc));
            }
        }
    }
    group
}

/// Every cell to clear this pass: ignited groups, then one non-propagating
/// shatter pass over counters touching those groups.
pub fn find_clear_targets(board: &Board) -> CellSet {
    let mut visited = CellSet::new();
    let mut cleared = CellSet::new();
    let ignition: Vec<(usize, usize)> = board
        .gems()
        .filter(|&(r, c, _)| ignites(board, r, c))
        .map(|(r, c, _)| (r, c))
        .collect();
    for start in ignition {
        cleared.extend(flood_fill(board, start, &mut visited));
    }

    let shattered: Vec<(usize, usize)> = cleared
        .iter()
        .flat_map(|&(r, c)| Board::neighbours(r, c))
        .filter(|&(r, c)| board.get(r, c).is_some_and(|g| g.is_counter()))
        .collect();
    cleared.extend(shattered);
    cleared
}

/// Areas of the power gems lying wholly inside `cleared`.
pub fn destroyed_power_areas(power_gems: &[PowerGem], cleared: &CellSet) -> Vec<usize> {
    power_gems
        .iter()
        .filter(|pg| pg.cells().all(|cell| cleared.contains(&cell)))
        .map(PowerGem::area)
        .collect()
}

/// Clear set plus the areas of `power_gems` wholly covered by it.
pub fn resolve_crashes(board: &Board, power_gems: &[PowerGem]) -> CrashOutcome {
    let cells = find_clear_targets(board);
    let power_areas = destroyed_power_areas(power_gems, &cells);
    CrashOutcome { cells, power_areas }
}
