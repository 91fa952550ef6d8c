//! Power-gem detection: non-overlapping same-colour rectangles of normal gems, at least 2×2.

use crate::board::{Board, COLS, ROWS};
use crate::gem::GemColor;

/// Rectangle of uniform normal gems. `id` is only unique within one detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerGem {
    pub id: u16,
    pub color: GemColor,
    /// Left column.
    pub col: usize,
    /// Top row.
    pub row: usize,
    pub width: usize,
    pub height: usize,
}

impl PowerGem {
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.row && row < self.row + self.height && col >= self.col && col < self.col + self.width
    }

    /// Covered cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.row..self.row + self.height)
            .flat_map(move |r| (self.col..self.col + self.width).map(move |c| (r, c)))
    }
}

/// Colour of a normal gem at a cell, if any.
fn normal_color(board: &Board, row: usize, col: usize) -> Option<GemColor> {
    board
        .get(row, col)
        .filter(|g| g.is_normal())
        .map(|g| g.color)
}

fn is_uniform(board: &Board, row: usize, col: usize, width: usize, height: usize, color: GemColor) -> bool {
    (row..row + height).all(|r| (col..col + width).all(|c| normal_color(board, r, c) == Some(color)))
}

/// Every uniform rectangle ≥2×2, ordered by top-left (row-major), then height, then width.
fn candidates(board: &Board) -> Vec<PowerGem> {
    let mut out = Vec::new();
    for row in 0..ROWS {
        for col in 0..COLS {
            let Some(color) = normal_color(board, row, col) else {
                continue;
            };
            for height in 2..=ROWS - row {
                if !is_uniform(board, row, col, 2, height, color) {
                    break;
                }
                for width in 2..=COLS - col {
                    if !is_uniform(board, row, col, width, height, color) {
                        break;
                    }
                    out.push(PowerGem {
                        id: 0,
                        color,
                        col,
                        row,
                        width,
                        height,
                    });
                }
            }
        }
    }
    out
}

/// Largest-first greedy selection of non-overlapping rectangles. Equal areas
/// keep enumeration order. Pure: the board is not modified.
pub fn detect_power_gems(board: &Board) -> Vec<PowerGem> {
    let mut cands = candidates(board);
    cands.sort_by(|a, b| b.area().cmp(&a.area()));

    let mut taken = [[false; COLS]; ROWS];
    let mut accepted: Vec<PowerGem> = Vec::new();
    for cand in cands {
        if cand.cells().any(|(r, c)| taken[r][c]) {
            continue;
        }
        for (r, c) in cand.cells() {
            taken[r][c] = true;
        }
        accepted.push(PowerGem {
            id: accepted.len() as u16,
            ..cand
        });
    }
    accepted
}

/// Detect and record the tags on the board's side table.
pub fn tag_power_gems(board: &mut Board) -> Vec<PowerGem> {
    let gems = detect_power_gems(board);
    board.set_power_tags(&gems);
    gems
}
