//! Board: 12×6 grid of optional gems, gravity, power-gem tag side table.

use crate::gem::Gem;
use crate::power::PowerGem;

pub const ROWS: usize = 12;
pub const COLS: usize = 6;
/// Drop alley: pairs enter here and a blocked top cell ends the game.
pub const SPAWN_COL: usize = 3;

/// Playfield: `cells[row][col]`, row 0 is the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Gem>; COLS]; ROWS],
    /// Power-gem id per cell from the last detection pass. Wiped by gravity.
    power_tags: [[Option<u16>; COLS]; ROWS],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[None; COLS]; ROWS],
            power_tags: [[None; COLS]; ROWS],
        }
    }

    #[inline]
    pub fn in_bounds(row: i32, col: i32) -> bool {
        row >= 0 && (row as usize) < ROWS && col >= 0 && (col as usize) < COLS
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<Gem> {
        if row >= ROWS || col >= COLS {
            return None;
        }
        self.cells[row][col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, gem: Option<Gem>) {
        if row < ROWS && col < COLS {
            self.cells[row][col] = gem;
        }
    }

    /// Remove and return the gem at a cell.
    #[inline]
    pub fn take(&mut self, row: usize, col: usize) -> Option<Gem> {
        if row >= ROWS || col >= COLS {
            return None;
        }
        self.cells[row][col].take()
    }

    #[inline]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_some()
    }

    /// Occupied cells in row-major order.
    pub fn gems(&self) -> impl Iterator<Item = (usize, usize, Gem)> + '_ {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, cell)| cell.map(|g| (r, c, g)))
        })
    }

    /// Orthogonal neighbours of a cell that lie on the board (up, down, left, right).
    pub fn neighbours(row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
        const DELTAS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        DELTAS.into_iter().filter_map(move |(dr, dc)| {
            let (r, c) = (row as i32 + dr, col as i32 + dc);
            Self::in_bounds(r, c).then_some((r as usize, c as usize))
        })
    }

    pub fn count(&self) -> usize {
        self.gems().count()
    }

    /// Stack height of a column (0 = empty, ROWS = full).
    pub fn column_height(&self, col: usize) -> usize {
        (0..ROWS)
            .find(|&r| self.is_occupied(r, col))
            .map_or(0, |r| ROWS - r)
    }

    /// Topmost empty cell of a column sitting right above its stack.
    pub fn landing_row(&self, col: usize) -> Option<usize> {
        (0..ROWS).rev().find(|&r| !self.is_occupied(r, col))
    }

    /// Game over iff the drop alley's top cell is occupied.
    pub fn check_game_over(&self) -> bool {
        self.is_occupied(0, SPAWN_COL)
    }

    #[inline]
    pub fn power_tag(&self, row: usize, col: usize) -> Option<u16> {
        if row >= ROWS || col >= COLS {
            return None;
        }
        self.power_tags[row][col]
    }

    /// Replace the tag table with the cells covered by `gems`.
    pub fn set_power_tags(&mut self, gems: &[PowerGem]) {
        self.clear_power_tags();
        for pg in gems {
            for (r, c) in pg.cells() {
                self.power_tags[r][c] = Some(pg.id);
            }
        }
    }

    pub fn clear_power_tags(&mut self) {
        self.power_tags = [[None; COLS]; ROWS];
    }

    /// Compact every column toward the bottom, keeping relative order.
    /// Power tags are dropped first; every gem falls on its own.
    /// Returns true if any gem moved.
    pub fn apply_gravity(&mut self) -> bool {
        self.clear_power_tags();
        let mut moved = false;
        for col in 0..COLS {
            let mut write = ROWS;
            for row in (0..ROWS).rev() {
                if let Some(gem) = self.cells[row][col] {
                    write -= 1;
                    if write != row {
                        self.cells[write][col] = Some(gem);
                        self.cells[row][col] = None;
                        moved = true;
                    }
                }
            }
        }
        moved
    }

    /// Build a board from text rows aligned to the bottom. `.` empty,
    /// `rgby` normal, `RGBY` crash, `*` diamond, `1`..`9` counter (red) with that timer.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        use crate::gem::GemColor;
        let mut board = Self::new();
        let offset = ROWS - rows.len();
        for (i, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let color = |ch: char| match ch.to_ascii_lowercase() {
                    'r' => GemColor::Red,
                    'g' => GemColor::Green,
                    'b' => GemColor::Blue,
                    _ => GemColor::Yellow,
                };
                let gem = match ch {
                    '.' => None,
                    '*' => Some(Gem::diamond()),
                    'r' | 'g' | 'b' | 'y' => Some(Gem::normal(color(ch))),
                    'R' | 'G' | 'B' | 'Y' => Some(Gem::crash(color(ch))),
                    '1'..='9' => Some(Gem::counter(GemColor::Red, ch as u8 - b'0')),
                    _ => panic!("bad board char {ch:?}"),
                };
                board.set(offset + i, c, gem);
            }
        }
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gem::GemColor;

    #[test]
    fn test_gravity_compacts_and_keeps_order() {
        let mut board = Board::new();
        board.set(2, 0, Some(Gem::normal(GemColor::Red)));
        board.set(5, 0, Some(Gem::normal(GemColor::Blue)));
        board.set(11, 1, Some(Gem::normal(GemColor::Green)));
        assert!(board.apply_gravity());
        assert_eq!(board.get(10, 0), Some(Gem::normal(GemColor::Red)));
        assert_eq!(board.get(11, 0), Some(Gem::normal(GemColor::Blue)));
        assert_eq!(board.get(11, 1), Some(Gem::normal(GemColor::Green)));
        assert_eq!(board.count(), 3);
    }

    #[test]
    fn test_gravity_idempotent() {
        let mut board = Board::from_rows(&["r.....", "......", "gb.y..", "..R..b"]);
        board.apply_gravity();
        let once = board.clone();
        assert!(!board.apply_gravity());
        assert_eq!(board, once);
    }

    #[test]
    fn test_gravity_strips_power_tags() {
        let mut board = Board::from_rows(&["rr....", "rr...."]);
        let gems = crate::power::detect_power_gems(&board);
        board.set_power_tags(&gems);
        assert!(board.power_tag(11, 0).is_some());
        board.apply_gravity();
        assert_eq!(board.power_tag(11, 0), None);
    }

    #[test]
    fn test_game_over_only_on_spawn_top() {
        let mut board = Board::new();
        board.set(0, 0, Some(Gem::normal(GemColor::Red)));
        assert!(!board.check_game_over());
        board.set(0, SPAWN_COL, Some(Gem::normal(GemColor::Red)));
        assert!(board.check_game_over());
    }

    #[test]
    fn test_column_height_and_landing_row() {
        let board = Board::from_rows(&["r.....", "r....."]);
        assert_eq!(board.column_height(0), 2);
        assert_eq!(board.landing_row(0), Some(9));
        assert_eq!(board.column_height(1), 0);
        assert_eq!(board.landing_row(1), Some(11));
    }
}
