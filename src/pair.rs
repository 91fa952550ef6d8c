//! Falling pair: two gems, anchor, orientation, and the moves a controller can make.

use crate::board::{Board, COLS, ROWS, SPAWN_COL};
use crate::gem::Gem;

/// Column offsets tried after a raw rotation fails, before the upward kick.
const WALL_KICKS: [i32; 4] = [1, -1, 2, -2];

/// Two-gem falling unit. `row`/`col` anchor the primary gem; the secondary
/// sits next to it according to `orientation` (0 above, 1 right, 2 below, 3 left).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemPair {
    pub primary: Gem,
    pub secondary: Gem,
    pub row: i32,
    pub col: i32,
    pub orientation: u8,
}

impl GemPair {
    /// New pair at the spawn anchor (drop alley, top row, secondary above).
    pub fn new(primary: Gem, secondary: Gem) -> Self {
        Self {
            primary,
            secondary,
            row: 0,
            col: SPAWN_COL as i32,
            orientation: 0,
        }
    }

    /// Reset anchor and orientation to the spawn position.
    pub fn reset_to_spawn(&mut self) {
        self.row = 0;
        self.col = SPAWN_COL as i32;
        self.orientation = 0;
    }

    /// (row, col) offset of the secondary relative to the primary.
    pub fn secondary_offset(orientation: u8) -> (i32, i32) {
        match orientation % 4 {
            0 => (-1, 0),
            1 => (0, 1),
            2 => (1, 0),
            _ => (0, -1),
        }
    }

    pub fn primary_pos(&self) -> (i32, i32) {
        (self.row, self.col)
    }

    pub fn secondary_pos(&self) -> (i32, i32) {
        let (dr, dc) = Self::secondary_offset(self.orientation);
        (self.row + dr, self.col + dc)
    }

    /// Both cells with their gems, primary first.
    pub fn cells(&self) -> [((i32, i32), Gem); 2] {
        [
            (self.primary_pos(), self.primary),
            (self.secondary_pos(), self.secondary),
        ]
    }

    /// False if either cell leaves the columns, falls below the last row, or
    /// hits an occupied cell. Rows above the top are allowed.
    pub fn is_valid(&self, board: &Board) -> bool {
        self.cells().iter().all(|&((r, c), _)| {
            if c < 0 || c >= COLS as i32 || r >= ROWS as i32 {
                return false;
            }
            r < 0 || !board.is_occupied(r as usize, c as usize)
        })
    }

    /// Shift by `dcol` columns if the result is valid.
    pub fn try_move(&mut self, board: &Board, dcol: i32) -> bool {
        let mut moved = *self;
        moved.col += dcol;
        if moved.is_valid(board) {
            *self = moved;
            true
        } else {
            false
        }
    }

    /// Rotate with kicks: raw rotation, wall kicks, then one row up.
    /// The first valid candidate is committed; otherwise nothing changes.
    pub fn rotate(&mut self, board: &Board, clockwise: bool) -> bool {
        let mut base = *self;
        base.orientation = if clockwise {
            (self.orientation + 1) % 4
        } else {
            (self.orientation + 3) % 4
        };

        let column_kicks = std::iter::once(0).chain(WALL_KICKS);
        let candidates = column_kicks
            .map(|dc| (0, dc))
            .chain(std::iter::once((-1, 0)));
        for (dr, dc) in candidates {
            let mut candidate = base;
            candidate.row += dr;
            candidate.col += dc;
            if candidate.is_valid(board) {
                *self = candidate;
                return true;
            }
        }
        false
    }

    /// Move down one row if possible.
    pub fn drop(&mut self, board: &Board) -> bool {
        let mut lowered = *self;
        lowered.row += 1;
        if lowered.is_valid(board) {
            *self = lowered;
            true
        } else {
            false
        }
    }

    /// Drop until blocked; returns rows travelled.
    pub fn hard_drop(&mut self, board: &Board) -> u32 {
        let mut rows = 0;
        while self.drop(board) {
            rows += 1;
        }
        rows
    }

    /// Write both gems into the board, skipping cells above the top row.
    pub fn lock(self, board: &mut Board) {
        for ((r, c), gem) in self.cells() {
            if Board::in_bounds(r, c) {
                board.set(r as usize, c as usize, Some(gem));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gem::GemColor;

    fn pair() -> GemPair {
        GemPair::new(Gem::normal(GemColor::Red), Gem::normal(GemColor::Blue))
    }

    #[test]
    fn test_spawn_secondary_above_top_is_valid() {
        let p = pair();
        assert_eq!(p.secondary_pos(), (-1, SPAWN_COL as i32));
        assert!(p.is_valid(&Board::new()));
    }

    #[test]
    fn test_invalid_outside_columns_or_below_floor() {
        let board = Board::new();
        let mut p = pair();
        p.col = 0;
        p.orientation = 3;
        assert!(!p.is_valid(&board));
        p.orientation = 0;
        p.row = ROWS as i32;
        assert!(!p.is_valid(&board));
    }

    #[test]
    fn test_invalid_on_occupied_cell() {
        let mut board = Board::new();
        board.set(5, SPAWN_COL, Some(Gem::normal(GemColor::Green)));
        let mut p = pair();
        p.row = 5;
        assert!(!p.is_valid(&board));
    }

    #[test]
    fn test_move_blocked_by_wall_is_noop() {
        let board = Board::new();
        let mut p = pair();
        p.row = 3;
        assert!(p.try_move(&board, 2));
        assert_eq!(p.col, 5);
        assert!(!p.try_move(&board, 1));
        assert_eq!(p.col, 5);
    }

    #[test]
    fn test_rotate_wall_kick_against_right_wall() {
        let board = Board::new();
        let mut p = pair();
        p.row = 3;
        p.col = 5;
        assert!(p.rotate(&board, true));
        assert_eq!(p.orientation, 1);
        // Raw rotation puts the secondary in column 6, +1 fails too, -1 wins.
        assert_eq!(p.col, 4);
        assert!(p.is_valid(&board));
    }

    #[test]
    fn test_rotate_floor_kick_moves_up() {
        let board = Board::new();
        let mut p = pair();
        p.col = 2;
        p.row = ROWS as i32 - 1;
        p.orientation = 1;
        assert!(p.is_valid(&board));
        // Secondary would land below the floor; no column shift helps.
        assert!(p.rotate(&board, true));
        assert_eq!(p.orientation, 2);
        assert_eq!((p.row, p.col), (ROWS as i32 - 2, 2));
        assert!(p.is_valid(&board));
    }

    #[test]
    fn test_rotate_rejected_leaves_state() {
        let mut board = Board::new();
        for r in 0..ROWS {
            for c in 0..COLS {
                if c != 2 {
                    board.set(r, c, Some(Gem::normal(GemColor::Yellow)));
                }
            }
        }
        let mut p = pair();
        p.col = 2;
        p.row = 5;
        let before = p;
        assert!(!p.rotate(&board, true));
        assert_eq!(p, before);
    }

    #[test]
    fn test_hard_drop_counts_rows_and_lock_writes() {
        let mut board = Board::new();
        let mut p = pair();
        assert_eq!(p.hard_drop(&board), 11);
        assert!(!p.drop(&board));
        p.lock(&mut board);
        assert_eq!(board.get(11, SPAWN_COL), Some(Gem::normal(GemColor::Red)));
        assert_eq!(board.get(10, SPAWN_COL), Some(Gem::normal(GemColor::Blue)));
    }

    #[test]
    fn test_lock_skips_cells_above_top() {
        let mut board = Board::new();
        let p = pair();
        p.lock(&mut board);
        assert_eq!(board.count(), 1);
        assert!(board.check_game_over());
    }
}
