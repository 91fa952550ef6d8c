//! Diamond resolution: each diamond wipes the colour it landed on from the whole board.

use crate::board::Board;
use crate::gem::{Gem, GemColor};

/// A cell removed by a diamond, with the gem that was there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiamondClear {
    pub row: usize,
    pub col: usize,
    pub gem: Gem,
}

/// Colour under the diamond, else the first non-diamond orthogonal neighbour.
fn target_color(board: &Board, row: usize, col: usize) -> Option<GemColor> {
    let below = board.get(row + 1, col).filter(|g| !g.is_diamond());
    below
        .or_else(|| {
            Board::neighbours(row, col)
                .filter_map(|(r, c)| board.get(r, c))
                .find(|g| !g.is_diamond())
        })
        .map(|g| g.color)
}

/// Resolve every diamond in row-major order, removing cells from `board`.
/// Returns all removed cells; empty when there were no diamonds.
pub fn resolve_diamonds(board: &mut Board) -> Vec<DiamondClear> {
    let diamonds: Vec<(usize, usize)> = board
        .gems()
        .filter(|(_, _, g)| g.is_diamond())
        .map(|(r, c, _)| (r, c))
        .collect();

    let mut cleared = Vec::new();
    for (row, col) in diamonds {
        let color = target_color(board, row, col);
        if let Some(gem) = board.take(row, col) {
            cleared.push(DiamondClear { row, col, gem });
        }
        let Some(color) = color else {
            log::debug!("diamond at ({row}, {col}) had no colour to wipe");
            continue;
        };
        let victims: Vec<(usize, usize)> = board
            .gems()
            .filter(|(_, _, g)| !g.is_diamond() && g.color == color)
            .map(|(r, c, _)| (r, c))
            .collect();
        for (r, c) in victims {
            if let Some(gem) = board.take(r, c) {
                cleared.push(DiamondClear { row: r, col: c, gem });
            }
        }
    }
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diamond_wipes_colour_below() {
        let mut board = Board::from_rows(&["*.....", "r.b...", "bbr.r."]);
        let cleared = resolve_diamonds(&mut board);
        // Diamond, plus three reds.
        assert_eq!(cleared.len(), 4);
        assert!(board.gems().all(|(_, _, g)| g.color == GemColor::Blue));
        assert_eq!(board.count(), 3);
    }

    #[test]
    fn test_diamond_on_floor_uses_side_neighbour() {
        let mut board = Board::from_rows(&["y*g..."]);
        let cleared = resolve_diamonds(&mut board);
        assert_eq!(cleared.len(), 2);
        assert_eq!(board.get(11, 2), Some(Gem::normal(GemColor::Green)));
    }

    #[test]
    fn test_lonely_diamond_vanishes() {
        let mut board = Board::from_rows(&["..*..."]);
        let cleared = resolve_diamonds(&mut board);
        assert_eq!(cleared.len(), 1);
        assert_eq!(board.count(), 0);
    }

    #[test]
    fn test_diamond_wipes_counters_and_crash_of_colour() {
        let mut board = Board::from_rows(&["*.....", "r1R..."]);
        let cleared = resolve_diamonds(&mut board);
        assert_eq!(cleared.len(), 4);
        assert_eq!(board.count(), 0);
    }
}
