//! Garbage delivery and the counter-gem countdown.

use crate::board::{COLS, ROWS};
use crate::gem::{Gem, GemColor, GemKind};
use crate::player::PlayerState;

/// Countdown for freshly delivered counter gems.
pub const COUNTER_TIMER: u8 = 5;
/// Countdown when a partial counter-attack left garbage behind.
pub const SHORT_COUNTER_TIMER: u8 = 3;

/// Place `count` random-colour counter gems with `timer`, one per column
/// left to right (wrapping), each on top of its column's stack. A full column
/// falls back to the first empty cell in row-major order. Returns gems placed.
pub fn deliver_garbage(state: &mut PlayerState, count: i64, timer: u8) -> usize {
    if count <= 0 {
        return 0;
    }
    let mut placed = 0;
    for i in 0..count as usize {
        let col = i % COLS;
        let target = state.board.landing_row(col).map(|r| (r, col)).or_else(|| {
            (0..ROWS)
                .flat_map(|r| (0..COLS).map(move |c| (r, c)))
                .find(|&(r, c)| !state.board.is_occupied(r, c))
        });
        let Some((row, col)) = target else {
            log::warn!("board full, {} garbage gems left undelivered", count as usize - i);
            break;
        };
        let color = GemColor::random(&mut state.rng);
        state.board.set(row, col, Some(Gem::counter(color, timer)));
        placed += 1;
    }
    placed
}

/// Tick every counter gem down by one; those reaching zero turn normal in the
/// same pass. Returns how many converted.
pub fn decrement_counters(state: &mut PlayerState) -> usize {
    let counters: Vec<(usize, usize, Gem)> =
        state.board.gems().filter(|(_, _, g)| g.is_counter()).collect();
    let mut converted = 0;
    for (row, col, gem) in counters {
        let GemKind::Counter { timer } = gem.kind else {
            continue;
        };
        let kind = match timer.saturating_sub(1) {
            0 => {
                converted += 1;
                GemKind::Normal
            }
            left => GemKind::Counter { timer: left },
        };
        state.board.set(row, col, Some(Gem { kind, ..gem }));
    }
    converted
}
