//! Heuristic AI: brute-force every placement of the current pair, score the
//! settled board, then walk the pair there one action per move interval.
//!
//! The AI only reads a [`PlayerState`]; the driver applies the returned
//! [`AiAction`] through the same pair controls a human uses.

use crate::board::{Board, COLS, ROWS, SPAWN_COL};
use crate::crash::find_clear_targets;
use crate::pair::GemPair;
use crate::player::PlayerState;
use crate::power::detect_power_gems;
use crate::Difficulty;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// --- Evaluation weights ---
const W_HEIGHT_SQ: f64 = 0.4;
const W_BUMPINESS: f64 = 1.5;
const W_ADJACENT: f64 = 1.0;
const W_CRASH_ADJACENT: f64 = 3.0;
const W_POWER_AREA: f64 = 1.5;
const W_CRASH_TARGET: f64 = 2.0;
const W_NEAR_TOP: f64 = 60.0;
const W_SPAWN_STACK: f64 = 4.0;
const W_SPAWN_DANGER: f64 = 250.0;
const DEAD: f64 = -100_000.0;
/// Columns this tall or taller count as near the top.
const NEAR_TOP_HEIGHT: usize = ROWS - 3;

/// What the AI wants the driver to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiAction {
    RotateCw,
    RotateCcw,
    /// Step one column toward the target; see [`Ai::move_direction`].
    Move,
    Drop,
    None,
}

/// Difficulty knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiProfile {
    /// Ticks spent "thinking" before committing to a target.
    pub think_frames: u32,
    /// Probability of picking a random placement instead of searching.
    pub mistake_rate: f64,
    /// Simulate one crash/clear/gravity step before scoring.
    pub lookahead: bool,
}

impl AiProfile {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                think_frames: 40,
                mistake_rate: 0.25,
                lookahead: false,
            },
            Difficulty::Medium => Self {
                think_frames: 20,
                mistake_rate: 0.08,
                lookahead: true,
            },
            Difficulty::Hard => Self {
                think_frames: 8,
                mistake_rate: 0.0,
                lookahead: true,
            },
        }
    }

    /// Ticks between actuation steps.
    pub fn move_interval(&self) -> u32 {
        (self.think_frames / 4).max(1)
    }
}

/// A placement the AI may aim for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub orientation: u8,
    pub col: i32,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Evaluating,
    Committed,
}

/// Per-side AI controller.
#[derive(Debug, Clone)]
pub struct Ai {
    profile: AiProfile,
    phase: Phase,
    think_timer: u32,
    move_timer: u32,
    target: Option<Placement>,
    /// `total_drops` of the pair being worked on; a change means a new pair.
    pair_serial: u32,
    /// Orientation and column when the last rotate/move was issued.
    last_step: Option<(u8, i32)>,
    rng: StdRng,
}

impl Ai {
    pub fn new(profile: AiProfile, seed: u64) -> Self {
        Self {
            profile,
            phase: Phase::Idle,
            think_timer: 0,
            move_timer: 0,
            target: None,
            pair_serial: 0,
            last_step: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn target(&self) -> Option<Placement> {
        self.target
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.think_timer = 0;
        self.move_timer = 0;
        self.target = None;
        self.last_step = None;
    }

    /// Advance one tick and return the action to apply.
    pub fn tick(&mut self, state: &PlayerState) -> AiAction {
        let Some(pair) = state.current_pair.filter(|_| state.alive) else {
            self.reset();
            return AiAction::None;
        };
        if state.total_drops != self.pair_serial {
            self.pair_serial = state.total_drops;
            self.reset();
        }

        if self.phase == Phase::Idle {
            self.phase = Phase::Evaluating;
            self.think_timer = 0;
        }

        match self.phase {
            Phase::Idle | Phase::Evaluating => {
                self.think_timer += 1;
                if self.think_timer < self.profile.think_frames {
                    return AiAction::None;
                }
                self.target = Some(self.choose(&state.board, &pair));
                self.phase = Phase::Committed;
                self.move_timer = 0;
                AiAction::None
            }
            Phase::Committed => {
                self.move_timer += 1;
                if self.move_timer < self.profile.move_interval() {
                    return AiAction::None;
                }
                self.move_timer = 0;
                let Some(target) = self.target else {
                    self.reset();
                    return AiAction::None;
                };
                let pos = (pair.orientation, pair.col);
                // The last step did nothing: the target is out of reach from here.
                if self.last_step == Some(pos) {
                    log::debug!("ai blocked at {pos:?} short of {target:?}, dropping");
                    self.phase = Phase::Idle;
                    self.last_step = None;
                    return AiAction::Drop;
                }
                self.last_step = Some(pos);
                if pair.orientation != target.orientation {
                    // Shorter way round; a half turn goes clockwise.
                    let diff = (target.orientation + 4 - pair.orientation) % 4;
                    return if diff == 3 {
                        AiAction::RotateCcw
                    } else {
                        AiAction::RotateCw
                    };
                }
                if pair.col != target.col {
                    return AiAction::Move;
                }
                self.phase = Phase::Idle;
                self.last_step = None;
                AiAction::Drop
            }
        }
    }

    /// -1 / +1 toward the target column, 0 when there or without a target.
    pub fn move_direction(&self, state: &PlayerState) -> i32 {
        match (self.target, state.current_pair) {
            (Some(target), Some(pair)) => (target.col - pair.col).signum(),
            _ => 0,
        }
    }

    fn choose(&mut self, board: &Board, pair: &GemPair) -> Placement {
        if self.profile.mistake_rate > 0.0 && self.rng.gen_bool(self.profile.mistake_rate) {
            let options = valid_placements(board, pair);
            if !options.is_empty() {
                let (orientation, col) = options[self.rng.gen_range(0..options.len())];
                let placement = Placement {
                    orientation,
                    col,
                    score: 0.0,
                };
                log::debug!("ai mistake: {placement:?}");
                return placement;
            }
        }
        let best = best_placement(board, pair, self.profile.lookahead).unwrap_or(Placement {
            orientation: pair.orientation,
            col: pair.col,
            score: DEAD,
        });
        log::debug!(
            "ai target: orientation {} col {} score {:.1}",
            best.orientation,
            best.col,
            best.score
        );
        best
    }
}

/// Every valid (orientation, column) for `pair` at its current row, scored,
/// best first. Equal scores keep evaluation order.
pub fn rank_placements(board: &Board, pair: &GemPair, lookahead: bool) -> Vec<Placement> {
    let mut ranked: Vec<Placement> = valid_placements(board, pair)
        .into_iter()
        .map(|(orientation, col)| {
            let mut candidate = *pair;
            candidate.orientation = orientation;
            candidate.col = col;
            Placement {
                orientation,
                col,
                score: simulate(board, candidate, lookahead),
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// (orientation, column) pairs where `pair` fits at its current row, orientation-major.
fn valid_placements(board: &Board, pair: &GemPair) -> Vec<(u8, i32)> {
    (0..4u8)
        .flat_map(|orientation| (0..COLS as i32).map(move |col| (orientation, col)))
        .filter(|&(orientation, col)| {
            let mut candidate = *pair;
            candidate.orientation = orientation;
            candidate.col = col;
            candidate.is_valid(board)
        })
        .collect()
}

pub fn best_placement(board: &Board, pair: &GemPair, lookahead: bool) -> Option<Placement> {
    rank_placements(board, pair, lookahead).into_iter().next()
}

/// Drop, lock, settle (and optionally clear once), then score.
fn simulate(board: &Board, mut pair: GemPair, lookahead: bool) -> f64 {
    pair.hard_drop(board);
    let overflow = pair.cells().iter().any(|&((r, _), _)| r < 0);
    let mut sim = board.clone();
    pair.lock(&mut sim);
    sim.apply_gravity();
    let mut bonus = 0.0;
    if lookahead {
        let cleared = find_clear_targets(&sim);
        if !cleared.is_empty() {
            for &(r, c) in &cleared {
                sim.take(r, c);
            }
            sim.apply_gravity();
            bonus = cleared.len() as f64 * W_CRASH_TARGET;
        }
    }
    if overflow {
        return DEAD;
    }
    evaluate(&sim) + bonus
}

/// Higher is better.
pub fn evaluate(board: &Board) -> f64 {
    if board.check_game_over() {
        return DEAD;
    }
    let heights: Vec<usize> = (0..COLS).map(|c| board.column_height(c)).collect();
    let mut score = 0.0;

    score -= heights.iter().map(|&h| (h * h) as f64).sum::<f64>() * W_HEIGHT_SQ;
    score -= heights
        .windows(2)
        .map(|w| w[0].abs_diff(w[1]) as f64)
        .sum::<f64>()
        * W_BUMPINESS;

    for (r, c, gem) in board.gems() {
        for (nr, nc) in [(r + 1, c), (r, c + 1)] {
            if gem.is_normal()
                && board
                    .get(nr, nc)
                    .is_some_and(|n| n.is_normal() && n.color == gem.color)
            {
                score += W_ADJACENT;
            }
        }
        if gem.is_crash() {
            let same = Board::neighbours(r, c)
                .filter_map(|(nr, nc)| board.get(nr, nc))
                .filter(|n| n.color == gem.color && (n.is_normal() || n.is_counter()))
                .count();
            score += same as f64 * W_CRASH_ADJACENT;
        }
    }

    let power_area: usize = detect_power_gems(board).iter().map(|pg| pg.area()).sum();
    score += power_area as f64 * W_POWER_AREA;
    score += find_clear_targets(board).len() as f64 * W_CRASH_TARGET;

    for &h in &heights {
        if h >= NEAR_TOP_HEIGHT {
            score -= (h + 1 - NEAR_TOP_HEIGHT) as f64 * W_NEAR_TOP;
        }
    }
    let spawn_h = heights[SPAWN_COL];
    score -= spawn_h as f64 * W_SPAWN_STACK;
    if spawn_h >= ROWS - 4 {
        score -= W_SPAWN_DANGER;
    }
    score
}
