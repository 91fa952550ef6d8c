//! Match driver: two boards ticked in lockstep, the lock cascade, and the garbage exchange.

use crate::ai::{Ai, AiAction, AiProfile};
use crate::attack::{apply_modifiers, resolve_counter_attack, COUNTER_RATIO};
use crate::garbage::{decrement_counters, deliver_garbage, COUNTER_TIMER, SHORT_COUNTER_TIMER};
use crate::player::{CascadeReport, PlayerState};
use crate::power::tag_power_gems;
use crate::{GameConfig, GameMode};

/// Mixed into the match seed so the AI's roll source differs from the pair sequence.
const AI_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Winner(usize),
    Draw,
}

/// One board plus what drives it.
#[derive(Debug)]
pub struct Side {
    pub player: PlayerState,
    pub ai: Option<Ai>,
    pub damage_modifier: f64,
    fall_timer: u32,
    /// Cells cleared by the most recent cascade (for the clear flash).
    pub flash_cells: Vec<(usize, usize)>,
    /// Bumped whenever `flash_cells` is replaced.
    pub flash_serial: u32,
    /// Longest chain this match.
    pub best_chain: u32,
    /// Attack sent after cancellation, summed over the match.
    pub attack_sent: i64,
}

impl Side {
    fn new(seed: u64, ai: Option<Ai>, damage_modifier: f64, config: &GameConfig) -> Self {
        Self {
            player: PlayerState::new(seed, config.pairs),
            ai,
            damage_modifier,
            fall_timer: 0,
            flash_cells: Vec::new(),
            flash_serial: 0,
            best_chain: 0,
            attack_sent: 0,
        }
    }

    pub fn is_ai(&self) -> bool {
        self.ai.is_some()
    }
}

/// Two sides and the shared tick counter.
#[derive(Debug)]
pub struct Match {
    pub sides: [Side; 2],
    pub outcome: Option<MatchOutcome>,
    pub ticks: u64,
    fall_frames: u32,
}

impl Match {
    /// Side 0 is the human in versus mode; every other side is AI-driven.
    pub fn new(config: &GameConfig) -> Self {
        let profile = AiProfile::for_difficulty(config.difficulty);
        let left_ai = (config.mode != GameMode::Versus)
            .then(|| Ai::new(profile, config.seed ^ AI_SEED_SALT));
        let right_ai = Some(Ai::new(profile, config.seed.rotate_left(17) ^ AI_SEED_SALT));
        // Same seed on both boards: both players get the same pair sequence.
        let mut m = Self {
            sides: [
                Side::new(config.seed, left_ai, config.damage_modifiers[0], config),
                Side::new(config.seed, right_ai, config.damage_modifiers[1], config),
            ],
            outcome: None,
            ticks: 0,
            fall_frames: config.fall_frames.max(1),
        };
        log::info!(
            "match start: seed {} mode {:?} difficulty {:?}",
            config.seed,
            config.mode,
            config.difficulty
        );
        for side in &mut m.sides {
            side.player.spawn_pair();
        }
        m
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    fn playable(&self, i: usize) -> bool {
        self.outcome.is_none() && self.sides[i].player.alive && self.sides[i].player.current_pair.is_some()
    }

    pub fn move_pair(&mut self, i: usize, dcol: i32) -> bool {
        self.playable(i) && self.sides[i].player.move_pair(dcol)
    }

    pub fn rotate_pair(&mut self, i: usize, clockwise: bool) -> bool {
        self.playable(i) && self.sides[i].player.rotate_pair(clockwise)
    }

    /// One row down; locks when the pair cannot fall.
    pub fn soft_drop(&mut self, i: usize) {
        if !self.playable(i) {
            return;
        }
        if self.sides[i].player.drop_pair() {
            self.sides[i].fall_timer = 0;
        } else {
            self.settle(i);
        }
    }

    /// Drop to the bottom and lock at once.
    pub fn hard_drop(&mut self, i: usize) {
        if !self.playable(i) {
            return;
        }
        self.sides[i].player.hard_drop_pair();
        self.settle(i);
    }

    /// Advance both sides by one tick.
    pub fn tick(&mut self) {
        if self.is_over() {
            return;
        }
        self.ticks += 1;
        for i in 0..2 {
            self.tick_ai(i);
            if !self.playable(i) {
                continue;
            }
            let side = &mut self.sides[i];
            side.fall_timer += 1;
            if side.fall_timer >= self.fall_frames {
                side.fall_timer = 0;
                if !side.player.drop_pair() {
                    self.settle(i);
                }
            }
        }
        self.update_outcome();
    }

    fn tick_ai(&mut self, i: usize) {
        if !self.playable(i) {
            return;
        }
        let side = &mut self.sides[i];
        let Some(ai) = side.ai.as_mut() else {
            return;
        };
        match ai.tick(&side.player) {
            AiAction::RotateCw => {
                side.player.rotate_pair(true);
            }
            AiAction::RotateCcw => {
                side.player.rotate_pair(false);
            }
            AiAction::Move => {
                let dir = ai.move_direction(&side.player);
                side.player.move_pair(dir);
            }
            AiAction::Drop => self.hard_drop(i),
            AiAction::None => {}
        }
    }

    /// Lock, count down counters, cascade, exchange garbage, spawn the next pair.
    fn settle(&mut self, i: usize) {
        let side = &mut self.sides[i];
        if !side.player.lock_pair() {
            return;
        }
        side.fall_timer = 0;
        decrement_counters(&mut side.player);
        let report = side.player.resolve_board();
        let sent = self.exchange(i, &report);

        let side = &mut self.sides[i];
        if !report.cleared_cells.is_empty() {
            side.flash_cells = report.cleared_cells;
            side.flash_serial = side.flash_serial.wrapping_add(1);
        }
        side.best_chain = side.best_chain.max(report.chain_len);
        side.attack_sent += sent;

        if report.total_attack <= 0 && side.player.pending_garbage > 0 {
            let timer = if side.player.pending_short_timer {
                SHORT_COUNTER_TIMER
            } else {
                COUNTER_TIMER
            };
            let count = side.player.pending_garbage;
            let placed = deliver_garbage(&mut side.player, count, timer);
            side.player.board.apply_gravity();
            side.player.power_gems = tag_power_gems(&mut side.player.board);
            side.player.pending_garbage = 0;
            side.player.pending_short_timer = false;
            log::debug!("side {i}: {placed} garbage delivered, timer {timer}");
        }

        if !side.player.spawn_pair() {
            log::info!("side {i} topped out with score {}", side.player.score);
        }
    }

    /// Apply modifiers, cancel own pending garbage, push the rest to the
    /// opponent. Returns what was sent.
    fn exchange(&mut self, i: usize, report: &CascadeReport) -> i64 {
        let side = &mut self.sides[i];
        let attack = apply_modifiers(report.total_attack, side.damage_modifier, report.diamond_clear);
        let counter = resolve_counter_attack(attack, side.player.pending_garbage, COUNTER_RATIO);
        side.player.pending_garbage = counter.remaining_garbage;
        // The short timer belongs to the garbage that survived a cancel; it goes when that does.
        side.player.pending_short_timer = counter.remaining_garbage > 0
            && (side.player.pending_short_timer || counter.pending_starts_at_three);
        if attack > 0 {
            log::debug!(
                "side {i}: chain {} attack {attack}, canceled {}, sent {}",
                report.chain_len,
                counter.canceled,
                counter.remaining_attack
            );
        }
        let sent = counter.remaining_attack.max(0);
        if sent > 0 {
            self.sides[1 - i].player.pending_garbage += sent;
        }
        sent
    }

    fn update_outcome(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let alive = [self.sides[0].player.alive, self.sides[1].player.alive];
        self.outcome = match alive {
            [true, true] => None,
            [true, false] => Some(MatchOutcome::Winner(0)),
            [false, true] => Some(MatchOutcome::Winner(1)),
            [false, false] => Some(MatchOutcome::Draw),
        };
        if let Some(outcome) = self.outcome {
            log::info!("match over after {} ticks: {outcome:?}", self.ticks);
        }
    }

    /// Tick until someone tops out or `max_ticks` runs out (a draw).
    pub fn run_to_end(&mut self, max_ticks: u64) -> MatchOutcome {
        while self.outcome.is_none() && self.ticks < max_ticks {
            self.tick();
        }
        *self.outcome.get_or_insert(MatchOutcome::Draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, SPAWN_COL};
    use crate::gem::{Gem, GemColor};
    use crate::pair::GemPair;

    fn config(mode: GameMode) -> GameConfig {
        GameConfig {
            mode,
            seed: 1234,
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_new_match_spawns_both_sides() {
        let m = Match::new(&config(GameMode::Versus));
        assert!(!m.sides[0].is_ai());
        assert!(m.sides[1].is_ai());
        assert!(m.sides.iter().all(|s| s.player.current_pair.is_some()));
        assert_eq!(m.sides[0].player.current_pair, m.sides[1].player.current_pair);
    }

    #[test]
    fn test_gravity_tick_drops_pair() {
        let mut m = Match::new(&GameConfig {
            fall_frames: 2,
            ..config(GameMode::Versus)
        });
        m.tick();
        assert_eq!(m.sides[0].player.current_pair.map(|p| p.row), Some(0));
        m.tick();
        assert_eq!(m.sides[0].player.current_pair.map(|p| p.row), Some(1));
    }

    #[test]
    fn test_attack_cancels_then_sends() {
        let mut m = Match::new(&config(GameMode::Versus));
        // Red crash over a red pair: 3 gems at chain 1 = attack 3.
        m.sides[0].player.board = Board::from_rows(&["...r..", "...r.."]);
        m.sides[0].player.current_pair = Some(GemPair::new(
            Gem::crash(GemColor::Red),
            Gem::normal(GemColor::Yellow),
        ));
        m.sides[0].player.pending_garbage = 1;
        m.hard_drop(0);
        // 3 attack: 2 cancel the single pending gem, 1 goes across.
        assert_eq!(m.sides[0].player.pending_garbage, 0);
        assert_eq!(m.sides[1].player.pending_garbage, 1);
        assert_eq!(m.sides[0].attack_sent, 1);
        assert_eq!(m.sides[0].best_chain, 1);
        assert!(!m.sides[0].flash_cells.is_empty());
    }

    #[test]
    fn test_quiet_lock_delivers_pending_garbage() {
        let mut m = Match::new(&config(GameMode::Versus));
        m.sides[0].player.current_pair = Some(GemPair::new(
            Gem::normal(GemColor::Red),
            Gem::normal(GemColor::Blue),
        ));
        m.sides[0].player.pending_garbage = 4;
        m.hard_drop(0);
        let board = &m.sides[0].player.board;
        let counters: Vec<_> = board.gems().filter(|(_, _, g)| g.is_counter()).collect();
        assert_eq!(counters.len(), 4);
        assert!(counters.iter().all(|(_, _, g)| g.counter_timer() == Some(COUNTER_TIMER)));
        assert_eq!(m.sides[0].player.pending_garbage, 0);
        assert_eq!(board.count(), 6);
    }

    /// Lock a red crash onto two reds (attack 3) against `pending` garbage.
    fn partial_cancel(m: &mut Match, pending: i64) {
        m.sides[0].player.board = Board::from_rows(&["...r..", "...r.."]);
        m.sides[0].player.current_pair = Some(GemPair::new(
            Gem::crash(GemColor::Red),
            Gem::normal(GemColor::Yellow),
        ));
        m.sides[0].player.pending_garbage = pending;
        m.hard_drop(0);
    }

    fn quiet_lock(m: &mut Match) {
        m.sides[0].player.current_pair = Some(GemPair::new(
            Gem::normal(GemColor::Green),
            Gem::normal(GemColor::Blue),
        ));
        m.hard_drop(0);
    }

    fn counter_timers(m: &Match) -> Vec<u8> {
        m.sides[0]
            .player
            .board
            .gems()
            .filter_map(|(_, _, g)| g.counter_timer())
            .collect()
    }

    #[test]
    fn test_garbage_left_by_partial_cancel_lands_on_short_timer() {
        let mut m = Match::new(&config(GameMode::Versus));
        partial_cancel(&mut m, 4);
        assert_eq!(m.sides[0].player.pending_garbage, 3);
        assert!(m.sides[0].player.pending_short_timer);
        assert!(counter_timers(&m).is_empty());

        quiet_lock(&mut m);
        assert_eq!(counter_timers(&m), vec![SHORT_COUNTER_TIMER; 3]);
        assert_eq!(m.sides[0].player.pending_garbage, 0);
        assert!(!m.sides[0].player.pending_short_timer);
    }

    #[test]
    fn test_full_cancel_clears_short_timer() {
        let mut m = Match::new(&config(GameMode::Versus));
        partial_cancel(&mut m, 4);
        assert!(m.sides[0].player.pending_short_timer);

        // Six reds at chain 1 = attack 6 cancels the remaining 3 exactly.
        m.sides[0].player.board = Board::from_rows(&["...r.."; 5]);
        m.sides[0].player.current_pair = Some(GemPair::new(
            Gem::crash(GemColor::Red),
            Gem::normal(GemColor::Yellow),
        ));
        m.hard_drop(0);
        assert_eq!(m.sides[0].player.pending_garbage, 0);
        assert!(!m.sides[0].player.pending_short_timer);

        // Fresh garbage from the opponent starts at the full timer.
        m.sides[0].player.pending_garbage = 3;
        quiet_lock(&mut m);
        assert_eq!(counter_timers(&m), vec![COUNTER_TIMER; 3]);
    }

    #[test]
    fn test_topping_out_ends_match() {
        let mut m = Match::new(&config(GameMode::Versus));
        let mut board = Board::new();
        for r in 1..12 {
            board.set(r, SPAWN_COL, Some(Gem::normal(GemColor::Green)));
        }
        m.sides[0].player.board = board;
        m.sides[0].player.current_pair = Some(GemPair::new(
            Gem::normal(GemColor::Red),
            Gem::normal(GemColor::Blue),
        ));
        m.hard_drop(0);
        assert!(!m.sides[0].player.alive);
        m.tick();
        assert_eq!(m.outcome, Some(MatchOutcome::Winner(1)));
    }

    #[test]
    fn test_headless_ai_match_finishes() {
        let mut m = Match::new(&GameConfig {
            fall_frames: 4,
            ..config(GameMode::Headless)
        });
        let outcome = m.run_to_end(50_000);
        assert!(m.is_over());
        assert_eq!(m.outcome, Some(outcome));
        assert!(m.sides.iter().any(|s| s.player.total_drops > 10));
    }

    #[test]
    fn test_headless_match_is_deterministic() {
        let run = || {
            let mut m = Match::new(&config(GameMode::Headless));
            let outcome = m.run_to_end(20_000);
            (outcome, m.ticks, m.sides[0].player.score, m.sides[1].player.score)
        };
        assert_eq!(run(), run());
    }
}
