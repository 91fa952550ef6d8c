//! Player state: board, current/next pair, pair generation, spawning and the lock cascade.

use crate::attack::step_attack;
use crate::board::Board;
use crate::crash::{destroyed_power_areas, resolve_crashes, CellSet};
use crate::diamond::resolve_diamonds;
use crate::gem::{Gem, GemColor};
use crate::pair::GemPair;
use crate::power::{tag_power_gems, PowerGem};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Score points per attack point.
const SCORE_PER_ATTACK: u64 = 10;

/// Pair generator knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSettings {
    /// Every n-th pair is a diamond pair (0 disables diamonds).
    pub diamond_interval: u32,
    /// Chance each generated gem is a crash gem.
    pub crash_chance: f64,
}

impl Default for PairSettings {
    fn default() -> Self {
        Self {
            diamond_interval: 25,
            crash_chance: 0.25,
        }
    }
}

/// Summary of one lock-to-quiescence cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Sum of step attacks before modifiers.
    pub total_attack: i64,
    /// Number of chain steps that cleared something.
    pub chain_len: u32,
    pub gems_cleared: usize,
    pub diamond_clear: bool,
    /// Every cell cleared during the cascade, in order.
    pub cleared_cells: Vec<(usize, usize)>,
}

/// One side of a match.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub board: Board,
    pub current_pair: Option<GemPair>,
    pub next_pair: GemPair,
    pub score: u64,
    /// Garbage owed by the opponent and not yet placed.
    pub pending_garbage: i64,
    /// Reserved; nothing reads or writes it yet.
    #[allow(dead_code)]
    pub pending_countered_garbage: i64,
    /// Next delivery of pending garbage uses the short countdown.
    pub pending_short_timer: bool,
    pub alive: bool,
    pub total_drops: u32,
    /// Power gems from the most recent detection pass, for display.
    pub power_gems: Vec<PowerGem>,
    pub(crate) rng: StdRng,
    settings: PairSettings,
}

impl PlayerState {
    pub fn new(seed: u64, settings: PairSettings) -> Self {
        let mut state = Self {
            board: Board::new(),
            current_pair: None,
            next_pair: GemPair::new(Gem::diamond(), Gem::diamond()),
            score: 0,
            pending_garbage: 0,
            pending_countered_garbage: 0,
            pending_short_timer: false,
            alive: true,
            total_drops: 0,
            power_gems: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            settings,
        };
        state.next_pair = state.generate_pair();
        state
    }

    fn random_gem<R: Rng + ?Sized>(rng: &mut R, settings: PairSettings) -> Gem {
        let color = GemColor::random(rng);
        if rng.gen_bool(settings.crash_chance) {
            Gem::crash(color)
        } else {
            Gem::normal(color)
        }
    }

    fn random_pair<R: Rng + ?Sized>(rng: &mut R, settings: PairSettings) -> GemPair {
        let primary = Self::random_gem(rng, settings);
        let secondary = Self::random_gem(rng, settings);
        GemPair::new(primary, secondary)
    }

    /// Pair number `total_drops + 1`: a diamond pair on the interval, random otherwise.
    fn generate_pair(&mut self) -> GemPair {
        let interval = self.settings.diamond_interval;
        if interval > 0 && (self.total_drops + 1) % interval == 0 {
            let secondary = Gem::normal(GemColor::random(&mut self.rng));
            GemPair::new(Gem::diamond(), secondary)
        } else {
            Self::random_pair(&mut self.rng, self.settings)
        }
    }

    /// Promote the next pair to current at the spawn anchor and pre-generate
    /// the following one. Returns false, and marks the player dead, if the
    /// new pair does not fit.
    pub fn spawn_pair(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        let mut pair = self.next_pair;
        pair.reset_to_spawn();
        self.total_drops += 1;
        self.next_pair = self.generate_pair();
        if !pair.is_valid(&self.board) {
            log::info!("spawn blocked after {} drops", self.total_drops);
            self.alive = false;
            self.current_pair = None;
            return false;
        }
        self.current_pair = Some(pair);
        true
    }

    pub fn move_pair(&mut self, dcol: i32) -> bool {
        match self.current_pair.as_mut() {
            Some(pair) => pair.try_move(&self.board, dcol),
            None => false,
        }
    }

    pub fn rotate_pair(&mut self, clockwise: bool) -> bool {
        match self.current_pair.as_mut() {
            Some(pair) => pair.rotate(&self.board, clockwise),
            None => false,
        }
    }

    pub fn drop_pair(&mut self) -> bool {
        match self.current_pair.as_mut() {
            Some(pair) => pair.drop(&self.board),
            None => false,
        }
    }

    pub fn hard_drop_pair(&mut self) -> u32 {
        match self.current_pair.as_mut() {
            Some(pair) => pair.hard_drop(&self.board),
            None => 0,
        }
    }

    /// Write the current pair into the board. Returns false with no pair.
    pub fn lock_pair(&mut self) -> bool {
        let Some(pair) = self.current_pair.take() else {
            return false;
        };
        log::trace!(
            "lock at {:?}/{:?}",
            pair.primary_pos(),
            pair.secondary_pos()
        );
        pair.lock(&mut self.board);
        true
    }

    /// Gravity, then clear passes until nothing ignites, chain step counting from 1.
    pub fn resolve_board(&mut self) -> CascadeReport {
        let mut report = CascadeReport::default();
        self.board.apply_gravity();
        let mut chain_step = 1u32;
        loop {
            let power = tag_power_gems(&mut self.board);
            self.power_gems.clone_from(&power);

            let diamond = resolve_diamonds(&mut self.board);
            let crash = resolve_crashes(&self.board, &power);
            if diamond.is_empty() && crash.is_empty() {
                break;
            }

            let mut cleared: CellSet = diamond.iter().map(|d| (d.row, d.col)).collect();
            cleared.extend(crash.cells.iter().copied());
            for &(r, c) in &crash.cells {
                self.board.take(r, c);
            }
            // A diamond wipe can take a power gem the crash pass never touched.
            let power_areas = if diamond.is_empty() {
                crash.power_areas
            } else {
                destroyed_power_areas(&power, &cleared)
            };

            let attack = step_attack(cleared.len(), &power_areas, chain_step);
            log::debug!(
                "chain {chain_step}: {} gems, power {:?}, attack {attack}",
                cleared.len(),
                power_areas
            );
            report.total_attack += attack;
            report.gems_cleared += cleared.len();
            report.diamond_clear |= !diamond.is_empty();
            report.chain_len = chain_step;
            report.cleared_cells.extend(cleared.iter().copied());
            self.score += attack.max(0) as u64 * SCORE_PER_ATTACK;

            self.board.apply_gravity();
            chain_step += 1;
        }
        self.power_gems = tag_power_gems(&mut self.board);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::SPAWN_COL;

    fn state(board: Board) -> PlayerState {
        let mut s = PlayerState::new(11, PairSettings::default());
        s.board = board;
        s
    }

    #[test]
    fn test_spawn_promotes_next_and_counts_drops() {
        let mut s = state(Board::new());
        let expected = s.next_pair;
        assert!(s.spawn_pair());
        let current = s.current_pair.expect("spawned pair");
        assert_eq!((current.primary, current.secondary), (expected.primary, expected.secondary));
        assert_eq!((current.row, current.col, current.orientation), (0, SPAWN_COL as i32, 0));
        assert_eq!(s.total_drops, 1);
    }

    #[test]
    fn test_spawn_blocked_sets_dead() {
        let mut board = Board::new();
        board.set(0, SPAWN_COL, Some(Gem::normal(GemColor::Red)));
        let mut s = state(board);
        assert!(!s.spawn_pair());
        assert!(!s.alive);
        assert!(s.current_pair.is_none());
        assert!(!s.spawn_pair());
    }

    #[test]
    fn test_diamond_pair_on_interval() {
        let settings = PairSettings {
            diamond_interval: 3,
            crash_chance: 0.0,
        };
        let mut s = PlayerState::new(5, settings);
        let mut kinds = Vec::new();
        for _ in 0..6 {
            assert!(s.spawn_pair());
            let pair = s.current_pair.take().expect("pair");
            kinds.push(pair.primary.is_diamond());
        }
        assert_eq!(kinds, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = PlayerState::new(99, PairSettings::default());
        let mut b = PlayerState::new(99, PairSettings::default());
        for _ in 0..10 {
            a.spawn_pair();
            b.spawn_pair();
            assert_eq!(a.current_pair.take(), b.current_pair.take());
        }
    }

    #[test]
    fn test_cascade_chain_two_steps() {
        // Red crash clears the reds; the blue crash then falls onto blue and clears it.
        let board = Board::from_rows(&["B.....", "r.....", "rR....", "bb...."]);
        let mut s = state(board);
        let report = s.resolve_board();
        assert_eq!(report.chain_len, 2);
        // Step 1: three reds at ×1; step 2: crash plus two blues at ×2.
        assert_eq!(report.total_attack, 3 + 6);
        assert_eq!(report.gems_cleared, 6);
        assert_eq!(s.board.count(), 0);
        assert_eq!(s.score, 90);
    }

    #[test]
    fn test_cascade_quiet_board() {
        let mut s = state(Board::from_rows(&["rgby.."]));
        let report = s.resolve_board();
        assert_eq!(report, CascadeReport::default());
        assert_eq!(s.board.count(), 4);
    }

    #[test]
    fn test_cascade_power_gem_bonus() {
        // 4×2 yellow power gem (area 8) detonated by a yellow crash.
        let board = Board::from_rows(&["yyyyY.", "yyyy.."]);
        let mut s = state(board);
        let report = s.resolve_board();
        assert_eq!(report.gems_cleared, 9);
        assert_eq!(report.total_attack, 10);
    }

    #[test]
    fn test_cascade_diamond_flag() {
        let board = Board::from_rows(&["*.....", "g.g..."]);
        let mut s = state(board);
        let report = s.resolve_board();
        assert!(report.diamond_clear);
        assert_eq!(report.gems_cleared, 3);
        assert_eq!(s.board.count(), 0);
    }

    #[test]
    fn test_lock_and_moves_without_pair() {
        let mut s = state(Board::new());
        assert!(!s.lock_pair());
        assert!(!s.move_pair(1));
        assert!(!s.rotate_pair(true));
        assert_eq!(s.hard_drop_pair(), 0);
    }
}
