//! Attack economy: chain-step scoring, damage modifiers, counter-attack cancellation.

/// Garbage cancelled per unit of pending garbage (two attack points cancel one gem).
pub const COUNTER_RATIO: i64 = 2;

/// Attack for one chain step: `(gems + Σ⌊area/8⌋) × chain_step`.
pub fn step_attack(gems_cleared: usize, power_gem_areas: &[usize], chain_step: u32) -> i64 {
    let bonus: usize = power_gem_areas.iter().map(|area| area / 8).sum();
    (gems_cleared + bonus) as i64 * i64::from(chain_step)
}

/// Character modifier first, then the diamond halving, each floored.
pub fn apply_modifiers(total: i64, damage_modifier: f64, is_diamond_clear: bool) -> i64 {
    let mut attack = (total as f64 * damage_modifier).floor() as i64;
    if is_diamond_clear {
        attack = (attack as f64 * 0.5).floor() as i64;
    }
    attack
}

/// Result of spending an attack against the attacker's own pending garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterOutcome {
    pub canceled: i64,
    pub remaining_attack: i64,
    pub remaining_garbage: i64,
    /// Surviving garbage should start its countdown at the shorter timer.
    pub pending_starts_at_three: bool,
}

/// Cancel pending garbage with `attack`, `ratio` attack points per gem.
pub fn resolve_counter_attack(attack: i64, pending_garbage: i64, ratio: i64) -> CounterOutcome {
    if attack <= 0 || pending_garbage <= 0 || ratio <= 0 {
        return CounterOutcome {
            canceled: 0,
            remaining_attack: attack,
            remaining_garbage: pending_garbage,
            pending_starts_at_three: false,
        };
    }
    let cancelable = attack / ratio;
    let canceled = cancelable.min(pending_garbage);
    let remaining_garbage = pending_garbage - canceled;
    CounterOutcome {
        canceled,
        remaining_attack: attack - canceled * ratio,
        remaining_garbage,
        pending_starts_at_three: canceled > 0 && remaining_garbage > 0,
    }
}
