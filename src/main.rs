//! crashtui: a puzzle-fighter style falling-gem duel in the terminal.

mod ai;
mod app;
mod attack;
mod board;
mod crash;
mod diamond;
mod game;
mod garbage;
mod gem;
mod input;
mod logging;
mod pair;
mod player;
mod power;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use game::{Match, MatchOutcome};
use player::PairSettings;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Everything a match needs, validated from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub seed: u64,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    /// Character damage modifier, per side.
    pub damage_modifiers: [f64; 2],
    /// Ticks between automatic one-row drops.
    pub fall_frames: u32,
    pub pairs: PairSettings,
    /// Headless tick limit; running out is a draw.
    pub max_ticks: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            mode: GameMode::Versus,
            difficulty: Difficulty::Medium,
            damage_modifiers: [1.0, 1.0],
            fall_frames: 30,
            pairs: PairSettings::default(),
            max_ticks: 100_000,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a finite number above zero, got {value}")]
    DamageModifier { name: &'static str, value: f64 },
    #[error("crash chance must be within 0..=1, got {0}")]
    CrashChance(f64),
    #[error("tick rate must be a finite number above zero, got {0}")]
    TickRate(f64),
    #[error("fall frames must be at least 1")]
    FallFrames,
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("damage modifier", args.damage_modifier),
            ("opponent damage modifier", args.opponent_damage_modifier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::DamageModifier { name, value });
            }
        }
        if !(0.0..=1.0).contains(&args.crash_chance) {
            return Err(ConfigError::CrashChance(args.crash_chance));
        }
        if !args.tick_rate.is_finite() || args.tick_rate <= 0.0 {
            return Err(ConfigError::TickRate(args.tick_rate));
        }
        if args.fall_frames == 0 {
            return Err(ConfigError::FallFrames);
        }
        Ok(Self {
            seed: args.seed.unwrap_or_else(clock_seed),
            mode: args.mode,
            difficulty: args.difficulty,
            damage_modifiers: [args.damage_modifier, args.opponent_damage_modifier],
            fall_frames: args.fall_frames,
            pairs: PairSettings {
                diamond_interval: args.diamond_interval,
                crash_chance: args.crash_chance,
            },
            max_ticks: args.max_ticks,
        })
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5EED)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = GameConfig::from_args(&args)?;
    if let Some(path) = args.log_file.as_deref() {
        logging::init(path, args.log_level)?;
    }

    if config.mode == GameMode::Headless {
        let mut m = Match::new(&config);
        let outcome = m.run_to_end(config.max_ticks);
        let verdict = match outcome {
            MatchOutcome::Winner(side) => format!("side {side} wins"),
            MatchOutcome::Draw => "draw".to_string(),
        };
        println!(
            "seed {}: {verdict} after {} ticks (scores {} / {})",
            config.seed, m.ticks, m.sides[0].player.score, m.sides[1].player.score
        );
        return Ok(());
    }

    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("{e}; falling back to the default theme");
        theme::Theme::default()
    });
    let mut app = App::new(&args, config, theme);
    app.run()
}

/// Falling-gem duel against a heuristic AI.
#[derive(Debug, Parser)]
#[command(
    name = "crashtui",
    version,
    about = "Puzzle-fighter style gem duel in the terminal. Detonate crash gems, build power gems, bury your opponent in counters.",
    long_about = "crashtui is a two-board falling-gem duel.\n\n\
        Pairs of coloured gems fall into a 6x12 well. A crash gem touching a gem of its colour \
        clears the whole connected group; clears chain as gems fall. Attack sent across \
        becomes counter gems on the other board, which turn normal after five of that \
        player's drops. Attacks cancel your own pending garbage first.\n\n\
        CONTROLS:\n  Left/Right h/l  Move      Up/k/i  Rotate CW    u/z   Rotate CCW\n  \
        Down/j          Soft drop Space/Enter Hard drop  p    Pause\n  r               Restart   q/Esc   Quit"
)]
pub struct Args {
    /// Who plays: versus (you vs AI), watch (AI vs AI), headless (AI vs AI, no UI, prints the result).
    #[arg(short, long, default_value = "versus")]
    pub mode: GameMode,

    /// AI strength.
    #[arg(short, long, default_value = "medium")]
    pub difficulty: Difficulty,

    /// Match seed; both boards get the same pair sequence. Defaults to the clock.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Damage multiplier on attacks sent by the left side.
    #[arg(long, default_value = "1.0", value_name = "X")]
    pub damage_modifier: f64,

    /// Damage multiplier on attacks sent by the right side.
    #[arg(long, default_value = "1.0", value_name = "X")]
    pub opponent_damage_modifier: f64,

    /// Game logic ticks per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Ticks between automatic one-row drops.
    #[arg(long, default_value = "30", value_name = "N")]
    pub fall_frames: u32,

    /// Headless mode tick limit; reaching it is a draw.
    #[arg(long, default_value = "100000", value_name = "N")]
    pub max_ticks: u64,

    /// Every N-th pair carries a diamond (0 disables).
    #[arg(long, default_value = "25", value_name = "N")]
    pub diamond_interval: u32,

    /// Chance each generated gem is a crash gem.
    #[arg(long, default_value = "0.25", value_name = "P")]
    pub crash_chance: f64,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Write log records to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Minimum level written to --log-file.
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: log::LevelFilter,

    /// Disable the clear flash.
    #[arg(long)]
    pub no_animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GameMode {
    #[default]
    Versus,
    Watch,
    Headless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("crashtui").chain(extra.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = GameConfig::from_args(&parse(&["--seed", "9"])).unwrap();
        assert_eq!(config, GameConfig {
            seed: 9,
            ..GameConfig::default()
        });
    }

    #[test]
    fn test_rejects_bad_modifiers() {
        let err = GameConfig::from_args(&parse(&["--damage-modifier", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::DamageModifier { .. }));
        let err = GameConfig::from_args(&parse(&["--opponent-damage-modifier=-1.5"])).unwrap_err();
        assert!(matches!(err, ConfigError::DamageModifier { .. }));
        let err = GameConfig::from_args(&parse(&["--crash-chance", "1.5"])).unwrap_err();
        assert_eq!(err, ConfigError::CrashChance(1.5));
        let err = GameConfig::from_args(&parse(&["--fall-frames", "0"])).unwrap_err();
        assert_eq!(err, ConfigError::FallFrames);
    }

    #[test]
    fn test_mode_and_difficulty_values() {
        let args = parse(&["-m", "headless", "-d", "hard", "--max-ticks", "500"]);
        let config = GameConfig::from_args(&args).unwrap();
        assert_eq!(config.mode, GameMode::Headless);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.max_ticks, 500);
    }
}
