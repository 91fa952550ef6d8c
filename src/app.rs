//! App: terminal init, main loop, tick timing and key handling.

use crate::game::Match;
use crate::input::{key_to_action, Action};
use crate::theme::Theme;
use crate::ui::{ClearFlash, View};
use crate::{Args, GameConfig, GameMode};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// DAS (Delayed Auto-Shift): delay before movement starts repeating when you hold a key.
const REPEAT_DELAY_MS: u64 = 170;
/// ARR (Auto-Repeat Rate): time between repeated moves while holding.
const REPEAT_INTERVAL_MS: u64 = 50;
/// Cap on ticks replayed after a stall so the game never fast-forwards.
const MAX_CATCH_UP_TICKS: u32 = 5;
const FRAME: Duration = Duration::from_millis(16);
/// Board the keyboard drives in versus mode.
const HUMAN_SIDE: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    /// Restarts reuse the seed only when it came from the command line.
    fixed_seed: bool,
    animate: bool,
    tick_interval: Duration,
    game: Match,
    screen: Screen,
    paused: bool,
    last_tick: Instant,
    repeat_state: Option<(Action, Instant)>,
    last_repeat_fire: Option<Instant>,
    flashes: [ClearFlash; 2],
}

impl App {
    pub fn new(args: &Args, config: GameConfig, theme: Theme) -> Self {
        let game = Match::new(&config);
        Self {
            fixed_seed: args.seed.is_some(),
            animate: !args.no_animation,
            tick_interval: Duration::from_secs_f64(1.0 / args.tick_rate),
            config,
            theme,
            game,
            screen: Screen::Playing,
            paused: false,
            last_tick: Instant::now(),
            repeat_state: None,
            last_repeat_fire: None,
            flashes: Default::default(),
        }
    }

    fn restart(&mut self) {
        if !self.fixed_seed {
            self.config.seed = self.config.seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        }
        log::info!("restart with seed {}", self.config.seed);
        self.game = Match::new(&self.config);
        self.screen = Screen::Playing;
        self.paused = false;
        self.last_tick = Instant::now();
        self.repeat_state = None;
        self.last_repeat_fire = None;
        self.flashes = Default::default();
    }

    fn human_controls(&self) -> bool {
        self.config.mode == GameMode::Versus
    }

    fn apply_action(&mut self, action: Action) {
        if !self.human_controls() {
            return;
        }
        match action {
            Action::MoveLeft => {
                self.game.move_pair(HUMAN_SIDE, -1);
            }
            Action::MoveRight => {
                self.game.move_pair(HUMAN_SIDE, 1);
            }
            Action::RotateCw => {
                self.game.rotate_pair(HUMAN_SIDE, true);
            }
            Action::RotateCcw => {
                self.game.rotate_pair(HUMAN_SIDE, false);
            }
            Action::SoftDrop => self.game.soft_drop(HUMAN_SIDE),
            Action::HardDrop => {
                self.game.hard_drop(HUMAN_SIDE);
                self.repeat_state = None;
            }
            Action::Pause | Action::Restart | Action::Quit | Action::None => {}
        }
    }

    fn tick_repeat(&mut self) {
        let Some((action, first)) = self.repeat_state else {
            return;
        };
        let now = Instant::now();
        if first.elapsed() < Duration::from_millis(REPEAT_DELAY_MS) {
            return;
        }
        let next = self.last_repeat_fire.unwrap_or(first) + Duration::from_millis(REPEAT_INTERVAL_MS);
        if now >= next {
            self.apply_action(action);
            self.last_repeat_fire = Some(now);
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        // Release events let held keys stop repeating; not every terminal supports them.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );
        let mut terminal = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let view = View {
                screen: self.screen,
                paused: self.paused,
                mode: self.config.mode,
                difficulty: self.config.difficulty,
                theme: &self.theme,
                animate: self.animate,
                now,
            };
            let flashes = &mut self.flashes;
            let game = &self.game;
            terminal.draw(|f| crate::ui::draw(f, game, &view, flashes))?;

            let timeout = FRAME.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    let action = key_to_action(key);
                    if key.kind != KeyEventKind::Press {
                        if key.kind == KeyEventKind::Release
                            && self.repeat_state.map(|(a, _)| a) == Some(action)
                        {
                            self.repeat_state = None;
                            self.last_repeat_fire = None;
                        }
                        continue;
                    }
                    if self.repeat_state.map(|(a, _)| a) == Some(action) {
                        continue;
                    }
                    match (self.screen, action) {
                        (_, Action::Quit) => return Ok(()),
                        (_, Action::Restart) => self.restart(),
                        (Screen::Playing, Action::Pause) => {
                            self.paused = !self.paused;
                            self.repeat_state = None;
                            // Don't replay the paused time as ticks.
                            self.last_tick = Instant::now();
                        }
                        (Screen::Playing, _) if !self.paused => {
                            self.apply_action(action);
                            if matches!(action, Action::MoveLeft | Action::MoveRight | Action::SoftDrop) {
                                self.repeat_state = Some((action, Instant::now()));
                                self.last_repeat_fire = None;
                            }
                        }
                        _ => {}
                    }
                }
            }

            if self.screen == Screen::Playing && !self.paused {
                self.tick_repeat();
                let mut ticks = 0;
                while self.last_tick.elapsed() >= self.tick_interval && ticks < MAX_CATCH_UP_TICKS {
                    self.last_tick += self.tick_interval;
                    self.game.tick();
                    ticks += 1;
                }
                if ticks == MAX_CATCH_UP_TICKS {
                    self.last_tick = Instant::now();
                }
                if self.game.is_over() {
                    self.screen = Screen::GameOver;
                    self.repeat_state = None;
                }
            }
        }
    }
}
