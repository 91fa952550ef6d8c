//! Layout and drawing: two wells with sidebars, pause and game-over overlays, the clear flash.

use crate::ai::Ai;
use crate::app::Screen;
use crate::board::{COLS, ROWS};
use crate::game::{Match, MatchOutcome, Side};
use crate::gem::{Gem, GemKind};
use crate::pair::GemPair;
use crate::theme::Theme;
use crate::{Difficulty, GameMode};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each gem is two terminal columns wide so cells look square.
const CELL_WIDTH: u16 = 2;
const WELL_WIDTH: u16 = COLS as u16 * CELL_WIDTH + 2;
const WELL_HEIGHT: u16 = ROWS as u16 + 2;
const SIDEBAR_WIDTH: u16 = 18;
const GAP: u16 = 2;
/// Pending garbage that fills the danger gauge.
const DANGER_GARBAGE: f64 = 24.0;
const CLEAR_FADE_MS: u32 = 350;

/// Fade-out of the cells one side's last cascade cleared.
#[derive(Default)]
pub struct ClearFlash {
    effect: Option<Effect>,
    serial: u32,
    last_process: Option<Instant>,
    cells: HashSet<(usize, usize)>,
}

impl ClearFlash {
    fn is_running(&self) -> bool {
        self.effect.as_ref().is_some_and(|e| !e.done())
    }

    /// Start a new fade when the side reports a fresh clear.
    fn sync(&mut self, side: &Side, well: Rect, bg: Color) {
        if side.flash_serial == self.serial {
            return;
        }
        self.serial = side.flash_serial;
        // Only cells left empty are painted; gems that fell in stay visible.
        self.cells = side
            .flash_cells
            .iter()
            .copied()
            .filter(|&(r, c)| !side.player.board.is_occupied(r, c))
            .collect();
        let positions: HashSet<(u16, u16)> = self
            .cells
            .iter()
            .flat_map(|&(r, c)| {
                let x = well.x + c as u16 * CELL_WIDTH;
                let y = well.y + r as u16;
                [(x, y), (x + 1, y)]
            })
            .collect();
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        self.effect = Some(
            fx::fade_to(bg, bg, (CLEAR_FADE_MS, Interpolation::Linear))
                .with_filter(filter)
                .with_area(well),
        );
        self.last_process = None;
    }

    fn render(&mut self, frame: &mut Frame, well: Rect, now: Instant) {
        let delta = self
            .last_process
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        self.last_process = Some(now);
        let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
        if let Some(effect) = self.effect.as_mut() {
            frame.render_effect(effect, well, TfxDuration::from_millis(delta_ms));
        }
        if self.effect.as_ref().is_some_and(Effect::done) {
            self.effect = None;
            self.cells.clear();
        }
    }
}

/// What the frame needs besides the match itself.
pub struct View<'a> {
    pub screen: Screen,
    pub paused: bool,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub theme: &'a Theme,
    pub animate: bool,
    pub now: Instant,
}

pub fn draw(frame: &mut Frame, game: &Match, view: &View, flashes: &mut [ClearFlash; 2]) {
    let area = frame.area();
    let total_w = 2 * (SIDEBAR_WIDTH + WELL_WIDTH) + GAP;
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Fill(1), Constraint::Length(total_w), Constraint::Fill(1)])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(WELL_HEIGHT), Constraint::Fill(1)])
        .split(horiz[1]);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Length(WELL_WIDTH),
            Constraint::Length(GAP),
            Constraint::Length(WELL_WIDTH),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(vert[1]);

    for (i, (well_area, sidebar_area)) in [(cols[1], cols[0]), (cols[3], cols[4])].into_iter().enumerate() {
        let side = &game.sides[i];
        let inner = well_inner(well_area);
        let flash = &mut flashes[i];
        if view.animate {
            flash.sync(side, inner, view.theme.bg);
        }
        draw_well(frame, side, well_area, view, flash);
        draw_sidebar(frame, side, sidebar_area, &side_label(i, side, view), view.theme);
        if view.animate && flash.is_running() {
            flash.render(frame, inner, view.now);
        }
    }

    match view.screen {
        Screen::Playing if view.paused => draw_pause_overlay(frame, view.theme, vert[1]),
        Screen::GameOver => draw_game_over(frame, game, view.theme, vert[1]),
        Screen::Playing => {}
    }
}

fn well_inner(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

fn side_label(i: usize, side: &Side, view: &View) -> String {
    match (side.is_ai(), view.mode) {
        (false, _) => "You".to_string(),
        (true, GameMode::Versus) => format!("AI ({:?})", view.difficulty),
        (true, _) => format!("AI {}", i + 1),
    }
}

/// Glyph and style for a gem. `powered` marks cells inside a power gem.
fn gem_cell(gem: Gem, powered: bool, theme: &Theme) -> (String, Style) {
    let color = theme.gem_color(gem.color);
    match gem.kind {
        GemKind::Normal if powered => ("▓▓".to_string(), Style::default().fg(color).bg(theme.bg).bold()),
        GemKind::Normal => ("██".to_string(), Style::default().fg(color)),
        GemKind::Crash => ("()".to_string(), Style::default().fg(Color::Black).bg(color).bold()),
        GemKind::Counter { timer } => (
            format!("{timer:>2}"),
            Style::default().fg(color).bg(theme.div_line).bold(),
        ),
        GemKind::Diamond => ("◆◆".to_string(), Style::default().fg(theme.diamond).bg(theme.bg)),
    }
}

fn draw_well(frame: &mut Frame, side: &Side, area: Rect, view: &View, flash: &ClearFlash) {
    let theme = view.theme;
    let border = if side.player.alive { theme.div_line } else { Color::Red };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border).bg(theme.bg));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let board = &side.player.board;
    let pair_cells = side.player.current_pair.map(|p| p.cells());
    let buf = frame.buffer_mut();
    for r in 0..ROWS {
        for c in 0..COLS {
            let x = inner.x + c as u16 * CELL_WIDTH;
            let y = inner.y + r as u16;
            if x + CELL_WIDTH > inner.x + inner.width || y >= inner.y + inner.height {
                continue;
            }
            let falling = pair_cells
                .iter()
                .flatten()
                .find(|&&((pr, pc), _)| pr == r as i32 && pc == c as i32)
                .map(|&(_, g)| g);
            let (symbol, style) = match falling.or_else(|| board.get(r, c)) {
                Some(gem) => gem_cell(gem, board.power_tag(r, c).is_some(), theme),
                None if flash.cells.contains(&(r, c)) && flash.is_running() => {
                    ("██".to_string(), Style::default().fg(Color::White))
                }
                None => ("  ".to_string(), Style::default().bg(theme.bg)),
            };
            buf.set_string(x, y, symbol, style);
        }
    }
}

fn draw_sidebar(frame: &mut Frame, side: &Side, area: Rect, label: &str, theme: &Theme) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // next pair
            Constraint::Length(7), // stats
            Constraint::Length(3), // incoming garbage
        ])
        .split(area);

    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(format!(" {label} "), title_style));
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    draw_next_pair(frame, &side.player.next_pair, next_inner, theme);

    let player = &side.player;
    let stat = |name: &'static str, value: String| {
        Line::from(vec![Span::styled(name, title_style), Span::styled(value, fg_style)])
    };
    let mut stats = vec![
        stat("Score ", player.score.to_string()),
        stat("Chain ", side.best_chain.to_string()),
        stat("Sent  ", side.attack_sent.to_string()),
        stat("Drops ", player.total_drops.to_string()),
    ];
    if let Some(target) = side.ai.as_ref().and_then(Ai::target) {
        stats.push(stat("Aim   ", format!("col {}", target.col + 1)));
    }
    let stats_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_inner = stats_block.inner(chunks[1]);
    stats_block.render(chunks[1], frame.buffer_mut());
    Paragraph::new(Text::from(stats)).render(stats_inner, frame.buffer_mut());

    let pending = player.pending_garbage.max(0);
    let ratio = (pending as f64 / DANGER_GARBAGE).min(1.0);
    let bar_color = if ratio > 0.6 {
        Color::Red
    } else if ratio > 0.25 {
        Color::Yellow
    } else {
        Color::Green
    };
    let mut gauge_label = format!("Incoming {pending}");
    if player.pending_short_timer && pending > 0 {
        gauge_label.push_str(" (3)");
    }
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).border_style(border_style))
        .ratio(ratio)
        .label(gauge_label)
        .gauge_style(Style::default().fg(bar_color).bg(theme.bg));
    gauge.render(chunks[2], frame.buffer_mut());
}

/// Next pair drawn in spawn orientation: secondary above primary.
fn draw_next_pair(frame: &mut Frame, pair: &GemPair, area: Rect, theme: &Theme) {
    let x = area.x + area.width.saturating_sub(CELL_WIDTH) / 2;
    for (dy, gem) in [(0, pair.secondary), (1, pair.primary)] {
        let y = area.y + dy;
        if y >= area.y + area.height {
            break;
        }
        let (symbol, style) = gem_cell(gem, false, theme);
        frame.buffer_mut().set_string(x, y, symbol, style);
    }
}

fn popup_rect(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = popup_rect(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(" Paused ", Style::default().fg(Color::Black).bg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled(" P Resume    Q Quit ", Style::default().fg(theme.main_fg))),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, game: &Match, theme: &Theme, area: Rect) {
    let popup = popup_rect(area, 34, 9);
    let verdict = match game.outcome {
        Some(MatchOutcome::Winner(0)) if !game.sides[0].is_ai() => " You win! ".to_string(),
        Some(MatchOutcome::Winner(_)) if !game.sides[0].is_ai() => " You lose ".to_string(),
        Some(MatchOutcome::Winner(side)) => format!(" AI {} wins ", side + 1),
        Some(MatchOutcome::Draw) | None => " Draw ".to_string(),
    };
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(verdict, Style::default().fg(Color::White).bg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                " Score {} : {} ",
                game.sides[0].player.score, game.sides[1].player.score
            ),
            fg,
        )),
        Line::from(Span::styled(format!(" {} ticks ", game.ticks), fg)),
        Line::from(""),
        Line::from(Span::styled(" R Restart    Q Quit ", fg)),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" crashtui ", theme.title)),
        )
        .render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gem::GemColor;

    #[test]
    fn test_gem_cells_are_two_columns() {
        let theme = Theme::default();
        for gem in [
            Gem::normal(GemColor::Red),
            Gem::crash(GemColor::Blue),
            Gem::counter(GemColor::Green, 5),
            Gem::diamond(),
        ] {
            let (symbol, _) = gem_cell(gem, false, &theme);
            assert_eq!(symbol.chars().count(), CELL_WIDTH as usize);
        }
        assert_eq!(gem_cell(Gem::counter(GemColor::Green, 3), false, &theme).0, " 3");
    }

    #[test]
    fn test_power_gem_cells_differ() {
        let theme = Theme::default();
        let gem = Gem::normal(GemColor::Yellow);
        assert_ne!(gem_cell(gem, true, &theme).0, gem_cell(gem, false, &theme).0);
    }
}
