//! Colours: btop-style `theme[key]="value"` files mapped onto the four gem colours.

use crate::gem::GemColor;
use crate::Palette;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Gem and chrome colours.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Indexed by `GemColor::index`: red, green, blue, yellow.
    pub gems: [Color; 4],
    pub diamond: Color,
    /// Well background.
    pub bg: Color,
    pub div_line: Color,
    pub main_fg: Color,
    pub title: Color,
    /// Counter timers, ghost text, hints.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("cannot read theme: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex colour: {0}")]
    InvalidHex(String),
}

const ONEDARK_GEMS: [Color; 4] = [
    Color::Rgb(0xE0, 0x6C, 0x75),
    Color::Rgb(0x98, 0xC3, 0x79),
    Color::Rgb(0x61, 0xAF, 0xEF),
    Color::Rgb(0xE5, 0xC0, 0x7B),
];

const HIGH_CONTRAST_GEMS: [Color; 4] = [
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0xFF, 0xFF, 0x00),
];

// Tol's bright scheme; no red/green pair relies on hue alone.
const COLORBLIND_GEMS: [Color; 4] = [
    Color::Rgb(0xCC, 0x33, 0x11),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0xEE, 0x77, 0x33),
];

impl Default for Theme {
    fn default() -> Self {
        Self {
            gems: ONEDARK_GEMS,
            diamond: Color::Rgb(0xDC, 0xDF, 0xE4),
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }
}

impl Theme {
    /// Load a btop-style theme, or One Dark when `path` is None or missing.
    /// The palette override is applied last.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let text = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&text))
            }
            Some(p) => {
                log::warn!("theme {} not found, using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.gems = HIGH_CONTRAST_GEMS;
                self.diamond = Color::White;
            }
            Palette::Colorblind => self.gems = COLORBLIND_GEMS,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |keys: &[&str]| keys.iter().find_map(|k| map.get(*k).and_then(|v| parse_hex(v).ok()));
        let d = Self::default();
        Self {
            gems: [
                get(&["cpu_end", "temp_end"]).unwrap_or(d.gems[0]),
                get(&["mem_box", "cpu_start"]).unwrap_or(d.gems[1]),
                get(&["cpu_box"]).unwrap_or(d.gems[2]),
                get(&["cpu_mid", "title"]).unwrap_or(d.gems[3]),
            ],
            diamond: get(&["hi_fg"]).unwrap_or(d.diamond),
            bg: get(&["meter_bg"]).unwrap_or(d.bg),
            div_line: get(&["div_line"]).unwrap_or(d.div_line),
            main_fg: get(&["main_fg"]).unwrap_or(d.main_fg),
            title: get(&["title"]).unwrap_or(d.title),
            inactive_fg: get(&["inactive_fg"]).unwrap_or(d.inactive_fg),
        }
    }

    #[inline]
    pub fn gem_color(&self, color: GemColor) -> Color {
        self.gems[color.index()]
    }
}

/// `theme[key]="value"` lines into a map; comments and junk are skipped.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let rest = line.strip_prefix("theme[")?;
            let (key, rest) = rest.split_once(']')?;
            let (_, value) = rest.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// `#RRGGBB` or `#RGB`.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>, scale: u8| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map(|v| v * scale)
            .ok_or_else(bad)
    };
    match hex.len() {
        6 => Ok(Color::Rgb(channel(0..2, 1)?, channel(2..4, 1)?, channel(4..6, 1)?)),
        3 => Ok(Color::Rgb(channel(0..1, 17)?, channel(1..2, 17)?, channel(2..3, 17)?)),
        _ => Err(bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(parse_hex("#98C379").unwrap(), Color::Rgb(0x98, 0xC3, 0x79));
        assert_eq!(parse_hex("#FFF").unwrap(), Color::Rgb(255, 255, 255));
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GG0000").is_err());
    }

    #[test]
    fn test_theme_file_overrides_gems() {
        let map = parse_theme_file(
            "# comment\ntheme[cpu_end]=\"#FF0000\"\ntheme[meter_bg]='#000000'\ngarbage line\n",
        );
        assert_eq!(map.len(), 2);
        let theme = Theme::from_map(&map);
        assert_eq!(theme.gem_color(GemColor::Red), Color::Rgb(255, 0, 0));
        assert_eq!(theme.bg, Color::Rgb(0, 0, 0));
        assert_eq!(theme.gem_color(GemColor::Blue), Theme::default().gems[2]);
    }

    #[test]
    fn test_palette_override() {
        let theme = Theme::load(None, Palette::Colorblind).unwrap();
        assert_eq!(theme.gems, COLORBLIND_GEMS);
    }
}
