//! Gem values: colour, kind and the counter timer.

use rand::Rng;

/// Gem colours (red, green, blue, yellow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GemColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl GemColor {
    pub const ALL: [Self; 4] = [Self::Red, Self::Green, Self::Blue, Self::Yellow];

    /// Uniformly random colour.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Palette index used by the theme (0..4).
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Yellow => 3,
        }
    }
}

/// What a gem does. The counter timer lives inside the variant, so a timer
/// can only exist on a counter gem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemKind {
    Normal,
    Crash,
    Counter { timer: u8 },
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gem {
    pub color: GemColor,
    pub kind: GemKind,
}

impl Gem {
    pub fn normal(color: GemColor) -> Self {
        Self {
            color,
            kind: GemKind::Normal,
        }
    }

    pub fn crash(color: GemColor) -> Self {
        Self {
            color,
            kind: GemKind::Crash,
        }
    }

    pub fn counter(color: GemColor, timer: u8) -> Self {
        Self {
            color,
            kind: GemKind::Counter { timer },
        }
    }

    /// Diamonds carry a colour only so every cell has one; it is never matched.
    pub fn diamond() -> Self {
        Self {
            color: GemColor::Red,
            kind: GemKind::Diamond,
        }
    }

    #[inline]
    pub fn is_normal(&self) -> bool {
        matches!(self.kind, GemKind::Normal)
    }

    #[inline]
    pub fn is_crash(&self) -> bool {
        matches!(self.kind, GemKind::Crash)
    }

    #[inline]
    pub fn is_counter(&self) -> bool {
        matches!(self.kind, GemKind::Counter { .. })
    }

    #[inline]
    pub fn is_diamond(&self) -> bool {
        matches!(self.kind, GemKind::Diamond)
    }

    /// Remaining countdown for counter gems, `None` for every other kind.
    pub fn counter_timer(&self) -> Option<u8> {
        match self.kind {
            GemKind::Counter { timer } => Some(timer),
            GemKind::Normal | GemKind::Crash | GemKind::Diamond => None,
        }
    }

    /// True if flood-fill may pass through this gem for the given colour.
    pub fn joins_group(&self, color: GemColor) -> bool {
        match self.kind {
            GemKind::Normal | GemKind::Crash => self.color == color,
            GemKind::Counter { .. } | GemKind::Diamond => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_timer_only_on_counter() {
        assert_eq!(Gem::counter(GemColor::Blue, 4).counter_timer(), Some(4));
        assert_eq!(Gem::normal(GemColor::Blue).counter_timer(), None);
        assert_eq!(Gem::crash(GemColor::Blue).counter_timer(), None);
        assert_eq!(Gem::diamond().counter_timer(), None);
    }

    #[test]
    fn test_joins_group() {
        assert!(Gem::normal(GemColor::Red).joins_group(GemColor::Red));
        assert!(Gem::crash(GemColor::Red).joins_group(GemColor::Red));
        assert!(!Gem::crash(GemColor::Red).joins_group(GemColor::Blue));
        assert!(!Gem::counter(GemColor::Red, 2).joins_group(GemColor::Red));
        assert!(!Gem::diamond().joins_group(GemColor::Red));
    }
}
