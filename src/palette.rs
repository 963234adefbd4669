//! Deterministic presentation slots derived from ids and ranks.

use serde::Serialize;

/// Project card background colors.
pub const CARD_PALETTE: [&str; 6] = [
    "#FFF9C4", "#FFCCBC", "#D1C4E9", "#B2EBF2", "#C8E6C9", "#FFE0B2",
];

/// Polynomial string hash `h = 31 * h + unit` over UTF-16 code units with
/// 32-bit wrapping arithmetic. Stable across runs and platforms.
pub fn string_hash(id: &str) -> i32 {
    id.encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Palette slot for an id, in `0..palette_size`. An empty palette maps to 0.
pub fn color_index(id: &str, palette_size: usize) -> usize {
    if palette_size == 0 {
        return 0;
    }
    string_hash(id).unsigned_abs() as usize % palette_size
}

pub fn card_color(id: &str) -> &'static str {
    CARD_PALETTE[color_index(id, CARD_PALETTE.len())]
}

/// Leaderboard medal by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MedalTier {
    First,
    Second,
    Third,
    Default,
}

impl MedalTier {
    /// 0 is first; anything past third place gets no medal.
    pub fn for_rank(index: usize) -> Self {
        match index {
            0 => MedalTier::First,
            1 => MedalTier::Second,
            2 => MedalTier::Third,
            _ => MedalTier::Default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MedalTier::First => "first",
            MedalTier::Second => "second",
            MedalTier::Third => "third",
            MedalTier::Default => "default",
        }
    }

    /// Start and end colors of the card gradient.
    pub fn gradient(self) -> [&'static str; 2] {
        match self {
            MedalTier::First => ["#FFD700", "#FFECB3"],
            MedalTier::Second => ["#C0C0C0", "#E0E0E0"],
            MedalTier::Third => ["#CD7F32", "#D7CCC8"],
            MedalTier::Default => ["#FFFFFF", "#FFFFFF"],
        }
    }
}
