use serde::{Deserialize, Serialize};

/// Completion above this position earns the top bonus
pub const TOP_BAND: f64 = 30.0;
/// Completion above this position earns the middle bonus
pub const MIDDLE_BAND: f64 = 60.0;
pub const TOP_BONUS: u64 = 50;
pub const MIDDLE_BONUS: u64 = 25;

/// How a completed word is turned into points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// ten points per letter, plus a bonus for finishing high on the field
    #[default]
    PositionBonus,
    /// one point per letter
    Length,
}

impl ScoringPolicy {
    /// Points for a word of `letters` completed at `position`
    pub fn points(&self, letters: usize, position: f64) -> u64 {
        match self {
            ScoringPolicy::PositionBonus => letters as u64 * 10 + position_bonus(position),
            ScoringPolicy::Length => letters as u64,
        }
    }
}

pub fn position_bonus(position: f64) -> u64 {
    if position < TOP_BAND {
        TOP_BONUS
    } else if position < MIDDLE_BAND {
        MIDDLE_BONUS
    } else {
        0
    }
}
