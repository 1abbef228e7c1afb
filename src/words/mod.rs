//! Word supply: records, difficulty profiles, candidate sources and the
//! shuffled no-repeat decks that serve them.

pub mod deck;
pub mod fallback;
pub mod manager;
pub mod profile;
pub mod source;
pub mod sqlite;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

pub use deck::{Deck, DeckKey, DeckStats};
pub use manager::{DeckManager, StoreLimits};
pub use profile::DifficultyProfile;
pub use source::{CandidateQuery, CandidateSource, MemorySource};
pub use sqlite::SqliteSource;

/// Difficulty tier chosen by the player
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    strum_macros::Display, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    Easy,
    Normal,
    Hard,
    Expert,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Easy, Tier::Normal, Tier::Hard, Tier::Expert];
}

impl FromStr for Tier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Tier::Easy),
            "normal" => Ok(Tier::Normal),
            "hard" => Ok(Tier::Hard),
            "expert" => Ok(Tier::Expert),
            _ => Err(ValidationError::UnknownTier(s.to_string())),
        }
    }
}

/// Corpus language. Adding a variant needs a matching entry in the fallback lists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    strum_macros::Display, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    Fr,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Fr, Language::En];

    pub fn code(&self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fr" => Ok(Language::Fr),
            "en" => Ok(Language::En),
            _ => Err(ValidationError::UnknownLanguage(s.to_string())),
        }
    }
}

/// A corpus word as returned by a candidate source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordRecord {
    pub text: String,
    pub language: Language,
    /// letter count, not byte length
    pub length: usize,
    /// corpus difficulty, 1-4
    pub tier: u8,
    pub frequency: u32,
}

impl WordRecord {
    pub fn new(text: impl Into<String>, language: Language, tier: u8, frequency: u32) -> Self {
        let text = text.into();
        let length = text.chars().count();
        Self {
            text,
            language,
            length,
            tier,
            frequency,
        }
    }
}

/// Levels are grouped into bands of three so a handful of decks cover a session
pub fn level_band(level: u32) -> u32 {
    (level / 3) * 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parsing_is_case_insensitive() {
        assert_eq!("Expert".parse::<Tier>(), Ok(Tier::Expert));
        assert_eq!(" easy ".parse::<Tier>(), Ok(Tier::Easy));
        assert_eq!(
            "insane".parse::<Tier>(),
            Err(ValidationError::UnknownTier("insane".to_string()))
        );
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!("fr".parse::<Language>(), Ok(Language::Fr));
        assert_eq!("EN".parse::<Language>(), Ok(Language::En));
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn test_display_matches_wire_names() {
        assert_eq!(Tier::Normal.to_string(), "normal");
        assert_eq!(Language::Fr.to_string(), "fr");
        assert_eq!(serde_json::to_string(&Tier::Hard).unwrap(), "\"hard\"");
    }

    #[test]
    fn test_word_length_counts_letters() {
        let word = WordRecord::new("été", Language::Fr, 1, 3);
        assert_eq!(word.length, 3);
    }

    #[test]
    fn test_level_band() {
        assert_eq!(level_band(1), 0);
        assert_eq!(level_band(2), 0);
        assert_eq!(level_band(3), 3);
        assert_eq!(level_band(5), 3);
        assert_eq!(level_band(6), 6);
        assert_eq!(level_band(100), 99);
    }
}
