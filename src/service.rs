use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::ValidationError;
use crate::words::{level_band, DeckManager, DeckStats, Language, Tier, WordRecord};

pub const MIN_LEVEL: i64 = 1;
pub const MAX_LEVEL: i64 = 100;
pub const MIN_COUNT: i64 = 1;
pub const MAX_COUNT: i64 = 50;
pub const DEFAULT_LANGUAGE: Language = Language::Fr;
pub const DEFAULT_LEVEL: u32 = 1;
pub const DEFAULT_COUNT: usize = 10;

pub fn parse_tier(raw: &str) -> Result<Tier, ValidationError> {
    raw.parse()
}

pub fn parse_language(raw: Option<&str>) -> Result<Language, ValidationError> {
    raw.map_or(Ok(DEFAULT_LANGUAGE), str::parse)
}

pub fn parse_level(raw: Option<i64>) -> Result<u32, ValidationError> {
    match raw {
        None => Ok(DEFAULT_LEVEL),
        Some(level) if (MIN_LEVEL..=MAX_LEVEL).contains(&level) => Ok(level as u32),
        Some(level) => Err(ValidationError::LevelOutOfRange(level)),
    }
}

pub fn parse_count(raw: Option<i64>) -> Result<usize, ValidationError> {
    match raw {
        None => Ok(DEFAULT_COUNT),
        Some(count) if (MIN_COUNT..=MAX_COUNT).contains(&count) => Ok(count as usize),
        Some(count) => Err(ValidationError::CountOutOfRange(count)),
    }
}

/// Validated address of a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordParams {
    pub tier: Tier,
    pub language: Language,
    pub level: u32,
}

impl WordParams {
    pub fn parse(
        tier: &str,
        language: Option<&str>,
        level: Option<i64>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            tier: parse_tier(tier)?,
            language: parse_language(language)?,
            level: parse_level(level)?,
        })
    }
}

/// Deck progress as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub tier: Tier,
    pub language: Language,
    pub level: u32,
    pub band: u32,
    #[serde(flatten)]
    pub deck: DeckStats,
}

/// Request-level entry point to the word supply. Raw inputs are validated
/// here; nothing past this point can fail.
#[derive(Clone)]
pub struct WordService {
    manager: Arc<DeckManager>,
}

impl WordService {
    pub fn new(manager: Arc<DeckManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<DeckManager> {
        &self.manager
    }

    pub fn next_word(
        &self,
        tier: &str,
        language: Option<&str>,
        level: Option<i64>,
    ) -> Result<WordRecord, ValidationError> {
        let p = WordParams::parse(tier, language, level)?;
        Ok(self.manager.next_word(p.tier, p.language, p.level))
    }

    pub fn batch_words(
        &self,
        tier: &str,
        language: Option<&str>,
        level: Option<i64>,
        count: Option<i64>,
    ) -> Result<Vec<WordRecord>, ValidationError> {
        let p = WordParams::parse(tier, language, level)?;
        let count = parse_count(count)?;
        Ok(self.manager.batch_words(p.tier, p.language, p.level, count))
    }

    pub fn restart(
        &self,
        tier: &str,
        language: Option<&str>,
        level: Option<i64>,
    ) -> Result<StatsReport, ValidationError> {
        let p = WordParams::parse(tier, language, level)?;
        debug!(tier = %p.tier, language = %p.language, level = p.level, "restart requested");
        self.manager.restart(p.tier, p.language, p.level);
        Ok(self.report(p))
    }

    pub fn list_stats(
        &self,
        tier: &str,
        language: Option<&str>,
        level: Option<i64>,
    ) -> Result<StatsReport, ValidationError> {
        let p = WordParams::parse(tier, language, level)?;
        Ok(self.report(p))
    }

    fn report(&self, p: WordParams) -> StatsReport {
        StatsReport {
            tier: p.tier,
            language: p.language,
            level: p.level,
            band: level_band(p.level),
            deck: self.manager.stats(p.tier, p.language, p.level),
        }
    }
}
