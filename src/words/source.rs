use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;

use super::{profile::DifficultyProfile, Language, Tier, WordRecord};
use crate::error::SourceError;

/// Filter handed to a candidate source when a deck is (re)built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    pub language: Language,
    pub lengths: BTreeSet<usize>,
    pub tiers: BTreeSet<u8>,
    pub frequency_floor: u32,
}

impl CandidateQuery {
    pub fn for_level(tier: Tier, language: Language, level: u32) -> Self {
        let profile = DifficultyProfile::for_tier(tier);
        Self {
            language,
            lengths: profile.lengths_for_level(level),
            tiers: profile.allowed_tier_set(),
            frequency_floor: profile.frequency_floor,
        }
    }

    pub fn matches(&self, word: &WordRecord) -> bool {
        word.language == self.language
            && self.lengths.contains(&word.length)
            && self.tiers.contains(&word.tier)
            && word.frequency >= self.frequency_floor
    }
}

impl fmt::Display for CandidateQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lengths [{}] tiers [{}] freq>={}",
            self.language,
            self.lengths.iter().join(","),
            self.tiers.iter().join(","),
            self.frequency_floor
        )
    }
}

/// Storage collaborator the deck manager draws candidates from.
///
/// Implementations return `Ok(vec![])` when nothing matches; an `Err` is
/// reserved for the store itself failing.
pub trait CandidateSource: Send + Sync {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<WordRecord>, SourceError>;
}

/// Candidate source over an in-process word list
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    words: Vec<WordRecord>,
}

impl MemorySource {
    pub fn new(words: Vec<WordRecord>) -> Self {
        Self { words }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl CandidateSource for MemorySource {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<WordRecord>, SourceError> {
        Ok(self
            .words
            .iter()
            .filter(|w| query.matches(w))
            .cloned()
            .collect())
    }
}
