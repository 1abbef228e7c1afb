use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::time::Instant;

use super::{level_band, Language, Tier, WordRecord};

/// Number of upcoming words reported by [`Deck::stats`]
const UPCOMING_PREVIEW: usize = 5;

/// Identity of a deck: one per tier, language and level band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeckKey {
    pub tier: Tier,
    pub language: Language,
    pub band: u32,
}

impl DeckKey {
    pub fn new(tier: Tier, language: Language, level: u32) -> Self {
        Self {
            tier,
            language,
            band: level_band(level),
        }
    }
}

impl fmt::Display for DeckKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.tier, self.language, self.band)
    }
}

/// Progress through a deck's current pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckStats {
    pub total: usize,
    pub cursor: usize,
    pub remaining: usize,
    pub progress_percent: u32,
    pub upcoming: Vec<String>,
}

/// A shuffled pass over a fixed candidate set.
///
/// Every word is served exactly once per pass; the next pass starts from a
/// fresh permutation of the same words.
#[derive(Debug, Clone)]
pub struct Deck {
    pub key: DeckKey,
    sequence: Vec<WordRecord>,
    cursor: usize,
    lengths: BTreeSet<usize>,
    passes: u64,
    last_used: Instant,
}

impl Deck {
    /// Build a deck from `words`, collapsing duplicate texts, and shuffle it
    pub fn new<R: Rng + ?Sized>(
        key: DeckKey,
        words: Vec<WordRecord>,
        lengths: BTreeSet<usize>,
        rng: &mut R,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut sequence: Vec<WordRecord> = words
            .into_iter()
            .filter(|w| seen.insert(w.text.to_lowercase()))
            .collect();
        sequence.shuffle(rng);

        Self {
            key,
            sequence,
            cursor: 0,
            lengths,
            passes: 0,
            last_used: Instant::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.sequence.len()
    }

    /// Length filter the candidate set was built with
    pub fn lengths(&self) -> &BTreeSet<usize> {
        &self.lengths
    }

    /// Completed reshuffles since the deck was built
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn last_used(&self) -> Instant {
        self.last_used
    }

    pub fn touch(&mut self) {
        self.last_used = Instant::now();
    }

    /// New permutation of the same words, starting over at the first one
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.sequence.shuffle(rng);
        self.cursor = 0;
        self.passes += 1;
    }

    /// Serve the next word, reshuffling first when the pass is exhausted.
    /// Returns `None` only for an empty deck.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<WordRecord> {
        if self.sequence.is_empty() {
            return None;
        }
        if self.is_exhausted() {
            self.reshuffle(rng);
        }
        let word = self.sequence[self.cursor].clone();
        self.cursor += 1;
        self.touch();
        Some(word)
    }

    pub fn stats(&self) -> DeckStats {
        let total = self.sequence.len();
        let cursor = self.cursor.min(total);
        let progress_percent = if total == 0 {
            0
        } else {
            ((cursor as f64 / total as f64) * 100.0).round() as u32
        };
        DeckStats {
            total,
            cursor,
            remaining: total - cursor,
            progress_percent,
            upcoming: self.sequence[cursor..]
                .iter()
                .take(UPCOMING_PREVIEW)
                .map(|w| w.text.clone())
                .collect(),
        }
    }
}
