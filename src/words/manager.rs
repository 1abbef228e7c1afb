use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{
    deck::{Deck, DeckKey, DeckStats},
    fallback::fallback_words,
    source::{CandidateQuery, CandidateSource},
    Language, Tier, WordRecord,
};

/// Levels whose decks are built ahead of a new session: the first level of
/// bands 0, 3 and 6, so no deck starts out with lengths unlocked later in its band
const PREWARM_LEVELS: [u32; 3] = [1, 3, 6];

/// Bounds on how many decks are kept and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_decks: usize,
    /// decks untouched for longer than this are dropped
    pub ttl: Duration,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_decks: 64,
            ttl: Duration::from_secs(30 * 60),
        }
    }
}

type Slot = Arc<Mutex<Option<Deck>>>;

struct Entry {
    slot: Slot,
    last_used: Instant,
}

impl Entry {
    /// Another caller holds the slot outside the map lock
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.slot) > 1
    }
}

/// Serves words from per-(tier, language, level band) shuffled decks.
///
/// Each deck sits behind its own lock, so callers asking for the same key
/// are serialized while other keys proceed; candidate queries only ever run
/// under the per-key lock.
pub struct DeckManager {
    source: Arc<dyn CandidateSource>,
    decks: Mutex<HashMap<DeckKey, Entry>>,
    rng: Mutex<StdRng>,
    limits: StoreLimits,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl DeckManager {
    pub fn new(source: Arc<dyn CandidateSource>) -> Self {
        Self::with_rng(source, StdRng::from_entropy(), StoreLimits::default())
    }

    /// Deterministic shuffles, for tests and replays
    pub fn with_seed(source: Arc<dyn CandidateSource>, seed: u64) -> Self {
        Self::with_rng(source, StdRng::seed_from_u64(seed), StoreLimits::default())
    }

    pub fn with_rng(source: Arc<dyn CandidateSource>, rng: StdRng, limits: StoreLimits) -> Self {
        Self {
            source,
            decks: Mutex::new(HashMap::new()),
            rng: Mutex::new(rng),
            limits,
        }
    }

    pub fn with_limits(mut self, limits: StoreLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Next word of the deck addressed by `tier`, `language` and `level`
    pub fn next_word(&self, tier: Tier, language: Language, level: u32) -> WordRecord {
        let key = DeckKey::new(tier, language, level);
        let slot = self.slot(key);
        let mut guard = lock(&slot);
        let word = self.draw(&mut guard, key, level);
        debug!(deck = %key, word = %word.text, "served word");
        word
    }

    /// `count` consecutive words from one deck, drawn under a single lock
    pub fn batch_words(
        &self,
        tier: Tier,
        language: Language,
        level: u32,
        count: usize,
    ) -> Vec<WordRecord> {
        let key = DeckKey::new(tier, language, level);
        let slot = self.slot(key);
        let mut guard = lock(&slot);
        (0..count)
            .map(|_| self.draw(&mut guard, key, level))
            .collect()
    }

    /// Start the addressed deck over from a fresh permutation
    pub fn restart(&self, tier: Tier, language: Language, level: u32) {
        let key = DeckKey::new(tier, language, level);
        let slot = self.slot(key);
        let mut guard = lock(&slot);
        let reusable = guard
            .as_ref()
            .is_some_and(|deck| !deck.is_empty() && self.filter_is_current(deck, level));
        if let (true, Some(deck)) = (reusable, guard.as_mut()) {
            deck.reshuffle(&mut *lock(&self.rng));
            deck.touch();
            info!(deck = %key, words = deck.len(), "deck restarted");
            return;
        }
        *guard = Some(self.build(key, level));
        info!(deck = %key, "deck rebuilt for restart");
    }

    pub fn stats(&self, tier: Tier, language: Language, level: u32) -> DeckStats {
        let key = DeckKey::new(tier, language, level);
        let slot = self.slot(key);
        let mut guard = lock(&slot);
        self.ensure(&mut guard, key, level).stats()
    }

    /// Build the decks a fresh session reaches first
    pub fn prewarm(&self, tier: Tier, language: Language) {
        for level in PREWARM_LEVELS {
            let key = DeckKey::new(tier, language, level);
            let slot = self.slot(key);
            let mut guard = lock(&slot);
            self.ensure(&mut guard, key, level);
        }
    }

    /// Snapshot of every materialized deck, ordered by key
    pub fn cache_stats(&self) -> Vec<(DeckKey, DeckStats)> {
        let slots: Vec<(DeckKey, Slot)> = lock(&self.decks)
            .iter()
            .map(|(key, entry)| (*key, Arc::clone(&entry.slot)))
            .collect();

        let mut stats: Vec<(DeckKey, DeckStats)> = slots
            .into_iter()
            .filter_map(|(key, slot)| {
                let guard = lock(&slot);
                guard.as_ref().map(|deck| (key, deck.stats()))
            })
            .collect();
        stats.sort_by(|a, b| a.0.cmp(&b.0));
        stats
    }

    pub fn deck_count(&self) -> usize {
        lock(&self.decks).len()
    }

    pub fn clear(&self) {
        lock(&self.decks).clear();
        info!("deck cache cleared");
    }

    /// Fetch or create the slot for `key`, applying the eviction policy
    fn slot(&self, key: DeckKey) -> Slot {
        let now = Instant::now();
        let mut decks = lock(&self.decks);

        // slots held outside the map lock are never evicted
        let ttl = self.limits.ttl;
        let before = decks.len();
        decks.retain(|k, entry| {
            *k == key || entry.in_use() || now.duration_since(entry.last_used) <= ttl
        });
        if decks.len() < before {
            debug!(evicted = before - decks.len(), "dropped idle decks");
        }

        if !decks.contains_key(&key) {
            while decks.len() >= self.limits.max_decks.max(1) {
                let oldest = decks
                    .iter()
                    .filter(|(_, entry)| !entry.in_use())
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(k, _)| *k);
                match oldest {
                    Some(k) => {
                        decks.remove(&k);
                        debug!(deck = %k, "evicted least recently used deck");
                    }
                    None => {
                        debug!(decks = decks.len(), "every deck is in use, over capacity");
                        break;
                    }
                }
            }
        }

        let entry = decks.entry(key).or_insert_with(|| Entry {
            slot: Arc::new(Mutex::new(None)),
            last_used: now,
        });
        entry.last_used = now;
        Arc::clone(&entry.slot)
    }

    fn ensure<'a>(&self, slot: &'a mut Option<Deck>, key: DeckKey, level: u32) -> &'a mut Deck {
        if slot.as_ref().map_or(true, |deck| deck.is_empty()) {
            *slot = Some(self.build(key, level));
        }
        slot.get_or_insert_with(|| self.build(key, level))
    }

    fn draw(&self, slot: &mut Option<Deck>, key: DeckKey, level: u32) -> WordRecord {
        let deck = self.ensure(slot, key, level);
        if !self.lengths_allowed(deck, level) {
            info!(deck = %key, level, "deck holds lengths not yet unlocked, rebuilding");
            *deck = self.build(key, level);
        } else if deck.is_exhausted() {
            if self.filter_is_current(deck, level) {
                info!(deck = %key, words = deck.len(), "deck exhausted, reshuffling");
            } else {
                info!(deck = %key, "deck exhausted, rebuilding with unlocked lengths");
                *deck = self.build(key, level);
            }
        }

        let drawn = deck.draw(&mut *lock(&self.rng));
        // ensure() never hands back an empty deck
        drawn.unwrap_or_else(|| fallback_words(key.tier, key.language).remove(0))
    }

    fn filter_is_current(&self, deck: &Deck, level: u32) -> bool {
        let query = CandidateQuery::for_level(deck.key.tier, deck.key.language, level);
        *deck.lengths() == query.lengths
    }

    /// A deck may lag behind an unlock, never run ahead of one
    fn lengths_allowed(&self, deck: &Deck, level: u32) -> bool {
        let query = CandidateQuery::for_level(deck.key.tier, deck.key.language, level);
        deck.lengths().is_subset(&query.lengths)
    }

    fn build(&self, key: DeckKey, level: u32) -> Deck {
        let query = CandidateQuery::for_level(key.tier, key.language, level);
        let words = match self.source.candidates(&query) {
            Ok(words) if !words.is_empty() => words,
            Ok(_) => {
                warn!(deck = %key, query = %query, "no candidates, using fallback words");
                fallback_words(key.tier, key.language)
            }
            Err(e) => {
                warn!(deck = %key, "candidate query failed ({e}), using fallback words");
                fallback_words(key.tier, key.language)
            }
        };

        let deck = Deck::new(key, words, query.lengths, &mut *lock(&self.rng));
        info!(deck = %key, words = deck.len(), "deck built");
        deck
    }
}
