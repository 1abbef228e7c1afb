//! Real-time game session: one falling word, keystroke matching, score and
//! speed progression, game over at the danger line.

pub mod falling;
pub mod scoring;
pub mod speed;
pub mod stats;

use std::mem;
use std::time::Duration;

use tracing::{debug, info};

use crate::feed::WordFeed;
use crate::words::{Language, Tier};

pub use falling::{FallingWord, InputMode, Match};
pub use scoring::ScoringPolicy;
pub use speed::current_speed;
pub use stats::GameSessionStats;

pub const SPAWN_POSITION: f64 = 3.0;
pub const DANGER_LINE: f64 = 92.0;
pub const SPAWN_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub spawn_delay: Duration,
    pub spawn_position: f64,
    pub danger_line: f64,
    pub allow_backspace: bool,
    pub scoring: ScoringPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            spawn_delay: SPAWN_DELAY,
            spawn_position: SPAWN_POSITION,
            danger_line: DANGER_LINE,
            allow_backspace: false,
            scoring: ScoringPolicy::default(),
        }
    }
}

/// True once a word at `position` has reached the danger line
pub fn crosses_danger_line(position: f64, danger_line: f64) -> bool {
    position >= danger_line
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    WordEscaped,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// a spawn is pending; counts down while playing
    Waiting { delay_left: Duration },
    Active(FallingWord),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub tier: Tier,
    pub language: Language,
    pub slot: Slot,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Playing(Round),
    Paused(Round),
    GameOver(GameOverReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Accepted,
    Rejected { expected: char },
    Completed { points: u64 },
    /// no active word, or the session is not playing
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// not playing; nothing advanced
    Idle,
    Waiting,
    Spawned { id: u64 },
    Moved { position: f64 },
    GameOver,
}

pub struct Engine<F: WordFeed> {
    config: EngineConfig,
    feed: F,
    phase: Phase,
    stats: GameSessionStats,
    next_id: u64,
    /// tier and language of the latest session, for restarts
    last_round: Option<(Tier, Language)>,
}

impl<F: WordFeed> Engine<F> {
    pub fn new(config: EngineConfig, feed: F) -> Self {
        Self {
            config,
            feed,
            phase: Phase::Idle,
            stats: GameSessionStats::default(),
            next_id: 0,
            last_round: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn stats(&self) -> &GameSessionStats {
        &self.stats
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.phase, Phase::Playing(_))
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver(_))
    }

    pub fn active_word(&self) -> Option<&FallingWord> {
        match &self.phase {
            Phase::Playing(round) | Phase::Paused(round) => match &round.slot {
                Slot::Active(word) => Some(word),
                Slot::Waiting { .. } => None,
            },
            _ => None,
        }
    }

    /// Begin a session. The first deck is restarted so play starts from a
    /// fresh permutation.
    pub fn start(&mut self, tier: Tier, language: Language) {
        self.stats = GameSessionStats::default();
        self.feed.restart(tier, language, self.stats.level);
        self.phase = Phase::Playing(Round {
            tier,
            language,
            slot: Slot::Waiting {
                delay_left: self.config.spawn_delay,
            },
        });
        self.feed.request(tier, language, self.stats.level);
        self.last_round = Some((tier, language));
        info!(%tier, %language, "session started");
    }

    /// Start over with the tier and language of the latest session
    pub fn restart(&mut self) -> bool {
        match self.last_round {
            Some((tier, language)) => {
                self.start(tier, language);
                true
            }
            None => false,
        }
    }

    pub fn tick(&mut self, dt: Duration) -> TickOutcome {
        let Phase::Playing(round) = &mut self.phase else {
            return TickOutcome::Idle;
        };
        self.stats.add_elapsed(dt.as_secs_f64());

        let escaped = match &mut round.slot {
            Slot::Waiting { delay_left } => {
                *delay_left = delay_left.saturating_sub(dt);
                if !delay_left.is_zero() {
                    return TickOutcome::Waiting;
                }
                let Some(record) = self.feed.poll() else {
                    return TickOutcome::Waiting;
                };
                self.next_id += 1;
                let speed = current_speed(round.tier, self.stats.words_typed);
                self.stats.current_speed = speed;
                let word = FallingWord::new(
                    self.next_id,
                    &record.text,
                    self.config.spawn_position,
                    speed,
                    InputMode::for_tier(round.tier),
                );
                debug!(id = word.id, word = %word.original, speed, "word spawned");
                round.slot = Slot::Active(word);
                return TickOutcome::Spawned { id: self.next_id };
            }
            Slot::Active(word) => {
                word.advance();
                if !crosses_danger_line(word.position, self.config.danger_line) {
                    return TickOutcome::Moved {
                        position: word.position,
                    };
                }
                word.original.clone()
            }
        };

        self.stats.record_escape();
        self.phase = Phase::GameOver(GameOverReason::WordEscaped);
        info!(
            word = %escaped,
            score = self.stats.score,
            words = self.stats.words_typed,
            "game over"
        );
        TickOutcome::GameOver
    }

    pub fn key(&mut self, c: char) -> KeyOutcome {
        let Phase::Playing(round) = &mut self.phase else {
            return KeyOutcome::Ignored;
        };
        let Slot::Active(word) = &mut round.slot else {
            return KeyOutcome::Ignored;
        };

        match word.type_char(c) {
            Match::Accepted => {
                self.stats.record_accepted();
                KeyOutcome::Accepted
            }
            Match::Rejected { expected } => {
                self.stats.record_rejected();
                debug!(typed = %c, %expected, "key rejected");
                KeyOutcome::Rejected { expected }
            }
            Match::Completed => {
                self.stats.record_accepted();
                let points = self.config.scoring.points(word.len(), word.position);
                debug!(id = word.id, word = %word.original, points, position = word.position, "word completed");
                round.slot = Slot::Waiting {
                    delay_left: self.config.spawn_delay,
                };
                self.stats.record_completion(points);
                self.feed
                    .request(round.tier, round.language, self.stats.level);
                KeyOutcome::Completed { points }
            }
        }
    }

    /// Undo the last accepted letter. Only honoured when backspace is enabled.
    pub fn backspace(&mut self) -> bool {
        if !self.config.allow_backspace {
            return false;
        }
        match &mut self.phase {
            Phase::Playing(Round {
                slot: Slot::Active(word),
                ..
            }) => word.backspace(),
            _ => false,
        }
    }

    pub fn pause(&mut self) -> bool {
        match mem::take(&mut self.phase) {
            Phase::Playing(round) => {
                self.phase = Phase::Paused(round);
                debug!("paused");
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    /// Back to playing. A spawn cancelled by the pause is rescheduled with the full delay.
    pub fn resume(&mut self) -> bool {
        match mem::take(&mut self.phase) {
            Phase::Paused(mut round) => {
                if let Slot::Waiting { delay_left } = &mut round.slot {
                    *delay_left = self.config.spawn_delay;
                }
                self.phase = Phase::Playing(round);
                debug!("resumed");
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.pause() || self.resume()
    }

    pub fn stop(&mut self) -> bool {
        match self.phase {
            Phase::Playing(_) | Phase::Paused(_) => {
                // a word drawn for the next spawn is never shown
                self.feed.cancel();
                self.phase = Phase::GameOver(GameOverReason::Stopped);
                info!(score = self.stats.score, "session stopped");
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.feed.cancel();
        self.phase = Phase::Idle;
        self.stats = GameSessionStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::WordRecord;
    use assert_matches::assert_matches;
    use std::collections::VecDeque;

    /// Hands out scripted words; `hold` simulates a slow supplier.
    #[derive(Default)]
    struct ScriptedFeed {
        words: VecDeque<&'static str>,
        pending: bool,
        hold: bool,
        requests: Vec<(Tier, Language, u32)>,
        restarts: usize,
    }

    impl WordFeed for ScriptedFeed {
        fn restart(&mut self, _tier: Tier, _language: Language, _level: u32) {
            self.restarts += 1;
        }

        fn request(&mut self, tier: Tier, language: Language, level: u32) {
            self.requests.push((tier, language, level));
            self.pending = true;
        }

        fn poll(&mut self) -> Option<WordRecord> {
            if !self.pending || self.hold {
                return None;
            }
            self.pending = false;
            self.words
                .pop_front()
                .map(|w| WordRecord::new(w, Language::En, 1, 10))
        }

        fn cancel(&mut self) {
            self.pending = false;
        }
    }

    fn engine(words: &[&'static str]) -> Engine<ScriptedFeed> {
        engine_with(EngineConfig::default(), words)
    }

    fn engine_with(config: EngineConfig, words: &[&'static str]) -> Engine<ScriptedFeed> {
        let feed = ScriptedFeed {
            words: words.iter().copied().collect(),
            ..Default::default()
        };
        Engine::new(config, feed)
    }

    fn spawn<F: WordFeed>(engine: &mut Engine<F>) {
        let delay = engine.config().spawn_delay;
        assert_matches!(engine.tick(delay), TickOutcome::Spawned { .. });
    }

    fn type_word<F: WordFeed>(engine: &mut Engine<F>, text: &str) -> KeyOutcome {
        let mut last = KeyOutcome::Ignored;
        for c in text.chars() {
            last = engine.key(c);
        }
        last
    }

    #[test]
    fn test_idle_engine_ignores_everything() {
        let mut engine = engine(&["cat"]);
        assert_eq!(engine.tick(Duration::from_millis(16)), TickOutcome::Idle);
        assert_eq!(engine.key('c'), KeyOutcome::Ignored);
        assert!(!engine.pause());
        assert!(!engine.stop());
        assert_eq!(engine.stats().elapsed_seconds, 0.0);
    }

    #[test]
    fn test_start_requests_first_word_and_waits() {
        let mut engine = engine(&["cat"]);
        engine.start(Tier::Normal, Language::En);
        assert_eq!(engine.feed().requests, vec![(Tier::Normal, Language::En, 1)]);
        assert_eq!(engine.tick(Duration::from_millis(500)), TickOutcome::Waiting);
        assert!(engine.active_word().is_none());
        assert_matches!(engine.tick(Duration::from_millis(500)), TickOutcome::Spawned { id: 1 });

        let word = engine.active_word().unwrap();
        assert_eq!(word.original, "cat");
        assert_eq!(word.position, SPAWN_POSITION);
        assert_eq!(word.speed, 0.3);
        assert_eq!(engine.stats().current_speed, 0.3);
    }

    #[test]
    fn test_spawn_waits_for_slow_feed() {
        let mut engine = engine(&["cat"]);
        engine.start(Tier::Normal, Language::En);
        engine.feed.hold = true;
        assert_eq!(engine.tick(Duration::from_secs(2)), TickOutcome::Waiting);
        assert_eq!(engine.tick(Duration::from_millis(16)), TickOutcome::Waiting);
        engine.feed.hold = false;
        assert_matches!(engine.tick(Duration::from_millis(16)), TickOutcome::Spawned { .. });
    }

    #[test]
    fn test_danger_line_boundary() {
        assert!(!crosses_danger_line(91.9, DANGER_LINE));
        assert!(crosses_danger_line(92.0, DANGER_LINE));
        assert!(crosses_danger_line(95.0, DANGER_LINE));
    }

    #[test]
    fn test_word_escaping_ends_the_game() {
        let config = EngineConfig {
            spawn_position: 91.0,
            ..Default::default()
        };
        let mut engine = engine_with(config, &["cat"]);
        engine.start(Tier::Normal, Language::En);
        spawn(&mut engine);

        // 91.0 -> 91.3 -> 91.6 -> 91.9, still alive
        for _ in 0..3 {
            assert_matches!(engine.tick(Duration::from_millis(16)), TickOutcome::Moved { .. });
        }
        assert!(engine.active_word().unwrap().position < DANGER_LINE);

        assert_eq!(engine.tick(Duration::from_millis(16)), TickOutcome::GameOver);
        assert_eq!(engine.phase(), &Phase::GameOver(GameOverReason::WordEscaped));
        assert_eq!(engine.stats().errors_count, 1);
        assert!(engine.active_word().is_none());
        assert_eq!(engine.tick(Duration::from_millis(16)), TickOutcome::Idle);
    }

    #[test]
    fn test_completion_scores_and_schedules_next_word() {
        let mut engine = engine(&["cat", "dog"]);
        engine.start(Tier::Normal, Language::En);
        spawn(&mut engine);

        assert_eq!(engine.key('c'), KeyOutcome::Accepted);
        assert_eq!(engine.key('x'), KeyOutcome::Rejected { expected: 'a' });
        assert_eq!(engine.key('a'), KeyOutcome::Accepted);
        // 3 letters * 10 + top band bonus
        assert_eq!(engine.key('t'), KeyOutcome::Completed { points: 80 });

        let stats = engine.stats();
        assert_eq!(stats.score, 80);
        assert_eq!(stats.words_typed, 1);
        assert_eq!(stats.errors_count, 1);
        assert_eq!(stats.accuracy, 75.0);
        assert!(engine.active_word().is_none());
        assert_eq!(engine.feed().requests.len(), 2);

        assert_eq!(engine.key('d'), KeyOutcome::Ignored);
        spawn(&mut engine);
        assert_eq!(engine.active_word().unwrap().original, "dog");
    }

    #[test]
    fn test_completion_is_scored_once() {
        let mut engine = engine(&["cat", "dog"]);
        engine.start(Tier::Normal, Language::En);
        spawn(&mut engine);
        type_word(&mut engine, "cat");
        let score = engine.stats().score;
        for c in "tttt".chars() {
            assert_eq!(engine.key(c), KeyOutcome::Ignored);
        }
        assert_eq!(engine.stats().score, score);
        assert_eq!(engine.stats().words_typed, 1);
    }

    #[test]
    fn test_same_word_at_same_position_scores_the_same() {
        let mut engine = engine(&["cat", "cat"]);
        engine.start(Tier::Normal, Language::En);

        spawn(&mut engine);
        let first = type_word(&mut engine, "cat");
        spawn(&mut engine);
        assert_eq!(engine.active_word().unwrap().position, SPAWN_POSITION);
        let second = type_word(&mut engine, "cat");

        assert_matches!(first, KeyOutcome::Completed { .. });
        assert_eq!(first, second);
        assert_eq!(engine.stats().score, 160);
    }

    #[test]
    fn test_length_scoring_policy() {
        let config = EngineConfig {
            scoring: ScoringPolicy::Length,
            ..Default::default()
        };
        let mut engine = engine_with(config, &["horse"]);
        engine.start(Tier::Normal, Language::En);
        spawn(&mut engine);
        assert_eq!(type_word(&mut engine, "horse"), KeyOutcome::Completed { points: 5 });
    }

    #[test]
    fn test_expert_types_right_to_left() {
        let mut engine = engine(&["cat"]);
        engine.start(Tier::Expert, Language::En);
        spawn(&mut engine);
        assert_eq!(engine.key('c'), KeyOutcome::Rejected { expected: 't' });
        assert_eq!(engine.key('t'), KeyOutcome::Accepted);
        assert_eq!(engine.key('a'), KeyOutcome::Accepted);
        assert_matches!(engine.key('c'), KeyOutcome::Completed { .. });
    }

    #[test]
    fn test_level_follows_words_typed() {
        let words: Vec<&'static str> = std::iter::repeat("ox").take(11).collect();
        let mut engine = engine(&words);
        engine.start(Tier::Easy, Language::En);
        for _ in 0..10 {
            spawn(&mut engine);
            type_word(&mut engine, "ox");
        }
        assert_eq!(engine.stats().level, 2);
        assert_eq!(
            engine.feed().requests.last(),
            Some(&(Tier::Easy, Language::En, 2))
        );
        spawn(&mut engine);
        // easy steps speed every ten words
        assert!((engine.active_word().unwrap().speed - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_pause_freezes_the_word() {
        let mut engine = engine(&["cat"]);
        engine.start(Tier::Normal, Language::En);
        spawn(&mut engine);
        assert!(engine.pause());
        assert_eq!(engine.tick(Duration::from_millis(16)), TickOutcome::Idle);
        assert_eq!(engine.key('c'), KeyOutcome::Ignored);
        assert_eq!(engine.active_word().unwrap().position, SPAWN_POSITION);
        assert!(engine.resume());
        assert_matches!(engine.tick(Duration::from_millis(16)), TickOutcome::Moved { .. });
    }

    #[test]
    fn test_resume_reschedules_pending_spawn() {
        let mut engine = engine(&["cat"]);
        engine.start(Tier::Normal, Language::En);
        assert_eq!(engine.tick(Duration::from_millis(600)), TickOutcome::Waiting);
        assert!(engine.pause());
        assert!(engine.resume());
        // the countdown starts over instead of finishing the old one
        assert_eq!(engine.tick(Duration::from_millis(600)), TickOutcome::Waiting);
        assert_matches!(engine.tick(Duration::from_millis(400)), TickOutcome::Spawned { .. });
    }

    #[test]
    fn test_toggle_pause() {
        let mut engine = engine(&["cat"]);
        engine.start(Tier::Normal, Language::En);
        assert!(engine.toggle_pause());
        assert_matches!(engine.phase(), Phase::Paused(_));
        assert!(engine.toggle_pause());
        assert!(engine.is_playing());
    }

    #[test]
    fn test_stop_from_pause() {
        let mut engine = engine(&["cat"]);
        engine.start(Tier::Normal, Language::En);
        spawn(&mut engine);
        engine.pause();
        assert!(engine.stop());
        assert_eq!(engine.phase(), &Phase::GameOver(GameOverReason::Stopped));
        assert!(!engine.stop());
    }

    #[test]
    fn test_reset_clears_session() {
        let mut engine = engine(&["cat", "dog"]);
        engine.start(Tier::Normal, Language::En);
        spawn(&mut engine);
        type_word(&mut engine, "cat");
        engine.reset();
        assert_eq!(engine.phase(), &Phase::Idle);
        assert_eq!(engine.stats(), &GameSessionStats::default());
        assert!(!engine.feed().pending);
    }

    #[test]
    fn test_restart_reuses_last_round() {
        let mut engine = engine(&["cat", "dog"]);
        assert!(!engine.restart());
        engine.start(Tier::Hard, Language::En);
        spawn(&mut engine);
        engine.stop();
        assert!(engine.restart());
        assert!(engine.is_playing());
        assert_matches!(
            engine.phase(),
            Phase::Playing(Round { tier: Tier::Hard, language: Language::En, .. })
        );
        assert_eq!(engine.stats().words_typed, 0);
        assert_eq!(engine.feed().restarts, 2);
    }

    #[test]
    fn test_stop_cancels_pending_word() {
        let mut engine = engine(&["cat", "dog"]);
        engine.start(Tier::Normal, Language::En);
        spawn(&mut engine);
        type_word(&mut engine, "cat");
        assert!(engine.feed().pending);
        engine.stop();
        assert!(!engine.feed().pending);
    }

    #[test]
    fn test_restart_starts_the_deck_over() {
        use crate::feed::DirectFeed;
        use crate::words::{DeckManager, MemorySource};
        use std::sync::Arc;

        let records = ["ant", "bee", "cow", "doe", "eel"]
            .iter()
            .map(|w| WordRecord::new(*w, Language::En, 1, 10))
            .collect();
        let manager = Arc::new(DeckManager::with_seed(Arc::new(MemorySource::new(records)), 2));
        let mut engine = Engine::new(EngineConfig::default(), DirectFeed::new(Arc::clone(&manager)));

        engine.start(Tier::Normal, Language::En);
        spawn(&mut engine);
        let word = engine.active_word().unwrap().original.clone();
        type_word(&mut engine, &word);
        assert_eq!(manager.stats(Tier::Normal, Language::En, 1).cursor, 2);

        engine.stop();
        assert!(engine.restart());
        // only the first word of the new session has been drawn
        assert_eq!(manager.stats(Tier::Normal, Language::En, 1).cursor, 1);
    }

    #[test]
    fn test_backspace_disabled_by_default() {
        let mut engine = engine(&["cat"]);
        engine.start(Tier::Normal, Language::En);
        spawn(&mut engine);
        engine.key('c');
        assert!(!engine.backspace());
        assert_eq!(engine.active_word().unwrap().remaining_text(), "at");
    }

    #[test]
    fn test_backspace_when_enabled() {
        let config = EngineConfig {
            allow_backspace: true,
            ..Default::default()
        };
        let mut engine = engine_with(config, &["cat"]);
        engine.start(Tier::Normal, Language::En);
        spawn(&mut engine);
        engine.key('c');
        assert!(engine.backspace());
        assert_eq!(engine.active_word().unwrap().remaining_text(), "cat");
        assert!(!engine.backspace());
    }

    #[test]
    fn test_counters_never_decrease() {
        let mut engine = engine(&["cat", "dog", "cow", "hen"]);
        engine.start(Tier::Normal, Language::En);
        let mut prev = engine.stats().clone();
        let script = "cxatzdogqcowhen";
        for c in script.chars() {
            engine.tick(Duration::from_millis(250));
            engine.key(c);
            let now = engine.stats();
            assert!(now.score >= prev.score);
            assert!(now.words_typed >= prev.words_typed);
            assert!(now.errors_count >= prev.errors_count);
            assert!(now.current_speed >= prev.current_speed);
            prev = now.clone();
        }
    }
}
