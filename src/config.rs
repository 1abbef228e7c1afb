use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::app_dirs::AppDirs;
use crate::engine::{EngineConfig, ScoringPolicy, DANGER_LINE, SPAWN_POSITION};
use crate::words::{
    CandidateSource, DeckManager, Language, MemorySource, SqliteSource, StoreLimits, Tier,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub language: Language,
    pub tier: Tier,
    pub tick_rate_ms: u64,
    pub spawn_delay_ms: u64,
    pub spawn_position: f64,
    pub danger_line: f64,
    pub allow_backspace: bool,
    pub scoring: ScoringPolicy,
    pub max_decks: usize,
    pub deck_ttl_secs: u64,
    /// fixed shuffle seed; random when absent
    pub seed: Option<u64>,
    /// SQLite word corpus; the embedded lists are used when absent
    pub database_path: Option<PathBuf>,
    pub scores_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: Language::Fr,
            tier: Tier::Normal,
            tick_rate_ms: 16,
            spawn_delay_ms: 1000,
            spawn_position: SPAWN_POSITION,
            danger_line: DANGER_LINE,
            allow_backspace: false,
            scoring: ScoringPolicy::PositionBonus,
            max_decks: 64,
            deck_ttl_secs: 30 * 60,
            seed: None,
            database_path: None,
            scores_path: None,
        }
    }
}

impl Config {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            spawn_delay: Duration::from_millis(self.spawn_delay_ms),
            spawn_position: self.spawn_position,
            danger_line: self.danger_line,
            allow_backspace: self.allow_backspace,
            scoring: self.scoring,
        }
    }

    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            max_decks: self.max_decks.max(1),
            ttl: Duration::from_secs(self.deck_ttl_secs),
        }
    }

    /// Word corpus location, if a corpus is configured or present in the state dir
    pub fn words_db(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(|| AppDirs::words_db_path().filter(|p| p.exists()))
    }

    /// Candidate source for the configured corpus. Without a usable corpus the
    /// decks are built from the embedded lists.
    pub fn candidate_source(&self) -> Arc<dyn CandidateSource> {
        let Some(path) = self.words_db() else {
            info!("no word corpus configured, using embedded lists");
            return Arc::new(MemorySource::empty());
        };
        match SqliteSource::open(&path) {
            Ok(source) => Arc::new(source),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open word corpus, using embedded lists");
                Arc::new(MemorySource::empty())
            }
        }
    }

    pub fn deck_manager(&self) -> DeckManager {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        DeckManager::with_rng(self.candidate_source(), rng, self.store_limits())
    }

    pub fn scores_db(&self) -> PathBuf {
        self.scores_path
            .clone()
            .or_else(AppDirs::scores_db_path)
            .unwrap_or_else(|| PathBuf::from("wordfall_scores.db"))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
