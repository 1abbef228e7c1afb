use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::engine::GameSessionStats;
use crate::error::ScoreError;
use crate::words::{Language, Tier};

/// Entries kept per language and tier
pub const MAX_SCORES_PER_BOARD: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighScore {
    /// assigned by the board on insert
    pub id: i64,
    pub player: String,
    pub score: u64,
    pub wpm: u32,
    pub accuracy: f64,
    pub words_typed: u32,
    pub elapsed_seconds: f64,
    pub date: DateTime<Local>,
    pub tier: Tier,
    pub language: Language,
}

impl HighScore {
    /// Entry for a finished session, dated now
    pub fn from_session(
        player: &str,
        stats: &GameSessionStats,
        tier: Tier,
        language: Language,
    ) -> Self {
        Self {
            id: 0,
            player: player.trim().to_string(),
            score: stats.score,
            wpm: stats.wpm,
            accuracy: stats.accuracy,
            words_typed: stats.words_typed,
            elapsed_seconds: stats.elapsed_seconds,
            date: Local::now(),
            tier,
            language,
        }
    }
}

/// Running totals over every recorded game of one tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSummary {
    pub tier: Tier,
    pub games: u64,
    pub average_score: f64,
    pub total_words: u64,
    pub total_seconds: f64,
    /// words per minute over all recorded play time
    pub average_wpm: f64,
}

impl TierSummary {
    fn empty(tier: Tier) -> Self {
        Self {
            tier,
            games: 0,
            average_score: 0.0,
            total_words: 0,
            total_seconds: 0.0,
            average_wpm: 0.0,
        }
    }
}

/// Top scores per (language, tier) and per-tier game totals, persisted in SQLite
#[derive(Debug)]
pub struct HighScoreDb {
    conn: Connection,
}

impl HighScoreDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ScoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, ScoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, ScoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS high_scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player TEXT NOT NULL,
                score INTEGER NOT NULL,
                wpm INTEGER NOT NULL,
                accuracy REAL NOT NULL,
                words_typed INTEGER NOT NULL,
                elapsed_seconds REAL NOT NULL,
                date TEXT NOT NULL,
                tier TEXT NOT NULL,
                language TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_high_scores_board ON high_scores(language, tier, score)",
            [],
        )?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS tier_totals (
                tier TEXT PRIMARY KEY,
                games INTEGER NOT NULL,
                total_score INTEGER NOT NULL,
                total_words INTEGER NOT NULL,
                total_seconds REAL NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    /// Whether `score` would make it onto the board
    pub fn is_high_score(
        &self,
        score: u64,
        language: Language,
        tier: Tier,
    ) -> Result<bool, ScoreError> {
        let (count, lowest): (i64, Option<i64>) = self.conn.query_row(
            "SELECT COUNT(*), MIN(score) FROM high_scores WHERE language = ?1 AND tier = ?2",
            params![language.code(), tier.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        if (count as usize) < MAX_SCORES_PER_BOARD {
            return Ok(true);
        }
        Ok(lowest.is_some_and(|lowest| score as i64 > lowest))
    }

    /// Insert `entry` and trim its board back to the top entries. Returns the new id.
    pub fn add(&mut self, entry: &HighScore) -> Result<i64, ScoreError> {
        let language = entry.language.code();
        let tier = entry.tier.to_string();

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO high_scores
            (player, score, wpm, accuracy, words_typed, elapsed_seconds, date, tier, language)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                entry.player.trim(),
                entry.score as i64,
                entry.wpm,
                entry.accuracy,
                entry.words_typed,
                entry.elapsed_seconds,
                entry.date.to_rfc3339(),
                tier,
                language,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let pruned = tx.execute(
            r#"
            DELETE FROM high_scores
            WHERE language = ?1 AND tier = ?2 AND id NOT IN (
                SELECT id FROM high_scores
                WHERE language = ?1 AND tier = ?2
                ORDER BY score DESC, id ASC
                LIMIT ?3
            )
            "#,
            params![language, tier, MAX_SCORES_PER_BOARD as i64],
        )?;
        tx.commit()?;

        info!(player = %entry.player, score = entry.score, %tier, language, "high score recorded");
        if pruned > 0 {
            debug!(pruned, "trimmed high-score board");
        }
        Ok(id)
    }

    /// Board for one language and tier, best first
    pub fn top(&self, language: Language, tier: Tier) -> Result<Vec<HighScore>, ScoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, player, score, wpm, accuracy, words_typed, elapsed_seconds, date
            FROM high_scores
            WHERE language = ?1 AND tier = ?2
            ORDER BY score DESC, id ASC
            "#,
        )?;

        let rows = stmt.query_map(params![language.code(), tier.to_string()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut scores = Vec::new();
        for row in rows {
            let (id, player, score, wpm, accuracy, words_typed, elapsed_seconds, date) = row?;
            scores.push(HighScore {
                id,
                player,
                score: score.max(0) as u64,
                wpm,
                accuracy,
                words_typed,
                elapsed_seconds,
                date: DateTime::parse_from_rfc3339(&date)?.with_timezone(&Local),
                tier,
                language,
            });
        }
        Ok(scores)
    }

    /// 1 plus the number of strictly better entries
    pub fn rank(&self, score: u64, language: Language, tier: Tier) -> Result<usize, ScoreError> {
        let better: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM high_scores WHERE language = ?1 AND tier = ?2 AND score > ?3",
            params![language.code(), tier.to_string(), score as i64],
            |row| row.get(0),
        )?;
        Ok(better as usize + 1)
    }

    /// Fold a finished game into its tier's totals, board or not
    pub fn record_game(&self, game: &HighScore) -> Result<(), ScoreError> {
        self.conn.execute(
            r#"
            INSERT INTO tier_totals (tier, games, total_score, total_words, total_seconds)
            VALUES (?1, 1, ?2, ?3, ?4)
            ON CONFLICT(tier) DO UPDATE SET
                games = games + 1,
                total_score = total_score + excluded.total_score,
                total_words = total_words + excluded.total_words,
                total_seconds = total_seconds + excluded.total_seconds
            "#,
            params![
                game.tier.to_string(),
                game.score as i64,
                game.words_typed,
                game.elapsed_seconds,
            ],
        )?;
        debug!(tier = %game.tier, score = game.score, "game totals updated");
        Ok(())
    }

    pub fn summary(&self, tier: Tier) -> Result<TierSummary, ScoreError> {
        let row = self.conn.query_row(
            "SELECT games, total_score, total_words, total_seconds FROM tier_totals WHERE tier = ?1",
            params![tier.to_string()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            },
        );
        let (games, total_score, total_words, total_seconds) = match row {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(TierSummary::empty(tier)),
            Err(e) => return Err(e.into()),
        };

        let games = games.max(0) as u64;
        let total_words = total_words.max(0) as u64;
        Ok(TierSummary {
            tier,
            games,
            average_score: if games > 0 {
                total_score as f64 / games as f64
            } else {
                0.0
            },
            total_words,
            total_seconds,
            average_wpm: if total_seconds > 0.0 {
                total_words as f64 / total_seconds * 60.0
            } else {
                0.0
            },
        })
    }

    /// One summary per tier, easiest first
    pub fn summaries(&self) -> Result<Vec<TierSummary>, ScoreError> {
        Tier::ALL.iter().map(|tier| self.summary(*tier)).collect()
    }

    pub fn reset_totals(&self) -> Result<usize, ScoreError> {
        let removed = self.conn.execute("DELETE FROM tier_totals", [])?;
        info!(removed, "game totals reset");
        Ok(removed)
    }

    /// Wipe one board, one language, or everything
    pub fn clear(&self, language: Option<Language>, tier: Option<Tier>) -> Result<usize, ScoreError> {
        let removed = match (language, tier) {
            (Some(language), Some(tier)) => self.conn.execute(
                "DELETE FROM high_scores WHERE language = ?1 AND tier = ?2",
                params![language.code(), tier.to_string()],
            )?,
            (Some(language), None) => self.conn.execute(
                "DELETE FROM high_scores WHERE language = ?1",
                params![language.code()],
            )?,
            (None, Some(tier)) => self.conn.execute(
                "DELETE FROM high_scores WHERE tier = ?1",
                params![tier.to_string()],
            )?,
            (None, None) => self.conn.execute("DELETE FROM high_scores", [])?,
        };
        info!(removed, "high scores cleared");
        Ok(removed)
    }
}
