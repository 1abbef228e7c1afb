use rusqlite::{params, params_from_iter, types::Value, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use super::{source::CandidateQuery, CandidateSource, Language, WordRecord};
use crate::error::SourceError;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS words (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        text TEXT NOT NULL,
        language TEXT NOT NULL,
        length INTEGER NOT NULL,
        difficulty INTEGER NOT NULL,
        frequency INTEGER NOT NULL DEFAULT 1,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (text, language)
    )
"#;

/// Candidate source backed by a SQLite `words` table
#[derive(Debug)]
pub struct SqliteSource {
    conn: Mutex<Connection>,
}

impl SqliteSource {
    /// Open (or create) the word store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, SourceError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, SourceError> {
        conn.execute(SCHEMA, [])?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_words_lookup ON words(language, length, difficulty)",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Store a word, replacing an existing entry with the same text and language
    pub fn insert(&self, word: &WordRecord) -> Result<(), SourceError> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO words (text, language, length, difficulty, frequency)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                word.text,
                word.language.code(),
                word.length as i64,
                word.tier,
                word.frequency,
            ],
        )?;
        Ok(())
    }

    /// Store several words in one transaction
    pub fn insert_batch(&self, words: &[WordRecord]) -> Result<(), SourceError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        for word in words {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO words (text, language, length, difficulty, frequency)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    word.text,
                    word.language.code(),
                    word.length as i64,
                    word.tier,
                    word.frequency,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize, SourceError> {
        let conn = self.lock();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // a panic while holding the connection leaves it usable
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn placeholders(start: usize, n: usize) -> String {
    (start..start + n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl CandidateSource for SqliteSource {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<WordRecord>, SourceError> {
        if query.lengths.is_empty() || query.tiers.is_empty() {
            return Ok(Vec::new());
        }

        let mut values: Vec<Value> = vec![
            Value::Text(query.language.code().to_string()),
            Value::Integer(query.frequency_floor as i64),
        ];
        let lengths_at = values.len() + 1;
        values.extend(query.lengths.iter().map(|&l| Value::Integer(l as i64)));
        let tiers_at = values.len() + 1;
        values.extend(query.tiers.iter().map(|&t| Value::Integer(t as i64)));

        let sql = format!(
            r#"
            SELECT text, length, difficulty, frequency
            FROM words
            WHERE language = ?1
              AND frequency >= ?2
              AND length IN ({})
              AND difficulty IN ({})
            ORDER BY frequency DESC, text ASC
            "#,
            placeholders(lengths_at, query.lengths.len()),
            placeholders(tiers_at, query.tiers.len()),
        );

        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let language: Language = query.language;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            let length: i64 = row.get(1)?;
            Ok(WordRecord {
                text: row.get(0)?,
                language,
                length: length as usize,
                tier: row.get(2)?,
                frequency: row.get(3)?,
            })
        })?;

        let mut words = Vec::new();
        for word in rows {
            words.push(word?);
        }
        debug!(count = words.len(), query = %query, "word store query");
        Ok(words)
    }
}
