use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::scorer::{normalize, MatchResult};

/// One reference word seen in an evaluated unit
#[derive(Debug, Clone)]
pub struct WordStat {
    pub word: String,
    pub was_missed: bool,
    pub timestamp: DateTime<Local>,
    pub unit_text: String,
}

/// Aggregate attempts for a single word
#[derive(Debug, Clone, PartialEq)]
pub struct WordSummary {
    pub word: String,
    pub attempts: i64,
    pub misses: i64,
    pub miss_rate: f64,
}

/// Database manager for word statistics
#[derive(Debug)]
pub struct WordStatsDb {
    conn: Connection,
}

impl WordStatsDb {
    /// Open the database at the default state location
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("recite_stats.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        Self::init(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS word_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word TEXT NOT NULL,
                was_missed BOOLEAN NOT NULL,
                timestamp TEXT NOT NULL,
                unit_text TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_word_stats_word ON word_stats(word)",
            [],
        )?;

        Ok(WordStatsDb { conn })
    }

    /// Record every reference word of an evaluated unit in one transaction
    pub fn record_unit(&mut self, unit_text: &str, result: &MatchResult) -> Result<()> {
        let timestamp = Local::now();
        let tx = self.conn.transaction()?;

        for word in normalize(unit_text) {
            let stat = WordStat {
                was_missed: result.missing_words.contains(&word),
                word,
                timestamp,
                unit_text: unit_text.to_string(),
            };
            insert_word_stat(&tx, &stat)?;
        }

        tx.commit()
    }

    /// Every recorded attempt at `word`, newest first
    pub fn get_word_stats(&self, word: &str) -> Result<Vec<WordStat>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT word, was_missed, timestamp, unit_text
            FROM word_stats
            WHERE word = ?1
            ORDER BY timestamp DESC
            "#,
        )?;

        let stat_iter = stmt.query_map([word], |row| {
            let timestamp_str: String = row.get(2)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        2,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(WordStat {
                word: row.get(0)?,
                was_missed: row.get(1)?,
                timestamp,
                unit_text: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            })
        })?;

        let mut stats = Vec::new();
        for stat in stat_iter {
            stats.push(stat?);
        }

        Ok(stats)
    }

    /// Percentage of attempts at `word` where it was missed
    pub fn get_miss_rate(&self, word: &str) -> Result<f64> {
        Ok(self
            .get_word_summary(word)?
            .map_or(0.0, |summary| summary.miss_rate))
    }

    pub fn get_word_summary(&self, word: &str) -> Result<Option<WordSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                COUNT(*) as total,
                SUM(CASE WHEN was_missed = 1 THEN 1 ELSE 0 END) as missed
            FROM word_stats
            WHERE word = ?1
            "#,
        )?;

        let (attempts, misses): (i64, Option<i64>) =
            stmt.query_row([word], |row| Ok((row.get(0)?, row.get(1)?)))?;

        if attempts == 0 {
            return Ok(None);
        }
        let misses = misses.unwrap_or(0);
        Ok(Some(WordSummary {
            word: word.to_string(),
            attempts,
            misses,
            miss_rate: (misses as f64 / attempts as f64) * 100.0,
        }))
    }

    /// Words missed at least once, most missed first
    pub fn get_most_missed(&self, limit: usize) -> Result<Vec<WordSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                word,
                COUNT(*) as attempts,
                SUM(CASE WHEN was_missed = 1 THEN 1 ELSE 0 END) as misses
            FROM word_stats
            GROUP BY word
            HAVING SUM(CASE WHEN was_missed = 1 THEN 1 ELSE 0 END) > 0
            ORDER BY
                SUM(CASE WHEN was_missed = 1 THEN 1 ELSE 0 END) DESC,
                AVG(CASE WHEN was_missed = 1 THEN 1.0 ELSE 0.0 END) DESC,
                word ASC
            LIMIT ?1
            "#,
        )?;

        let summary_iter = stmt.query_map([limit as i64], |row| {
            let attempts: i64 = row.get(1)?;
            let misses: i64 = row.get(2)?;
            Ok(WordSummary {
                word: row.get(0)?,
                attempts,
                misses,
                miss_rate: (misses as f64 / attempts as f64) * 100.0,
            })
        })?;

        let mut summary = Vec::new();
        for item in summary_iter {
            summary.push(item?);
        }

        Ok(summary)
    }

    pub fn clear_all_stats(&self) -> Result<()> {
        self.conn.execute("DELETE FROM word_stats", [])?;
        Ok(())
    }
}

fn insert_word_stat(conn: &Connection, stat: &WordStat) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO word_stats (word, was_missed, timestamp, unit_text)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            stat.word,
            stat.was_missed,
            stat.timestamp.to_rfc3339(),
            stat.unit_text,
        ],
    )?;
    Ok(())
}
