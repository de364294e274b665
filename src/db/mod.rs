//! Database module - SQLite storage for timer snapshots and the rest log

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::timer::TimerSnapshot;

/// Finished rest countdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestRecord {
    pub id: Option<i64>,
    pub completed_at: DateTime<Utc>,
    pub exercise_id: Option<String>,
    pub target_secs: Option<u64>,
    pub elapsed_secs: u64,
}

/// Snapshot as stored, with the time it was written
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSnapshot {
    pub snapshot: TimerSnapshot,
    pub saved_at: DateTime<Utc>,
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS timer_snapshot (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                saved_at TEXT NOT NULL,
                state TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS rests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                completed_at TEXT NOT NULL,
                exercise_id TEXT,
                target_secs INTEGER,
                elapsed_secs INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Replace the stored snapshot
    pub fn save_snapshot(&self, snapshot: &TimerSnapshot) -> Result<()> {
        let state = serde_json::to_string(snapshot)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO timer_snapshot (id, saved_at, state) VALUES (1, ?1, ?2)",
            params![Utc::now().to_rfc3339(), state],
        )?;
        Ok(())
    }

    pub fn load_snapshot(&self) -> Result<Option<SavedSnapshot>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT saved_at, state FROM timer_snapshot WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((saved_at, state)) = row else {
            return Ok(None);
        };

        Ok(Some(SavedSnapshot {
            snapshot: serde_json::from_str(&state)?,
            saved_at: DateTime::parse_from_rfc3339(&saved_at)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }))
    }

    pub fn clear_snapshot(&self) -> Result<()> {
        self.conn.execute("DELETE FROM timer_snapshot", [])?;
        Ok(())
    }

    /// Add a finished rest
    pub fn log_rest(&self, rest: &RestRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO rests (completed_at, exercise_id, target_secs, elapsed_secs)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                rest.completed_at.to_rfc3339(),
                rest.exercise_id,
                rest.target_secs.map(|t| t as i64),
                rest.elapsed_secs as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get rests, newest first
    pub fn get_rests(&self, limit: usize) -> Result<Vec<RestRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, completed_at, exercise_id, target_secs, elapsed_secs FROM rests
             ORDER BY completed_at DESC, id DESC LIMIT ?1",
        )?;

        let rests = stmt.query_map(params![limit as i64], |row| {
            let date_str: String = row.get(1)?;
            let target: Option<i64> = row.get(3)?;
            let elapsed: i64 = row.get(4)?;
            Ok(RestRecord {
                id: Some(row.get(0)?),
                completed_at: DateTime::parse_from_rfc3339(&date_str)
                    .map(|d| d.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
                exercise_id: row.get(2)?,
                target_secs: target.map(|t| t.max(0) as u64),
                elapsed_secs: elapsed.max(0) as u64,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

        Ok(rests)
    }
}
