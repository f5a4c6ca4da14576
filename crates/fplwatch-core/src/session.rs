// Connected team and favourite leagues, persisted in SQLite.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENTRY_ID_KEY: &str = "entry_id";

/// What the user has connected to. Survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub entry_id: Option<u64>,
    /// League ids in the order they were favourited.
    pub favorite_leagues: Vec<u64>,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.entry_id.is_some()
    }

    pub fn is_favorite(&self, league_id: u64) -> bool {
        self.favorite_leagues.contains(&league_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Please enter your FPL Team ID")]
    EmptyTeamId,

    #[error("Invalid team ID `{input}`")]
    InvalidTeamId { input: String },
}

/// Parse a team id typed by the user: surrounding whitespace is ignored and
/// the rest must be a positive integer.
pub fn parse_team_id(text: &str) -> Result<u64, SessionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SessionError::EmptyTeamId);
    }
    match trimmed.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(SessionError::InvalidTeamId {
            input: trimmed.to_string(),
        }),
    }
}

/// SQLite-backed session persistence.
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    /// Open (or create) the session database at `path`. Pass `":memory:"`
    /// for an ephemeral store.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open session database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS session_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS favorite_leagues (
                position  INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id INTEGER NOT NULL UNIQUE,
                added_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )
        .context("failed to create session schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("session mutex poisoned")
    }

    pub fn load(&self) -> Result<Session> {
        let conn = self.conn();

        let entry_id: Option<String> = conn
            .query_row(
                "SELECT value FROM session_state WHERE key = ?1",
                params![ENTRY_ID_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("failed to read connected entry")?;
        let entry_id = match entry_id {
            Some(text) => Some(
                text.parse::<u64>()
                    .with_context(|| format!("stored entry id `{text}` is not a number"))?,
            ),
            None => None,
        };

        let mut stmt = conn
            .prepare("SELECT league_id FROM favorite_leagues ORDER BY position")
            .context("failed to prepare favourites query")?;
        let favorite_leagues = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .context("failed to query favourites")?
            .map(|r| r.map(|id| id as u64))
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read favourite row")?;

        Ok(Session {
            entry_id,
            favorite_leagues,
        })
    }

    /// Replace the connected entry. Favourites are kept.
    pub fn connect_team(&self, entry_id: u64) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO session_state (key, value) VALUES (?1, ?2)",
                params![ENTRY_ID_KEY, entry_id.to_string()],
            )
            .context("failed to save connected entry")?;
        tracing::debug!(entry_id, "session connected");
        Ok(())
    }

    pub fn disconnect(&self) -> Result<()> {
        self.conn()
            .execute(
                "DELETE FROM session_state WHERE key = ?1",
                params![ENTRY_ID_KEY],
            )
            .context("failed to clear connected entry")?;
        Ok(())
    }

    /// No-op if the league is already a favourite.
    pub fn add_favorite(&self, league_id: u64) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR IGNORE INTO favorite_leagues (league_id) VALUES (?1)",
                params![league_id as i64],
            )
            .context("failed to add favourite league")?;
        Ok(())
    }

    pub fn remove_favorite(&self, league_id: u64) -> Result<()> {
        self.conn()
            .execute(
                "DELETE FROM favorite_leagues WHERE league_id = ?1",
                params![league_id as i64],
            )
            .context("failed to remove favourite league")?;
        Ok(())
    }

    /// Flip a league's favourite flag. Returns whether it is now a favourite.
    pub fn toggle_favorite(&self, league_id: u64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        let removed = tx
            .execute(
                "DELETE FROM favorite_leagues WHERE league_id = ?1",
                params![league_id as i64],
            )
            .context("failed to remove favourite league")?;
        if removed == 0 {
            tx.execute(
                "INSERT INTO favorite_leagues (league_id) VALUES (?1)",
                params![league_id as i64],
            )
            .context("failed to add favourite league")?;
        }
        tx.commit().context("failed to commit favourite toggle")?;
        Ok(removed == 0)
    }
}
