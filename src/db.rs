//! Database module for tablebot
//!
//! Provides durable session snapshots and the reservation log.

mod schema;

pub use schema::*;

use crate::state_machine::DialogueSession;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Stored session {0} is unreadable: {1}")]
    CorruptSession(String, serde_json::Error),
    #[error("Could not encode session: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> DbResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    // ==================== Session Operations ====================

    /// Latest snapshot for a session key, if one was ever saved
    pub fn load_session(&self, session_id: &str) -> DbResult<Option<DialogueSession>> {
        let conn = self.conn()?;
        let state: Option<String> = conn
            .query_row(
                "SELECT state FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;

        state
            .map(|json| {
                serde_json::from_str(&json)
                    .map_err(|e| DbError::CorruptSession(session_id.to_string(), e))
            })
            .transpose()
    }

    /// Replace the snapshot for a session key; last writer wins
    pub fn save_session(
        &self,
        session_id: &str,
        session: &DialogueSession,
        last_message: &str,
    ) -> DbResult<()> {
        let conn = self.conn()?;
        upsert_session(&conn, session_id, session, last_message)
    }

    /// Last message received for a session key
    #[allow(dead_code)] // Used in tests
    pub fn last_message(&self, session_id: &str) -> DbResult<Option<String>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT last_message FROM sessions WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(DbError::from)
    }

    // ==================== Reservation Operations ====================

    /// Log a confirmed booking and save the snapshot that confirmed it in one
    /// transaction. On error neither is written.
    pub fn confirm_reservation(
        &self,
        reservation: &Reservation,
        session: &DialogueSession,
        last_message: &str,
    ) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        upsert_session(&tx, &reservation.session_id, session, last_message)?;
        tx.execute(
            "INSERT INTO reservations (session_id, date, party_size, confirmed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                reservation.session_id,
                reservation.date,
                reservation.party_size,
                reservation.confirmed_at.to_rfc3339()
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Reservations confirmed under a session key, oldest first
    #[allow(dead_code)] // Used in tests
    pub fn list_reservations(&self, session_id: &str) -> DbResult<Vec<Reservation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT session_id, date, party_size, confirmed_at FROM reservations
             WHERE session_id = ?1 ORDER BY confirmed_at, id",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok(Reservation {
                session_id: row.get(0)?,
                date: row.get(1)?,
                party_size: row.get(2)?,
                confirmed_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

fn upsert_session(
    conn: &Connection,
    session_id: &str,
    session: &DialogueSession,
    last_message: &str,
) -> DbResult<()> {
    let state = serde_json::to_string(session)?;
    conn.execute(
        "INSERT INTO sessions (session_id, state, last_message, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(session_id) DO UPDATE SET
            state = excluded.state,
            last_message = excluded.last_message,
            updated_at = excluded.updated_at",
        params![session_id, state, last_message, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
