//! Database schema and types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    state TEXT NOT NULL,
    last_message TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reservations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    date TEXT NOT NULL,
    party_size INTEGER NOT NULL,
    confirmed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reservations_session ON reservations(session_id, confirmed_at);
";

/// A confirmed booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub session_id: String,
    pub date: String,
    pub party_size: u32,
    pub confirmed_at: DateTime<Utc>,
}

impl Reservation {
    pub fn confirmed_now(session_id: impl Into<String>, date: impl Into<String>, party_size: u32) -> Self {
        Self {
            session_id: session_id.into(),
            date: date.into(),
            party_size,
            confirmed_at: Utc::now(),
        }
    }
}
