//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with scripted implementations.

use super::StoreError;
use crate::db::{Database, Reservation};
use crate::intent::Intent;
use crate::llm::LlmError;
use crate::nlu::{ContradictionVerdict, ModerationVerdict};
use crate::state_machine::DialogueSession;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Per-key dialogue snapshots
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stored session, or a fresh idle one for an unseen key
    async fn load(&self, session_id: &str) -> Result<DialogueSession, StoreError>;

    /// Replace the snapshot for a key along with the message that produced it
    async fn save(
        &self,
        session_id: &str,
        session: &DialogueSession,
        incoming_message: &str,
    ) -> Result<(), StoreError>;
}

/// Append-only log of confirmed bookings
#[async_trait]
pub trait ReservationLog: Send + Sync {
    /// Log a booking together with the snapshot of the turn that confirmed it.
    /// Both are written or neither is.
    async fn record(
        &self,
        reservation: &Reservation,
        session: &DialogueSession,
        incoming_message: &str,
    ) -> Result<(), StoreError>;
}

/// Combined storage trait for convenience
pub trait Storage: SessionStore + ReservationLog {}
impl<T: SessionStore + ReservationLog> Storage for T {}

/// The model-backed decisions a turn can need, one method per call contract
#[async_trait]
pub trait Nlu: Send + Sync {
    async fn moderate(&self, message: &str) -> Result<ModerationVerdict, LlmError>;

    async fn check_contradiction(&self, message: &str) -> Result<ContradictionVerdict, LlmError>;

    async fn classify_intent(
        &self,
        last_bot_question: Option<&str>,
        message: &str,
    ) -> Result<Intent, LlmError>;

    async fn resolve_dates(&self, message: &str, today: NaiveDate) -> Result<Vec<String>, LlmError>;

    async fn select_candidate(&self, message: &str, candidates: &[String]) -> Result<String, LlmError>;

    async fn extract_party_size(&self, message: &str) -> Result<i64, LlmError>;

    async fn answer_fact(&self, message: &str) -> Result<String, LlmError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn load(&self, session_id: &str) -> Result<DialogueSession, StoreError> {
        (**self).load(session_id).await
    }

    async fn save(
        &self,
        session_id: &str,
        session: &DialogueSession,
        incoming_message: &str,
    ) -> Result<(), StoreError> {
        (**self).save(session_id, session, incoming_message).await
    }
}

#[async_trait]
impl<T: ReservationLog + ?Sized> ReservationLog for Arc<T> {
    async fn record(
        &self,
        reservation: &Reservation,
        session: &DialogueSession,
        incoming_message: &str,
    ) -> Result<(), StoreError> {
        (**self).record(reservation, session, incoming_message).await
    }
}

#[async_trait]
impl<T: Nlu + ?Sized> Nlu for Arc<T> {
    async fn moderate(&self, message: &str) -> Result<ModerationVerdict, LlmError> {
        (**self).moderate(message).await
    }

    async fn check_contradiction(&self, message: &str) -> Result<ContradictionVerdict, LlmError> {
        (**self).check_contradiction(message).await
    }

    async fn classify_intent(
        &self,
        last_bot_question: Option<&str>,
        message: &str,
    ) -> Result<Intent, LlmError> {
        (**self).classify_intent(last_bot_question, message).await
    }

    async fn resolve_dates(&self, message: &str, today: NaiveDate) -> Result<Vec<String>, LlmError> {
        (**self).resolve_dates(message, today).await
    }

    async fn select_candidate(&self, message: &str, candidates: &[String]) -> Result<String, LlmError> {
        (**self).select_candidate(message, candidates).await
    }

    async fn extract_party_size(&self, message: &str) -> Result<i64, LlmError> {
        (**self).extract_party_size(message).await
    }

    async fn answer_fact(&self, message: &str) -> Result<String, LlmError> {
        (**self).answer_fact(message).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as Storage
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[allow(dead_code)] // Useful for tests
    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl SessionStore for DatabaseStorage {
    async fn load(&self, session_id: &str) -> Result<DialogueSession, StoreError> {
        Ok(self
            .db
            .load_session(session_id)?
            .unwrap_or_else(|| DialogueSession::new(session_id)))
    }

    async fn save(
        &self,
        session_id: &str,
        session: &DialogueSession,
        incoming_message: &str,
    ) -> Result<(), StoreError> {
        self.db
            .save_session(session_id, session, incoming_message)
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl ReservationLog for DatabaseStorage {
    async fn record(
        &self,
        reservation: &Reservation,
        session: &DialogueSession,
        incoming_message: &str,
    ) -> Result<(), StoreError> {
        self.db
            .confirm_reservation(reservation, session, incoming_message)
            .map_err(StoreError::from)
    }
}

/// Process-local storage used when no database path is configured.
/// Sessions are lost on restart.
#[derive(Default)]
pub struct MemoryStorage {
    sessions: Mutex<HashMap<String, DialogueSession>>,
    reservations: Mutex<Vec<Reservation>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the reservation log
    #[allow(dead_code)] // Used in tests
    pub fn reservations(&self) -> Vec<Reservation> {
        self.reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stored snapshot without the idle default
    pub fn session(&self, session_id: &str) -> Option<DialogueSession> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }
}

#[async_trait]
impl SessionStore for MemoryStorage {
    async fn load(&self, session_id: &str) -> Result<DialogueSession, StoreError> {
        Ok(self
            .session(session_id)
            .unwrap_or_else(|| DialogueSession::new(session_id)))
    }

    async fn save(
        &self,
        session_id: &str,
        session: &DialogueSession,
        _incoming_message: &str,
    ) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id.to_string(), session.clone());
        Ok(())
    }
}

#[async_trait]
impl ReservationLog for MemoryStorage {
    async fn record(
        &self,
        reservation: &Reservation,
        session: &DialogueSession,
        _incoming_message: &str,
    ) -> Result<(), StoreError> {
        // Sessions before reservations, so both change under one critical section
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let mut reservations = self
            .reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.insert(reservation.session_id.clone(), session.clone());
        reservations.push(reservation.clone());
        Ok(())
    }
}

/// Stand-in when the configured store could not be opened: every turn fails
/// and the health check reports the store as down.
pub struct UnavailableStorage {
    reason: String,
}

impl UnavailableStorage {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SessionStore for UnavailableStorage {
    async fn load(&self, _session_id: &str) -> Result<DialogueSession, StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }

    async fn save(
        &self,
        _session_id: &str,
        _session: &DialogueSession,
        _incoming_message: &str,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}

#[async_trait]
impl ReservationLog for UnavailableStorage {
    async fn record(
        &self,
        _reservation: &Reservation,
        _session: &DialogueSession,
        _incoming_message: &str,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}
