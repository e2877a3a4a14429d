//! Dialogue session types

use crate::intent::Intent;
use serde::{Deserialize, Serialize};

/// Booking progress within one flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    #[default]
    Idle,
    AwaitingDate,
    AwaitingClarification,
    AwaitingPartySize,
    Complete,
}

impl BookingState {
    /// Position in the booking flow; transitions only move forward or back to idle
    #[allow(dead_code)] // Used in tests
    pub fn rank(self) -> u8 {
        match self {
            BookingState::Idle => 0,
            BookingState::AwaitingDate => 1,
            BookingState::AwaitingClarification => 2,
            BookingState::AwaitingPartySize => 3,
            BookingState::Complete => 4,
        }
    }

    /// Whether a booking is partway through and a side question should resume it
    pub fn is_in_progress(self) -> bool {
        !matches!(self, BookingState::Idle | BookingState::Complete)
    }
}

/// Per-user dialogue state, persisted as one snapshot per turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueSession {
    pub session_id: String,
    #[serde(default)]
    pub booking_state: BookingState,
    #[serde(default)]
    pub pending_date: Option<String>,
    /// Non-empty only while awaiting clarification
    #[serde(default)]
    pub date_candidates: Vec<String>,
    #[serde(default)]
    pub party_size: Option<u32>,
    #[serde(default)]
    pub last_bot_question: Option<String>,
    #[serde(default)]
    pub last_intent: Option<Intent>,
}

impl DialogueSession {
    /// Fresh idle session for a key seen for the first time
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            booking_state: BookingState::Idle,
            pending_date: None,
            date_candidates: Vec::new(),
            party_size: None,
            last_bot_question: None,
            last_intent: None,
        }
    }

    /// Abandon the current booking: back to idle with every slot cleared
    pub fn clear_booking(&mut self) {
        self.booking_state = BookingState::Idle;
        self.pending_date = None;
        self.date_candidates.clear();
        self.party_size = None;
        self.last_bot_question = None;
    }

    /// Whether both slots needed for a reservation are filled
    #[allow(dead_code)] // Used in tests
    pub fn has_all_slots(&self) -> bool {
        self.pending_date.is_some() && self.party_size.is_some()
    }
}
