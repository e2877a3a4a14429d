//! Intent labels and context-aware classification
//!
//! The same reply ("Sunday") means different things depending on what the
//! bot last asked, so the last bot question always travels with the message.

use crate::nlu::bounded_call;
use crate::runtime::Nlu;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What the user is trying to do with their latest message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    StartBooking,
    ProvideDate,
    ProvideDisambiguation,
    ProvidePartySize,
    AskFact,
    ConfirmBooking,
    CancelBooking,
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 8] = [
        Intent::StartBooking,
        Intent::ProvideDate,
        Intent::ProvideDisambiguation,
        Intent::ProvidePartySize,
        Intent::AskFact,
        Intent::ConfirmBooking,
        Intent::CancelBooking,
        Intent::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::StartBooking => "start_booking",
            Intent::ProvideDate => "provide_date",
            Intent::ProvideDisambiguation => "provide_disambiguation",
            Intent::ProvidePartySize => "provide_party_size",
            Intent::AskFact => "ask_fact",
            Intent::ConfirmBooking => "confirm_booking",
            Intent::CancelBooking => "cancel_booking",
            Intent::Unknown => "unknown",
        }
    }

    /// One-line meaning, rendered into the classification prompt
    pub fn description(self) -> &'static str {
        match self {
            Intent::StartBooking => "the user wants to start a new table reservation",
            Intent::ProvideDate => "the user is telling us which day to book after being asked for one",
            Intent::ProvideDisambiguation => {
                "the user is picking one of the dates the bot just offered"
            }
            Intent::ProvidePartySize => "the user is saying how many people are coming",
            Intent::AskFact => "the user asks an off-topic factual question",
            Intent::ConfirmBooking => {
                "the user confirms the final details or says they need nothing else"
            }
            Intent::CancelBooking => "the user wants to abandon the reservation in progress",
            Intent::Unknown => "the intent is unclear",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label not in the fixed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised intent label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for Intent {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        let intent = match normalized.as_str() {
            "start_booking" | "book_reservation" => Intent::StartBooking,
            "provide_date" => Intent::ProvideDate,
            "provide_disambiguation" | "answer_clarification" => Intent::ProvideDisambiguation,
            "provide_party_size" | "answer_party_size" => Intent::ProvidePartySize,
            "ask_fact" => Intent::AskFact,
            "confirm_booking" => Intent::ConfirmBooking,
            "cancel_booking" => Intent::CancelBooking,
            "unknown" => Intent::Unknown,
            _ => return Err(UnknownLabel(s.to_string())),
        };
        Ok(intent)
    }
}

/// Classify a message, falling back to [`Intent::Unknown`] on any failure.
pub async fn classify<N: Nlu + ?Sized>(
    nlu: &N,
    last_bot_question: Option<&str>,
    message: &str,
    limit: Duration,
) -> Intent {
    let intent = bounded_call(
        "intent_classifier",
        limit,
        nlu.classify_intent(last_bot_question, message),
    )
    .await
    .unwrap_or(Intent::Unknown);

    tracing::debug!(%intent, has_context = last_bot_question.is_some(), "Classified message");
    intent
}
