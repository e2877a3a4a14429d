//! Events that drive dialogue transitions
//!
//! Each event carries the outcome of whatever model work the turn needed, so
//! the transition itself never performs I/O.

use crate::intent::Intent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Moderation gate outcomes
    ModerationBlocked {
        reply: String,
    },
    ContradictionCorrected {
        reply: String,
    },

    // Extractor outcomes
    DatesResolved {
        /// `start_booking` or `provide_date`
        intent: Intent,
        dates: Vec<String>,
    },
    CandidateSelected {
        selection: Option<String>,
    },
    PartySizeExtracted {
        size: i64,
    },
    FactAnswered {
        answer: String,
    },

    // Intents that need no extraction
    ConfirmRequested,
    CancelRequested,
    Unrecognized {
        intent: Intent,
    },
}

impl Event {
    /// Classified intent behind this event, if the turn got that far
    pub fn intent(&self) -> Option<Intent> {
        match self {
            Event::ModerationBlocked { .. } | Event::ContradictionCorrected { .. } => None,
            Event::DatesResolved { intent, .. } | Event::Unrecognized { intent } => Some(*intent),
            Event::CandidateSelected { .. } => Some(Intent::ProvideDisambiguation),
            Event::PartySizeExtracted { .. } => Some(Intent::ProvidePartySize),
            Event::FactAnswered { .. } => Some(Intent::AskFact),
            Event::ConfirmRequested => Some(Intent::ConfirmBooking),
            Event::CancelRequested => Some(Intent::CancelBooking),
        }
    }
}
