//! Pure dialogue transition function
//!
//! Given the same session and event, always produces the same session, reply
//! and effects. Model work happens before (see [`dispatch`]); persistence
//! happens after, by executing the returned effects.

use super::{BookingState, DialogueSession, Effect, Event};
use crate::intent::Intent;

pub const ASK_DATE: &str = "What day would you like to book for?";
pub const NOT_UNDERSTOOD: &str = "I'm sorry, I don't understand. Can you rephrase?";
pub const CANCELLED: &str = "No problem, I've cancelled that reservation request.";
pub const NOTHING_TO_CANCEL: &str = "There's no reservation in progress.";
pub const NOTHING_TO_CONFIRM: &str =
    "I don't have a complete reservation to confirm yet. Just say \"book a table\" to start a new one.";

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub session: DialogueSession,
    pub reply: String,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    fn new(session: DialogueSession, reply: impl Into<String>) -> Self {
        Self {
            session,
            reply: reply.into(),
            effects: vec![Effect::PersistSession],
        }
    }

    /// Persist together with a confirmed booking instead of a plain save
    fn with_reservation(mut self, date: String, party_size: u32) -> Self {
        self.effects = vec![Effect::PersistReservation { date, party_size }];
        self
    }
}

/// Which extractor (if any) a classified message needs before transitioning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    ResolveDates,
    SelectCandidate { candidates: Vec<String> },
    ExtractPartySize,
    AnswerFact,
    Confirm,
    Cancel,
    Unhandled,
}

/// Route an intent given where the booking currently stands
pub fn dispatch(session: &DialogueSession, intent: Intent) -> Dispatch {
    use BookingState as S;

    match (intent, session.booking_state) {
        (Intent::AskFact, _) => Dispatch::AnswerFact,
        (Intent::ConfirmBooking, _) => Dispatch::Confirm,
        (Intent::CancelBooking, _) => Dispatch::Cancel,

        // Restarting from complete abandons the finished booking; a restart
        // while we're waiting for a day is just a day
        (Intent::StartBooking, S::Idle | S::Complete | S::AwaitingDate)
        | (Intent::ProvideDate, S::AwaitingDate) => Dispatch::ResolveDates,

        (Intent::ProvideDisambiguation, S::AwaitingClarification) => Dispatch::SelectCandidate {
            candidates: session.date_candidates.clone(),
        },

        (Intent::ProvidePartySize, S::AwaitingPartySize) => Dispatch::ExtractPartySize,

        _ => Dispatch::Unhandled,
    }
}

pub fn transition(session: &DialogueSession, event: Event) -> TransitionResult {
    use BookingState as S;

    let mut next = session.clone();
    if let Some(intent) = event.intent() {
        next.last_intent = Some(intent);
    }

    match (session.booking_state, event) {
        // ============================================================
        // Moderation gate
        // ============================================================
        (_, Event::ModerationBlocked { reply }) => {
            next.clear_booking();
            next.last_intent = None;
            TransitionResult::new(next, reply)
        }

        (_, Event::ContradictionCorrected { reply }) => TransitionResult::new(next, reply),

        // ============================================================
        // Date resolution
        // ============================================================
        (S::Idle | S::Complete, Event::DatesResolved { dates, .. }) => {
            next.clear_booking();
            if dates.len() > 1 {
                let question = ask_clarification(&dates);
                next.date_candidates = dates;
                ask(next, S::AwaitingClarification, question)
            } else if let Some(date) = dates.into_iter().next() {
                let question = ask_party_size(&date);
                next.pending_date = Some(date);
                ask(next, S::AwaitingPartySize, question)
            } else {
                ask(next, S::AwaitingDate, ASK_DATE.to_string())
            }
        }

        (S::AwaitingDate, Event::DatesResolved { dates, .. }) => match dates.into_iter().next() {
            Some(date) => {
                let question = ask_party_size(&date);
                next.pending_date = Some(date);
                ask(next, S::AwaitingPartySize, question)
            }
            None => ask(next, S::AwaitingDate, ASK_DATE.to_string()),
        },

        // ============================================================
        // Disambiguation
        // ============================================================
        (S::AwaitingClarification, Event::CandidateSelected { selection }) => {
            let chosen = selection
                .as_deref()
                .and_then(|s| find_candidate(&session.date_candidates, s));
            match chosen {
                Some(date) => {
                    let question = ask_party_size(&date);
                    next.date_candidates.clear();
                    next.pending_date = Some(date);
                    ask(next, S::AwaitingPartySize, question)
                }
                None => {
                    let question = ask_clarification(&session.date_candidates);
                    ask(next, S::AwaitingClarification, question)
                }
            }
        }

        // ============================================================
        // Party size
        // ============================================================
        (S::AwaitingPartySize, Event::PartySizeExtracted { size }) => {
            let Some(date) = session.pending_date.clone() else {
                // No day on record; the only way forward is to ask for one
                return ask(next, S::AwaitingDate, ASK_DATE.to_string());
            };
            match u32::try_from(size).ok().filter(|n| *n > 0) {
                Some(n) => {
                    next.party_size = Some(n);
                    let question = format!(
                        "Perfect. Reservation for {n} on {}. Anything else you'd like?",
                        display_date(&date)
                    );
                    ask(next, S::Complete, question)
                }
                None => ask(next, S::AwaitingPartySize, ask_party_size(&date)),
            }
        }

        // ============================================================
        // Side questions, confirmation, cancellation
        // ============================================================
        (state, Event::FactAnswered { answer }) => {
            next.last_intent = None;
            let reply = match (&session.last_bot_question, state.is_in_progress()) {
                (Some(question), true) => {
                    format!("{answer} Now, back to your reservation... {question}")
                }
                _ => answer,
            };
            TransitionResult::new(next, reply)
        }

        (_, Event::ConfirmRequested) => {
            let booked = match (&session.pending_date, session.party_size) {
                (Some(date), Some(party_size)) => Some((date.clone(), party_size)),
                _ => None,
            };
            next.clear_booking();
            match booked {
                Some((date, party_size)) => {
                    let reply = format!(
                        "Your table for {party_size} on {} is confirmed. We'll see you then!",
                        display_date(&date)
                    );
                    TransitionResult::new(next, reply)
                        .with_reservation(date, party_size)
                }
                None => TransitionResult::new(next, NOTHING_TO_CONFIRM),
            }
        }

        (state, Event::CancelRequested) => {
            let had_booking = state != S::Idle || session.pending_date.is_some();
            next.clear_booking();
            let reply = if had_booking { CANCELLED } else { NOTHING_TO_CANCEL };
            TransitionResult::new(next, reply)
        }

        // ============================================================
        // Everything else: unknown intents and extractor results that
        // don't match the current state
        // ============================================================
        (_, _) => TransitionResult::new(next, NOT_UNDERSTOOD),
    }
}

/// Move to `state` and issue `question`, remembering it as the resume anchor
fn ask(mut session: DialogueSession, state: BookingState, question: String) -> TransitionResult {
    session.booking_state = state;
    session.last_bot_question = Some(question.clone());
    TransitionResult::new(session, question)
}

fn ask_party_size(date: &str) -> String {
    format!(
        "Great. How many people will be in your party on {}?",
        display_date(date)
    )
}

fn ask_clarification(candidates: &[String]) -> String {
    let names: Vec<String> = candidates.iter().map(|c| display_date(c)).collect();
    let options = match names.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} or {second}"),
        [init @ .., last] => format!("{}, or {last}", init.join(", ")),
    };
    format!("Sure, just to confirm, do you mean {options}?")
}

/// Match a selection against the offered candidates, trimmed and
/// case-insensitive, returning the candidate's own spelling
fn find_candidate(candidates: &[String], selection: &str) -> Option<String> {
    let wanted = selection.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    candidates
        .iter()
        .find(|c| c.trim().to_lowercase() == wanted)
        .cloned()
}

/// Capitalize a weekday-style date for display; other text passes through
fn display_date(date: &str) -> String {
    let mut chars = date.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
