//! Conversation turn executor

use super::traits::{Nlu, Storage};
use super::RuntimeError;

use crate::db::Reservation;
use crate::extract;
use crate::intent::{self, Intent};
use crate::moderation::{GateOutcome, ModerationGate};
use crate::state_machine::{dispatch, transition, DialogueSession, Dispatch, Effect, Event};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::Instrument;

/// Generic conversation runtime that can work with any storage and NLU implementations
pub struct ConversationRuntime<S, N>
where
    S: Storage + 'static,
    N: Nlu + 'static,
{
    storage: S,
    nlu: N,
    gate: ModerationGate,
    /// Deadline for each individual model call
    call_timeout: Duration,
    /// One lock per session key so turns for the same user run one at a time
    session_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    /// Reference day for fuzzy date resolution
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl<S, N> ConversationRuntime<S, N>
where
    S: Storage + 'static,
    N: Nlu + 'static,
{
    pub fn new(storage: S, nlu: N, gate: ModerationGate, call_timeout: Duration) -> Self {
        Self {
            storage,
            nlu,
            gate,
            call_timeout,
            session_locks: Mutex::new(HashMap::new()),
            today: local_today,
        }
    }

    /// Pin the reference day (tests)
    #[allow(dead_code)]
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Run one turn: screen, classify, extract, transition, persist.
    ///
    /// Model failures never surface here; they resolve to fallbacks inside the
    /// turn. Only store failures are returned, and then nothing was replied.
    pub async fn handle_turn(&self, session_id: &str, message: &str) -> Result<String, RuntimeError> {
        let turn_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("turn", %turn_id, session_id);
        self.run_turn(session_id, message).instrument(span).await
    }

    async fn run_turn(&self, session_id: &str, message: &str) -> Result<String, RuntimeError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let session = self.storage.load(session_id).await?;
        let before = session.booking_state;

        let event = self.gather_event(&session, message).await;
        let intent = event.intent();
        let result = transition(&session, event);

        tracing::info!(
            intent = intent.map(Intent::as_str),
            from = ?before,
            to = ?result.session.booking_state,
            "Turn complete"
        );

        for effect in result.effects {
            self.execute_effect(session_id, &result.session, message, effect)
                .await?;
        }

        Ok(result.reply)
    }

    /// Do the model work the turn needs and package the outcome as an event
    async fn gather_event(&self, session: &DialogueSession, message: &str) -> Event {
        if let Some(outcome) = self.gate.check(&self.nlu, message).await {
            return match outcome {
                GateOutcome::Blocked { reply, .. } => Event::ModerationBlocked { reply },
                GateOutcome::Corrected { reply } => Event::ContradictionCorrected { reply },
            };
        }

        let intent = intent::classify(
            &self.nlu,
            session.last_bot_question.as_deref(),
            message,
            self.call_timeout,
        )
        .await;

        let limit = self.call_timeout;
        match dispatch(session, intent) {
            Dispatch::ResolveDates => Event::DatesResolved {
                intent,
                dates: extract::resolve_dates(&self.nlu, message, (self.today)(), limit).await,
            },
            Dispatch::SelectCandidate { candidates } => Event::CandidateSelected {
                selection: extract::select_candidate(&self.nlu, message, &candidates, limit).await,
            },
            Dispatch::ExtractPartySize => Event::PartySizeExtracted {
                size: extract::extract_party_size(&self.nlu, message, limit).await,
            },
            Dispatch::AnswerFact => Event::FactAnswered {
                answer: extract::answer_fact(&self.nlu, message, limit).await,
            },
            Dispatch::Confirm => Event::ConfirmRequested,
            Dispatch::Cancel => Event::CancelRequested,
            Dispatch::Unhandled => Event::Unrecognized { intent },
        }
    }

    async fn execute_effect(
        &self,
        session_id: &str,
        session: &DialogueSession,
        message: &str,
        effect: Effect,
    ) -> Result<(), RuntimeError> {
        match effect {
            Effect::PersistSession => {
                self.storage.save(session_id, session, message).await?;
            }
            Effect::PersistReservation { date, party_size } => {
                let reservation = Reservation::confirmed_now(session_id, date, party_size);
                self.storage.record(&reservation, session, message).await?;
                tracing::info!(
                    date = %reservation.date,
                    party_size = reservation.party_size,
                    "Reservation confirmed"
                );
            }
        }
        Ok(())
    }

    fn session_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .session_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Drop locks nobody is holding or waiting on
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(session_id.to_string()).or_default())
    }
}
