//! Scripted implementations for testing
//!
//! These fakes enable turn-level testing without real model calls.

use super::traits::*;
use super::StoreError;
use crate::db::Reservation;
use crate::intent::Intent;
use crate::llm::LlmError;
use crate::nlu::{ContradictionVerdict, ModerationVerdict};
use crate::state_machine::DialogueSession;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

type Queue<T> = Mutex<VecDeque<Result<T, LlmError>>>;

// ============================================================================
// Scripted NLU
// ============================================================================

/// [`Nlu`] that replays queued results per call.
///
/// Moderation and contradiction default to a clean verdict once their queue
/// is empty; every other call defaults to a network error, which exercises
/// the fallback paths.
#[derive(Default)]
pub struct ScriptedNlu {
    moderation: Queue<ModerationVerdict>,
    contradiction: Queue<ContradictionVerdict>,
    intents: Queue<Intent>,
    dates: Queue<Vec<String>>,
    selections: Queue<String>,
    party_sizes: Queue<i64>,
    facts: Queue<String>,
    delay: Option<Duration>,
    /// Record of every call, in order
    calls: Mutex<Vec<&'static str>>,
    /// Last-bot-question context of each classification call
    contexts: Mutex<Vec<Option<String>>>,
}

fn push<T>(queue: &mut Queue<T>, result: Result<T, LlmError>) {
    queue.get_mut().unwrap().push_back(result);
}

impl ScriptedNlu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_moderation(mut self, result: Result<ModerationVerdict, LlmError>) -> Self {
        push(&mut self.moderation, result);
        self
    }

    pub fn with_contradiction(mut self, result: Result<ContradictionVerdict, LlmError>) -> Self {
        push(&mut self.contradiction, result);
        self
    }

    pub fn with_intent(mut self, result: Result<Intent, LlmError>) -> Self {
        push(&mut self.intents, result);
        self
    }

    pub fn with_dates(mut self, result: Result<Vec<String>, LlmError>) -> Self {
        push(&mut self.dates, result);
        self
    }

    pub fn with_selection(mut self, result: Result<String, LlmError>) -> Self {
        push(&mut self.selections, result);
        self
    }

    pub fn with_party_size(mut self, result: Result<i64, LlmError>) -> Self {
        push(&mut self.party_sizes, result);
        self
    }

    pub fn with_fact(mut self, result: Result<String, LlmError>) -> Self {
        push(&mut self.facts, result);
        self
    }

    /// Stall every call, for timeout tests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Names of the calls made so far
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Context passed to the most recent classification, if any happened
    pub fn last_classification_context(&self) -> Option<Option<String>> {
        self.contexts.lock().unwrap().last().cloned()
    }

    async fn reply<T>(
        &self,
        call: &'static str,
        queue: &Queue<T>,
        default: impl FnOnce() -> Result<T, LlmError>,
    ) -> Result<T, LlmError> {
        self.calls.lock().unwrap().push(call);
        let next = queue.lock().unwrap().pop_front();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next.unwrap_or_else(default)
    }
}

fn unscripted<T>() -> Result<T, LlmError> {
    Err(LlmError::network("No scripted response"))
}

#[async_trait]
impl Nlu for ScriptedNlu {
    async fn moderate(&self, _message: &str) -> Result<ModerationVerdict, LlmError> {
        self.reply("moderate", &self.moderation, || Ok(ModerationVerdict::clean()))
            .await
    }

    async fn check_contradiction(&self, _message: &str) -> Result<ContradictionVerdict, LlmError> {
        self.reply("check_contradiction", &self.contradiction, || {
            Ok(ContradictionVerdict::consistent())
        })
        .await
    }

    async fn classify_intent(
        &self,
        last_bot_question: Option<&str>,
        _message: &str,
    ) -> Result<Intent, LlmError> {
        self.contexts
            .lock()
            .unwrap()
            .push(last_bot_question.map(String::from));
        self.reply("classify_intent", &self.intents, unscripted).await
    }

    async fn resolve_dates(&self, _message: &str, _today: NaiveDate) -> Result<Vec<String>, LlmError> {
        self.reply("resolve_dates", &self.dates, unscripted).await
    }

    async fn select_candidate(&self, _message: &str, _candidates: &[String]) -> Result<String, LlmError> {
        self.reply("select_candidate", &self.selections, unscripted).await
    }

    async fn extract_party_size(&self, _message: &str) -> Result<i64, LlmError> {
        self.reply("extract_party_size", &self.party_sizes, unscripted).await
    }

    async fn answer_fact(&self, _message: &str) -> Result<String, LlmError> {
        self.reply("answer_fact", &self.facts, unscripted).await
    }
}

// ============================================================================
// Failing Storage
// ============================================================================

/// Storage that loads fine but refuses to save, to check that a failed
/// write fails the whole turn
#[derive(Default)]
pub struct ReadOnlyStorage {
    inner: MemoryStorage,
}

#[async_trait]
impl SessionStore for ReadOnlyStorage {
    async fn load(&self, session_id: &str) -> Result<DialogueSession, StoreError> {
        self.inner.load(session_id).await
    }

    async fn save(
        &self,
        _session_id: &str,
        _session: &DialogueSession,
        _incoming_message: &str,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only".to_string()))
    }
}

#[async_trait]
impl ReservationLog for ReadOnlyStorage {
    async fn record(
        &self,
        _reservation: &Reservation,
        _session: &DialogueSession,
        _incoming_message: &str,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only".to_string()))
    }
}

/// Memory storage whose first `n` confirmation writes fail
pub struct FlakyStorage {
    inner: MemoryStorage,
    failures_left: Mutex<usize>,
}

impl FlakyStorage {
    pub fn failing_confirmations(n: usize) -> Self {
        Self {
            inner: MemoryStorage::new(),
            failures_left: Mutex::new(n),
        }
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }
}

#[async_trait]
impl SessionStore for FlakyStorage {
    async fn load(&self, session_id: &str) -> Result<DialogueSession, StoreError> {
        self.inner.load(session_id).await
    }

    async fn save(
        &self,
        session_id: &str,
        session: &DialogueSession,
        incoming_message: &str,
    ) -> Result<(), StoreError> {
        self.inner.save(session_id, session, incoming_message).await
    }
}

#[async_trait]
impl ReservationLog for FlakyStorage {
    async fn record(
        &self,
        reservation: &Reservation,
        session: &DialogueSession,
        incoming_message: &str,
    ) -> Result<(), StoreError> {
        {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(StoreError::Unavailable("write failed".to_string()));
            }
        }
        self.inner.record(reservation, session, incoming_message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_nlu_replays_in_order() {
        let nlu = ScriptedNlu::new()
            .with_intent(Ok(Intent::StartBooking))
            .with_intent(Ok(Intent::ProvidePartySize));

        assert_eq!(nlu.classify_intent(None, "a").await.unwrap(), Intent::StartBooking);
        assert_eq!(
            nlu.classify_intent(Some("How many?"), "b").await.unwrap(),
            Intent::ProvidePartySize
        );
        assert!(nlu.classify_intent(None, "c").await.is_err());
        assert_eq!(nlu.last_classification_context(), Some(None));
        assert_eq!(nlu.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_gate_calls_default_to_clean() {
        let nlu = ScriptedNlu::new();
        assert!(!nlu.moderate("hi").await.unwrap().is_violation);
        assert!(!nlu.check_contradiction("hi").await.unwrap().is_contradictory);
        assert_eq!(nlu.last_classification_context(), None);
    }
}
