//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all reachable sessions and
//! every event.

#![allow(clippy::collapsible_if)]

use super::transition::ASK_DATE;
use super::*;
use crate::intent::Intent;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_day() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("monday".to_string()),
        Just("friday".to_string()),
        Just("saturday".to_string()),
        Just("sunday".to_string()),
        Just("2026-12-24".to_string()),
        "[a-z]{3,9}",
    ]
}

fn arb_candidates() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(arb_day(), 2..5).prop_map(|mut days| {
        days.sort();
        days.dedup();
        if days.len() < 2 {
            days.push("next-week".to_string());
        }
        days
    })
}

fn arb_intent() -> impl Strategy<Value = Intent> {
    proptest::sample::select(Intent::ALL.to_vec())
}

/// Sessions that a real conversation can reach
fn arb_session() -> impl Strategy<Value = DialogueSession> {
    let idle = Just(DialogueSession::new("u1"));
    let awaiting_date = Just({
        let mut s = DialogueSession::new("u1");
        s.booking_state = BookingState::AwaitingDate;
        s.last_bot_question = Some(ASK_DATE.to_string());
        s
    });
    let clarifying = arb_candidates().prop_map(|candidates| {
        let mut s = DialogueSession::new("u1");
        s.booking_state = BookingState::AwaitingClarification;
        s.last_bot_question = Some(format!("do you mean {}?", candidates.join(" or ")));
        s.date_candidates = candidates;
        s
    });
    let party = arb_day().prop_map(|day| {
        let mut s = DialogueSession::new("u1");
        s.booking_state = BookingState::AwaitingPartySize;
        s.last_bot_question = Some(format!("How many people will be in your party on {day}?"));
        s.pending_date = Some(day);
        s
    });
    let complete = (arb_day(), 1u32..20).prop_map(|(day, n)| {
        let mut s = DialogueSession::new("u1");
        s.booking_state = BookingState::Complete;
        s.last_bot_question = Some("Anything else you'd like?".to_string());
        s.pending_date = Some(day);
        s.party_size = Some(n);
        s
    });

    (
        prop_oneof![idle, awaiting_date, clarifying, party, complete],
        proptest::option::of(arb_intent()),
    )
        .prop_map(|(mut s, last_intent)| {
            s.last_intent = last_intent;
            s
        })
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z .']{1,40}".prop_map(|reply| Event::ModerationBlocked { reply }),
        "[a-zA-Z .']{1,40}".prop_map(|reply| Event::ContradictionCorrected { reply }),
        (
            prop_oneof![Just(Intent::StartBooking), Just(Intent::ProvideDate)],
            proptest::collection::vec(arb_day(), 0..4)
        )
            .prop_map(|(intent, dates)| Event::DatesResolved { intent, dates }),
        proptest::option::of(arb_day()).prop_map(|selection| Event::CandidateSelected { selection }),
        (-5i64..30).prop_map(|size| Event::PartySizeExtracted { size }),
        "[a-zA-Z .]{1,40}".prop_map(|answer| Event::FactAnswered { answer }),
        Just(Event::ConfirmRequested),
        Just(Event::CancelRequested),
        arb_intent().prop_map(|intent| Event::Unrecognized { intent }),
    ]
}

// ============================================================================
// Invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn prop_transition_is_deterministic(session in arb_session(), event in arb_event()) {
        let a = transition(&session, event.clone());
        let b = transition(&session, event);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_candidates_and_pending_date_exclusive(session in arb_session(), event in arb_event()) {
        let next = transition(&session, event).session;
        prop_assert!(next.date_candidates.is_empty() || next.pending_date.is_none());
        prop_assert_eq!(
            !next.date_candidates.is_empty(),
            next.booking_state == BookingState::AwaitingClarification
        );
    }

    #[test]
    fn prop_state_only_moves_forward_or_to_idle(session in arb_session(), event in arb_event()) {
        let restart = matches!(event, Event::DatesResolved { .. })
            && session.booking_state == BookingState::Complete;
        let next = transition(&session, event).session;
        prop_assert!(
            next.booking_state == BookingState::Idle
                || restart
                || next.booking_state.rank() >= session.booking_state.rank(),
            "{:?} -> {:?}", session.booking_state, next.booking_state
        );
    }

    #[test]
    fn prop_party_size_cleared_only_on_confirm_or_abandon(session in arb_session(), event in arb_event()) {
        let abandoning = matches!(
            event,
            Event::ModerationBlocked { .. }
                | Event::ConfirmRequested
                | Event::CancelRequested
                | Event::DatesResolved { .. }
        );
        let next = transition(&session, event).session;
        if session.party_size.is_some() && next.party_size.is_none() {
            prop_assert!(abandoning);
        }
        if next.party_size.is_some() {
            prop_assert_eq!(next.booking_state, BookingState::Complete);
        }
    }

    #[test]
    fn prop_every_turn_persists_exactly_once(session in arb_session(), event in arb_event()) {
        let effects = transition(&session, event).effects;
        prop_assert_eq!(effects.len(), 1);
        let is_persist = matches!(
            effects[0],
            Effect::PersistSession | Effect::PersistReservation { .. }
        );
        prop_assert!(is_persist);
    }

    #[test]
    fn prop_reservation_recorded_only_for_complete_confirm(session in arb_session(), event in arb_event()) {
        let confirming = event == Event::ConfirmRequested;
        let effects = transition(&session, event).effects;
        let recorded = effects
            .iter()
            .any(|e| matches!(e, Effect::PersistReservation { .. }));
        prop_assert_eq!(recorded, confirming && session.has_all_slots());
    }

    #[test]
    fn prop_fact_answer_never_moves_the_booking(session in arb_session(), answer in "[a-zA-Z .]{1,40}") {
        let result = transition(&session, Event::FactAnswered { answer: answer.clone() });
        prop_assert_eq!(result.session.booking_state, session.booking_state);
        prop_assert_eq!(&result.session.pending_date, &session.pending_date);
        prop_assert_eq!(&result.session.date_candidates, &session.date_candidates);
        prop_assert_eq!(result.session.party_size, session.party_size);
        prop_assert_eq!(result.session.last_intent, None);
        prop_assert!(result.reply.starts_with(&answer));
        if session.booking_state.is_in_progress() {
            if let Some(question) = &session.last_bot_question {
                prop_assert!(result.reply.ends_with(question.as_str()));
            }
        }
    }

    #[test]
    fn prop_foreign_selection_keeps_candidates(candidates in arb_candidates(), pick in "[0-9]{1,4}") {
        let mut session = DialogueSession::new("u1");
        session.booking_state = BookingState::AwaitingClarification;
        session.date_candidates = candidates;
        let next = transition(&session, Event::CandidateSelected { selection: Some(pick) }).session;
        prop_assert_eq!(next.booking_state, BookingState::AwaitingClarification);
        prop_assert_eq!(next.date_candidates, session.date_candidates);
    }

    #[test]
    fn prop_offered_selection_is_accepted(candidates in arb_candidates(), index in any::<prop::sample::Index>()) {
        let mut session = DialogueSession::new("u1");
        session.booking_state = BookingState::AwaitingClarification;
        let pick = index.get(&candidates).to_uppercase();
        session.date_candidates = candidates;
        let next = transition(&session, Event::CandidateSelected { selection: Some(pick.clone()) }).session;
        prop_assert_eq!(next.booking_state, BookingState::AwaitingPartySize);
        prop_assert!(next.date_candidates.is_empty());
        let stored = next.pending_date.unwrap_or_default();
        prop_assert_eq!(stored.to_uppercase(), pick);
        prop_assert!(session.date_candidates.contains(&stored));
    }

    #[test]
    fn prop_non_positive_party_size_reasks(day in arb_day(), size in i64::MIN..=0) {
        let mut session = DialogueSession::new("u1");
        session.booking_state = BookingState::AwaitingPartySize;
        session.pending_date = Some(day);
        let result = transition(&session, Event::PartySizeExtracted { size });
        prop_assert_eq!(result.session.booking_state, BookingState::AwaitingPartySize);
        prop_assert_eq!(result.session.party_size, None);
    }

    #[test]
    fn prop_single_date_never_clarifies(day in arb_day()) {
        let result = transition(
            &DialogueSession::new("u1"),
            Event::DatesResolved { intent: Intent::StartBooking, dates: vec![day.clone()] },
        );
        prop_assert_eq!(result.session.booking_state, BookingState::AwaitingPartySize);
        prop_assert_eq!(result.session.pending_date, Some(day));
    }

    #[test]
    fn prop_emitted_question_becomes_anchor(session in arb_session(), event in arb_event()) {
        let result = transition(&session, event);
        if result.session.last_bot_question != session.last_bot_question {
            // Only changes when we ask something new, or clear on reset
            prop_assert!(
                result.session.last_bot_question.as_deref() == Some(result.reply.as_str())
                    || (result.session.last_bot_question.is_none()
                        && result.session.booking_state == BookingState::Idle)
            );
        }
    }
}
