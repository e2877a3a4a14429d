//! Slot extractors
//!
//! Thin wrappers over the model calls that turn a failed call into each
//! extractor's fallback value. Validation against session data (is the
//! selection one of the offered candidates, is the party size positive)
//! belongs to the transition, not here.

use crate::nlu::bounded_call;
use crate::runtime::Nlu;
use chrono::NaiveDate;
use std::time::Duration;

pub const FACT_FALLBACK: &str = "I'm sorry, I'm having trouble looking that up right now.";

/// Resolve fuzzy day expressions into an ordered candidate list.
///
/// Blank entries are dropped and duplicates removed keeping first mention.
/// A failed call yields no candidates.
pub async fn resolve_dates<N: Nlu + ?Sized>(
    nlu: &N,
    message: &str,
    today: NaiveDate,
    limit: Duration,
) -> Vec<String> {
    let raw = bounded_call("date_resolver", limit, nlu.resolve_dates(message, today))
        .await
        .unwrap_or_default();

    let mut dates: Vec<String> = Vec::with_capacity(raw.len());
    for date in raw {
        let date = date.trim();
        if !date.is_empty() && !dates.iter().any(|d| d.eq_ignore_ascii_case(date)) {
            dates.push(date.to_string());
        }
    }
    dates
}

/// Ask which candidate the user picked; `None` when nothing usable came back
pub async fn select_candidate<N: Nlu + ?Sized>(
    nlu: &N,
    message: &str,
    candidates: &[String],
    limit: Duration,
) -> Option<String> {
    bounded_call(
        "disambiguation_selector",
        limit,
        nlu.select_candidate(message, candidates),
    )
    .await
    .filter(|s| !s.trim().is_empty())
}

/// Party size as the model reported it; 0 on failure
pub async fn extract_party_size<N: Nlu + ?Sized>(nlu: &N, message: &str, limit: Duration) -> i64 {
    bounded_call("party_size_extractor", limit, nlu.extract_party_size(message))
        .await
        .unwrap_or(0)
}

pub async fn answer_fact<N: Nlu + ?Sized>(nlu: &N, message: &str, limit: Duration) -> String {
    bounded_call("fact_answerer", limit, nlu.answer_fact(message))
        .await
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| FACT_FALLBACK.to_string())
}
