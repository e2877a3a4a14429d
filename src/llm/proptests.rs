//! Property-based tests for structured output coercion
//!
//! - Any schema-conforming object survives fences and surrounding prose
//! - Arbitrary model text never panics the parser
//! - Objects with the wrong field types are always rejected

use super::structured::parse_json;
use super::LlmErrorKind;
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DateCandidates {
    date_candidates: Vec<String>,
}

fn arb_candidates() -> impl Strategy<Value = DateCandidates> {
    proptest::collection::vec("[a-zA-Z0-9 ,-]{1,20}", 0..5)
        .prop_map(|date_candidates| DateCandidates { date_candidates })
}

/// Ways a model tends to wrap its JSON
fn arb_wrapping() -> impl Strategy<Value = (String, String)> {
    prop_oneof![
        Just((String::new(), String::new())),
        Just(("```json\n".to_string(), "\n```".to_string())),
        Just(("```\n".to_string(), "\n```".to_string())),
        "[a-zA-Z .!:]{0,30}".prop_map(|prose| (format!("{prose} "), String::new())),
        "[a-zA-Z .!:]{0,30}".prop_map(|prose| (String::new(), format!(" {prose}"))),
    ]
}

proptest! {
    #[test]
    fn prop_wrapped_object_round_trips(value in arb_candidates(), (prefix, suffix) in arb_wrapping()) {
        let body = serde_json::to_string(&value).unwrap();
        let reply = format!("{prefix}{body}{suffix}");
        let parsed: DateCandidates = parse_json(&reply).unwrap();
        prop_assert_eq!(parsed, value);
    }

    #[test]
    fn prop_arbitrary_text_never_panics(text in "\\PC{0,200}") {
        let _ = parse_json::<DateCandidates>(&text);
    }

    #[test]
    fn prop_wrong_field_type_rejected(n in any::<i64>()) {
        let reply = format!("{{\"date_candidates\": {n}}}");
        let err = parse_json::<DateCandidates>(&reply).unwrap_err();
        prop_assert_eq!(err.kind, LlmErrorKind::Parse);
    }
}
