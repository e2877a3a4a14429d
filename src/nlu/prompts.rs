//! Prompt templates for each model call
//!
//! Every structured prompt spells out the exact JSON shape expected back.

use crate::intent::Intent;
use crate::llm::LlmRequest;
use chrono::NaiveDate;
use std::fmt::Write as _;

const MODERATION_SYSTEM: &str = r#"You are a content moderator for a restaurant reservation chatbot.
Decide whether the user's message violates one of these rules:
1. Profanity or slurs: offensive language. Use category "profanity" and
   response "Let's keep our conversation respectful, please."
2. Gibberish: random, nonsensical text such as "asdflkj asdfasdfsadf". Use
   category "gibberish" and response "I'm sorry, I didn't catch that, could you rephrase?"

Short replies such as "four", "Sunday" or "yes" are never gibberish.
If there is no violation use is_violation=false, category "none" and response "".

Reply with JSON only:
{"is_violation": <bool>, "category": "profanity" | "gibberish" | "none", "response": "<string>"}"#;

const CONTRADICTION_SYSTEM: &str = r#"You check user messages for simple factual contradictions,
such as a temperature or unit that contradicts the description attached to it
(e.g. "Is 30C freezing?"). Ordinary requests and questions are not contradictions.

If the message contains such a contradiction, set is_contradictory=true and give a
short, friendly correction (e.g. "No, 30°C is quite warm, not freezing.").
Otherwise set is_contradictory=false and correction "".

Reply with JSON only:
{"is_contradictory": <bool>, "correction": "<string>"}"#;

const DATE_SYSTEM: &str = r#"You resolve fuzzy day expressions in a restaurant booking request.
List every specific day the user could mean, in the order they mention them,
as lowercase weekday names (e.g. "saturday") or ISO dates when a calendar date is given.
"this weekend or maybe Monday" means ["saturday", "sunday", "monday"].
"Friday" means ["friday"]. If no day is mentioned, return an empty list.

Reply with JSON only:
{"date_candidates": ["<day>", ...]}"#;

const SELECTION_SYSTEM: &str = r#"The user was offered a list of days and replied with their choice.
Return the option they picked, copied exactly as it appears in the list.
If the reply does not pick exactly one option, return an empty string.

Reply with JSON only:
{"selected": "<option>"}"#;

const PARTY_SIZE_SYSTEM: &str = r#"Extract how many people the reservation is for.
Numbers may be written as digits or words ("four", "a couple" = 2, "just me" = 1).
If no party size is stated, return 0.

Reply with JSON only:
{"party_size": <integer>}"#;

const FACT_SYSTEM: &str = "You are a helpful assistant. Answer the user's question concisely.";

pub fn moderation(message: &str) -> LlmRequest {
    LlmRequest::prompt(MODERATION_SYSTEM, message)
        .with_json_output()
        .with_max_tokens(256)
}

pub fn contradiction(message: &str) -> LlmRequest {
    LlmRequest::prompt(CONTRADICTION_SYSTEM, message)
        .with_json_output()
        .with_max_tokens(256)
}

pub fn intent(last_bot_question: Option<&str>, message: &str) -> LlmRequest {
    let mut system = String::from(
        "You are the central router for a restaurant reservation chatbot.\n\
         Classify the intent of the user's latest message using both the message\n\
         AND the bot's last question, which is the only context you have.\n\nPossible intents:\n",
    );
    for intent in Intent::ALL {
        let _ = writeln!(system, "- '{}': {}.", intent.as_str(), intent.description());
    }
    system.push_str(
        "\nContext rules:\n\
         - If the bot asked \"do you mean A, B or C?\", a reply naming one of them (\"Sunday\") is 'provide_disambiguation'.\n\
         - If the bot asked \"What day would you like to book for?\", a reply naming a day is 'provide_date'.\n\
         - If the bot asked \"How many people...?\", a reply like \"four\" is 'provide_party_size'.\n\
         - \"By the way...\" or any off-topic question is 'ask_fact', whatever the bot asked.\n\
         - \"book a table\" or \"I want a reservation\" is 'start_booking'.\n\
         - \"that's all\", \"no thanks\" or \"yes, confirm\" after \"Anything else you'd like?\" is 'confirm_booking'.\n\
         \nReply with JSON only:\n{\"intent\": \"<label>\"}",
    );

    let user = format!(
        "Bot's last question: {}\nUser's message: {message}",
        last_bot_question.unwrap_or("None")
    );

    LlmRequest::prompt(system, user)
        .with_json_output()
        .with_max_tokens(64)
}

pub fn dates(message: &str, today: NaiveDate) -> LlmRequest {
    let user = format!(
        "Today is {} ({}).\nUser's message: {message}",
        today.format("%Y-%m-%d"),
        today.format("%A")
    );
    LlmRequest::prompt(DATE_SYSTEM, user)
        .with_json_output()
        .with_max_tokens(256)
}

pub fn selection(message: &str, candidates: &[String]) -> LlmRequest {
    let options = candidates
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n");
    let user = format!("Options:\n{options}\nUser's reply: {message}");
    LlmRequest::prompt(SELECTION_SYSTEM, user)
        .with_json_output()
        .with_max_tokens(64)
}

pub fn party_size(message: &str) -> LlmRequest {
    LlmRequest::prompt(PARTY_SIZE_SYSTEM, message)
        .with_json_output()
        .with_max_tokens(32)
}

pub fn fact(message: &str) -> LlmRequest {
    LlmRequest::prompt(FACT_SYSTEM, message).with_max_tokens(512)
}
