//! Moderation gate
//!
//! Screens every inbound message before classification. A fixed keyword list
//! runs first so baseline cases never depend on a model call. Model-backed
//! checks fail open: an error or timeout lets the message through.

use crate::nlu::bounded_call;
use crate::runtime::Nlu;
use regex::{Regex, RegexBuilder};
use std::time::Duration;

pub const RESPECTFUL_REPLY: &str = "Let's keep our conversation respectful, please.";
pub const REPHRASE_REPLY: &str = "I'm sorry, I didn't catch that, could you rephrase?";

/// Baseline disallowed words, matched as whole words
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    "fuck", "fucking", "shit", "bitch", "bastard", "asshole", "cunt", "dickhead",
];

/// Why a message was stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationCategory {
    Profanity,
    Gibberish,
    /// Model flagged a violation with a category we don't name
    Other,
}

impl ViolationCategory {
    fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "profanity" | "slur" | "profanity/slur" => Self::Profanity,
            "gibberish" => Self::Gibberish,
            _ => Self::Other,
        }
    }

    fn canned_reply(self) -> &'static str {
        match self {
            Self::Profanity | Self::Other => RESPECTFUL_REPLY,
            Self::Gibberish => REPHRASE_REPLY,
        }
    }
}

/// Gate outcome for a message that must not be processed normally
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Disallowed content; the turn ends and the booking is abandoned
    Blocked {
        category: ViolationCategory,
        reply: String,
    },
    /// A factual contradiction; the correction replaces the normal reply
    Corrected { reply: String },
}

impl GateOutcome {
    pub fn reply(&self) -> &str {
        match self {
            GateOutcome::Blocked { reply, .. } | GateOutcome::Corrected { reply } => reply,
        }
    }
}

pub struct ModerationGate {
    blocklist: Regex,
    limit: Duration,
}

impl ModerationGate {
    pub fn new(words: &[&str], limit: Duration) -> Result<Self, regex::Error> {
        let alternation = words
            .iter()
            .map(|w| regex::escape(w.trim()))
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join("|");
        // An empty alternation would match everywhere
        let pattern = if alternation.is_empty() {
            r"[^\s\S]".to_string()
        } else {
            format!(r"\b(?:{alternation})\b")
        };
        let blocklist = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
        Ok(Self { blocklist, limit })
    }

    pub fn with_default_blocklist(limit: Duration) -> Result<Self, regex::Error> {
        Self::new(DEFAULT_BLOCKLIST, limit)
    }

    /// Deterministic whole-word screen
    pub fn keyword_hit(&self, message: &str) -> bool {
        self.blocklist.is_match(message)
    }

    /// Screen a message. `None` means proceed with normal processing.
    pub async fn check<N: Nlu + ?Sized>(&self, nlu: &N, message: &str) -> Option<GateOutcome> {
        if self.keyword_hit(message) {
            tracing::info!(source = "keyword", "Message blocked by moderation");
            return Some(GateOutcome::Blocked {
                category: ViolationCategory::Profanity,
                reply: RESPECTFUL_REPLY.to_string(),
            });
        }

        if let Some(verdict) = bounded_call("moderation", self.limit, nlu.moderate(message)).await {
            if verdict.is_violation {
                let category = ViolationCategory::from_label(&verdict.category);
                let reply = if verdict.response.trim().is_empty() {
                    category.canned_reply().to_string()
                } else {
                    verdict.response.trim().to_string()
                };
                tracing::info!(source = "model", ?category, "Message blocked by moderation");
                return Some(GateOutcome::Blocked { category, reply });
            }
        }

        let verdict = bounded_call(
            "contradiction",
            self.limit,
            nlu.check_contradiction(message),
        )
        .await?;
        let correction = verdict.correction.trim();
        if verdict.is_contradictory && !correction.is_empty() {
            tracing::info!("Message corrected for a factual contradiction");
            return Some(GateOutcome::Corrected {
                reply: correction.to_string(),
            });
        }

        None
    }
}
