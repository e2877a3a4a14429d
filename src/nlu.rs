//! Model-backed implementation of the [`Nlu`] capability
//!
//! One prompt per contract. Every call goes through the registry's default
//! model; structured replies are schema-checked by deserialization.

mod prompts;

use crate::intent::Intent;
use crate::llm::{complete_json, LlmError, LlmService, ModelRegistry};
use crate::runtime::Nlu;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Moderation call output
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModerationVerdict {
    pub is_violation: bool,
    #[serde(default, alias = "violation_type")]
    pub category: String,
    #[serde(default)]
    pub response: String,
}

impl ModerationVerdict {
    pub fn clean() -> Self {
        Self {
            is_violation: false,
            category: "none".to_string(),
            response: String::new(),
        }
    }
}

/// Contradiction call output
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContradictionVerdict {
    pub is_contradictory: bool,
    #[serde(default)]
    pub correction: String,
}

impl ContradictionVerdict {
    pub fn consistent() -> Self {
        Self {
            is_contradictory: false,
            correction: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IntentOutput {
    intent: String,
}

#[derive(Debug, Deserialize)]
struct DateCandidatesOutput {
    date_candidates: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SelectionOutput {
    selected: String,
}

#[derive(Debug, Deserialize)]
struct PartySizeOutput {
    party_size: i64,
}

/// Await a model call under a deadline.
///
/// Failures and timeouts are logged and collapse to `None`; the caller
/// substitutes its documented fallback. Calls are never retried.
pub async fn bounded_call<T, F>(component: &'static str, limit: Duration, call: F) -> Option<T>
where
    F: Future<Output = Result<T, LlmError>>,
{
    let error = match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(e)) => e,
        Err(_) => LlmError::timeout(limit),
    };
    tracing::warn!(
        component,
        kind = ?error.kind,
        error = %error.message,
        "Model call failed, using fallback"
    );
    None
}

/// [`Nlu`] backed by the registry's default model
pub struct LlmNlu {
    service: Option<Arc<dyn LlmService>>,
}

impl LlmNlu {
    pub fn new(registry: &ModelRegistry) -> Self {
        Self {
            service: registry.default(),
        }
    }

    pub fn from_service(service: Arc<dyn LlmService>) -> Self {
        Self {
            service: Some(service),
        }
    }

    /// Whether a model is wired in at all
    pub fn is_ready(&self) -> bool {
        self.service.is_some()
    }

    fn service(&self) -> Result<&dyn LlmService, LlmError> {
        self.service
            .as_deref()
            .ok_or_else(|| LlmError::network("No LLM available"))
    }
}

#[async_trait]
impl Nlu for LlmNlu {
    async fn moderate(&self, message: &str) -> Result<ModerationVerdict, LlmError> {
        let service = self.service()?;
        complete_json(service, &prompts::moderation(message)).await
    }

    async fn check_contradiction(&self, message: &str) -> Result<ContradictionVerdict, LlmError> {
        let service = self.service()?;
        complete_json(service, &prompts::contradiction(message)).await
    }

    async fn classify_intent(
        &self,
        last_bot_question: Option<&str>,
        message: &str,
    ) -> Result<Intent, LlmError> {
        let service = self.service()?;
        let output: IntentOutput =
            complete_json(service, &prompts::intent(last_bot_question, message)).await?;
        output
            .intent
            .parse()
            .map_err(|e: crate::intent::UnknownLabel| LlmError::parse(e.to_string()))
    }

    async fn resolve_dates(&self, message: &str, today: NaiveDate) -> Result<Vec<String>, LlmError> {
        let service = self.service()?;
        let output: DateCandidatesOutput =
            complete_json(service, &prompts::dates(message, today)).await?;
        Ok(output.date_candidates)
    }

    async fn select_candidate(&self, message: &str, candidates: &[String]) -> Result<String, LlmError> {
        let service = self.service()?;
        let output: SelectionOutput =
            complete_json(service, &prompts::selection(message, candidates)).await?;
        Ok(output.selected)
    }

    async fn extract_party_size(&self, message: &str) -> Result<i64, LlmError> {
        let service = self.service()?;
        let output: PartySizeOutput =
            complete_json(service, &prompts::party_size(message)).await?;
        Ok(output.party_size)
    }

    async fn answer_fact(&self, message: &str) -> Result<String, LlmError> {
        let service = self.service()?;
        let response = service.complete(&prompts::fact(message)).await?;
        Ok(response.text.trim().to_string())
    }
}
