//! LLM provider abstraction
//!
//! Provides a common interface for interacting with various LLM providers.

mod anthropic;
mod error;
mod gemini;
mod models;
mod registry;
mod structured;
mod types;

#[cfg(test)]
mod proptests;

#[allow(unused_imports)] // Public API re-exports
pub use anthropic::AnthropicService;
pub use error::{LlmError, LlmErrorKind};
#[allow(unused_imports)] // Public API re-exports
pub use gemini::GeminiService;
pub use models::{all_models, ModelDef, Provider};
pub use registry::{LlmConfig, ModelRegistry};
pub use structured::{complete_json, parse_json};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for LLM services.
///
/// Failures are logged at warn: every caller has a fallback reply.
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    end_turn = response.end_turn,
                    "Model call completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    transient = e.kind.is_transient(),
                    "Model call failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl LlmService for Echo {
        async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
            if request.json_output {
                Err(LlmError::rate_limit("slow down"))
            } else {
                Ok(LlmResponse::from_text("ok"))
            }
        }

        fn model_id(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_logging_service_passes_results_through() {
        let service = LoggingService::new(Arc::new(Echo));
        assert_eq!(service.model_id(), "echo");

        let ok = service.complete(&LlmRequest::prompt("system", "hi")).await.unwrap();
        assert_eq!(ok.text, "ok");

        let err = service
            .complete(&LlmRequest::prompt("system", "hi").with_json_output())
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::RateLimit);
    }
}
