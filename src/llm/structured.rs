//! Structured (JSON) output from free-form completions
//!
//! Models are asked for a JSON object matching a schema. The reply is
//! validated by deserializing into the caller's type; anything that does
//! not fit is an [`LlmErrorKind::Parse`](super::LlmErrorKind::Parse) error.

use super::{LlmError, LlmRequest, LlmService};
use serde::de::DeserializeOwned;

/// Run a completion and coerce the reply into `T`.
pub async fn complete_json<T: DeserializeOwned>(
    service: &dyn LlmService,
    request: &LlmRequest,
) -> Result<T, LlmError> {
    let response = service.complete(request).await?;
    parse_json(&response.text)
}

/// Parse a model reply as `T`.
///
/// Tolerates markdown code fences and prose around a single JSON object.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let body = strip_code_fence(text.trim());

    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            let embedded = body
                .find('{')
                .zip(body.rfind('}'))
                .filter(|(start, end)| start < end)
                .and_then(|(start, end)| body.get(start..=end));

            match embedded {
                Some(object) => serde_json::from_str(object).map_err(|e| {
                    LlmError::parse(format!("Reply does not match schema: {e} - reply: {text}"))
                }),
                None => Err(LlmError::parse(format!(
                    "Reply is not JSON: {first_err} - reply: {text}"
                ))),
            }
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line (```json)
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
