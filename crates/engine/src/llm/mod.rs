mod openai;
pub mod types;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rolescope_common::config::LlmConfig;

use crate::circuit_breaker::CircuitBreaker;

pub use types::{LlmResponse, TokenUsage};

/// Client for a single LLM chat completion call.
///
/// Deliberately does not retry internally: a scoring job's `retry_count`
/// and `status` transitions must be observable between attempts (§4.5,
/// §4.8), so the worker owns the retry loop and calls `chat()` once per
/// attempt.
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
    api_key: String,
    circuit_breaker: Arc<CircuitBreaker>,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM API HTTP error: {0}")]
    Http(String),

    #[error("LLM API call timed out")]
    Timeout,

    #[error("LLM API auth error: {0}")]
    Auth(String),

    #[error("LLM API rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("LLM API server error: {0}")]
    ServerError(String),

    #[error("LLM API bad request: {0}")]
    BadRequest(String),

    #[error("Failed to parse LLM API response: {0}")]
    Parse(String),

    #[error("No LLM API key configured")]
    NotConfigured,

    #[error("LLM circuit breaker is open")]
    CircuitOpen,
}

impl LlmError {
    /// True when retrying the same request is pointless — the worker should
    /// fail the job outright instead of consuming another retry slot (§4.5).
    pub fn is_non_retryable(&self) -> bool {
        matches!(self, LlmError::Auth(_) | LlmError::BadRequest(_) | LlmError::NotConfigured)
    }
}

impl From<LlmError> for rolescope_common::RolescopeError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::CircuitOpen => rolescope_common::RolescopeError::CircuitOpen("llm".to_string()),
            other => rolescope_common::RolescopeError::LlmApi(other.to_string()),
        }
    }
}

impl LlmClient {
    /// Create a new LLM client from the API key resolved at startup.
    /// Returns `None` if no key was configured.
    pub fn new(
        api_key: Option<String>,
        config: LlmConfig,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Option<Self> {
        let api_key = match api_key {
            Some(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!("No LLM API key configured — scoring will not run.");
                return None;
            }
        };

        Some(Self {
            http: reqwest::Client::new(),
            config,
            api_key,
            circuit_breaker,
        })
    }

    /// Model to use for a given scoring stage (§4.5 — stage 1 uses the
    /// default model, stages 2/3 escalate to a stronger model).
    pub fn model_for_stage(&self, stage: u8) -> &str {
        match stage {
            2 => &self.config.stage2_model,
            3 => &self.config.stage3_model,
            _ => &self.config.default_model,
        }
    }

    /// Perform a single chat completion attempt against the given model.
    /// No retry, no backoff — the caller decides what to do with the result.
    pub async fn chat(&self, model: &str, prompt: &str) -> Result<LlmResponse, LlmError> {
        if !self.circuit_breaker.allow() {
            return Err(LlmError::CircuitOpen);
        }

        let timeout = std::time::Duration::from_secs(self.config.call_timeout_seconds);
        let result =
            openai::send_chat_completion(&self.http, &self.api_key, model, prompt, timeout).await;

        match &result {
            Ok(_) => self.circuit_breaker.record_success(),
            Err(LlmError::Auth(_)) | Err(LlmError::BadRequest(_)) => {
                self.circuit_breaker.record_success()
            }
            Err(_) => self.circuit_breaker.record_failure(),
        }

        result
    }
}

/// Object-safe wrapper so tests can substitute a fake caller for `LlmClient`
/// without threading generics through the scoring worker (§10.4).
pub trait LlmCaller: Send + Sync {
    fn call<'a>(
        &'a self,
        model: &'a str,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<LlmResponse, LlmError>> + Send + 'a>>;
}

impl LlmCaller for LlmClient {
    fn call<'a>(
        &'a self,
        model: &'a str,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<LlmResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.chat(model, prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_non_retryable() {
        assert!(LlmError::Auth("bad key".into()).is_non_retryable());
        assert!(!LlmError::Timeout.is_non_retryable());
        assert!(!LlmError::ServerError("oops".into()).is_non_retryable());
    }

    #[test]
    fn model_for_stage_falls_back_to_default() {
        let config = LlmConfig {
            default_model: "gpt-3.5-turbo".into(),
            stage2_model: "gpt-4o".into(),
            stage3_model: "gpt-4o".into(),
            max_retries: 3,
            retry_base_seconds: 1,
            retry_cap_seconds: 30,
            call_timeout_seconds: 30,
        };
        let client = LlmClient {
            http: reqwest::Client::new(),
            config,
            api_key: "test".into(),
            circuit_breaker: Arc::new(CircuitBreaker::new("llm", 3, 120)),
        };
        assert_eq!(client.model_for_stage(1), "gpt-3.5-turbo");
        assert_eq!(client.model_for_stage(2), "gpt-4o");
        assert_eq!(client.model_for_stage(9), "gpt-3.5-turbo");
    }
}
