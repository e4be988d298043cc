use std::sync::Arc;

use crate::client::{CompletionBackend, CompletionClient};
use crate::config::AiConfig;
use crate::errors::AnalysisError;
use crate::extract::extract_json;
use crate::input::{bound_input, MIN_INPUT_CHARS};
use crate::normalize::{normalize, AnalysisReport};
use crate::retry::{with_retry, RetryPolicy};

/// Single entry point for codebase analysis.
///
/// Owns credential and model selection and composes the whole pipeline:
/// input bounding, the retry engine wrapping the completion call, JSON
/// extraction and normalization. Holds no mutable state, so concurrent
/// analyses are fully independent.
pub struct CodebaseAnalyzer {
    backend: Arc<dyn CompletionBackend>,
    retry: RetryPolicy,
}

impl CodebaseAnalyzer {
    pub fn new(config: &AiConfig) -> Result<Self, AnalysisError> {
        Ok(Self {
            backend: Arc::new(CompletionClient::new(config)?),
            retry: RetryPolicy {
                max_attempts: config.max_attempts,
                base_delay_ms: config.base_delay_ms,
            },
        })
    }

    /// Builds an analyzer around an injected backend. Used by tests to drive
    /// the pipeline without a network.
    pub fn with_backend(backend: Arc<dyn CompletionBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    /// Analyzes a codebase string.
    ///
    /// Either returns a report satisfying the [`AnalysisReport`] invariants
    /// or fails with a classified error; nothing partially validated ever
    /// escapes. Transient failures (rate limits, 5xx, truncated JSON) are
    /// retried automatically before being surfaced.
    pub async fn analyze_codebase(&self, input: &str) -> Result<AnalysisReport, AnalysisError> {
        let trimmed = input.trim();
        let length = trimmed.chars().count();
        if length < MIN_INPUT_CHARS {
            return Err(AnalysisError::InputTooShort { length });
        }

        let bounded = bound_input(trimmed);
        let backend = Arc::clone(&self.backend);

        with_retry(self.retry, move || {
            let backend = Arc::clone(&backend);
            let bounded = bounded.clone();
            async move {
                let content = backend.complete(&bounded).await?;
                let parsed = extract_json(&content)?;
                Ok(normalize(parsed))
            }
        })
        .await
    }
}
