use thiserror::Error;

/// Errors produced by the analysis pipeline.
///
/// Every variant is classified where it is detected: `is_retryable` tells the
/// retry engine whether running the request again can help. Nothing further
/// down the call chain re-classifies an error.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Input is too short for a meaningful analysis ({length} chars after trimming). Paste more code.")]
    InputTooShort { length: usize },

    #[error("Invalid API key. Get one at https://openrouter.ai/keys")]
    InvalidApiKey,

    #[error("No credits remaining. Check the model name, or add credits at https://openrouter.ai/credits")]
    NoCredits,

    #[error("Rate limit reached, retrying automatically")]
    RateLimited,

    #[error("Completion endpoint is temporarily unavailable ({status})")]
    UpstreamUnavailable { status: u16 },

    #[error("Completion endpoint error {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Completion request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Completion endpoint returned an unexpected envelope")]
    MalformedEnvelope { snippet: String },

    #[error("Model reply was not valid JSON: {message}")]
    InvalidJson { message: String, snippet: String },
}

impl AnalysisError {
    /// Whether the retry engine may run the failed request again.
    ///
    /// Malformed envelopes and unparseable JSON count as retryable: they come
    /// from nondeterministic generation and usually clear up on a second call.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::InputTooShort { .. }
            | AnalysisError::InvalidApiKey
            | AnalysisError::NoCredits
            | AnalysisError::Network(_) => false,
            AnalysisError::ApiStatus { status, .. } => *status >= 500,
            AnalysisError::RateLimited
            | AnalysisError::UpstreamUnavailable { .. }
            | AnalysisError::MalformedEnvelope { .. }
            | AnalysisError::InvalidJson { .. } => true,
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from config file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_errors_are_not_retryable() {
        assert!(!AnalysisError::InputTooShort { length: 3 }.is_retryable());
        assert!(!AnalysisError::InvalidApiKey.is_retryable());
        assert!(!AnalysisError::NoCredits.is_retryable());
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(AnalysisError::RateLimited.is_retryable());
        assert!(AnalysisError::UpstreamUnavailable { status: 503 }.is_retryable());
        assert!(AnalysisError::MalformedEnvelope {
            snippet: "{}".to_string()
        }
        .is_retryable());
        assert!(AnalysisError::InvalidJson {
            message: "EOF while parsing".to_string(),
            snippet: "{".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn unmapped_statuses_retry_only_on_server_errors() {
        let server = AnalysisError::ApiStatus {
            status: 500,
            body: String::new(),
        };
        let client = AnalysisError::ApiStatus {
            status: 418,
            body: String::new(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
    }
}
