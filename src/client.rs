use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AiConfig;
use crate::errors::AnalysisError;
use crate::prompts::{JSON_ONLY_SUFFIX, SYSTEM_PROMPT};

/// A chat message with a role and content, used in both directions.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// The completion endpoint's wire envelope. Only the first choice's message
/// content is consumed.
#[derive(Deserialize, Debug, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// Seam between the pipeline and the completion endpoint.
///
/// One implementation speaks HTTP; tests inject fakes to drive the retry
/// engine and facade without a network.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Performs exactly one request and returns the raw text of the model's
    /// first choice. Classifies its own failures; never retries.
    async fn complete(&self, input: &str) -> Result<String, AnalysisError>;
}

/// HTTP client for an OpenAI-compatible chat completion endpoint.
pub struct CompletionClient {
    http: reqwest::Client,
    config: AiConfig,
}

impl CompletionClient {
    pub fn new(config: &AiConfig) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    fn build_request(&self, input: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: format!("{SYSTEM_PROMPT}\n\n{JSON_ONLY_SUFFIX}"),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!("Analyze this codebase:\n\n{input}"),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(&self, input: &str) -> Result<String, AnalysisError> {
        let payload = self.build_request(input);
        tracing::debug!(model = %payload.model, "sending completion request");

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(self.config.api_key.as_deref().unwrap_or(""))
            .header("X-Title", "codecritic")
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if !(200..300).contains(&status) {
            tracing::warn!(status, "completion endpoint returned an error");
            return Err(classify_status(status, &body));
        }

        first_choice_content(&body)
    }
}

/// Maps a non-2xx HTTP status to a classified error.
fn classify_status(status: u16, body: &str) -> AnalysisError {
    match status {
        401 => AnalysisError::InvalidApiKey,
        402 => AnalysisError::NoCredits,
        429 => AnalysisError::RateLimited,
        502 | 503 => AnalysisError::UpstreamUnavailable { status },
        _ => AnalysisError::ApiStatus {
            status,
            body: body.chars().take(200).collect(),
        },
    }
}

/// Parses the wire envelope and pulls out the first choice's content.
///
/// A 2xx response without at least one choice holding message content is
/// treated as a transient generation glitch, not a permanent failure.
fn first_choice_content(body: &str) -> Result<String, AnalysisError> {
    let snippet = || body.chars().take(200).collect::<String>();

    let envelope: ChatCompletionResponse = serde_json::from_str(body).map_err(|err| {
        tracing::error!("failed to parse completion envelope: {err}");
        AnalysisError::MalformedEnvelope { snippet: snippet() }
    })?;

    let content = envelope
        .choices
        .first()
        .map(|choice| choice.message.content.clone())
        .unwrap_or_default();

    if content.trim().is_empty() {
        tracing::warn!("completion envelope carried no usable choice");
        return Err(AnalysisError::MalformedEnvelope { snippet: snippet() });
    }

    Ok(content)
}
