use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::ReasoningBackend;
use crate::config::BackendConfig;
use crate::error::AnalysisError;

const USER_AGENT: &str = concat!("clause-checkr/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenAI and compatible endpoints.
pub struct OpenAiBackend {
    client: Client,
    config: BackendConfig,
    api_key: String,
}

impl OpenAiBackend {
    /// Build a client, reading the API key from the configured environment variable.
    pub fn from_config(config: BackendConfig) -> Result<Self, AnalysisError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AnalysisError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_key(config, api_key)
    }

    pub fn with_key(config: BackendConfig, api_key: String) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

impl ReasoningBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError> {
        let request = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AnalysisError::Backend(format!(
                "{} returned {}: {}",
                self.config.endpoint,
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        parse_completion(&body)
    }
}

/// Pull the answer text out of a chat-completions response body.
fn parse_completion(body: &str) -> Result<String, AnalysisError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
        AnalysisError::MalformedBackendResponse(format!("not a chat completion: {}", e))
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| {
            AnalysisError::MalformedBackendResponse("completion has no message content".into())
        })
}
