use crate::config::{HttpConfig, ModelConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Language model that judges the submitted copy.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_text: &str) -> Result<String, ModelError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model credential rejected")]
    Unauthorized,
    #[error("model rate limit reached")]
    RateLimited,
    #[error("model service unavailable ({status})")]
    Unavailable { status: u16 },
    #[error("model request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model request timed out")]
    Timeout,
    #[error("model transport error: {0}")]
    Transport(String),
    #[error("unreadable model response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    seed: u64,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions client (Groq by default). Never retries.
pub struct GroqChatClient {
    http: reqwest::Client,
    api_key: String,
    config: ModelConfig,
}

impl GroqChatClient {
    pub fn new(
        api_key: String,
        config: ModelConfig,
        http: &HttpConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: http.client()?,
            api_key,
            config,
        })
    }
}

#[async_trait]
impl ModelClient for GroqChatClient {
    async fn generate(&self, system_prompt: &str, user_text: &str) -> Result<String, ModelError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
            seed: self.config.seed,
            stream: false,
        };

        debug!(model = %self.config.model, chars = user_text.chars().count(), "calling model");
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => ModelError::Unauthorized,
                429 => ModelError::RateLimited,
                code @ 500..=599 => ModelError::Unavailable { status: code },
                code => ModelError::Status {
                    status: code,
                    body: preview(&body, 200).to_string(),
                },
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|err| ModelError::Decode(err.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        debug!(chars = content.chars().count(), "model call finished");
        Ok(content)
    }
}

fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}
