//! LLM client for proposal extraction.
//!
//! Supports the Ollama generate API and OpenAI-compatible chat completions.

mod config;
mod prompts;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use config::{LlmAppConfig, LlmConfig, LlmDeviceConfig, LlmProvider};
pub use prompts::DEFAULT_PROPOSALS_PROMPT;

/// LLM client for reply processing.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// OpenAI-compatible chat request format.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Check if the LLM service is reachable.
    pub async fn is_available(&self) -> bool {
        if !self.config.enabled() {
            return false;
        }
        let url = match self.config.provider() {
            LlmProvider::Ollama => format!("{}/api/tags", self.config.endpoint()),
            LlmProvider::OpenAI => format!("{}/v1/models", self.config.endpoint()),
        };
        let mut request = self.client.get(&url);
        if let Some(key) = self.config.api_key() {
            request = request.bearer_auth(key);
        }
        match request.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Ask the model for the proposals named in `text`.
    ///
    /// Returns the raw answer, trimmed; the sentinel is left for the caller.
    pub async fn propose(&self, subject: &str, text: &str) -> Result<String, LlmError> {
        let prompt = self
            .config
            .app
            .get_proposals_prompt()
            .replace("{subject}", subject)
            .replace("{content}", self.truncate_content(text));

        let answer = self.complete(&prompt).await?;
        Ok(answer.trim().to_string())
    }

    /// Send a prompt to the configured provider.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        if !self.config.enabled() {
            return Err(LlmError::Disabled);
        }
        match self.config.provider() {
            LlmProvider::Ollama => self.call_ollama(prompt).await,
            LlmProvider::OpenAI => self.call_openai(prompt).await,
        }
    }

    /// Truncate content to configured maximum (UTF-8 safe).
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        let max = self.config.app.max_content_chars;
        if text.len() <= max {
            return text;
        }
        let mut end = max;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    /// Call Ollama API with a prompt.
    async fn call_ollama(&self, prompt: &str) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: self.config.model(),
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.app.temperature,
                num_predict: self.config.app.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint());
        debug!("POST {} (model {})", url, self.config.model());
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(ollama_resp.response)
    }

    /// Call an OpenAI-compatible chat completions API.
    async fn call_openai(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| LlmError::MissingApiKey(self.config.provider_name().to_string()))?;

        let request = ChatRequest {
            model: self.config.model(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.app.max_tokens,
            temperature: self.config.app.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.config.endpoint());
        debug!("POST {} (model {})", url, self.config.model());
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Parse("Response has no choices".to_string()))
    }
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("LLM is disabled")]
    Disabled,
    #[error("{0} API key not set. Set LLM_API_KEY, OPENAI_API_KEY or GROQ_API_KEY")]
    MissingApiKey(String),
}
