//! Proposal LLM client configuration.
//!
//! Split into two tiers:
//! - `LlmAppConfig`: from the config file (prompt, generation params)
//! - `LlmDeviceConfig`: from env vars, device-specific (provider, endpoint, model, api_key)
//!
//! Env vars: LLM_PROVIDER, LLM_MODEL, LLM_ENDPOINT, LLM_API_KEY, OLLAMA_HOST,
//! plus GROQ_API_KEY / OPENAI_API_KEY for provider auto-detection.

use serde::{Deserialize, Serialize};

use super::prompts::DEFAULT_PROPOSALS_PROMPT;

/// LLM provider type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Ollama API (local, default)
    #[default]
    Ollama,
    /// OpenAI-compatible API (OpenAI, Groq, Together.ai, etc.)
    OpenAI,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "groq" | "together" => Some(Self::OpenAI),
            _ => None,
        }
    }
}

/// Application-level LLM config (from the config file).
/// Controls what the LLM is asked, not how to connect to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct LlmAppConfig {
    /// Whether proposal extraction is enabled
    #[serde(default = "default_enabled")]
    #[prefer(default)]
    pub enabled: bool,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    #[prefer(default)]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    #[prefer(default)]
    pub temperature: f32,
    /// Custom proposals prompt (uses {subject} and {content} placeholders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[prefer(default)]
    pub proposals_prompt: Option<String>,
    /// Maximum characters of reply text to send to the LLM
    #[serde(default = "default_max_content_chars")]
    #[prefer(default)]
    pub max_content_chars: usize,
}

/// Device-level LLM config (from env vars, varies per device).
/// Controls how to connect to the LLM backend.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmDeviceConfig {
    /// LLM provider (ollama or openai)
    pub provider: LlmProvider,
    /// API endpoint (provider-specific defaults apply)
    pub endpoint: String,
    /// Model to use for extraction
    pub model: String,
    /// API key for OpenAI-compatible providers
    pub api_key: Option<String>,
}

/// Combined LLM configuration (runtime).
///
/// Serde: only the app config is read from the config file.
/// Device config is populated from environment variables during Default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct LlmConfig {
    #[serde(flatten)]
    #[prefer(flatten)]
    pub app: LlmAppConfig,
    #[serde(skip)]
    #[prefer(skip)]
    pub device: LlmDeviceConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_max_tokens() -> u32 {
    128
}

fn default_temperature() -> f32 {
    0.0
}

fn default_max_content_chars() -> usize {
    4000
}

// === LlmAppConfig implementations ===

impl Default for LlmAppConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            proposals_prompt: None,
            max_content_chars: default_max_content_chars(),
        }
    }
}

impl LlmAppConfig {
    /// Check if the config equals the default (for skip_serializing_if).
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Get the proposals prompt, using custom or default.
    pub fn get_proposals_prompt(&self) -> &str {
        self.proposals_prompt
            .as_deref()
            .unwrap_or(DEFAULT_PROPOSALS_PROMPT)
    }
}

// === LlmDeviceConfig implementations ===

impl Default for LlmDeviceConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl LlmDeviceConfig {
    /// Create device config from environment variables.
    ///
    /// - LLM_PROVIDER: ollama, groq, openai, together (authoritative when set)
    /// - LLM_MODEL: model ID
    /// - LLM_ENDPOINT: API base URL, then OLLAMA_HOST
    /// - LLM_API_KEY: API key, then GROQ_API_KEY / OPENAI_API_KEY
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve device config from an arbitrary variable source.
    pub(crate) fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            provider: LlmProvider::default(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
        };

        // Check if provider is explicitly set
        let explicit_provider = var("LLM_PROVIDER");
        if let Some(ref val) = explicit_provider {
            if let Some(provider) = LlmProvider::from_str(val) {
                config.provider = provider;
            }
        }

        // Explicit endpoint always wins, then OLLAMA_HOST for Ollama provider
        let explicit_endpoint = var("LLM_ENDPOINT");
        if let Some(ref endpoint) = explicit_endpoint {
            config.endpoint = endpoint.clone();
        } else if let Some(ollama_host) = var("OLLAMA_HOST") {
            config.endpoint = ollama_host;
        }

        // Explicit API key always wins
        if let Some(val) = var("LLM_API_KEY") {
            config.api_key = Some(val);
        }

        let explicit_model = var("LLM_MODEL");

        // If provider was explicitly set, use provider-specific defaults
        if let Some(ref provider_str) = explicit_provider {
            let provider_lower = provider_str.to_lowercase();

            if explicit_endpoint.is_none() {
                match provider_lower.as_str() {
                    "groq" => config.endpoint = "https://api.groq.com/openai".to_string(),
                    "openai" => config.endpoint = "https://api.openai.com".to_string(),
                    "together" => config.endpoint = "https://api.together.xyz".to_string(),
                    _ => {}
                }
            }

            if config.api_key.is_none() {
                match provider_lower.as_str() {
                    "groq" => config.api_key = var("GROQ_API_KEY"),
                    "openai" => config.api_key = var("OPENAI_API_KEY"),
                    _ => {}
                }
            }

            if explicit_model.is_none() {
                match provider_lower.as_str() {
                    "groq" => config.model = "llama-3.3-70b-versatile".to_string(),
                    "openai" => config.model = "gpt-3.5-turbo".to_string(),
                    "together" => {
                        config.model = "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo".to_string()
                    }
                    _ => {}
                }
            }
        } else if config.api_key.is_none() {
            // No explicit provider - auto-detect from available keys
            if let Some(key) = var("GROQ_API_KEY") {
                config.api_key = Some(key);
                config.provider = LlmProvider::OpenAI;
                if explicit_endpoint.is_none() {
                    config.endpoint = "https://api.groq.com/openai".to_string();
                }
                config.model = "llama-3.3-70b-versatile".to_string();
            } else if let Some(key) = var("OPENAI_API_KEY") {
                config.api_key = Some(key);
                config.provider = LlmProvider::OpenAI;
                if explicit_endpoint.is_none() {
                    config.endpoint = "https://api.openai.com".to_string();
                }
                config.model = "gpt-3.5-turbo".to_string();
            }
        }

        if let Some(model) = explicit_model {
            config.model = model;
        }

        config
    }

    /// Get the provider name for display.
    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            LlmProvider::Ollama => "Ollama",
            LlmProvider::OpenAI => {
                if self.endpoint.contains("groq.com") {
                    "Groq"
                } else if self.endpoint.contains("together.xyz") {
                    "Together.ai"
                } else {
                    "OpenAI"
                }
            }
        }
    }
}

// === LlmConfig (combined) implementations ===

impl LlmConfig {
    pub fn new(app: LlmAppConfig, device: LlmDeviceConfig) -> Self {
        Self { app, device }
    }

    pub fn is_default(&self) -> bool {
        self.app.is_default()
    }

    pub fn enabled(&self) -> bool {
        self.app.enabled
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.device.provider
    }

    pub fn endpoint(&self) -> &str {
        self.device.endpoint.trim_end_matches('/')
    }

    pub fn model(&self) -> &str {
        &self.device.model
    }

    pub fn api_key(&self) -> Option<&str> {
        self.device.api_key.as_deref()
    }

    pub fn provider_name(&self) -> &'static str {
        self.device.provider_name()
    }

    /// Override the model chosen by the environment, e.g. from a CLI flag.
    pub fn set_model(&mut self, model: String) {
        self.device.model = model;
    }
}
