//! Settings store: provider selection, credentials, models, and
//! generation parameters.
//!
//! Updates are plain field replacements with no validation beyond type
//! shape; range checks, if wanted, belong to whatever UI sits on top.

use crate::provider::Provider;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Prepended to every request regardless of provider
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Timi, a helpful AI assistant. \
Be concise and direct in your responses. Avoid unnecessary explanations and \
get straight to the point. Keep responses brief but complete.";

fn default_model(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAi => "gpt-4",
        Provider::Anthropic => "claude-3-5-sonnet-20241022",
        Provider::Google => "gemini-1.5-pro",
        Provider::OpenRouter => "anthropic/claude-3.5-sonnet",
        Provider::Mistral => "mistral-large",
        Provider::Qwen => "qwen-max",
        Provider::Grok => "grok-beta",
    }
}

/// Process-wide configuration, persisted across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Provider used for the next call
    pub current_provider: Provider,
    /// Credential per provider; empty string means "not configured"
    pub api_keys: IndexMap<Provider, String>,
    /// Selected model per provider, independent of `current_provider`
    pub models: IndexMap<Provider, String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            current_provider: Provider::OpenAi,
            api_keys: Provider::ALL
                .iter()
                .map(|p| (*p, String::new()))
                .collect(),
            models: Provider::ALL
                .iter()
                .map(|p| (*p, default_model(*p).to_string()))
                .collect(),
            temperature: 0.3,
            max_tokens: 500,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// State-holder for [`Settings`]; mutated only through these operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsStore {
    settings: Settings,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: Settings) -> Self {
        Self { settings }
    }

    /// Current snapshot
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn update_provider(&mut self, provider: Provider) {
        self.settings.current_provider = provider;
    }

    pub fn update_api_key(&mut self, provider: Provider, api_key: impl Into<String>) {
        self.settings.api_keys.insert(provider, api_key.into());
    }

    pub fn update_model(&mut self, provider: Provider, model: impl Into<String>) {
        self.settings.models.insert(provider, model.into());
    }

    pub fn update_temperature(&mut self, temperature: f64) {
        self.settings.temperature = temperature;
    }

    pub fn update_max_tokens(&mut self, max_tokens: u32) {
        self.settings.max_tokens = max_tokens;
    }

    pub fn update_system_prompt(&mut self, prompt: impl Into<String>) {
        self.settings.system_prompt = prompt.into();
    }

    /// Restore the documented defaults
    pub fn reset(&mut self) {
        self.settings = Settings::default();
    }

    /// Configured credential for a provider; `None` when missing or empty
    pub fn api_key_for(&self, provider: Provider) -> Option<&str> {
        self.settings
            .api_keys
            .get(&provider)
            .map(String::as_str)
            .filter(|key| !key.is_empty())
    }
}
