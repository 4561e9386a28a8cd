//! Per-provider adapter records.
//!
//! Each backend is described by one [`Adapter`]: display name, model list,
//! endpoint, header set, request-body shape, and success-envelope parser.
//! Adding a provider means adding one enum variant and one record here;
//! the call path in [`gateway`](super::gateway) never changes.

use crate::message::Role;
use crate::provider::gateway::GatewayError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Fallbacks applied when the caller leaves the generation knobs unset
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TEMPERATURE: f64 = 0.7;

/// A supported LLM backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
    OpenRouter,
    Mistral,
    Qwen,
    Grok,
}

impl Provider {
    pub const ALL: [Provider; 7] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Google,
        Provider::OpenRouter,
        Provider::Mistral,
        Provider::Qwen,
        Provider::Grok,
    ];

    /// Stable lowercase identifier, used in settings and persisted state
    pub fn id(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
            Provider::OpenRouter => "openrouter",
            Provider::Mistral => "mistral",
            Provider::Qwen => "qwen",
            Provider::Grok => "grok",
        }
    }

    /// Human-readable provider name
    pub fn display_name(&self) -> &'static str {
        adapter(*self).name
    }

    /// Model identifiers this provider accepts
    pub fn models(&self) -> &'static [&'static str] {
        adapter(*self).models
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Provider {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .iter()
            .copied()
            .find(|p| p.id() == s)
            .ok_or_else(|| GatewayError::UnsupportedProvider(s.to_string()))
    }
}

/// Provider-agnostic request message, `{role, content}` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&crate::message::Message> for WireMessage {
    fn from(msg: &crate::message::Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// Generation parameters; unset fields fall back per provider
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

/// Where a provider's request goes and how the URL is assembled
#[derive(Debug, Clone, Copy)]
pub enum Endpoint {
    /// Fixed URL; the credential travels in the headers
    Static(&'static str),
    /// Model id and credential are interpolated into the URL itself
    ModelAndKeyInUrl(&'static str),
}

impl Endpoint {
    /// Resolve the request URL. `base_override` replaces the built-in base
    /// (used to point the gateway at a test server).
    pub fn url(&self, base_override: Option<&str>, model: &str, api_key: &str) -> String {
        match self {
            Endpoint::Static(base) => base_override.unwrap_or(base).to_string(),
            Endpoint::ModelAndKeyInUrl(base) => {
                format!("{}/{model}:generateContent?key={api_key}", base_override.unwrap_or(base))
            }
        }
    }
}

/// One backend's wire format, as data
pub struct Adapter {
    pub name: &'static str,
    pub models: &'static [&'static str],
    pub endpoint: Endpoint,
    pub headers: fn(api_key: &str) -> Vec<(&'static str, String)>,
    pub build_body: fn(messages: &[WireMessage], model: &str, opts: GenerationOptions) -> Value,
    pub parse_response: fn(body: &Value) -> Option<String>,
    /// Minimal valid success envelope, kept next to the parser it must satisfy
    pub sample_success_body: fn() -> Value,
}

/// Resolve the adapter record for a provider
pub fn adapter(provider: Provider) -> &'static Adapter {
    match provider {
        Provider::OpenAi => &OPENAI,
        Provider::Anthropic => &ANTHROPIC,
        Provider::Google => &GOOGLE,
        Provider::OpenRouter => &OPENROUTER,
        Provider::Mistral => &MISTRAL,
        Provider::Qwen => &QWEN,
        Provider::Grok => &GROK,
    }
}

static OPENAI: Adapter = Adapter {
    name: "OpenAI",
    models: &["gpt-4", "gpt-4-turbo", "gpt-3.5-turbo"],
    endpoint: Endpoint::Static("https://api.openai.com/v1/chat/completions"),
    headers: bearer_headers,
    build_body: message_array_body,
    parse_response: parse_choice_array,
    sample_success_body: sample_choice_array,
};

static ANTHROPIC: Adapter = Adapter {
    name: "Anthropic",
    models: &[
        "claude-3-5-sonnet-20241022",
        "claude-3-haiku-20240307",
        "claude-3-opus-20240229",
    ],
    endpoint: Endpoint::Static("https://api.anthropic.com/v1/messages"),
    headers: anthropic_headers,
    build_body: message_array_body,
    parse_response: parse_content_array,
    sample_success_body: sample_content_array,
};

static GOOGLE: Adapter = Adapter {
    name: "Google",
    models: &["gemini-1.5-pro", "gemini-1.5-flash", "gemini-pro"],
    endpoint: Endpoint::ModelAndKeyInUrl("https://generativelanguage.googleapis.com/v1beta/models"),
    headers: content_type_headers,
    build_body: contents_body,
    parse_response: parse_candidates,
    sample_success_body: sample_candidates,
};

static OPENROUTER: Adapter = Adapter {
    name: "OpenRouter",
    models: &[
        "openai/gpt-4",
        "openai/gpt-4-turbo",
        "openai/gpt-3.5-turbo",
        "anthropic/claude-3.5-sonnet",
        "anthropic/claude-3-opus",
        "anthropic/claude-3-haiku",
        "google/gemini-pro",
        "google/gemini-pro-vision",
        "meta-llama/llama-3.1-405b-instruct",
        "meta-llama/llama-3.1-70b-instruct",
        "meta-llama/llama-3.1-8b-instruct",
        "mistralai/mistral-large",
        "mistralai/mistral-medium",
        "mistralai/mixtral-8x7b-instruct",
        "perplexity/llama-3.1-sonar-large-128k-online",
        "cohere/command-r-plus",
        "databricks/dbrx-instruct",
        "microsoft/wizardlm-2-8x22b",
        "qwen/qwen-2-72b-instruct",
        "deepseek/deepseek-coder",
    ],
    endpoint: Endpoint::Static("https://openrouter.ai/api/v1/chat/completions"),
    headers: openrouter_headers,
    build_body: message_array_body,
    parse_response: parse_choice_array,
    sample_success_body: sample_choice_array,
};

static MISTRAL: Adapter = Adapter {
    name: "Mistral AI",
    models: &["mistral-large", "mistral-medium", "mistral-small"],
    endpoint: Endpoint::Static("https://api.mistral.ai/v1/chat/completions"),
    headers: bearer_headers,
    build_body: message_array_body,
    parse_response: parse_choice_array,
    sample_success_body: sample_choice_array,
};

static QWEN: Adapter = Adapter {
    name: "Qwen",
    models: &["qwen-max", "qwen-plus", "qwen-turbo"],
    endpoint: Endpoint::Static(
        "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation",
    ),
    headers: bearer_headers,
    build_body: nested_parameters_body,
    parse_response: parse_nested_output,
    sample_success_body: sample_nested_output,
};

static GROK: Adapter = Adapter {
    name: "Grok (xAI)",
    models: &["grok-beta", "grok-vision-beta"],
    endpoint: Endpoint::Static("https://api.x.ai/v1/chat/completions"),
    headers: bearer_headers,
    build_body: message_array_body,
    parse_response: parse_choice_array,
    sample_success_body: sample_choice_array,
};

// --- Header sets ---

fn bearer_headers(api_key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("Authorization", format!("Bearer {api_key}")),
        ("Content-Type", "application/json".to_string()),
    ]
}

fn anthropic_headers(api_key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("x-api-key", api_key.to_string()),
        ("Content-Type", "application/json".to_string()),
        ("anthropic-version", "2023-06-01".to_string()),
    ]
}

/// The credential rides in the URL, so only the content type is needed
fn content_type_headers(_api_key: &str) -> Vec<(&'static str, String)> {
    vec![("Content-Type", "application/json".to_string())]
}

fn openrouter_headers(api_key: &str) -> Vec<(&'static str, String)> {
    let mut headers = bearer_headers(api_key);
    headers.push(("X-Title", "Timi Chat".to_string()));
    headers
}

// --- Request bodies ---

/// `{model, messages, max_tokens, temperature}` with messages verbatim
fn message_array_body(messages: &[WireMessage], model: &str, opts: GenerationOptions) -> Value {
    json!({
        "model": model,
        "messages": messages,
        "max_tokens": opts.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "temperature": opts.temperature.unwrap_or(DEFAULT_TEMPERATURE),
    })
}

/// `{contents: [{parts: [{text}], role}]}`; assistant becomes "model",
/// everything else "user"; generation knobs are not part of this schema
fn contents_body(messages: &[WireMessage], _model: &str, _opts: GenerationOptions) -> Value {
    let contents: Vec<Value> = messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                Role::Assistant => "model",
                _ => "user",
            };
            json!({ "parts": [{ "text": msg.content }], "role": role })
        })
        .collect();
    json!({ "contents": contents })
}

/// `{model, input: {messages}, parameters: {max_tokens, temperature}}`
fn nested_parameters_body(messages: &[WireMessage], model: &str, opts: GenerationOptions) -> Value {
    json!({
        "model": model,
        "input": { "messages": messages },
        "parameters": {
            "max_tokens": opts.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "temperature": opts.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        },
    })
}

// --- Success-envelope parsers ---

fn parse_choice_array(body: &Value) -> Option<String> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_owned)
}

fn parse_content_array(body: &Value) -> Option<String> {
    body.get("content")?.get(0)?.get("text")?.as_str().map(str::to_owned)
}

fn parse_candidates(body: &Value) -> Option<String> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_owned)
}

fn parse_nested_output(body: &Value) -> Option<String> {
    body.get("output")?
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_owned)
}

// --- Sample envelopes (one per parser shape) ---

fn sample_choice_array() -> Value {
    json!({ "choices": [{ "message": { "content": "hi" } }] })
}

fn sample_content_array() -> Value {
    json!({ "content": [{ "type": "text", "text": "hi" }] })
}

fn sample_candidates() -> Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": "hi" }] } }] })
}

fn sample_nested_output() -> Value {
    json!({ "output": { "choices": [{ "message": { "content": "hi" } }] } })
}
