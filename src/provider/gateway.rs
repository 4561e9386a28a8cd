//! Provider gateway: one normalized call surface over heterogeneous LLM APIs.
//!
//! The gateway owns no state beyond a reused HTTP client. Each call issues
//! exactly one request: no retry, no timeout, no coalescing. Overlapping
//! calls are the caller's business; the store's patch-by-id design is what
//! makes a late reply land on the right message.

use crate::provider::adapter::{adapter, GenerationOptions, Provider, WireMessage};
use serde_json::Value;
use std::time::Instant;

/// A gateway failure, rendered into chat content by the orchestrator
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Non-2xx response; `message` comes from the provider's error
    /// envelope when one could be extracted
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("{provider} returned a response in an unexpected shape")]
    MalformedResponse { provider: &'static str },
}

/// Normalized request: everything a provider call needs
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

/// Stateless transform from a [`ChatRequest`] to the assistant's reply text
#[derive(Debug, Clone, Default)]
pub struct Gateway {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every adapter's endpoint base (points the gateway at a
    /// test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Replace the HTTP client, e.g. to set a proxy
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Send one chat completion request and return the assistant's reply.
    ///
    /// Non-2xx responses surface the provider's own error message when the
    /// body carries one, else `HTTP <status>: <reason>`. A success body
    /// that doesn't match the provider's envelope is a
    /// [`GatewayError::MalformedResponse`].
    pub async fn call(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        let record = adapter(request.provider);
        let url = record
            .endpoint
            .url(self.base_url.as_deref(), &request.model, &request.api_key);
        let opts = GenerationOptions {
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let body = (record.build_body)(&request.messages, &request.model, opts);

        let start = Instant::now();
        tracing::info!(
            target: "gateway",
            provider = request.provider.id(),
            model = %request.model,
            message_count = request.messages.len(),
            "Starting chat completion call"
        );

        let mut builder = self.http.post(&url);
        for (name, value) in (record.headers)(&request.api_key) {
            builder = builder.header(name, value);
        }

        let response = builder.json(&body).send().await.map_err(|e| {
            tracing::error!(target: "gateway", provider = request.provider.id(), error = %e, "Request failed");
            GatewayError::Request(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&text).unwrap_or_else(|| {
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unknown error")
                )
            });
            tracing::error!(
                target: "gateway",
                provider = request.provider.id(),
                status = status.as_u16(),
                error = %message,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Chat completion call returned error"
            );
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Value = response.json().await?;
        let reply = (record.parse_response)(&envelope).ok_or(GatewayError::MalformedResponse {
            provider: record.name,
        })?;

        tracing::info!(
            target: "gateway",
            provider = request.provider.id(),
            model = %request.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            reply_chars = reply.len(),
            "Chat completion call completed"
        );
        Ok(reply)
    }
}

/// Pull a human-readable message out of an error body: `error.message`
/// first, then a top-level `message`
fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}
