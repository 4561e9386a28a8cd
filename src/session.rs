//! Session orchestration: the control flow between the stores and the
//! provider gateway.
//!
//! `send` appends the user message, parks a pending assistant placeholder,
//! calls the gateway, and patches the placeholder by id with the reply or
//! the error text. Because the patch is id-addressed, a reply that arrives
//! after the user switched chats still lands on the right message. The
//! store lock is never held across the network await, so sends may
//! overlap freely.

use crate::attachment::{fold_into_prompt, ProcessedFile};
use crate::message::{Message, MessagePatch, Role};
use crate::provider::{ChatRequest, Gateway, WireMessage};
use crate::store::{ChatStore, SettingsStore};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// A send halted before any network traffic
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// Configuration error, not a gateway error: the user needs to add a
    /// credential in settings
    #[error("No API key configured for {0}; add one in settings")]
    MissingApiKey(&'static str),
}

/// Drives one user's conversations against the provider gateway
pub struct Session {
    chats: Arc<Mutex<ChatStore>>,
    settings: Arc<Mutex<SettingsStore>>,
    gateway: Gateway,
}

impl Session {
    pub fn new(chats: ChatStore, settings: SettingsStore) -> Self {
        Self::with_gateway(chats, settings, Gateway::new())
    }

    pub fn with_gateway(chats: ChatStore, settings: SettingsStore, gateway: Gateway) -> Self {
        Self {
            chats: Arc::new(Mutex::new(chats)),
            settings: Arc::new(Mutex::new(settings)),
            gateway,
        }
    }

    /// Shared handle to the conversation store
    pub fn chats(&self) -> Arc<Mutex<ChatStore>> {
        Arc::clone(&self.chats)
    }

    /// Shared handle to the settings store
    pub fn settings(&self) -> Arc<Mutex<SettingsStore>> {
        Arc::clone(&self.settings)
    }

    /// Send a user message through the active provider and return the id
    /// of the assistant message that will hold the reply.
    ///
    /// Gateway failures do not escape: they are rendered into the pending
    /// message as `Error: <text>` with `is_error` set. The only `Err` here
    /// is the missing-credential check, which fires before anything is
    /// appended.
    pub async fn send(&self, text: impl Into<String>) -> Result<Uuid, SendError> {
        let text = text.into();

        let (provider, api_key, model, max_tokens, temperature, system_prompt) = {
            let store = self.settings.lock();
            let settings = store.settings();
            let provider = settings.current_provider;
            let api_key = store
                .api_key_for(provider)
                .ok_or(SendError::MissingApiKey(provider.display_name()))?
                .to_string();
            let model = settings.models.get(&provider).cloned().unwrap_or_default();
            (
                provider,
                api_key,
                model,
                settings.max_tokens,
                settings.temperature,
                settings.system_prompt.clone(),
            )
        };

        let (assistant_id, messages) = {
            let mut chats = self.chats.lock();
            chats.append(Message::user(provider, text));
            let pending = Message::pending_assistant(provider);
            let assistant_id = pending.id;
            chats.append(pending);

            let mut messages = Vec::new();
            if !system_prompt.is_empty() {
                messages.push(WireMessage::new(Role::System, system_prompt));
            }
            // Full history minus placeholders still awaiting their reply
            messages.extend(
                chats
                    .active_messages()
                    .iter()
                    .filter(|m| !m.is_loading)
                    .map(WireMessage::from),
            );
            (assistant_id, messages)
        };

        let request = ChatRequest {
            provider,
            api_key,
            model,
            messages,
            max_tokens: Some(max_tokens),
            temperature: Some(temperature),
        };

        let patch = match self.gateway.call(&request).await {
            Ok(reply) => MessagePatch::resolved(reply),
            Err(err) => MessagePatch::failed(format!("Error: {err}")),
        };
        self.chats.lock().patch(assistant_id, &patch);
        Ok(assistant_id)
    }

    /// Like [`send`](Self::send), with processed attachments folded into
    /// the user message content first
    pub async fn send_with_attachments(
        &self,
        text: impl Into<String>,
        files: &[ProcessedFile],
    ) -> Result<Uuid, SendError> {
        self.send(fold_into_prompt(&text.into(), files)).await
    }
}
