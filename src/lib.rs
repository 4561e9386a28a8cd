//! Timi - multi-provider LLM chat core
//!
//! This crate provides:
//! - A provider gateway normalizing requests/responses across LLM backends
//! - Conversation and settings stores with versioned JSON persistence
//! - A session orchestrator wiring the stores to the gateway

pub mod attachment;
pub mod message;
pub mod provider;
pub mod session;
pub mod store;

pub use attachment::{fold_into_prompt, ProcessedFile};
pub use message::{Message, MessagePatch, Role};
pub use provider::{adapter, ChatRequest, Gateway, GatewayError, Provider, WireMessage};
pub use session::{SendError, Session};
pub use store::{Chat, ChatStore, Settings, SettingsStore, Storage};
