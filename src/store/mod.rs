//! Durable state: conversations, settings, and their on-disk blobs

mod chats;
mod persist;
mod settings;

pub use chats::{Chat, ChatStore, DEFAULT_CHAT_NAME};
pub use persist::{Storage, STORAGE_VERSION};
pub use settings::{Settings, SettingsStore, DEFAULT_SYSTEM_PROMPT};
