//! Durable state: two independent versioned JSON blobs.
//!
//! Chats and settings are persisted separately so one can change without
//! rewriting the other. Each blob carries an explicit version tag; a
//! mismatch is a hard error rather than a silent misread.

use crate::store::chats::{Chat, ChatStore};
use crate::store::settings::{Settings, SettingsStore};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Bumped on any breaking change to either blob's layout
pub const STORAGE_VERSION: u32 = 1;

const CHATS_FILE: &str = "chats.json";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Serialize, Deserialize)]
struct ChatsBlob {
    version: u32,
    chats: Vec<Chat>,
    current_chat_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingsBlob {
    version: u32,
    settings: Settings,
}

/// On-disk home for both blobs
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Storage rooted at the platform data directory
    pub fn new() -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("timi");
        Self { dir }
    }

    /// Storage rooted at an explicit directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn chats_path(&self) -> PathBuf {
        self.dir.join(CHATS_FILE)
    }

    fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    /// Load the conversation store; an absent file is an empty store
    pub fn load_chats(&self) -> anyhow::Result<ChatStore> {
        let path = self.chats_path();
        if !path.exists() {
            return Ok(ChatStore::new());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let blob: ChatsBlob = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if blob.version != STORAGE_VERSION {
            anyhow::bail!(
                "unsupported chat store version {} in {} (expected {})",
                blob.version,
                path.display(),
                STORAGE_VERSION
            );
        }
        Ok(ChatStore::from_parts(blob.chats, blob.current_chat_id))
    }

    pub fn save_chats(&self, store: &ChatStore) -> anyhow::Result<()> {
        let blob = ChatsBlob {
            version: STORAGE_VERSION,
            chats: store.chats().to_vec(),
            current_chat_id: store.current_chat_id(),
        };
        self.write_blob(&self.chats_path(), &blob)
    }

    /// Load settings; an absent file yields the documented defaults
    pub fn load_settings(&self) -> anyhow::Result<SettingsStore> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(SettingsStore::new());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let blob: SettingsBlob = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if blob.version != STORAGE_VERSION {
            anyhow::bail!(
                "unsupported settings version {} in {} (expected {})",
                blob.version,
                path.display(),
                STORAGE_VERSION
            );
        }
        Ok(SettingsStore::from_settings(blob.settings))
    }

    pub fn save_settings(&self, store: &SettingsStore) -> anyhow::Result<()> {
        let blob = SettingsBlob {
            version: STORAGE_VERSION,
            settings: store.settings().clone(),
        };
        self.write_blob(&self.settings_path(), &blob)
    }

    fn write_blob<T: Serialize>(&self, path: &Path, blob: &T) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let content = serde_json::to_string_pretty(blob)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, MessagePatch};
    use crate::provider::Provider;

    #[test]
    fn chats_round_trip_preserves_messages_and_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_dir(dir.path());

        let mut store = ChatStore::new();
        store.append(Message::user(Provider::Anthropic, "what is borrowing"));
        let pending = Message::pending_assistant(Provider::Anthropic);
        let pending_id = pending.id;
        store.append(pending);
        store.patch(pending_id, &MessagePatch::resolved("a loan of a reference"));
        store.create_chat();

        storage.save_chats(&store).unwrap();
        let loaded = storage.load_chats().unwrap();

        assert_eq!(loaded, store, "round-trip must preserve timestamps too");
        assert_eq!(loaded.current_chat_id(), store.current_chat_id());
    }

    #[test]
    fn absent_files_load_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_dir(dir.path());
        assert!(storage.load_chats().unwrap().chats().is_empty());
        assert_eq!(
            storage.load_settings().unwrap().settings(),
            &Settings::default()
        );
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_dir(dir.path());

        let mut store = SettingsStore::new();
        store.update_provider(Provider::Mistral);
        store.update_api_key(Provider::Mistral, "sk-mistral");
        store.update_temperature(0.9);

        storage.save_settings(&store).unwrap();
        let loaded = storage.load_settings().unwrap();
        assert_eq!(loaded.settings(), store.settings());
    }

    #[test]
    fn version_mismatch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_dir(dir.path());
        std::fs::write(
            dir.path().join("chats.json"),
            r#"{"version":99,"chats":[],"current_chat_id":null}"#,
        )
        .unwrap();
        let err = storage.load_chats().unwrap_err();
        assert!(err.to_string().contains("version 99"));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_dir(dir.path());
        std::fs::write(dir.path().join("settings.json"), "not json").unwrap();
        assert!(storage.load_settings().is_err());
    }
}
