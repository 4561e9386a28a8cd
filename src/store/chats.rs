//! Conversation store: the set of chats, their messages, and the
//! active-chat pointer.
//!
//! The store is a plain owned state-holder handed to whoever drives it;
//! there is no ambient singleton. None of the operations fail: mutations
//! against an unknown id are no-ops, and `set_active` is deliberately
//! lenient (an unknown id just yields an empty message view).

use crate::message::{Message, MessagePatch, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name given to a chat before the first user message arrives
pub const DEFAULT_CHAT_NAME: &str = "New Chat";

/// Derive a chat name from the first user message: first 4 words,
/// cut to 27 chars + ellipsis when the joined name exceeds 30
fn derive_chat_name(first_message: &str) -> String {
    let name = first_message
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ");
    if name.chars().count() > 30 {
        let cut: String = name.chars().take(27).collect();
        format!("{cut}...")
    } else {
        name
    }
}

/// A named, ordered sequence of messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub name: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: DEFAULT_CHAT_NAME.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns every chat and the active-chat pointer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatStore {
    chats: Vec<Chat>,
    current_chat_id: Option<Uuid>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted parts
    pub fn from_parts(chats: Vec<Chat>, current_chat_id: Option<Uuid>) -> Self {
        Self {
            chats,
            current_chat_id,
        }
    }

    /// Chats in canonical insertion order
    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn current_chat_id(&self) -> Option<Uuid> {
        self.current_chat_id
    }

    /// Create a default-named empty chat and make it active
    pub fn create_chat(&mut self) -> Uuid {
        let chat = Chat::new();
        let id = chat.id;
        self.chats.push(chat);
        self.current_chat_id = Some(id);
        id
    }

    /// Switch the active pointer. Existence is not validated: an unknown
    /// id yields an empty message view rather than an error.
    pub fn set_active(&mut self, id: Uuid) {
        self.current_chat_id = Some(id);
    }

    /// Append a message to the active chat, creating one first when none
    /// is active. The first user message into a still-default-named chat
    /// also names it.
    pub fn append(&mut self, message: Message) {
        let chat_id = match self.current_chat_id {
            Some(id) => id,
            None => self.create_chat(),
        };
        let Some(chat) = self.chats.iter_mut().find(|c| c.id == chat_id) else {
            // Dangling active pointer: same no-op as any unknown-id mutation
            return;
        };
        if chat.messages.is_empty() && message.role == Role::User && chat.name == DEFAULT_CHAT_NAME
        {
            chat.name = derive_chat_name(&message.content);
        }
        chat.messages.push(message);
        chat.touch();
    }

    /// Merge `patch` into the message with this id, wherever it lives.
    /// The lookup spans every chat so a reply that resolves after the user
    /// switched chats still lands on the right message. Only the owning
    /// chat's `updated_at` is refreshed.
    pub fn patch(&mut self, message_id: Uuid, patch: &MessagePatch) {
        for chat in &mut self.chats {
            if let Some(message) = chat.messages.iter_mut().find(|m| m.id == message_id) {
                patch.apply(message);
                chat.touch();
                return;
            }
        }
    }

    /// Remove a message by id, wherever it lives
    pub fn remove(&mut self, message_id: Uuid) {
        for chat in &mut self.chats {
            let before = chat.messages.len();
            chat.messages.retain(|m| m.id != message_id);
            if chat.messages.len() != before {
                chat.touch();
                return;
            }
        }
    }

    /// Empty the active chat's message list in place
    pub fn clear_active(&mut self) {
        let current = self.current_chat_id;
        if let Some(chat) = current.and_then(|id| self.chats.iter_mut().find(|c| c.id == id)) {
            chat.messages.clear();
            chat.touch();
        }
    }

    /// Give a chat a new human label
    pub fn rename_chat(&mut self, id: Uuid, name: impl Into<String>) {
        if let Some(chat) = self.chats.iter_mut().find(|c| c.id == id) {
            chat.name = name.into();
            chat.touch();
        }
    }

    /// Remove a chat. When it was active, the pointer moves to the first
    /// remaining chat in insertion order, or to none.
    pub fn delete_chat(&mut self, id: Uuid) {
        self.chats.retain(|c| c.id != id);
        if self.current_chat_id == Some(id) {
            self.current_chat_id = self.chats.first().map(|c| c.id);
        }
    }

    /// Presentation view: chats ordered by `updated_at`, newest first.
    /// Canonical storage order stays insertion order.
    pub fn list_visible(&self) -> Vec<&Chat> {
        let mut view: Vec<&Chat> = self.chats.iter().collect();
        view.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        view
    }

    /// Messages of the active chat, or empty when there is none
    pub fn active_messages(&self) -> &[Message] {
        self.current_chat_id
            .and_then(|id| self.chats.iter().find(|c| c.id == id))
            .map(|c| c.messages.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;

    fn user(content: &str) -> Message {
        Message::user(Provider::OpenAi, content)
    }

    #[test]
    fn append_on_empty_store_creates_exactly_one_chat() {
        let mut store = ChatStore::new();
        store.append(user("first"));
        assert_eq!(store.chats().len(), 1);
        assert_eq!(store.current_chat_id(), Some(store.chats()[0].id));

        store.append(user("second"));
        assert_eq!(store.chats().len(), 1, "second append must not create another chat");
        assert_eq!(store.active_messages().len(), 2);
    }

    #[test]
    fn first_user_message_names_the_chat() {
        let mut store = ChatStore::new();
        store.append(user("Tell me about rust ownership semantics please"));
        assert_eq!(store.chats()[0].name, "Tell me about rust");
    }

    #[test]
    fn naming_keeps_exactly_30_chars_untruncated() {
        // 4 words joining to exactly 30 characters stay as-is
        let mut store = ChatStore::new();
        store.append(user("aaaaaaa bbbbbbb ccccccc dddddd trailing words"));
        assert_eq!(store.chats()[0].name.chars().count(), 30);
        assert_eq!(store.chats()[0].name, "aaaaaaa bbbbbbb ccccccc dddddd");
    }

    #[test]
    fn naming_truncates_31_chars_to_27_plus_ellipsis() {
        let mut store = ChatStore::new();
        store.append(user("aaaaaaa bbbbbbb ccccccc ddddddd trailing"));
        assert_eq!(store.chats()[0].name, "aaaaaaa bbbbbbb ccccccc ddd...");
        assert_eq!(store.chats()[0].name.chars().count(), 30);
    }

    #[test]
    fn assistant_first_message_does_not_name_the_chat() {
        let mut store = ChatStore::new();
        store.append(Message::pending_assistant(Provider::OpenAi));
        assert_eq!(store.chats()[0].name, DEFAULT_CHAT_NAME);
    }

    #[test]
    fn naming_happens_only_once() {
        let mut store = ChatStore::new();
        store.append(user("first message here"));
        let name = store.chats()[0].name.clone();
        store.append(user("a completely different follow-up"));
        assert_eq!(store.chats()[0].name, name);
    }

    #[test]
    fn renamed_chat_is_not_auto_named() {
        let mut store = ChatStore::new();
        let id = store.create_chat();
        store.rename_chat(id, "Budget planning");
        store.append(user("what rhymes with orange"));
        assert_eq!(store.chats()[0].name, "Budget planning");
    }

    #[test]
    fn patch_reaches_messages_in_inactive_chats() {
        let mut store = ChatStore::new();
        store.append(user("in chat A"));
        let pending = Message::pending_assistant(Provider::Anthropic);
        let pending_id = pending.id;
        store.append(pending);
        let chat_a = store.current_chat_id().unwrap();

        // User moves on before the reply lands
        let chat_b = store.create_chat();
        store.append(user("in chat B"));
        let b_updated = store.chats().iter().find(|c| c.id == chat_b).unwrap().updated_at;

        store.patch(pending_id, &MessagePatch::resolved("late reply"));

        let a = store.chats().iter().find(|c| c.id == chat_a).unwrap();
        let patched = a.messages.iter().find(|m| m.id == pending_id).unwrap();
        assert_eq!(patched.content, "late reply");
        assert!(!patched.is_loading);

        // Only the owning chat's updated_at moves
        let b = store.chats().iter().find(|c| c.id == chat_b).unwrap();
        assert_eq!(b.updated_at, b_updated);
        assert_eq!(b.messages.len(), 1);
        assert_eq!(b.messages[0].content, "in chat B");
    }

    #[test]
    fn patch_unknown_id_is_a_no_op() {
        let mut store = ChatStore::new();
        store.append(user("hello"));
        let before = store.clone();
        store.patch(Uuid::new_v4(), &MessagePatch::resolved("ghost"));
        assert_eq!(store, before);
    }

    #[test]
    fn remove_deletes_across_chats() {
        let mut store = ChatStore::new();
        store.append(user("keep"));
        let doomed = user("remove me");
        let doomed_id = doomed.id;
        store.append(doomed);
        store.create_chat();

        store.remove(doomed_id);
        let first = &store.chats()[0];
        assert_eq!(first.messages.len(), 1);
        assert_eq!(first.messages[0].content, "keep");
    }

    #[test]
    fn delete_active_chat_activates_first_remaining() {
        let mut store = ChatStore::new();
        let a = store.create_chat();
        let b = store.create_chat();
        let c = store.create_chat();
        store.set_active(c);

        store.delete_chat(c);
        assert_eq!(store.current_chat_id(), Some(a));

        store.delete_chat(a);
        assert_eq!(store.current_chat_id(), Some(b));

        store.delete_chat(b);
        assert_eq!(store.current_chat_id(), None);
        assert!(store.chats().is_empty());
    }

    #[test]
    fn delete_inactive_chat_keeps_pointer() {
        let mut store = ChatStore::new();
        let a = store.create_chat();
        let b = store.create_chat();
        store.set_active(b);
        store.delete_chat(a);
        assert_eq!(store.current_chat_id(), Some(b));
    }

    #[test]
    fn set_active_unknown_id_yields_empty_view() {
        let mut store = ChatStore::new();
        store.append(user("hello"));
        store.set_active(Uuid::new_v4());
        assert!(store.active_messages().is_empty());
    }

    #[test]
    fn clear_active_empties_in_place() {
        let mut store = ChatStore::new();
        store.append(user("one"));
        store.append(user("two"));
        store.clear_active();
        assert!(store.active_messages().is_empty());
        assert_eq!(store.chats().len(), 1);

        // No active chat: nothing happens
        let mut empty = ChatStore::new();
        empty.clear_active();
        assert!(empty.chats().is_empty());
    }

    #[test]
    fn list_visible_orders_by_recency() {
        let mut store = ChatStore::new();
        let a = store.create_chat();
        let b = store.create_chat();
        let c = store.create_chat();

        store.set_active(a);
        store.append(user("bump a"));

        let visible: Vec<Uuid> = store.list_visible().iter().map(|c| c.id).collect();
        assert_eq!(visible, vec![a, c, b]);
        // Canonical order is untouched
        let canonical: Vec<Uuid> = store.chats().iter().map(|c| c.id).collect();
        assert_eq!(canonical, vec![a, b, c]);
    }
}
