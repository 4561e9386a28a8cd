//! End-to-end send flow: stores plus gateway against a mock server

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use timi_chat::{ChatStore, Gateway, Provider, Role, SendError, Session, SettingsStore};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn configured_settings(provider: Provider, key: &str) -> SettingsStore {
    let mut settings = SettingsStore::new();
    settings.update_provider(provider);
    settings.update_api_key(provider, key);
    settings
}

fn session_against(server: &MockServer, settings: SettingsStore) -> Session {
    Session::with_gateway(
        ChatStore::new(),
        settings,
        Gateway::new().with_base_url(server.uri()),
    )
}

#[tokio::test]
async fn send_resolves_the_pending_assistant_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system"},
                {"role": "user", "content": "hello there"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "hi!"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session =
        session_against(&server, configured_settings(Provider::OpenAi, "sk-test"));
    let assistant_id = session.send("hello there").await.unwrap();

    let chats = session.chats();
    let chats = chats.lock();
    let messages = chats.active_messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "hello there");
    assert_eq!(messages[1].id, assistant_id);
    assert_eq!(messages[1].content, "hi!");
    assert!(!messages[1].is_loading);
    assert!(!messages[1].is_error);
    // Implicit chat creation named the chat from the first user message
    assert_eq!(chats.chats()[0].name, "hello there");
}

#[tokio::test]
async fn gateway_failure_becomes_an_error_message_in_the_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "invalid key"}
            })),
        )
        .mount(&server)
        .await;

    let session =
        session_against(&server, configured_settings(Provider::Anthropic, "sk-bad"));
    let assistant_id = session.send("hello").await.unwrap();

    let chats = session.chats();
    let chats = chats.lock();
    let assistant = chats
        .active_messages()
        .iter()
        .find(|m| m.id == assistant_id)
        .unwrap();
    assert_eq!(assistant.content, "Error: invalid key");
    assert!(assistant.is_error);
    assert!(!assistant.is_loading);
}

#[tokio::test]
async fn missing_api_key_halts_before_any_append_or_request() {
    let session = Session::new(ChatStore::new(), SettingsStore::new());
    let err = session.send("hello").await.unwrap_err();
    assert!(matches!(err, SendError::MissingApiKey("OpenAI")));

    let chats = session.chats();
    let chats = chats.lock();
    assert!(chats.chats().is_empty(), "nothing may be appended");
}

#[tokio::test]
async fn late_reply_lands_in_the_chat_that_sent_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(json!({
                    "choices": [{"message": {"content": "slow reply"}}]
                })),
        )
        .mount(&server)
        .await;

    let session = Arc::new(
        session_against(&server, configured_settings(Provider::OpenAi, "sk-test")),
    );

    let sender = Arc::clone(&session);
    let handle = tokio::spawn(async move { sender.send("first chat question").await });

    // Switch to a fresh chat while the call is still in flight
    tokio::time::sleep(Duration::from_millis(100)).await;
    let first_chat = {
        let chats = session.chats();
        let mut chats = chats.lock();
        let first = chats.current_chat_id().unwrap();
        chats.create_chat();
        first
    };

    let assistant_id = handle.await.unwrap().unwrap();

    let chats = session.chats();
    let chats = chats.lock();
    let first = chats.chats().iter().find(|c| c.id == first_chat).unwrap();
    let assistant = first.messages.iter().find(|m| m.id == assistant_id).unwrap();
    assert_eq!(assistant.content, "slow reply");
    assert!(!assistant.is_loading);
    // The now-active chat stayed empty
    assert!(chats.active_messages().is_empty());
}

#[tokio::test]
async fn attachments_are_folded_into_the_user_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "looks like a config file"}}]
        })))
        .mount(&server)
        .await;

    let session =
        session_against(&server, configured_settings(Provider::OpenAi, "sk-test"));
    let file = timi_chat::ProcessedFile::text_excerpt("app.toml", "text/plain", 9, "key = 1");
    session
        .send_with_attachments("what is this", std::slice::from_ref(&file))
        .await
        .unwrap();

    let chats = session.chats();
    let chats = chats.lock();
    let user = &chats.active_messages()[0];
    assert!(user.content.starts_with("what is this\n\n[Text File: app.toml]"));
    assert!(user.content.contains("key = 1"));
}
