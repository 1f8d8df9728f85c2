//! Full client lifecycle against the live mock server.
//!
//! Starts the workspace mock server on an OS-assigned port and drives it
//! through the real reqwest transport: account creation, onboarding, chat
//! and message flows, plus the exact error messages the client is expected
//! to surface.

use std::sync::Arc;

use companion_client::{ApiClient, ApiError, MemoryTokenStore};
use serde_json::json;

async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        mock_server::run(listener).await.unwrap();
    });
    format!("http://{addr}")
}

fn client_for(base_url: &str) -> (ApiClient, Arc<MemoryTokenStore>) {
    let tokens = Arc::new(MemoryTokenStore::new());
    let client = ApiClient::new(base_url, tokens.clone());
    (client, tokens)
}

#[tokio::test]
async fn account_and_chat_lifecycle() {
    let base_url = spawn_server().await;
    let (client, tokens) = client_for(&base_url);

    // Register and adopt the issued token.
    let auth = client
        .register("Ana", "ana@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(auth.user.name, "Ana");
    assert!(!auth.user.onboarding_completed);
    tokens.set(auth.token.clone());

    let me = client.get_current_user().await.unwrap();
    assert_eq!(me.user.id, auth.user.id);
    assert_eq!(me.user.email, "ana@example.com");

    // Onboarding flag is monotonic: false, complete, then true.
    assert!(!client.get_onboarding_status().await.unwrap().completed);
    let ack = client
        .complete_onboarding(json!({ "goals": ["practice"], "tone": "casual" }))
        .await
        .unwrap();
    assert_eq!(ack.message, "onboarding completed");
    assert!(client.get_onboarding_status().await.unwrap().completed);

    let ack = client
        .update_user_preferences(json!({ "theme": "dark" }))
        .await
        .unwrap();
    assert_eq!(ack.message, "preferences updated");

    // Chat with an opaque partner descriptor, relayed verbatim.
    let created = client
        .create_chat(json!({ "persona": "Luna", "traits": ["warm"] }))
        .await
        .unwrap();
    assert!(created.chat.is_active);
    assert_eq!(created.chat.partner["persona"], "Luna");
    let chat_id = created.chat.id.clone();

    let chats = client.get_chats().await.unwrap();
    assert_eq!(chats.chats.len(), 1);
    assert_eq!(chats.chats[0].id, chat_id);

    let fetched = client.get_chat(&chat_id).await.unwrap();
    assert_eq!(fetched.chat, created.chat);

    // Messages come back in send order.
    let first = client.send_message(&chat_id, "user", "hola").await.unwrap();
    assert_eq!(first.message.chat_id, chat_id);
    assert_eq!(first.message.content, "hola");
    client
        .send_message(&chat_id, "partner", "¡hola!")
        .await
        .unwrap();

    let messages = client.get_messages(&chat_id).await.unwrap();
    assert_eq!(messages.messages.len(), 2);
    assert_eq!(messages.messages[0].sender, "user");
    assert_eq!(messages.messages[1].sender, "partner");

    let ack = client.test_new_character(&chat_id).await.unwrap();
    assert_eq!(ack.message, "test message queued");

    // Deactivation is one-way.
    let ack = client.deactivate_chat(&chat_id).await.unwrap();
    assert_eq!(ack.message, "chat deactivated");
    assert!(!client.get_chat(&chat_id).await.unwrap().chat.is_active);
}

#[tokio::test]
async fn login_returns_fresh_token_for_known_account() {
    let base_url = spawn_server().await;
    let (client, tokens) = client_for(&base_url);

    let registered = client
        .register("Ana", "ana@example.com", "secret")
        .await
        .unwrap();

    let auth = client.login("ana@example.com", "secret").await.unwrap();
    assert_eq!(auth.user.id, registered.user.id);
    assert_ne!(auth.token, registered.token);

    tokens.set(auth.token.clone());
    assert_eq!(client.get_current_user().await.unwrap().user.id, auth.user.id);
}

#[tokio::test]
async fn login_failure_surfaces_exact_server_message() {
    let base_url = spawn_server().await;
    let (client, _tokens) = client_for(&base_url);

    client
        .register("Ana", "ana@example.com", "secret")
        .await
        .unwrap();

    let err = client.login("ana@example.com", "wrong").await.unwrap_err();
    match err {
        ApiError::Http { status, ref message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "invalid credentials");
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let base_url = spawn_server().await;
    let (client, _tokens) = client_for(&base_url);

    client
        .register("Ana", "ana@example.com", "secret")
        .await
        .unwrap();
    let err = client
        .register("Ana", "ana@example.com", "secret")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 400, .. }));
    assert_eq!(err.to_string(), "email already registered");
}

#[tokio::test]
async fn token_presence_controls_authorization_header() {
    let base_url = spawn_server().await;
    let (client, tokens) = client_for(&base_url);

    // No token in the store: the request goes out without an
    // Authorization header, which the server reports distinctly.
    let err = client.get_chats().await.unwrap_err();
    assert_eq!(err.to_string(), "no token provided");

    // A stored token is attached, even when the server does not know it.
    tokens.set("bogus");
    let err = client.get_chats().await.unwrap_err();
    assert_eq!(err.to_string(), "invalid token");

    // Clearing the store drops the header again.
    tokens.clear();
    let err = client.get_chats().await.unwrap_err();
    assert_eq!(err.to_string(), "no token provided");
}

#[tokio::test]
async fn unknown_chat_id_is_a_404_with_message() {
    let base_url = spawn_server().await;
    let (client, tokens) = client_for(&base_url);

    let auth = client
        .register("Ana", "ana@example.com", "secret")
        .await
        .unwrap();
    tokens.set(auth.token.clone());

    let err = client.get_chat("missing").await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 404, .. }));
    assert_eq!(err.to_string(), "chat not found");

    let err = client.send_message("missing", "user", "hi").await.unwrap_err();
    assert_eq!(err.to_string(), "chat not found");
}

#[tokio::test]
async fn public_auth_flows_acknowledge_without_token() {
    let base_url = spawn_server().await;
    let (client, _tokens) = client_for(&base_url);

    let ack = client.verify_email("sometoken").await.unwrap();
    assert_eq!(ack.message, "email verified");

    let ack = client.forgot_password("ana@example.com").await.unwrap();
    assert_eq!(ack.message, "reset email sent");

    let ack = client.reset_password("sometoken", "newpw").await.unwrap();
    assert_eq!(ack.message, "password updated");

    let ack = client.resend_verification("ana@example.com").await.unwrap();
    assert_eq!(ack.message, "verification email sent");
}

#[tokio::test]
async fn concurrent_calls_do_not_cross_contaminate() {
    let base_url = spawn_server().await;
    let (client, tokens) = client_for(&base_url);

    let auth = client
        .register("Ana", "ana@example.com", "secret")
        .await
        .unwrap();
    tokens.set(auth.token.clone());

    let chat = client.create_chat(json!({ "persona": "Luna" })).await.unwrap();
    let chat_id = chat.chat.id.clone();
    client.send_message(&chat_id, "user", "hola").await.unwrap();

    let (chats, messages) = tokio::join!(client.get_chats(), client.get_messages(&chat_id));
    let chats = chats.unwrap();
    let messages = messages.unwrap();
    assert_eq!(chats.chats.len(), 1);
    assert_eq!(chats.chats[0].id, chat_id);
    assert_eq!(messages.messages.len(), 1);
    assert_eq!(messages.messages[0].content, "hola");
}
