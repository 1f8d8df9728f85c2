//! Wire types for the companion chat API.
//!
//! # Design
//! These types mirror the remote service's JSON contract and are defined
//! independently of the mock-server crate; integration tests catch schema
//! drift. The service speaks camelCase (and names the display-name field
//! `nombre`), so every struct carries the serde renames needed to keep the
//! Rust side idiomatic. Payloads the client merely relays — the chat
//! partner descriptor, preference and onboarding objects — stay opaque
//! `serde_json::Value`s rather than `any`-style loose typing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An account as the service reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Display name; `nombre` on the wire.
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    /// One-way flag: flips false → true when onboarding completes.
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A conversation with one partner persona.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    /// Service-defined partner descriptor; relayed verbatim, never
    /// interpreted by the client.
    pub partner: Value,
    /// One-way flag: deactivation is permanent.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single message inside a chat. `sender` is a free-form string — the
/// user or a counterpart persona, at the service's discretion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `/auth/login` and `/auth/register` (identical shapes).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Acknowledgement body for operations that return no data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ack {
    pub message: String,
}

/// Body of `/users/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub user: User,
}

/// Body of `/onboarding/status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardingStatus {
    pub completed: bool,
}

/// Body of `GET /chats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatsResponse {
    pub chats: Vec<Chat>,
}

/// Body of `GET /chats/{id}` and `POST /chats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub chat: Chat,
}

/// Body of `GET /messages/{chatId}`. Order is the service's send order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

/// Body of `POST /messages/{chatId}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: Message,
}
