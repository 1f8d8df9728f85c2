//! Async API client for the companion chat service.
//!
//! # Overview
//! One typed method per remote operation (auth, user profile, onboarding,
//! chats, messaging), all funneled through a single transport primitive
//! that injects the bearer token, merges headers, and normalizes HTTP and
//! decode failures into [`ApiError`].
//!
//! # Design
//! - `ApiClient` is stateless beyond its base URL; the token is read from
//!   an injected [`TokenStore`] on every request, so a single cloned
//!   instance is safe to share across tasks.
//! - Response bodies are returned exactly as the service shapes them
//!   (envelope structs in [`types`]); nothing is unwrapped or cached.
//! - Payloads the client merely relays stay `serde_json::Value`.
//! - DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod error;
pub mod token;
pub mod types;

pub use client::{ApiClient, BASE_URL_ENV, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use token::{MemoryTokenStore, TokenStore};
pub use types::{
    Ack, AuthResponse, Chat, ChatResponse, ChatsResponse, Message, MessageResponse,
    MessagesResponse, OnboardingStatus, User, UserResponse,
};
