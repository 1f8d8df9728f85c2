//! Authenticated request pipeline and the typed endpoint catalog.
//!
//! # Design
//! `ApiClient` holds a shared `reqwest::Client`, an immutable base URL,
//! and the injected `TokenStore`; it carries no other state, so one
//! instance can be cloned across tasks freely. Every public endpoint
//! method is a pass-through: it fixes the method, path, and body for a
//! single call to `request`, and declares the exact response type it
//! expects back. All normalization — default headers, bearer injection,
//! error-body unwrapping — lives in the one transport function.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::token::TokenStore;
use crate::types::{
    Ack, AuthResponse, ChatResponse, ChatsResponse, MessageResponse, MessagesResponse,
    OnboardingStatus, UserResponse,
};

/// Environment variable consulted by [`ApiClient::from_env`].
pub const BASE_URL_ENV: &str = "COMPANION_API_URL";

/// Base URL used when [`BASE_URL_ENV`] is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000/api";

/// Message substituted when an error response carries no parseable body.
const FALLBACK_ERROR: &str = "Error de conexión";

/// Async client for the companion chat service.
///
/// Stateless apart from its immutable configuration: the token is read
/// from the injected [`TokenStore`] on every request, so the client always
/// reflects the current authentication state without callers re-supplying
/// it.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Build a client from `COMPANION_API_URL`, falling back to
    /// [`DEFAULT_BASE_URL`] when unset.
    pub fn from_env(tokens: Arc<dyn TokenStore>) -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(&base_url, tokens)
    }

    // -----------------------------------------------------------------------
    // Transport primitive
    // -----------------------------------------------------------------------

    /// Perform one request against `base_url + path`.
    ///
    /// Headers start from `Content-Type: application/json`, gain
    /// `Authorization: Bearer <token>` when the store holds a token, and
    /// are then overlaid with `headers` — caller entries win on conflict,
    /// `Authorization` included. A non-2xx response fails with
    /// [`ApiError::Http`] carrying the body's `error` field (or a fallback
    /// message); a 2xx body is deserialized into `T` with no further
    /// validation.
    pub async fn request_with_headers<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let merged = merge_headers(self.tokens.token().as_deref(), headers)?;

        debug!(%method, %url, "issuing request");
        let mut request = self.http.request(method, &url).headers(merged);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            let err = http_error(status, &text);
            debug!(status, %err, "request rejected");
            return Err(err);
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        self.request_with_headers(method, path, body, HeaderMap::new())
            .await
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.request(
            Method::POST,
            "/auth/register",
            Some(json!({ "nombre": name, "email": email, "password": password })),
        )
        .await
    }

    pub async fn verify_email(&self, token: &str) -> Result<Ack, ApiError> {
        self.request(Method::GET, &format!("/auth/verify/{token}"), None)
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<Ack, ApiError> {
        self.request(
            Method::POST,
            "/auth/forgot-password",
            Some(json!({ "email": email })),
        )
        .await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<Ack, ApiError> {
        self.request(
            Method::POST,
            "/auth/reset-password",
            Some(json!({ "token": token, "newPassword": new_password })),
        )
        .await
    }

    pub async fn resend_verification(&self, email: &str) -> Result<Ack, ApiError> {
        self.request(
            Method::POST,
            "/auth/resend-verification",
            Some(json!({ "email": email })),
        )
        .await
    }

    // -----------------------------------------------------------------------
    // User
    // -----------------------------------------------------------------------

    pub async fn get_current_user(&self) -> Result<UserResponse, ApiError> {
        self.request(Method::GET, "/users/me", None).await
    }

    /// `preferences` is relayed verbatim; its shape is a contract between
    /// the embedding application and the service.
    pub async fn update_user_preferences(&self, preferences: Value) -> Result<Ack, ApiError> {
        self.request(Method::PATCH, "/users/preferences", Some(preferences))
            .await
    }

    // -----------------------------------------------------------------------
    // Onboarding
    // -----------------------------------------------------------------------

    /// `data` is relayed verbatim, like `update_user_preferences`.
    pub async fn complete_onboarding(&self, data: Value) -> Result<Ack, ApiError> {
        self.request(Method::POST, "/onboarding/complete", Some(data))
            .await
    }

    pub async fn get_onboarding_status(&self) -> Result<OnboardingStatus, ApiError> {
        self.request(Method::GET, "/onboarding/status", None).await
    }

    // -----------------------------------------------------------------------
    // Chats
    // -----------------------------------------------------------------------

    pub async fn get_chats(&self) -> Result<ChatsResponse, ApiError> {
        self.request(Method::GET, "/chats", None).await
    }

    pub async fn get_chat(&self, chat_id: &str) -> Result<ChatResponse, ApiError> {
        self.request(Method::GET, &format!("/chats/{chat_id}"), None)
            .await
    }

    pub async fn create_chat(&self, partner: Value) -> Result<ChatResponse, ApiError> {
        self.request(Method::POST, "/chats", Some(json!({ "partner": partner })))
            .await
    }

    pub async fn deactivate_chat(&self, chat_id: &str) -> Result<Ack, ApiError> {
        self.request(Method::PATCH, &format!("/chats/{chat_id}/deactivate"), None)
            .await
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    pub async fn get_messages(&self, chat_id: &str) -> Result<MessagesResponse, ApiError> {
        self.request(Method::GET, &format!("/messages/{chat_id}"), None)
            .await
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        sender: &str,
        content: &str,
    ) -> Result<MessageResponse, ApiError> {
        self.request(
            Method::POST,
            &format!("/messages/{chat_id}"),
            Some(json!({ "sender": sender, "content": content })),
        )
        .await
    }

    pub async fn test_new_character(&self, chat_id: &str) -> Result<Ack, ApiError> {
        self.request(
            Method::POST,
            &format!("/messages/test-new-character/{chat_id}"),
            None,
        )
        .await
    }
}

/// Assemble the outgoing header set: JSON content type, then the bearer
/// token when present, then caller overrides (last write wins).
fn merge_headers(token: Option<&str>, overrides: HeaderMap) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ApiError::Network(format!("invalid bearer token: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }
    headers.extend(overrides);
    Ok(headers)
}

/// Normalize a non-2xx response into [`ApiError::Http`].
///
/// The message is the body's `error` string when one is present, the
/// fixed fallback when the body is not valid JSON, and `HTTP <status>`
/// when the body parses but carries no usable `error` field.
fn http_error(status: u16, body: &str) -> ApiError {
    let message = match serde_json::from_str::<Value>(body) {
        Ok(parsed) => match parsed.get("error").and_then(Value::as_str) {
            Some(msg) if !msg.is_empty() => msg.to_string(),
            _ => format!("HTTP {status}"),
        },
        Err(_) => FALLBACK_ERROR.to_string(),
    };
    ApiError::Http { status, message }
}
