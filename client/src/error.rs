//! Error types for the companion API client.
//!
//! # Design
//! Three variants instead of one opaque kind, so callers can tell a
//! rejected request apart from a dead network or a contract mismatch.
//! `Http` displays only its normalized message — that message is the
//! contract the service's consumers key their UI strings off, so it is
//! kept free of status-code decoration.

use std::fmt;

/// Errors returned by every `ApiClient` method.
#[derive(Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status. `message` is the body's
    /// `error` field, or a fallback when the body is not usable JSON.
    Http { status: u16, message: String },

    /// The exchange could not be completed (DNS, refused connection,
    /// broken transfer).
    Network(String),

    /// A 2xx body did not deserialize into the expected type.
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http { message, .. } => write!(f, "{message}"),
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Decode(msg) => write!(f, "decode failed: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}
