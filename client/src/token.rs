//! Bearer-token source for the transport layer.
//!
//! # Design
//! The token's lifecycle (obtained at login, cleared at logout, persisted
//! between runs) belongs to the application embedding this client, so the
//! client only *reads* through the `TokenStore` trait it is handed at
//! construction. `MemoryTokenStore` is the caller-owned in-process
//! implementation; anything backed by a keychain or a file satisfies the
//! same trait.

use std::sync::RwLock;

/// Read-only view of the current bearer token.
///
/// Called once per request; returning `None` means the request goes out
/// without an `Authorization` header.
pub trait TokenStore: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// In-process token holder. `set`/`clear` are for the owning application;
/// the client itself never writes.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write().unwrap() = None;
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }
}
