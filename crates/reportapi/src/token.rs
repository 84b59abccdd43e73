// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Injected credential provider for the API token. The client never
//! touches `.env` files or any other concrete secret store; callers wire
//! whatever backing their environment prefers.

use std::sync::RwLock;

pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str);
}

/// Process-local token store, optionally seeded from an existing token.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(token: &str) -> Self {
        MemoryTokenStore {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn set(&self, token: &str) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_returns_token_until_replaced() {
        let store = MemoryTokenStore::seeded("abc");
        assert_eq!(store.get().as_deref(), Some("abc"));
        store.set("def");
        assert_eq!(store.get().as_deref(), Some("def"));
    }

    #[test]
    fn empty_store_has_no_token() {
        assert!(MemoryTokenStore::new().get().is_none());
    }
}
