// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Credential persistence contract
//!
//! The account layer owns the actual storage format; connections only read
//! and write string values under the keys in [`keys`].

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::Result;

/// Keys used when persisting connection data
pub mod keys {
    pub const ORIGIN_URL: &str = "origin_url";
    pub const SSL_MODE: &str = "ssl_mode";
    pub const USE_LEGACY_HTTP_PROTOCOL: &str = "use_legacy_http_protocol";
    pub const OAUTH_CLIENT_KEY: &str = "oauth_client_key";
    pub const OAUTH_CLIENT_SECRET: &str = "oauth_client_secret";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const USER_TOKEN: &str = "user_token";
    pub const USER_SECRET: &str = "user_secret";
}

/// Key/value store for account credentials and connection settings
pub trait CredentialStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, returning true if the stored value changed
    fn put(&self, key: &str, value: &str) -> bool;

    /// Remove a value, returning true if something was removed
    fn remove(&self, key: &str) -> bool;
}

/// Write `value` when present and non-empty, otherwise remove the key
pub fn put_or_remove(store: &dyn CredentialStore, key: &str, value: Option<&str>) -> bool {
    match value {
        Some(v) if !v.is_empty() => store.put(key, v),
        _ => store.remove(key),
    }
}

/// In-memory credential store, cheap to clone and share
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot as JSON, keys sorted
    pub fn to_json(&self) -> Result<String> {
        let sorted: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        Ok(serde_json::to_string(&sorted)?)
    }

    /// Restore from a snapshot produced by [`to_json`](Self::to_json)
    pub fn from_json(json: &str) -> Result<Self> {
        let map: BTreeMap<String, String> = serde_json::from_str(json)?;
        let store = Self::new();
        for (key, value) in map {
            store.entries.insert(key, value);
        }
        Ok(store)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn put(&self, key: &str, value: &str) -> bool {
        match self.entries.insert(key.to_string(), value.to_string()) {
            Some(previous) => previous != value,
            None => true,
        }
    }

    fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_reports_changes() {
        let store = MemoryCredentialStore::new();
        assert!(store.put(keys::USERNAME, "alice"));
        assert!(!store.put(keys::USERNAME, "alice"));
        assert!(store.put(keys::USERNAME, "bob"));
        assert_eq!(store.get(keys::USERNAME).as_deref(), Some("bob"));
    }

    #[test]
    fn test_put_or_remove() {
        let store = MemoryCredentialStore::new();
        assert!(put_or_remove(&store, keys::PASSWORD, Some("secret")));
        assert!(put_or_remove(&store, keys::PASSWORD, Some("")));
        assert!(store.get(keys::PASSWORD).is_none());
        assert!(!put_or_remove(&store, keys::PASSWORD, None));
    }

    #[test]
    fn test_json_snapshot() {
        let store = MemoryCredentialStore::new();
        store.put(keys::ORIGIN_URL, "https://example.social/");
        store.put(keys::SSL_MODE, "secure");

        let json = store.to_json().unwrap();
        let restored = MemoryCredentialStore::from_json(&json).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get(keys::SSL_MODE).as_deref(), Some("secure"));
    }
}
