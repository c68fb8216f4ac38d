//! TTL key-value store for short-lived session artifacts.
//!
//! Holds refresh tokens, email-verification codes, and live `OAuth2` state
//! entries. Expiry is load-bearing: a key past its TTL must behave exactly
//! like a deleted key.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::AuthError;

/// Externally-synchronized TTL key-value collaborator. Single-key operations
/// are atomic on the store side; the core performs no client-side locking.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AuthError>;
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError>;
    /// Idempotent; deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), AuthError>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process store used by the dev server and the test suite.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AuthError> {
        let mut entries = self.entries.lock().await;
        // Writes double as the pruning pass so the map does not accumulate
        // expired refresh tokens between reads.
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn set_then_get_round_trips() -> Result<()> {
        let store = MemoryStore::new();
        store
            .set("refresh:abc", "token", Duration::from_secs(60))
            .await?;
        assert_eq!(store.get("refresh:abc").await?.as_deref(), Some("token"));
        Ok(())
    }

    #[tokio::test]
    async fn overwrite_replaces_value() -> Result<()> {
        let store = MemoryStore::new();
        store.set("k", "first", Duration::from_secs(60)).await?;
        store.set("k", "second", Duration::from_secs(60)).await?;
        assert_eq!(store.get("k").await?.as_deref(), Some("second"));
        Ok(())
    }

    #[tokio::test]
    async fn expired_entry_reads_as_missing() -> Result<()> {
        let store = MemoryStore::new();
        store.set("k", "v", Duration::from_millis(0)).await?;
        assert_eq!(store.get("k").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_idempotent() -> Result<()> {
        let store = MemoryStore::new();
        store.set("k", "v", Duration::from_secs(60)).await?;
        store.delete("k").await?;
        store.delete("k").await?;
        assert_eq!(store.get("k").await?, None);
        Ok(())
    }
}
