//! Ephemeral coordination store for cross-request counters and caches.
//!
//! Holds the login/MFA attempt counters, the cached MFA challenge codes, and
//! the revoked-token registry. The trait makes the atomicity contract
//! explicit: `increment_with_expiry` is a single atomic step (no
//! read-then-write gap), and the TTL is applied only by the write that
//! creates the key.
//!
//! The in-memory implementation covers a single-node deployment; a networked
//! backend slots in behind the same trait.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Atomically increment the counter at `key` and return the new count.
    /// `ttl` is applied only when this increment creates the key; later
    /// increments never extend the window.
    async fn increment_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64>;

    /// Read a live value. Expired keys read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value with a fresh TTL, replacing any previous entry.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Single-process store with TTL semantics. Every operation runs under one
/// lock, which is what makes `increment_with_expiry` atomic.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn increment_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.live(now));

        let count = match entries.get_mut(key) {
            Some(entry) => {
                let count = entry.value.parse::<u64>().unwrap_or(0) + 1;
                entry.value = count.to_string();
                count
            }
            None => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: "1".to_string(),
                        expires_at: now + ttl,
                    },
                );
                1
            }
        };

        Ok(count)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let entries = self.entries.lock().await;

        Ok(entries
            .get(key)
            .filter(|entry| entry.live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.live(now));

        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test]
    async fn set_get_delete_round_trip() {
        let store = MemoryStore::new();

        store
            .set_with_expiry("mfa:login:1", "042", Duration::from_secs(120))
            .await
            .unwrap();
        assert_eq!(
            store.get("mfa:login:1").await.unwrap(),
            Some("042".to_string())
        );

        store.delete("mfa:login:1").await.unwrap();
        assert_eq!(store.get("mfa:login:1").await.unwrap(), None);

        // deleting again is a no-op
        store.delete("mfa:login:1").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn values_expire_after_ttl() {
        let store = MemoryStore::new();

        store
            .set_with_expiry("k", "v", Duration::from_secs(120))
            .await
            .unwrap();

        advance(Duration::from_secs(119)).await;
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));

        advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn increment_counts_up() {
        let store = MemoryStore::new();

        for expected in 1..=3 {
            let count = store
                .increment_with_expiry("attempts", Duration::from_secs(300))
                .await
                .unwrap();
            assert_eq!(count, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn increment_ttl_set_only_on_first_write() {
        let store = MemoryStore::new();

        store
            .increment_with_expiry("attempts", Duration::from_secs(300))
            .await
            .unwrap();

        advance(Duration::from_secs(200)).await;
        // This increment must not extend the original 300s window.
        store
            .increment_with_expiry("attempts", Duration::from_secs(300))
            .await
            .unwrap();

        advance(Duration::from_secs(101)).await;
        assert_eq!(store.get("attempts").await.unwrap(), None);

        // A fresh increment after expiry starts over at 1.
        let count = store
            .increment_with_expiry("attempts", Duration::from_secs(300))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn set_replaces_value_and_ttl() {
        let store = MemoryStore::new();

        store
            .set_with_expiry("k", "old", Duration::from_secs(10))
            .await
            .unwrap();
        advance(Duration::from_secs(8)).await;

        store
            .set_with_expiry("k", "new", Duration::from_secs(10))
            .await
            .unwrap();
        advance(Duration::from_secs(8)).await;

        assert_eq!(store.get("k").await.unwrap(), Some("new".to_string()));
    }
}
