//! In-memory Counter Store
//!
//! Process-local counters for tests and single-node development. Behaves
//! like the shared stores for one process, but counts are not shared
//! across replicas.

use platform::rate_limit::{CounterStore, CounterStoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct Counter {
    value: i64,
    expires_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    counters: Arc<Mutex<HashMap<String, Counter>>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired counters, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        match self.counters.lock() {
            Ok(mut counters) => {
                let before = counters.len();
                counters.retain(|_, counter| counter.expires_at > now);
                before - counters.len()
            }
            Err(_) => 0,
        }
    }

    /// Live counter value, if any
    pub fn get(&self, key: &str) -> Option<i64> {
        let now = Instant::now();
        let counters = self.counters.lock().ok()?;
        counters
            .get(key)
            .filter(|counter| counter.expires_at > now)
            .map(|counter| counter.value)
    }
}

impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, CounterStoreError> {
        let now = Instant::now();
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| CounterStoreError::Unavailable("counter map lock poisoned".into()))?;

        let counter = counters.entry(key.to_string()).or_insert(Counter {
            value: 0,
            expires_at: now + ttl,
        });
        if counter.expires_at <= now {
            *counter = Counter {
                value: 0,
                expires_at: now + ttl,
            };
        }
        counter.value += 1;

        Ok(counter.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_increment_counts_and_expires() {
        let store = MemoryCounterStore::new();
        let ttl = Duration::from_secs(60);

        assert_eq!(store.increment("k", ttl).await.unwrap(), 1);
        assert_eq!(store.increment("k", ttl).await.unwrap(), 2);
        assert_eq!(store.get("k"), Some(2));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.get("k"), None);
        assert_eq!(store.increment("k", ttl).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_set_on_creation_only() {
        let store = MemoryCounterStore::new();
        let ttl = Duration::from_secs(10);

        store.increment("k", ttl).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        store.increment("k", ttl).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(store.get("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemoryCounterStore::new();
        store.increment("short", Duration::from_secs(1)).await.unwrap();
        store.increment("long", Duration::from_secs(100)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.get("long"), Some(1));
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemoryCounterStore::new();
        let ttl = Duration::from_secs(60);
        tokio_test::block_on(async {
            store.increment("a", ttl).await.unwrap();
            store.increment("a", ttl).await.unwrap();
            assert_eq!(store.increment("b", ttl).await.unwrap(), 1);
        });
    }
}
