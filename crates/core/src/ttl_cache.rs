//! In-process key/value cache with per-entry time-to-live.
//!
//! Expiry is lazy: an expired entry is reported as a miss (and dropped) on
//! the next access. No background sweeper exists.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

struct Slot<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Slot<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Thread-safe TTL cache. Cloned values are handed out, so `V` is usually an
/// `Arc` or another cheaply cloneable handle.
pub struct TtlCache<K, V> {
    slots: RwLock<HashMap<K, Slot<V>>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the live value for `key`, if any.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        {
            let slots = self.slots.read().await;
            match slots.get(key) {
                Some(slot) if slot.is_live(now) => return Some(slot.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop it so the map does not grow with dead entries.
        let mut slots = self.slots.write().await;
        if slots.get(key).is_some_and(|slot| !slot.is_live(now)) {
            slots.remove(key);
        }
        None
    }

    /// Insert or replace `key`, expiring `ttl` from now.
    pub async fn insert(&self, key: K, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.slots
            .write()
            .await
            .insert(key, Slot { value, expires_at });
    }

    /// Mutate the live value for `key` in place, keeping its expiry.
    ///
    /// Returns `false` when there is no live entry.
    pub async fn update<F>(&self, key: &K, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        match slots.get_mut(key) {
            Some(slot) if slot.is_live(now) => {
                f(&mut slot.value);
                true
            }
            _ => false,
        }
    }

    /// Remove `key`. Returns `true` if an entry (live or expired) was present.
    pub async fn remove(&self, key: &K) -> bool {
        self.slots.write().await.remove(key).is_some()
    }

    /// Number of stored entries, including expired ones not yet dropped.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test(start_paused = true)]
    async fn entry_is_served_until_ttl_elapses() {
        let cache = TtlCache::new();
        cache.insert("k", 1, HOUR).await;

        tokio::time::advance(HOUR - Duration::from_secs(1)).await;
        assert_eq!(cache.get(&"k").await, Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&"k").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn update_keeps_original_expiry() {
        let cache = TtlCache::new();
        cache.insert("k", 1, HOUR).await;

        tokio::time::advance(HOUR / 2).await;
        assert!(cache.update(&"k", |v| *v += 1).await);
        assert_eq!(cache.get(&"k").await, Some(2));

        tokio::time::advance(HOUR / 2).await;
        assert_eq!(cache.get(&"k").await, None);
    }

    #[tokio::test]
    async fn update_of_missing_key_is_noop() {
        let cache: TtlCache<&str, i32> = TtlCache::new();
        assert!(!cache.update(&"missing", |v| *v = 9).await);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let cache = TtlCache::new();
        cache.insert(1, "a", HOUR).await;
        assert!(cache.remove(&1).await);
        assert!(!cache.remove(&1).await);
        assert_eq!(cache.get(&1).await, None);
    }
}
