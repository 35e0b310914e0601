//! A small bounded cache with per-entry expiry.
//!
//! Holds the public menu and settings so that every phone refreshing the
//! order page does not hit the store. Writes through the admin API
//! invalidate the affected entry.

use std::{
  collections::HashMap,
  hash::Hash,
  time::{Duration, Instant},
};

use tokio::sync::Mutex;

struct Entry<V> {
  value:    V,
  inserted: Instant,
}

/// A `capacity`-bounded map whose entries expire `ttl` after insertion.
pub struct TtlCache<K, V> {
  ttl:      Duration,
  capacity: usize,
  entries:  Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
  K: Eq + Hash + Clone,
  V: Clone,
{
  /// A zero capacity is treated as one.
  pub fn new(capacity: usize, ttl: Duration) -> Self {
    Self { ttl, capacity: capacity.max(1), entries: Mutex::new(HashMap::new()) }
  }

  pub async fn get(&self, key: &K) -> Option<V> { self.get_at(key, Instant::now()).await }

  pub async fn insert(&self, key: K, value: V) { self.insert_at(key, value, Instant::now()).await }

  pub async fn invalidate(&self, key: &K) { self.entries.lock().await.remove(key); }

  pub async fn len(&self) -> usize { self.entries.lock().await.len() }

  async fn get_at(&self, key: &K, now: Instant) -> Option<V> {
    let mut entries = self.entries.lock().await;
    let fresh = entries
      .get(key)
      .map(|e| now.saturating_duration_since(e.inserted) < self.ttl)?;
    if fresh {
      entries.get(key).map(|e| e.value.clone())
    } else {
      entries.remove(key);
      None
    }
  }

  async fn insert_at(&self, key: K, value: V, now: Instant) {
    let mut entries = self.entries.lock().await;
    if entries.len() >= self.capacity && !entries.contains_key(&key) {
      let ttl = self.ttl;
      entries.retain(|_, e| now.saturating_duration_since(e.inserted) < ttl);
    }
    if entries.len() >= self.capacity && !entries.contains_key(&key) {
      let oldest = entries
        .iter()
        .min_by_key(|(_, e)| e.inserted)
        .map(|(k, _)| k.clone());
      if let Some(oldest) = oldest {
        entries.remove(&oldest);
      }
    }
    entries.insert(key, Entry { value, inserted: now });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TTL: Duration = Duration::from_secs(30);

  #[tokio::test]
  async fn hit_then_expire() {
    let cache = TtlCache::new(4, TTL);
    let t0 = Instant::now();
    cache.insert_at("menu", 1, t0).await;
    assert_eq!(cache.get_at(&"menu", t0 + Duration::from_secs(29)).await, Some(1));
    assert_eq!(cache.get_at(&"menu", t0 + TTL).await, None);
    assert_eq!(cache.len().await, 0, "expired entries are evicted on read");
  }

  #[tokio::test]
  async fn full_cache_drops_expired_first() {
    let cache = TtlCache::new(2, TTL);
    let t0 = Instant::now();
    cache.insert_at("old", 1, t0).await;
    cache.insert_at("fresh", 2, t0 + Duration::from_secs(20)).await;

    let later = t0 + Duration::from_secs(40);
    cache.insert_at("new", 3, later).await;
    assert_eq!(cache.get_at(&"fresh", later).await, Some(2));
    assert_eq!(cache.get_at(&"new", later).await, Some(3));
    assert_eq!(cache.len().await, 2);
  }

  #[tokio::test]
  async fn full_cache_drops_oldest_when_nothing_expired() {
    let cache = TtlCache::new(2, TTL);
    let t0 = Instant::now();
    cache.insert_at("a", 1, t0).await;
    cache.insert_at("b", 2, t0 + Duration::from_secs(1)).await;
    cache.insert_at("c", 3, t0 + Duration::from_secs(2)).await;

    let now = t0 + Duration::from_secs(3);
    assert_eq!(cache.get_at(&"a", now).await, None);
    assert_eq!(cache.get_at(&"b", now).await, Some(2));
    assert_eq!(cache.get_at(&"c", now).await, Some(3));
  }

  #[tokio::test]
  async fn overwrite_does_not_evict() {
    let cache = TtlCache::new(1, TTL);
    let t0 = Instant::now();
    cache.insert_at("menu", 1, t0).await;
    cache.insert_at("menu", 2, t0).await;
    assert_eq!(cache.get_at(&"menu", t0).await, Some(2));
  }

  #[tokio::test]
  async fn invalidate_removes() {
    let cache = TtlCache::new(2, TTL);
    cache.insert("settings", 1).await;
    cache.invalidate(&"settings").await;
    assert_eq!(cache.get(&"settings").await, None);
  }
}
