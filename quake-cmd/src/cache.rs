//! Read-through cache with a per-key single-flight guarantee.
//!
//! Each key owns an async mutex. The request holding it runs the refresh;
//! requests arriving meanwhile queue on the mutex and reuse whatever the
//! in-flight refresh produced, so the upstream sees at most one fetch per key.
//! Slots are never removed: invalidation only marks the stored value stale,
//! so an explicit refresh still queues behind a fetch already running.

use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};
use tokio::time::Instant;

/// Values decide for themselves whether they may be served for the full TTL.
pub trait Cacheable {
    fn is_cacheable(&self) -> bool;
}

impl<T: Cacheable> Cacheable for Arc<T> {
    fn is_cacheable(&self) -> bool {
        self.as_ref().is_cacheable()
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
    /// Invalidation generation observed when the refresh started.
    generation: u64,
}

struct Slot<V> {
    /// Number of refreshes that have completed for this key.
    completed: AtomicU64,
    /// Bumped by every invalidation.
    invalidated: AtomicU64,
    entry: tokio::sync::Mutex<Option<Entry<V>>>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Slot {
            completed: AtomicU64::new(0),
            invalidated: AtomicU64::new(0),
            entry: tokio::sync::Mutex::new(None),
        }
    }
}

pub struct ViewCache<K, V> {
    ttl: Duration,
    slots: Mutex<HashMap<K, Arc<Slot<V>>>>,
}

impl<K, V> ViewCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Cacheable,
{
    pub fn new(ttl: Duration) -> Self {
        ViewCache {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self, key: &K) -> Arc<Slot<V>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.clone()).or_default().clone()
    }

    /// Return the cached value for `key`, running `refresh` when it is missing,
    /// stale or invalidated.
    ///
    /// A request that had to wait for another request's refresh reuses that
    /// result, even when it is not cacheable or was invalidated meanwhile. The
    /// next request after that refreshes again.
    pub async fn get_or_refresh<F, Fut>(&self, key: &K, refresh: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let slot = self.slot(key);
        let seen = slot.completed.load(Ordering::Acquire);
        let mut entry = slot.entry.lock().await;
        if let Some(current) = entry.as_ref() {
            let joined_in_flight = slot.completed.load(Ordering::Acquire) > seen;
            let fresh = current.value.is_cacheable()
                && current.generation == slot.invalidated.load(Ordering::Acquire)
                && current.stored_at.elapsed() < self.ttl;
            if joined_in_flight || fresh {
                return current.value.clone();
            }
        }
        let generation = slot.invalidated.load(Ordering::Acquire);
        let value = refresh().await;
        *entry = Some(Entry {
            value: value.clone(),
            stored_at: Instant::now(),
            generation,
        });
        slot.completed.fetch_add(1, Ordering::Release);
        value
    }

    /// Mark the value for `key` stale; the next request that is not already
    /// waiting on a refresh fetches again.
    pub fn invalidate(&self, key: &K) {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get(key) {
            slot.invalidated.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub fn clear(&self) {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        for slot in slots.values() {
            slot.invalidated.fetch_add(1, Ordering::AcqRel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::task::JoinSet;

    #[derive(Debug, Clone, PartialEq)]
    struct Value {
        generation: usize,
        complete: bool,
    }

    impl Cacheable for Value {
        fn is_cacheable(&self) -> bool {
            self.complete
        }
    }

    async fn fetch(calls: &AtomicUsize, complete: bool) -> Value {
        let generation = calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(50)).await;
        Value {
            generation,
            complete,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_value_is_reused_until_ttl() {
        let cache: ViewCache<&str, Value> = ViewCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_refresh(&"30d", || fetch(&calls, true)).await;
        let second = cache.get_or_refresh(&"30d", || fetch(&calls, true)).await;
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        let third = cache.get_or_refresh(&"30d", || fetch(&calls, true)).await;
        assert_eq!(third.generation, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let cache: ViewCache<&str, Value> = ViewCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        cache.get_or_refresh(&"30d", || fetch(&calls, true)).await;
        cache.get_or_refresh(&"5y", || fetch(&calls, true)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uncacheable_value_is_not_kept() {
        let cache: ViewCache<&str, Value> = ViewCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        cache.get_or_refresh(&"30d", || fetch(&calls, false)).await;
        let again = cache.get_or_refresh(&"30d", || fetch(&calls, true)).await;
        assert_eq!(again.generation, 2);
        assert!(again.complete);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refresh() {
        let cache: ViewCache<&str, Value> = ViewCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        cache.get_or_refresh(&"30d", || fetch(&calls, true)).await;
        cache.invalidate(&"30d");
        cache.get_or_refresh(&"30d", || fetch(&calls, true)).await;
        cache.clear();
        cache.get_or_refresh(&"30d", || fetch(&calls, true)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let cache: Arc<ViewCache<&str, Value>> = Arc::new(ViewCache::new(Duration::ZERO));
        let calls = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            tasks.spawn(async move {
                cache
                    .get_or_refresh(&"30d", || async move { fetch(&calls, false).await })
                    .await
            });
        }
        let mut generations = Vec::new();
        while let Some(result) = tasks.join_next().await {
            generations.push(result.unwrap().generation);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(generations.iter().all(|g| *g == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_during_refresh_keeps_one_fetch_in_flight() {
        let cache: Arc<ViewCache<&str, Value>> =
            Arc::new(ViewCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));

        // Seed the slot so every task finds an existing entry to invalidate.
        cache.get_or_refresh(&"30d", || fetch(&calls, true)).await;

        let mut tasks = JoinSet::new();
        for _ in 0..3 {
            let cache = cache.clone();
            let calls = calls.clone();
            let in_flight = in_flight.clone();
            let max_in_flight = max_in_flight.clone();
            tasks.spawn(async move {
                cache.invalidate(&"30d");
                cache
                    .get_or_refresh(&"30d", || async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_in_flight.fetch_max(now, Ordering::SeqCst);
                        let value = fetch(&calls, true).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        value
                    })
                    .await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        assert!(calls.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_fetched_after_invalidate_is_cached_again() {
        let cache: ViewCache<&str, Value> = ViewCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        let first = cache.get_or_refresh(&"30d", || fetch(&calls, true)).await;
        cache.invalidate(&"30d");
        let second = cache.get_or_refresh(&"30d", || fetch(&calls, true)).await;
        let third = cache.get_or_refresh(&"30d", || fetch(&calls, true)).await;
        assert_eq!(first.generation, 1);
        assert_eq!(second.generation, 2);
        assert_eq!(third, second);
    }
}
