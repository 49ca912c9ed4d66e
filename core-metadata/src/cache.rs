//! Coalescing fetch cache
//!
//! [`InfoCache`] answers "give me the payload for key K" with at most one
//! transport fetch per key in flight at any time:
//!
//! - A cached key resolves immediately, without reaching an await point.
//! - The first caller for an uncached key issues one fetch on a detached
//!   task; every caller that arrives while that fetch is in flight joins a
//!   FIFO waiter list instead of issuing a second fetch.
//! - On resolution the payload is stored and every waiter receives it in
//!   registration order; on failure every waiter receives the error and the
//!   key becomes immediately retryable.
//!
//! A key lives in at most one of {entries, pending}; both sit behind the
//! same lock, which is never held across an await.

use crate::config::CacheLimit;
use crate::error::{MetadataError, Result};
use bridge_traits::{ResourceKind, Transport, TransportError};
use core_runtime::events::{ClientEvent, EventBus};
use lru::LruCache;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, warn};

type FetchResult = Result<Arc<Value>>;

/// Counter snapshot for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found no entry
    pub misses: u64,
    /// Lookups that joined an already in-flight fetch
    pub coalesced: u64,
    /// Fetches issued to the transport
    pub fetches: u64,
    /// Fetches that ended in a transport error
    pub failures: u64,
    /// Entries dropped by the LRU bound
    pub evictions: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

struct CacheState<K: Eq + Hash> {
    entries: LruCache<K, Arc<Value>>,
    pending: HashMap<K, Vec<oneshot::Sender<FetchResult>>>,
}

struct CacheInner<K: Eq + Hash> {
    resource: ResourceKind,
    transport: Arc<dyn Transport>,
    events: Option<EventBus>,
    state: Mutex<CacheState<K>>,
    counters: Counters,
}

enum Joined {
    /// The value landed between the miss check and re-acquiring the lock.
    Resolved(Arc<Value>),
    Waiting(oneshot::Receiver<FetchResult>),
}

/// Request cache with per-key fetch coalescing.
///
/// Generic over the key type; the song metadata and artist-credit caches
/// are two instantiations of this one mechanism.
pub struct InfoCache<K: Eq + Hash> {
    inner: Arc<CacheInner<K>>,
}

impl<K> InfoCache<K>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
{
    /// Create an empty cache for one backend resource.
    pub fn new(
        resource: ResourceKind,
        limit: CacheLimit,
        transport: Arc<dyn Transport>,
        events: Option<EventBus>,
    ) -> Self {
        let entries = match limit {
            CacheLimit::Unbounded => LruCache::unbounded(),
            CacheLimit::LeastRecentlyUsed(capacity) => LruCache::new(capacity),
        };

        Self {
            inner: Arc::new(CacheInner {
                resource,
                transport,
                events,
                state: Mutex::new(CacheState {
                    entries,
                    pending: HashMap::new(),
                }),
                counters: Counters::default(),
            }),
        }
    }

    /// Get the payload for `key`, fetching it if necessary.
    ///
    /// Cache hits resolve without reaching an await point.
    pub async fn get(&self, key: &K) -> Result<Arc<Value>> {
        self.get_with(key, || {}).await
    }

    /// Get the payload for `key`, invoking `on_miss` synchronously if the
    /// value is not already cached.
    ///
    /// `on_miss` runs strictly before the result can be delivered, so
    /// callers can render a placeholder before the async boundary.
    pub async fn get_with<F: FnOnce()>(&self, key: &K, on_miss: F) -> Result<Arc<Value>> {
        if let Some(value) = self.lookup(key) {
            return Ok(value);
        }

        on_miss();

        let rx = match self.join_or_fetch(key) {
            Joined::Resolved(value) => return Ok(value),
            Joined::Waiting(rx) => rx,
        };

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(MetadataError::Interrupted(format!(
                "fetch for {} {} dropped before completion",
                self.inner.resource, key
            ))),
        }
    }

    /// Look at the cached payload for `key` without fetching or touching
    /// recency.
    pub fn peek(&self, key: &K) -> Option<Arc<Value>> {
        self.inner.lock_state().entries.peek(key).cloned()
    }

    /// Drop every cached entry.
    ///
    /// In-flight fetches are unaffected; their results land in the emptied
    /// cache as usual.
    pub fn clear(&self) {
        self.inner.lock_state().entries.clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock_state().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.counters.snapshot()
    }

    fn lookup(&self, key: &K) -> Option<Arc<Value>> {
        let mut state = self.inner.lock_state();
        match state.entries.get(key) {
            Some(value) => {
                self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(value))
            }
            None => {
                self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Join the in-flight fetch for `key`, or start one.
    fn join_or_fetch(&self, key: &K) -> Joined {
        let (tx, rx) = oneshot::channel();
        let mut state = self.inner.lock_state();

        if let Some(value) = state.entries.get(key) {
            self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Joined::Resolved(Arc::clone(value));
        }

        if let Some(waiters) = state.pending.get_mut(key) {
            waiters.push(tx);
            self.inner.counters.coalesced.fetch_add(1, Ordering::Relaxed);
            debug!(
                resource = %self.inner.resource,
                key = %key,
                waiters = waiters.len(),
                "Joined in-flight fetch"
            );
            return Joined::Waiting(rx);
        }

        state.pending.insert(key.clone(), vec![tx]);
        drop(state);

        self.inner.counters.fetches.fetch_add(1, Ordering::Relaxed);
        debug!(resource = %self.inner.resource, key = %key, "Issuing fetch");
        self.spawn_fetch(key.clone());

        Joined::Waiting(rx)
    }

    /// Run the fetch on a detached task: dropping callers never cancels an
    /// issued fetch.
    fn spawn_fetch(&self, key: K) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            match inner.transport.fetch(inner.resource, &key.to_string()).await {
                Ok(payload) => inner.complete(key, Arc::new(payload)),
                Err(err) => inner.fail(key, err),
            }
        });
    }
}

impl<K> CacheInner<K>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
{
    fn lock_state(&self) -> MutexGuard<'_, CacheState<K>> {
        self.state.lock().expect("cache state poisoned")
    }

    /// Store the payload and drain the waiter list in registration order.
    fn complete(&self, key: K, value: Arc<Value>) {
        let waiters = {
            let mut state = self.lock_state();
            if let Some((evicted, _)) = state.entries.push(key.clone(), Arc::clone(&value)) {
                if evicted != key {
                    self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        resource = %self.resource,
                        key = %evicted,
                        "Evicted least recently used entry"
                    );
                }
            }
            state.pending.remove(&key).unwrap_or_default()
        };

        debug!(
            resource = %self.resource,
            key = %key,
            waiters = waiters.len(),
            "Fetch resolved"
        );

        for tx in waiters {
            let _ = tx.send(Ok(Arc::clone(&value)));
        }
    }

    /// Clear the pending entry and deliver the error to every waiter, so
    /// the key can be retried by a later call.
    fn fail(&self, key: K, err: TransportError) {
        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        warn!(
            resource = %self.resource,
            key = %key,
            error = %err,
            "Fetch failed"
        );

        if let Some(events) = &self.events {
            events
                .emit(ClientEvent::MetadataFetchFailed {
                    resource: self.resource,
                    key: key.to_string(),
                    message: err.to_string(),
                })
                .ok();
        }

        let waiters = {
            let mut state = self.lock_state();
            state.pending.remove(&key).unwrap_or_default()
        };

        let err = MetadataError::Transport(err);
        for tx in waiters {
            let _ = tx.send(Err(err.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    struct StaticTransport {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl Transport for StaticTransport {
        async fn fetch(
            &self,
            _resource: ResourceKind,
            key: &str,
        ) -> std::result::Result<Value, TransportError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "id": key }))
        }

        async fn write(
            &self,
            _resource: ResourceKind,
            _key: &str,
            _payload: Value,
        ) -> std::result::Result<Value, TransportError> {
            Ok(Value::Null)
        }
    }

    fn cache(limit: CacheLimit) -> (InfoCache<String>, Arc<StaticTransport>) {
        let transport = Arc::new(StaticTransport {
            fetches: AtomicUsize::new(0),
        });
        let cache = InfoCache::new(
            ResourceKind::SongMetadata,
            limit,
            transport.clone() as Arc<dyn Transport>,
            None,
        );
        (cache, transport)
    }

    #[tokio::test]
    async fn test_peek_does_not_fetch() {
        let (cache, transport) = cache(CacheLimit::lru(4));
        assert!(cache.peek(&"1".to_string()).is_none());
        assert_eq!(transport.fetches.load(Ordering::SeqCst), 0);

        cache.get(&"1".to_string()).await.unwrap();
        assert!(cache.peek(&"1".to_string()).is_some());
        assert_eq!(transport.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_empties_entries() {
        let (cache, _) = cache(CacheLimit::lru(4));
        cache.get(&"1".to_string()).await.unwrap();
        cache.get(&"2".to_string()).await.unwrap();
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_stats_count_hits_misses_and_fetches() {
        let (cache, _) = cache(CacheLimit::lru(4));
        cache.get(&"1".to_string()).await.unwrap();
        cache.get(&"1".to_string()).await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test]
    async fn test_lru_bound_evicts_oldest() {
        let (cache, transport) = cache(CacheLimit::lru(2));
        for key in ["1", "2", "3"] {
            cache.get(&key.to_string()).await.unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);
        assert!(cache.peek(&"1".to_string()).is_none());

        // An evicted key is fetched again on demand.
        cache.get(&"1".to_string()).await.unwrap();
        assert_eq!(transport.fetches.load(Ordering::SeqCst), 4);
    }
}
