//! Memoized async fetches with TTL, in-flight de-duplication and stale fallback
//!
//! - A completed fetch is stored with `now + ttl` expiry, replacing any previous entry.
//! - Concurrent lookups of a key share the single outstanding fetch.
//! - A failed fetch falls back to the previous value for that key, even if expired.
//! - Expiry is checked lazily on read.
//! - Over capacity, the first negative or expired entry is evicted, otherwise the oldest.
//! - A fetch that started before `clear()` neither stores its result nor
//!   touches fetches started after it.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use indexmap::IndexMap;
use tokio::time::Instant;
use tracing::warn;

struct Entry<V> {
    /// `None` is a cached negative result
    value: Option<V>,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

struct State<V> {
    entries: IndexMap<String, Entry<V>>,
    pending: HashMap<String, Shared<BoxFuture<'static, Option<V>>>>,
    ttl: Duration,
    max_size: usize,
    /// Bumped by `clear()`
    generation: u64,
}

impl<V> State<V> {
    fn store(&mut self, key: String, value: Option<V>) {
        let now = Instant::now();
        let expires_at = now + self.ttl;

        if self.entries.shift_remove(&key).is_none() && self.max_size > 0 {
            while self.entries.len() >= self.max_size {
                let victim = self
                    .entries
                    .values()
                    .position(|entry| entry.value.is_none() || !entry.is_fresh(now))
                    .unwrap_or(0);
                self.entries.shift_remove_index(victim);
            }
        }

        self.entries.insert(key, Entry { value, expires_at });
    }
}

/// Process-wide memoized cache for one kind of remote lookup
pub struct Memoized<V> {
    state: Arc<Mutex<State<V>>>,
}

impl<V> Clone for Memoized<V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

fn lock<V>(state: &Mutex<State<V>>) -> MutexGuard<'_, State<V>> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<V> Memoized<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                entries: IndexMap::new(),
                pending: HashMap::new(),
                ttl,
                max_size,
                generation: 0,
            })),
        }
    }

    /// Returns the cached value for `key` or runs `fetch` to obtain it.
    ///
    /// `Ok(None)` from the fetcher is cached like any other value. An `Err` is
    /// logged and answered with the previous value for `key`, if there is one.
    pub async fn get_with<F, Fut, E>(&self, key: &str, fetch: F) -> Option<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let shared = {
            let mut state = lock(&self.state);

            if let Some(entry) = state.entries.get(key)
                && entry.is_fresh(Instant::now())
            {
                return entry.value.clone();
            }

            match state.pending.get(key) {
                Some(in_flight) => in_flight.clone(),
                None => {
                    let in_flight =
                        self.spawn_fetch(key.to_string(), state.generation, fetch());
                    state.pending.insert(key.to_string(), in_flight.clone());
                    in_flight
                }
            }
        };

        shared.await
    }

    fn spawn_fetch<Fut, E>(
        &self,
        key: String,
        generation: u64,
        fut: Fut,
    ) -> Shared<BoxFuture<'static, Option<V>>>
    where
        Fut: Future<Output = Result<Option<V>, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let state = Arc::clone(&self.state);

        async move {
            let result = fut.await;
            let mut state = lock(&state);

            if state.generation != generation {
                return match result {
                    Ok(value) => value,
                    Err(e) => {
                        warn!("Fetch for {} failed: {}", key, e);
                        None
                    }
                };
            }
            state.pending.remove(&key);

            match result {
                Ok(value) => {
                    state.store(key, value.clone());
                    value
                }
                Err(e) => {
                    warn!("Fetch for {} failed: {}", key, e);
                    state.entries.get(&key).and_then(|entry| entry.value.clone())
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Apply a new TTL/capacity policy; existing entries keep their expiry
    pub fn configure(&self, ttl: Duration, max_size: usize) {
        let mut state = lock(&self.state);
        state.ttl = ttl;
        state.max_size = max_size;
    }

    /// Drop every stored value and forget in-flight fetches
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.entries.clear();
        state.pending.clear();
        state.generation += 1;
    }

    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
