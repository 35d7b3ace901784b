//! # Meridian Cache Layer
//!
//! A small TTL cache that sits between the dashboard engine and the raw
//! data fetcher. Its one non-trivial guarantee is single-flight: concurrent
//! callers asking for the same key while a fetch is in flight all receive
//! the result of that one fetch, and no duplicate upstream call is issued
//! within the same refresh window.
//!
//! ## Design
//!
//! - **Structured keys:** a [`CacheKey`] is an endpoint discriminant plus a
//!   canonical serialization of the request parameters, so differently
//!   filtered queries can never collide.
//! - **Per-key serialization:** each key owns a `tokio::sync::Mutex` slot.
//!   Refreshes for unrelated keys proceed concurrently; waiters on the same
//!   key queue on the slot lock and observe the completed entry.
//! - **No stale-serving by default:** a stale or missing entry blocks the
//!   caller until a fresh fetch completes. Callers that can tolerate
//!   staleness opt in via [`Cache::get_or_fetch_with_fallback`].
//! - **No background sweep:** the key space is bounded by the dashboard's
//!   view surface, so entries are only replaced in place or explicitly
//!   invalidated.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// The logical upstream endpoints the cache distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    AccountSummary,
    Positions,
    OpenOrders,
    TradeHistory,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::AccountSummary => "account_summary",
            Endpoint::Positions => "positions",
            Endpoint::OpenOrders => "open_orders",
            Endpoint::TradeHistory => "trade_history",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured cache key: endpoint discriminant plus a canonical parameter
/// serialization. Replaces loose string keys so two differently parameterized
/// queries against the same endpoint occupy distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub endpoint: Endpoint,
    pub params: String,
}

impl CacheKey {
    pub fn new(endpoint: Endpoint, params: impl Into<String>) -> Self {
        Self {
            endpoint,
            params: params.into(),
        }
    }

    /// Key for an endpoint that takes no parameters.
    pub fn bare(endpoint: Endpoint) -> Self {
        Self::new(endpoint, "")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.endpoint)
        } else {
            write!(f, "{}?{}", self.endpoint, self.params)
        }
    }
}

struct Slot<V> {
    value: Option<(V, Instant)>,
}

/// A TTL cache with per-key single-flight coordination.
///
/// The cache owns entry lifetime exclusively: values go in through
/// `get_or_fetch*` and leave through TTL replacement or explicit
/// invalidation. `V` is cloned out to callers; entries are never handed out
/// by reference.
pub struct Cache<V> {
    slots: Mutex<HashMap<CacheKey, Arc<Mutex<Slot<V>>>>>,
}

impl<V: Clone> Cache<V> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key` if it is younger than `ttl`,
    /// otherwise runs `fetch` and stores the result.
    ///
    /// On fetch failure the previous value (if any) is preserved and the
    /// error is propagated unchanged.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: fmt::Display,
    {
        let slot = self.slot(&key).await;
        // Single-flight: whoever holds this lock refreshes; everyone else
        // queues here and sees the completed entry.
        let mut guard = slot.lock().await;

        if let Some((value, fetched_at)) = &guard.value {
            if fetched_at.elapsed() < ttl {
                tracing::trace!(%key, "cache hit");
                return Ok(value.clone());
            }
        }

        tracing::debug!(%key, "cache miss, refreshing");
        match fetch().await {
            Ok(value) => {
                guard.value = Some((value.clone(), Instant::now()));
                Ok(value)
            }
            Err(err) => {
                // The previous value stays; the next caller past the TTL
                // will retry the fetch.
                tracing::warn!(%key, error = %err, "refresh failed");
                Err(err)
            }
        }
    }

    /// Like [`Cache::get_or_fetch`], but serves the last good value when the
    /// refresh fails and one exists. The error is logged, not returned.
    /// An explicit opt-in for callers that prefer stale data to a blank
    /// section.
    pub async fn get_or_fetch_with_fallback<F, Fut, E>(
        &self,
        key: CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: fmt::Display,
    {
        let slot = self.slot(&key).await;
        let mut guard = slot.lock().await;

        if let Some((value, fetched_at)) = &guard.value {
            if fetched_at.elapsed() < ttl {
                return Ok(value.clone());
            }
        }

        match fetch().await {
            Ok(value) => {
                guard.value = Some((value.clone(), Instant::now()));
                Ok(value)
            }
            Err(err) => match &guard.value {
                Some((stale, _)) => {
                    tracing::warn!(%key, error = %err, "refresh failed, serving last good value");
                    Ok(stale.clone())
                }
                None => Err(err),
            },
        }
    }

    /// Drops the entry for `key`, forcing the next access to fetch.
    pub async fn invalidate(&self, key: &CacheKey) {
        let slot = {
            let slots = self.slots.lock().await;
            slots.get(key).cloned()
        };
        if let Some(slot) = slot {
            slot.lock().await.value = None;
        }
    }

    /// Drops every entry.
    pub async fn invalidate_all(&self) {
        let slots: Vec<_> = {
            let map = self.slots.lock().await;
            map.values().cloned().collect()
        };
        for slot in slots {
            slot.lock().await.value = None;
        }
    }

    async fn slot(&self, key: &CacheKey) -> Arc<Mutex<Slot<V>>> {
        let mut slots = self.slots.lock().await;
        slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Slot { value: None })))
            .clone()
    }
}

impl<V: Clone> Default for Cache<V> {
    fn default() -> Self {
        Self::new()
    }
}
