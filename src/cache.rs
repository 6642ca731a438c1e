//! Route outcome caching.
//!
//! This module provides [`RouteCache`], an LRU cache of [`RouteOutcome`]s
//! keyed by request method, host and path. It is gated behind the `cache`
//! feature flag and uses the [`lru`] crate internally. A [`Router`] is
//! immutable, so cached outcomes stay valid for the router they came from;
//! call [`RouteCache::clear`] when switching routers.
//!
//! [`CacheStats`] tracks hits, misses, and invalidations so you can monitor
//! cache effectiveness at runtime.
//!
//! # Examples
//!
//! ```
//! use route_trie::{Route, RouteCache, RouteRequest, Router};
//!
//! let router = Router::builder().route(Route::new("docs/{*path}")).build().unwrap();
//! let mut cache = RouteCache::with_capacity(64);
//! let request = RouteRequest::new("/docs/guide/intro");
//!
//! router.route_cached(&mut cache, &request);
//! router.route_cached(&mut cache, &request);
//! assert_eq!(cache.stats().hits, 1);
//! assert_eq!(cache.len(), 1);
//! ```
//!
//! [`Router`]: crate::Router

use crate::error::RouteOutcome;
use crate::selector::RouteRequest;
use crate::{debug_log, trace_log};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cache key: the parts of a request the default policies look at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RequestKey {
    method: String,
    host: Option<String>,
    path: String,
}

impl RequestKey {
    fn of(request: &RouteRequest) -> Self {
        Self {
            method: request.method().to_string(),
            host: request.host().map(str::to_ascii_lowercase),
            path: request.path().to_string(),
        }
    }
}

/// Counters tracking cache hit/miss rates and invalidations.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    /// Number of full cache invalidations (via [`RouteCache::clear`]).
    pub invalidations: usize,
}

impl CacheStats {
    /// Return the hit rate as a value in `0.0..=1.0`.
    ///
    /// Returns `0.0` if no lookups have been performed.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache for routing outcomes.
///
/// Default capacity is 1000 entries. Requests that carry headers used by a
/// custom policy should not be cached, since headers are not part of the key.
#[derive(Debug)]
pub struct RouteCache {
    entries: LruCache<RequestKey, RouteOutcome>,
    stats: CacheStats,
}

impl RouteCache {
    const DEFAULT_CAPACITY: usize = 1000;

    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a cache holding at most `capacity` outcomes. A zero capacity
    /// is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(cap),
            stats: CacheStats::default(),
        }
    }

    /// Look up the cached outcome for `request`. Updates hit/miss stats.
    pub fn get(&mut self, request: &RouteRequest) -> Option<RouteOutcome> {
        if let Some(outcome) = self.entries.get(&RequestKey::of(request)) {
            self.stats.hits += 1;
            trace_log!("Route cache hit for {} '{}'", request.method(), request.path());
            Some(outcome.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Route cache miss for {} '{}'", request.method(), request.path());
            None
        }
    }

    /// Store the outcome for `request`, evicting the least recently used
    /// entry when full.
    pub fn insert(&mut self, request: &RouteRequest, outcome: RouteOutcome) {
        self.entries.push(RequestKey::of(request), outcome);
    }

    /// Drop every entry and increment the invalidation counter.
    pub fn clear(&mut self) {
        let len = self.entries.len();
        self.entries.clear();
        self.stats.invalidations += 1;
        debug_log!(
            "Route cache cleared: {} entries removed ({} total invalidations, hit rate: {:.1}%)",
            len,
            self.stats.invalidations,
            self.stats.hit_rate() * 100.0
        );
    }

    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset all counters in [`CacheStats`] to zero.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RouteCache {
    fn clone(&self) -> Self {
        Self {
            entries: LruCache::new(self.entries.cap()),
            stats: self.stats.clone(),
        }
    }
}
