//! Read-through TTL cache for derived analytics.
//!
//! The lock is never held across an await: a miss releases it, runs the
//! computation, then re-locks to store the result. Two concurrent misses on
//! one key may therefore both compute; the later write wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use beatscope_core::Clock;
use chrono::{DateTime, Duration, Utc};

struct CacheEntry<V> {
    value: V,
    created_at: DateTime<Utc>,
}

pub struct AnalyticsCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

/// TTL from whole seconds; values past chrono's range are capped at a century.
#[must_use]
pub fn ttl_from_secs(secs: u64) -> Duration {
    Duration::from_std(std::time::Duration::from_secs(secs))
        .unwrap_or_else(|_| Duration::weeks(52 * 100))
}

impl<V: Clone> AnalyticsCache<V> {
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// The cached value, if present and not older than the TTL.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|e| now - e.created_at <= self.ttl)
            .map(|e| e.value.clone())
    }

    pub fn insert(&self, key: &str, value: V) {
        let created_at = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), CacheEntry { value, created_at });
    }

    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(hit) = self.get(key) {
            return hit;
        }
        let value = compute().await;
        self.insert(key, value.clone());
        value
    }

    /// Like [`Self::get_or_compute`], but an `Err` is returned uncached.
    ///
    /// # Errors
    ///
    /// Whatever `compute` returns.
    pub async fn try_get_or_compute<F, Fut, E>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }

    /// Entries held, expired or not; nothing is evicted until read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
