//! Bounded in-memory store for listing payloads

use crate::error::Result;
use crate::types::CacheEntry;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::debug;

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Earliest point at which some entry leaves the stale window.
    /// May be earlier than the true minimum after overwrites, never later.
    next_deadline: Option<DateTime<Utc>>,
}

/// Key → entry map bounded to `max_entries`
///
/// Entries are fresh until `expires_at`, then kept for `stale_retention`
/// so they can back stale-fallback reads. Nothing runs in the background:
/// [`CacheStore::evict`] is called by readers, and [`CacheStore::put`] runs
/// the same pass when an insert pushes the store over its bound.
///
/// All operations hold a `std` lock briefly and never suspend.
pub struct CacheStore<V> {
    inner: RwLock<Inner<V>>,
    max_entries: usize,
    stale_retention: Duration,
    evictions: AtomicU64,
}

fn add_saturating(at: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    at.checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn to_delta(duration: std::time::Duration) -> Duration {
    Duration::from_std(duration).unwrap_or(Duration::MAX)
}

impl<V: Clone> CacheStore<V> {
    pub fn new(max_entries: usize, stale_retention: std::time::Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                next_deadline: None,
            }),
            max_entries,
            stale_retention: to_delta(stale_retention),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up an entry regardless of freshness; callers check `expires_at`
    pub fn get(&self, key: &str) -> Result<Option<CacheEntry<V>>> {
        let inner = self.inner.read()?;
        Ok(inner.entries.get(key).cloned())
    }

    /// Store `payload` under `key`, replacing any previous entry
    pub fn put(
        &self,
        key: String,
        payload: V,
        fingerprint: String,
        ttl: std::time::Duration,
    ) -> Result<()> {
        let now = Utc::now();
        let entry = CacheEntry {
            key: key.clone(),
            payload,
            fingerprint,
            created_at: now,
            expires_at: add_saturating(now, to_delta(ttl)),
        };
        let deadline = add_saturating(entry.expires_at, self.stale_retention);

        let mut inner = self.inner.write()?;
        inner.entries.insert(key, entry);
        inner.next_deadline = Some(match inner.next_deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });

        if inner.entries.len() > self.max_entries {
            self.evict_locked(&mut inner, now);
        }
        Ok(())
    }

    /// Drop entries past their stale window, then the soonest-expiring
    /// entries until the store is within `max_entries`. Returns the number
    /// of entries removed.
    pub fn evict(&self) -> Result<usize> {
        let now = Utc::now();

        {
            let inner = self.inner.read()?;
            if !self.needs_eviction(&inner, now) {
                return Ok(0);
            }
        }

        let mut inner = self.inner.write()?;
        if !self.needs_eviction(&inner, now) {
            return Ok(0);
        }
        Ok(self.evict_locked(&mut inner, now))
    }

    fn needs_eviction(&self, inner: &Inner<V>, now: DateTime<Utc>) -> bool {
        if inner.entries.is_empty() {
            return false;
        }
        inner.entries.len() > self.max_entries
            || inner.next_deadline.is_some_and(|deadline| deadline <= now)
    }

    fn evict_locked(&self, inner: &mut Inner<V>, now: DateTime<Utc>) -> usize {
        let before = inner.entries.len();
        let retention = self.stale_retention;

        inner
            .entries
            .retain(|_, entry| add_saturating(entry.expires_at, retention) > now);
        let expired = before - inner.entries.len();

        if inner.entries.len() > self.max_entries {
            let excess = inner.entries.len() - self.max_entries;
            let mut by_expiry: Vec<(DateTime<Utc>, String)> = inner
                .entries
                .iter()
                .map(|(key, entry)| (entry.expires_at, key.clone()))
                .collect();
            by_expiry.sort();

            for (_, key) in by_expiry.into_iter().take(excess) {
                inner.entries.remove(&key);
            }
        }

        inner.next_deadline = inner
            .entries
            .values()
            .map(|entry| add_saturating(entry.expires_at, retention))
            .min();

        let removed = before - inner.entries.len();
        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
            debug!(
                removed,
                expired,
                remaining = inner.entries.len(),
                "Evicted cache entries"
            );
        }
        removed
    }

    /// Number of entries currently held, fresh or stale
    pub fn len(&self) -> Result<usize> {
        Ok(self.inner.read()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Total entries removed by eviction since startup
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}
