//! One-time-use replay detection.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::SamlResult;

/// Remembers which assertions have already been consumed.
pub trait ReplayCache: Send + Sync {
    /// Records `key` as used until `expires`.
    ///
    /// Returns `Ok(true)` on first use and `Ok(false)` if `key` was already
    /// recorded and has not expired at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store is unavailable.
    fn check_and_record(
        &self,
        key: &str,
        now: DateTime<Utc>,
        expires: DateTime<Utc>,
    ) -> SamlResult<bool>;
}

/// Number of recorded keys between two sweeps of expired entries.
pub const DEFAULT_PURGE_INTERVAL: usize = 256;

/// Process-local replay cache backed by a concurrent map.
///
/// Expired entries are swept every [`DEFAULT_PURGE_INTERVAL`] recordings, so
/// the map stays proportional to the number of live assertions.
#[derive(Debug)]
pub struct InMemoryReplayCache {
    entries: DashMap<String, DateTime<Utc>>,
    recorded: AtomicUsize,
    purge_interval: usize,
}

impl Default for InMemoryReplayCache {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            recorded: AtomicUsize::new(0),
            purge_interval: DEFAULT_PURGE_INTERVAL,
        }
    }
}

impl InMemoryReplayCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sweeps expired entries every `interval` recordings instead.
    #[must_use]
    pub fn with_purge_interval(mut self, interval: usize) -> Self {
        self.purge_interval = interval.max(1);
        self
    }

    /// Drops entries that expired at or before `now`.
    pub fn purge_expired(&self, now: DateTime<Utc>) {
        self.entries.retain(|_, expires| *expires > now);
    }

    /// Returns the number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReplayCache for InMemoryReplayCache {
    fn check_and_record(
        &self,
        key: &str,
        now: DateTime<Utc>,
        expires: DateTime<Utc>,
    ) -> SamlResult<bool> {
        let first_use = match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() > now {
                    false
                } else {
                    entry.insert(expires);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(expires);
                true
            }
        };

        // The entry guard is released here; sweeping while holding it would
        // deadlock on its shard.
        if first_use {
            let recorded = self.recorded.fetch_add(1, Ordering::Relaxed) + 1;
            if recorded % self.purge_interval == 0 {
                self.purge_expired(now);
            }
        }
        Ok(first_use)
    }
}
