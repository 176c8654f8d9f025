//! Time-expiring cache for the unfiltered record list.
//!
//! The cache holds a single entry. Any successful write invalidates it as a
//! whole; there is no keyed invalidation.
//!
//! Each invalidation advances a generation counter. A reader that loaded
//! records under an older generation cannot store them, so a snapshot taken
//! before a write never outlives that write's invalidation.

use std::{
    fmt,
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use crate::BirthRecord;

/// Lifetime of a cached entry unless configured otherwise.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Source of the current instant used for expiry checks.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Counters describing cache effectiveness since construction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found no live entry.
    pub misses: u64,
    /// Calls to [`ReadCache::invalidate`].
    pub invalidations: u64,
}

struct Entry {
    records: Arc<[BirthRecord]>,
    expires_at: Instant,
}

/// Token identifying the invalidation epoch a reader started in.
///
/// Obtained from [`ReadCache::generation`] before loading records and handed
/// back to [`ReadCache::set_if_current`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Single-entry cache for the full record list.
///
/// Hits return the same shared allocation until the entry expires or is
/// invalidated.
///
/// # Examples
/// ```
/// use std::{sync::Arc, time::Duration};
/// use birthstats_core::ReadCache;
///
/// let cache = ReadCache::new(Duration::from_secs(60));
/// assert!(cache.get().is_none());
///
/// let stored = cache.set(Vec::new());
/// let hit = cache.get().expect("entry is live");
/// assert!(Arc::ptr_eq(&stored, &hit));
///
/// cache.invalidate();
/// assert!(cache.get().is_none());
/// ```
pub struct ReadCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: RwLock<Option<Entry>>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl fmt::Debug for ReadCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadCache")
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Default for ReadCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ReadCache {
    /// Create an empty cache using the system clock.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create an empty cache that reads time from `clock`.
    #[must_use]
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entry: RwLock::new(None),
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached records, if present and unexpired.
    #[must_use]
    pub fn get(&self) -> Option<Arc<[BirthRecord]>> {
        let now = self.clock.now();
        let live = self
            .entry
            .read()
            .ok()
            .and_then(|guard| {
                guard
                    .as_ref()
                    .filter(|entry| now < entry.expires_at)
                    .map(|entry| Arc::clone(&entry.records))
            });
        match live {
            Some(records) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                log::debug!("record cache hit ({} records)", records.len());
                Some(records)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                log::debug!("record cache miss");
                None
            }
        }
    }

    /// The current invalidation epoch.
    ///
    /// Take this before reading the store on a miss.
    #[must_use]
    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    /// Store `records`, replacing any previous entry, and return the shared
    /// list.
    pub fn set(&self, records: impl Into<Arc<[BirthRecord]>>) -> Arc<[BirthRecord]> {
        let records = records.into();
        let expires_at = self.clock.now() + self.ttl;
        if let Ok(mut guard) = self.entry.write() {
            *guard = Some(Self::entry(&records, expires_at));
        } else {
            log::warn!("record cache lock is poisoned; entry not stored");
        }
        records
    }

    /// Store `records` only if no invalidation happened since `generation`
    /// was taken. The list is returned either way.
    pub fn set_if_current(
        &self,
        generation: Generation,
        records: impl Into<Arc<[BirthRecord]>>,
    ) -> Arc<[BirthRecord]> {
        let records = records.into();
        let expires_at = self.clock.now() + self.ttl;
        match self.entry.write() {
            Ok(mut guard) if self.generation() == generation => {
                *guard = Some(Self::entry(&records, expires_at));
            }
            Ok(_) => log::debug!("record cache invalidated during load; entry not stored"),
            Err(_) => log::warn!("record cache lock is poisoned; entry not stored"),
        }
        records
    }

    /// Drop the cached entry and start a new generation.
    pub fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        let mut guard = match self.entry.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.generation.fetch_add(1, Ordering::AcqRel);
        *guard = None;
        drop(guard);
        log::debug!("record cache invalidated");
    }

    fn entry(records: &Arc<[BirthRecord]>, expires_at: Instant) -> Entry {
        Entry {
            records: Arc::clone(records),
            expires_at,
        }
    }

    /// Snapshot of the hit, miss and invalidation counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}
