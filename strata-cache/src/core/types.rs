use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Why an entry left the memory tier.
///
/// Capacity evictions demote an entry (its disk copy is retained); explicit
/// removals and overwrites purge the disk copy as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    /// Displaced by the size bound. The entry may still live on disk.
    Evicted,
    /// Explicitly removed or overwritten by a caller.
    Removed,
}

/// Notification delivered when an entry leaves the memory tier.
#[derive(Debug)]
pub struct Removal<V> {
    pub cause: RemovalCause,
    pub key: String,
    /// The value that left the tier.
    pub value: V,
    /// The value that took its place, when the departure was an overwrite.
    pub replacement: Option<V>,
}

impl<V> Removal<V> {
    /// True when the entry was displaced by the size bound rather than
    /// removed by a caller.
    pub fn was_evicted(&self) -> bool {
        self.cause == RemovalCause::Evicted
    }
}

/// Weight function for memory-tier entries
pub type Weigher<V> = Box<dyn Fn(&str, &V) -> usize + Send + Sync>;

/// Hook that computes a value for a missing key
pub type CreateHook<V> = Box<dyn Fn(&str) -> Option<V> + Send + Sync>;

/// Hook observing entries that leave the memory tier
pub type RemovalHook<V> = Box<dyn Fn(Removal<V>) + Send + Sync>;

/// Statistics for the memory tier
///
/// Counters reflect the memory tier's view only: a get satisfied from disk
/// still counts as a miss, and promotions bump neither puts nor creates.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStats {
    /// Number of gets answered from memory
    pub hits: u64,
    /// Number of gets not answered from memory
    pub misses: u64,
    /// Number of values produced by the create hook
    pub creates: u64,
    /// Number of put operations
    pub puts: u64,
    /// Number of entries displaced by the size bound
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Lock-free counter block backing [`CacheStats`].
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    creates: AtomicU64,
    puts: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_create(&self) {
        self.creates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            creates: self.creates.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
