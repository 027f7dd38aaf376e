//! Bounded in-memory tier.
//!
//! A weight-bounded LRU map with optional create, weigher, and removal
//! hooks. All map state lives behind one mutex; hooks never run while it is
//! held. Notifications are collected under the lock and delivered after it
//! is released, so a hook may freely call back into the cache.

use crate::core::error::{CacheError, Result};
use crate::core::types::{
    CacheStats, Counters, CreateHook, Removal, RemovalCause, RemovalHook, Weigher,
};
use lru::LruCache;
use parking_lot::Mutex;
use std::fmt;
use tracing::debug;

struct Slot<V> {
    value: V,
    /// Weight computed at insert time; fixed for the life of the entry.
    weight: usize,
}

struct Inner<V> {
    entries: LruCache<String, Slot<V>>,
    weight: usize,
}

/// Weight-bounded in-memory LRU cache.
///
/// The bound is a total weight, not an entry count: each entry's weight
/// comes from the configured weigher (constant 1 by default), and inserts
/// evict least-recently-used entries until the total fits again. Statistics
/// are tracked per instance and reflect only this tier's view.
pub struct MemoryCache<V: 'static> {
    capacity: usize,
    inner: Mutex<Inner<V>>,
    counters: Counters,
    weigher: Option<Weigher<V>>,
    create: Option<CreateHook<V>>,
    listener: Option<RemovalHook<V>>,
}

impl<V: Clone + 'static> MemoryCache<V> {
    /// Create a cache bounded by `capacity` weight units.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_hooks(capacity, None, None, None)
    }

    pub(crate) fn with_hooks(
        capacity: usize,
        weigher: Option<Weigher<V>>,
        create: Option<CreateHook<V>>,
        listener: Option<RemovalHook<V>>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::Config(
                "memory capacity must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                weight: 0,
            }),
            counters: Counters::default(),
            weigher,
            create,
            listener,
        })
    }

    /// Look up `key`, refreshing its recency on a hit.
    ///
    /// On a miss the create hook, if any, runs outside the lock and its
    /// value is adopted. A value inserted concurrently while the hook was
    /// running wins; the created value is then discarded with a `Removed`
    /// notification carrying the winner as `replacement`.
    pub fn get(&self, key: &str) -> Option<V> {
        {
            let mut inner = self.inner.lock();
            if let Some(slot) = inner.entries.get(key) {
                self.counters.record_hit();
                return Some(slot.value.clone());
            }
        }
        self.counters.record_miss();

        let create = self.create.as_ref()?;
        let created = create(key)?;
        self.counters.record_create();

        let weight = self.weigh(key, &created);
        let mut notices = Vec::new();
        let result = {
            let mut inner = self.inner.lock();
            if let Some(existing) = inner.entries.get(key) {
                let kept = existing.value.clone();
                notices.push(Removal {
                    cause: RemovalCause::Removed,
                    key: key.to_string(),
                    value: created,
                    replacement: Some(kept.clone()),
                });
                kept
            } else {
                debug!("Adopting created value for key={}", key);
                inner.entries.put(
                    key.to_string(),
                    Slot {
                        value: created.clone(),
                        weight,
                    },
                );
                inner.weight += weight;
                self.trim_locked(&mut inner, &mut notices);
                created
            }
        };
        self.emit(notices);
        Some(result)
    }

    /// Insert `key`, returning the displaced value if one was present.
    pub fn put(&self, key: &str, value: V) -> Option<V> {
        self.counters.record_put();
        let weight = self.weigh(key, &value);
        let mut notices = Vec::new();
        let previous = {
            let mut inner = self.inner.lock();
            let prev = inner.entries.put(key.to_string(), Slot { value, weight });
            inner.weight += weight;
            let previous = prev.map(|old| {
                inner.weight -= old.weight;
                let replacement = inner.entries.peek(key).map(|slot| slot.value.clone());
                notices.push(Removal {
                    cause: RemovalCause::Removed,
                    key: key.to_string(),
                    value: old.value.clone(),
                    replacement,
                });
                old.value
            });
            self.trim_locked(&mut inner, &mut notices);
            previous
        };
        self.emit(notices);
        previous
    }

    /// Insert without touching the put counter. Used when a value returns
    /// from the disk tier: a promotion is not a caller write.
    pub(crate) fn admit(&self, key: &str, value: V) {
        let weight = self.weigh(key, &value);
        let mut notices = Vec::new();
        {
            let mut inner = self.inner.lock();
            if let Some(old) = inner.entries.put(key.to_string(), Slot { value, weight }) {
                inner.weight -= old.weight;
                let replacement = inner.entries.peek(key).map(|slot| slot.value.clone());
                notices.push(Removal {
                    cause: RemovalCause::Removed,
                    key: key.to_string(),
                    value: old.value,
                    replacement,
                });
            }
            inner.weight += weight;
            self.trim_locked(&mut inner, &mut notices);
        }
        self.emit(notices);
    }

    /// Remove `key`, returning its value if present.
    pub fn remove(&self, key: &str) -> Option<V> {
        let mut notices = Vec::new();
        let previous = {
            let mut inner = self.inner.lock();
            inner.entries.pop(key).map(|slot| {
                inner.weight -= slot.weight;
                notices.push(Removal {
                    cause: RemovalCause::Removed,
                    key: key.to_string(),
                    value: slot.value.clone(),
                    replacement: None,
                });
                slot.value
            })
        };
        self.emit(notices);
        previous
    }

    /// Drop every entry, notifying each with an `Evicted` cause.
    pub fn evict_all(&self) {
        self.clear_with(RemovalCause::Evicted);
    }

    /// Drop every entry with the given cause. Only `Evicted` clears count
    /// toward the eviction statistic.
    pub(crate) fn clear_with(&self, cause: RemovalCause) {
        let mut notices = Vec::new();
        {
            let mut inner = self.inner.lock();
            while let Some((key, slot)) = inner.entries.pop_lru() {
                inner.weight -= slot.weight;
                notices.push(Removal {
                    cause,
                    key,
                    value: slot.value,
                    replacement: None,
                });
            }
        }
        if cause == RemovalCause::Evicted {
            self.counters.record_evictions(notices.len() as u64);
        }
        self.emit(notices);
    }

    /// Copy of the current entries, least recently used first.
    pub fn snapshot(&self) -> Vec<(String, V)> {
        let inner = self.inner.lock();
        let mut entries: Vec<(String, V)> = inner
            .entries
            .iter()
            .map(|(key, slot)| (key.clone(), slot.value.clone()))
            .collect();
        // iteration runs most recent first
        entries.reverse();
        entries
    }

    fn weigh(&self, key: &str, value: &V) -> usize {
        match &self.weigher {
            Some(weigher) => weigher(key, value),
            None => 1,
        }
    }

    fn trim_locked(&self, inner: &mut Inner<V>, notices: &mut Vec<Removal<V>>) {
        let mut evicted = 0u64;
        while inner.weight > self.capacity {
            match inner.entries.pop_lru() {
                Some((key, slot)) => {
                    inner.weight -= slot.weight;
                    evicted += 1;
                    debug!("Evicting key={} weight={}", key, slot.weight);
                    notices.push(Removal {
                        cause: RemovalCause::Evicted,
                        key,
                        value: slot.value,
                        replacement: None,
                    });
                }
                None => break,
            }
        }
        if evicted > 0 {
            self.counters.record_evictions(evicted);
        }
    }

    fn emit(&self, notices: Vec<Removal<V>>) {
        if let Some(listener) = &self.listener {
            for notice in notices {
                listener(notice);
            }
        }
    }
}

impl<V: 'static> MemoryCache<V> {
    /// Total weight currently held.
    pub fn weight(&self) -> usize {
        self.inner.lock().weight
    }

    /// Maximum total weight.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the statistics counters.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

impl<V: 'static> fmt::Display for MemoryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.counters.snapshot();
        let accesses = stats.hits + stats.misses;
        let hit_percent = if accesses == 0 {
            0
        } else {
            100 * stats.hits / accesses
        };
        write!(
            f,
            "MemoryCache[capacity={},weight={},hits={},misses={},hit_rate={}%]",
            self.capacity,
            self.weight(),
            stats.hits,
            stats.misses,
            hit_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<(RemovalCause, String, String, Option<String>)>>>;

    fn recording_listener(log: &Log) -> Option<RemovalHook<String>> {
        let log = Arc::clone(log);
        Some(Box::new(move |removal: Removal<String>| {
            log.lock().push((
                removal.cause,
                removal.key,
                removal.value,
                removal.replacement,
            ));
        }))
    }

    #[test]
    fn test_put_get_remove() {
        let cache: MemoryCache<String> = MemoryCache::new(4).unwrap();
        assert!(cache.get("a").is_none());
        assert!(cache.put("a", "1".to_string()).is_none());
        assert_eq!(cache.get("a"), Some("1".to_string()));
        assert_eq!(cache.put("a", "2".to_string()), Some("1".to_string()));
        assert_eq!(cache.remove("a"), Some("2".to_string()));
        assert!(cache.remove("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = MemoryCache::<String>::new(0);
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_lru_eviction_order() {
        let cache: MemoryCache<String> = MemoryCache::new(2).unwrap();
        cache.put("a", "1".to_string());
        cache.put("b", "2".to_string());
        // touch "a" so "b" becomes the eviction candidate
        cache.get("a");
        cache.put("c", "3".to_string());

        assert_eq!(cache.get("a"), Some("1".to_string()));
        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("c"), Some("3".to_string()));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_weigher_drives_eviction() {
        let cache = MemoryCache::with_hooks(
            10,
            Some(Box::new(|_key: &str, value: &String| value.len())),
            None,
            None,
        )
        .unwrap();
        cache.put("a", "aaaa".to_string());
        cache.put("b", "bbbb".to_string());
        assert_eq!(cache.weight(), 8);

        // 4 more weight units force "a" out
        cache.put("c", "cccc".to_string());
        assert!(cache.get("a").is_none());
        assert_eq!(cache.weight(), 8);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_oversized_entry_is_trimmed_away() {
        let cache = MemoryCache::with_hooks(
            3,
            Some(Box::new(|_key: &str, value: &String| value.len())),
            None,
            None,
        )
        .unwrap();
        cache.put("big", "too large".to_string());
        assert!(cache.is_empty());
        assert_eq!(cache.weight(), 0);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_replacement_notice_carries_new_value() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let cache = MemoryCache::with_hooks(4, None, None, recording_listener(&log)).unwrap();
        cache.put("k", "old".to_string());
        cache.put("k", "new".to_string());

        let notices = log.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(
            notices[0],
            (
                RemovalCause::Removed,
                "k".to_string(),
                "old".to_string(),
                Some("new".to_string())
            )
        );
    }

    #[test]
    fn test_eviction_notice_has_evicted_cause() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let cache = MemoryCache::with_hooks(1, None, None, recording_listener(&log)).unwrap();
        cache.put("a", "1".to_string());
        cache.put("b", "2".to_string());

        let notices = log.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].0, RemovalCause::Evicted);
        assert_eq!(notices[0].1, "a");
        assert_eq!(notices[0].3, None);
    }

    #[test]
    fn test_create_hook_fills_misses() {
        let cache = MemoryCache::with_hooks(
            4,
            None,
            Some(Box::new(|key: &str| Some(format!("made:{key}")))),
            None,
        )
        .unwrap();
        assert_eq!(cache.get("x"), Some("made:x".to_string()));
        // now resident, the second get is a plain hit
        assert_eq!(cache.get("x"), Some("made:x".to_string()));

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.creates, 1);
        assert_eq!(stats.puts, 0);
    }

    #[test]
    fn test_create_hook_may_decline() {
        let cache: MemoryCache<String> =
            MemoryCache::with_hooks(4, None, Some(Box::new(|_key: &str| None)), None).unwrap();
        assert!(cache.get("x").is_none());
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().creates, 0);
    }

    #[test]
    fn test_created_value_yields_to_concurrent_put() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let cache = Arc::new(
            MemoryCache::with_hooks(
                4,
                None,
                Some(Box::new(|_key: &str| {
                    thread::sleep(Duration::from_millis(200));
                    Some("created".to_string())
                })),
                recording_listener(&log),
            )
            .unwrap(),
        );

        let getter = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.get("k"))
        };
        thread::sleep(Duration::from_millis(50));
        cache.put("k", "put".to_string());

        // the concurrent writer wins; the created value is discarded
        assert_eq!(getter.join().unwrap(), Some("put".to_string()));
        assert_eq!(cache.get("k"), Some("put".to_string()));

        let notices = log.lock();
        assert!(notices.contains(&(
            RemovalCause::Removed,
            "k".to_string(),
            "created".to_string(),
            Some("put".to_string())
        )));
    }

    #[test]
    fn test_counters() {
        let cache: MemoryCache<String> = MemoryCache::new(1).unwrap();
        cache.put("a", "1".to_string());
        cache.get("a");
        cache.get("missing");
        cache.put("b", "2".to_string());

        let stats = cache.stats();
        assert_eq!(stats.puts, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_least_recent_first() {
        let cache: MemoryCache<String> = MemoryCache::new(8).unwrap();
        cache.put("a", "1".to_string());
        cache.put("b", "2".to_string());
        cache.put("c", "3".to_string());
        cache.get("a");

        let keys: Vec<String> = cache.snapshot().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_evict_all_counts_evictions() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let cache = MemoryCache::with_hooks(8, None, None, recording_listener(&log)).unwrap();
        cache.put("a", "1".to_string());
        cache.put("b", "2".to_string());
        cache.evict_all();

        assert!(cache.is_empty());
        assert_eq!(cache.weight(), 0);
        assert_eq!(cache.stats().evictions, 2);
        assert!(log.lock().iter().all(|n| n.0 == RemovalCause::Evicted));
    }

    #[test]
    fn test_clear_with_removed_skips_eviction_counter() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let cache = MemoryCache::with_hooks(8, None, None, recording_listener(&log)).unwrap();
        cache.put("a", "1".to_string());
        cache.clear_with(RemovalCause::Removed);

        assert!(cache.is_empty());
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(log.lock()[0].0, RemovalCause::Removed);
    }

    #[test]
    fn test_display_summary() {
        let cache: MemoryCache<String> = MemoryCache::new(4).unwrap();
        cache.put("a", "1".to_string());
        cache.get("a");
        cache.get("b");
        assert_eq!(
            cache.to_string(),
            "MemoryCache[capacity=4,weight=1,hits=1,misses=1,hit_rate=50%]"
        );
    }
}
