//! Two-tier cache orchestration.
//!
//! [`TwoLevelCache`] pairs a bounded [`MemoryCache`] with an optional
//! [`DiskStore`] behind one key-value surface. The memory tier is
//! authoritative: every write lands there first and is then copied to disk
//! on a best-effort basis, so a disk failure degrades durability but never
//! correctness. Reads fall back to disk on a memory miss and promote what
//! they find.

use crate::convert::Converter;
use crate::core::error::{CacheError, Result};
use crate::core::types::{CacheStats, CreateHook, Removal, RemovalCause, RemovalHook, Weigher};
use crate::disk::{DiskStore, DiskStoreConfig};
use crate::memory::MemoryCache;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A two-tier cache: a weight-bounded memory level over an optional
/// size-bounded disk level.
///
/// The tiers hold independent copies of each value. Memory evictions leave
/// the disk copy in place, so an entry pushed out by capacity pressure can
/// still be served (and re-promoted) later. Explicit removals and
/// replacements propagate to disk so a stale copy never resurfaces.
///
/// Statistics cover the memory tier only; a get satisfied from disk counts
/// as a miss.
///
/// Build instances through [`TwoLevelCache::builder`].
pub struct TwoLevelCache<V: 'static> {
    memory: MemoryCache<V>,
    disk: Option<Arc<DiskStore>>,
    converter: Option<Arc<dyn Converter<V>>>,
}

impl<V: Clone + 'static> TwoLevelCache<V> {
    /// Start configuring a cache.
    pub fn builder() -> CacheBuilder<V> {
        CacheBuilder::new()
    }

    /// Look up `key` in memory, then on disk.
    ///
    /// A memory hit refreshes recency and returns a clone. On a miss the
    /// configured create hook, if any, runs first; only when it declines is
    /// the disk tier consulted. A decoded disk value is admitted back into
    /// memory before being returned. Disk read or decode failures are
    /// logged and treated as an absent entry.
    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(value) = self.memory.get(key) {
            return Some(value);
        }
        let store = self.disk.as_ref()?;
        let converter = self.converter.as_ref()?;

        let bytes = match store.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Unable to read disk entry for key={}: {}", key, e);
                return None;
            }
        };
        match converter.from_bytes(&bytes) {
            Ok(value) => {
                debug!("Promoting key={} from disk", key);
                self.memory.admit(key, value.clone());
                Some(value)
            }
            Err(e) => {
                warn!("Unable to decode disk entry for key={}: {}", key, e);
                None
            }
        }
    }

    /// Insert `value` under `key` in both tiers, returning the value it
    /// displaced from memory.
    ///
    /// The memory insert is authoritative and always happens; the disk copy
    /// is best-effort and failures are only logged. A displaced value first
    /// has its disk copy removed (via the removal notification), then the
    /// new value is written through, so the disk tier converges on the
    /// replacement.
    pub fn put(&self, key: &str, value: V) -> Option<V> {
        let previous = self.memory.put(key, value.clone());
        if let (Some(store), Some(converter)) = (self.disk.as_ref(), self.converter.as_ref()) {
            write_through_quietly(store, converter.as_ref(), key, &value);
        }
        previous
    }

    /// Remove `key` from both tiers, returning the value memory held.
    ///
    /// The disk tier is always asked to drop the key, even when memory had
    /// no entry: the value may live only on disk after an eviction.
    pub fn remove(&self, key: &str) -> Option<V> {
        let previous = self.memory.remove(key);
        if let Some(store) = self.disk.as_ref() {
            remove_quietly(store, key);
        }
        previous
    }

    /// Drop everything from both tiers and delete the disk store.
    ///
    /// Memory entries are discarded as explicit removals, not evictions, so
    /// the eviction counter is untouched and removal hooks see
    /// [`RemovalCause::Removed`]. The disk store is closed and its directory
    /// emptied; the cache no longer accepts disk traffic afterwards.
    pub fn evict_all(&self) -> Result<()> {
        self.memory.clear_with(RemovalCause::Removed);
        if let Some(store) = self.disk.as_ref() {
            store.delete()?;
        }
        Ok(())
    }

    /// Drop every memory entry as an eviction, leaving disk untouched.
    ///
    /// Disk copies survive, so subsequent gets can re-promote them.
    pub fn evict_all_memory(&self) {
        self.memory.evict_all();
    }

    /// Close the disk store and empty its directory, leaving memory intact.
    pub fn evict_all_disk(&self) -> Result<()> {
        if let Some(store) = self.disk.as_ref() {
            store.delete()?;
        }
        Ok(())
    }

    /// Least-recently-used-first view of the memory tier.
    pub fn snapshot(&self) -> Vec<(String, V)> {
        self.memory.snapshot()
    }
}

impl<V: 'static> TwoLevelCache<V> {
    /// Memory-tier statistics. Disk-satisfied gets count as misses.
    pub fn stats(&self) -> CacheStats {
        self.memory.stats()
    }

    /// Current total weight of the memory tier.
    pub fn memory_weight(&self) -> usize {
        self.memory.weight()
    }

    /// Weight bound of the memory tier.
    pub fn memory_capacity(&self) -> usize {
        self.memory.capacity()
    }

    /// Number of entries in the memory tier.
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Bytes of value data currently on disk, or 0 without a disk tier.
    pub fn disk_size(&self) -> u64 {
        self.disk.as_ref().map(|store| store.size()).unwrap_or(0)
    }

    /// Byte bound of the disk tier, or 0 without one.
    pub fn disk_capacity(&self) -> u64 {
        self.disk.as_ref().map(|store| store.capacity()).unwrap_or(0)
    }

    /// Directory backing the disk tier, if there is one.
    pub fn directory(&self) -> Option<&Path> {
        self.disk.as_ref().map(|store| store.directory())
    }

    /// Whether the disk tier refuses further traffic. `true` without one.
    pub fn is_closed(&self) -> bool {
        self.disk.as_ref().map(|store| store.is_closed()).unwrap_or(true)
    }

    /// Flush buffered disk journal writes to the file system.
    pub fn flush(&self) -> Result<()> {
        match self.disk.as_ref() {
            Some(store) => store.flush(),
            None => Ok(()),
        }
    }

    /// Flush and close the disk tier. Memory stays usable; disk reads and
    /// writes fail quietly afterwards.
    pub fn close(&self) -> Result<()> {
        match self.disk.as_ref() {
            Some(store) => store.close(),
            None => Ok(()),
        }
    }
}

impl<V: 'static> fmt::Display for TwoLevelCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TwoLevelCache[{},disk_size={}/{}]",
            self.memory,
            self.disk_size(),
            self.disk_capacity()
        )
    }
}

/// Configures and constructs a [`TwoLevelCache`].
///
/// Only the memory capacity is mandatory. Adding a disk tier requires a
/// converter, since disk holds serialized bytes rather than live values.
pub struct CacheBuilder<V: 'static> {
    memory_capacity: usize,
    disk: Option<DiskStoreConfig>,
    converter: Option<Arc<dyn Converter<V>>>,
    weigher: Option<Weigher<V>>,
    create: Option<CreateHook<V>>,
    on_removed: Option<RemovalHook<V>>,
}

impl<V: Clone + 'static> CacheBuilder<V> {
    fn new() -> Self {
        Self {
            memory_capacity: 0,
            disk: None,
            converter: None,
            weigher: None,
            create: None,
            on_removed: None,
        }
    }

    /// Weight bound of the memory tier. Mandatory and non-zero.
    pub fn memory_capacity(mut self, capacity: usize) -> Self {
        self.memory_capacity = capacity;
        self
    }

    /// Attach a disk tier described by `config`.
    pub fn disk(mut self, config: DiskStoreConfig) -> Self {
        self.disk = Some(config);
        self
    }

    /// Attach a disk tier at `directory` bounded by `max_bytes`.
    ///
    /// `app_version` stamps the store; reopening with a different value
    /// fails with [`CacheError::VersionMismatch`].
    pub fn disk_store(self, directory: impl Into<PathBuf>, app_version: u32, max_bytes: u64) -> Self {
        self.disk(DiskStoreConfig {
            directory: directory.into(),
            app_version,
            max_bytes,
        })
    }

    /// Converter between live values and their disk representation.
    pub fn converter(mut self, converter: impl Converter<V> + 'static) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    /// Weigh entries with `weigher` instead of counting each as 1.
    pub fn weigher(mut self, weigher: impl Fn(&str, &V) -> usize + Send + Sync + 'static) -> Self {
        self.weigher = Some(Box::new(weigher));
        self
    }

    /// Produce values for missing keys on demand.
    ///
    /// The hook runs on a full miss of both tiers' in-memory view, before
    /// disk is consulted. Returning `None` declines. A produced value is
    /// written through to disk and then adopted into memory, unless another
    /// writer filled the key in the meantime, in which case the created
    /// value is discarded with a removal notification.
    pub fn create_with(mut self, create: impl Fn(&str) -> Option<V> + Send + Sync + 'static) -> Self {
        self.create = Some(Box::new(create));
        self
    }

    /// Observe entries leaving the memory tier.
    ///
    /// The hook runs outside all cache locks and may call back into the
    /// cache.
    pub fn on_removed(mut self, hook: impl Fn(Removal<V>) + Send + Sync + 'static) -> Self {
        self.on_removed = Some(Box::new(hook));
        self
    }

    /// Validate the configuration and open the cache.
    ///
    /// All validation happens before any file system access, so a rejected
    /// configuration leaves no directory behind.
    pub fn build(self) -> Result<TwoLevelCache<V>> {
        let CacheBuilder {
            memory_capacity,
            disk,
            converter,
            weigher,
            create,
            on_removed,
        } = self;

        if memory_capacity == 0 {
            return Err(CacheError::Config(
                "memory capacity must be greater than zero".to_string(),
            ));
        }
        if let Some(config) = &disk {
            if converter.is_none() {
                return Err(CacheError::Config(
                    "a disk tier requires a converter".to_string(),
                ));
            }
            if memory_capacity as u64 >= config.max_bytes {
                return Err(CacheError::Config(format!(
                    "memory capacity ({}) must be smaller than disk capacity ({}); \
                     the second level should be the larger tier",
                    memory_capacity, config.max_bytes
                )));
            }
        }

        let store = match disk {
            Some(config) => Some(Arc::new(DiskStore::open(config)?)),
            None => None,
        };

        // Replacements and explicit removals must not leave a stale disk
        // copy behind; evictions keep theirs so the entry can come back.
        let listener: Option<RemovalHook<V>> = if store.is_some() || on_removed.is_some() {
            let store = store.clone();
            Some(Box::new(move |removal: Removal<V>| {
                if !removal.was_evicted() {
                    if let Some(store) = store.as_ref() {
                        remove_quietly(store, &removal.key);
                    }
                }
                if let Some(hook) = on_removed.as_ref() {
                    hook(removal);
                }
            }))
        } else {
            None
        };

        // Created values reach disk even if a concurrent writer beats them
        // into memory; the discard notification then purges that copy again.
        let create: Option<CreateHook<V>> = match create {
            Some(user_create) => {
                let store = store.clone();
                let converter = converter.clone();
                Some(Box::new(move |key: &str| {
                    let value = user_create(key)?;
                    if let (Some(store), Some(converter)) = (store.as_ref(), converter.as_ref()) {
                        write_through_quietly(store, converter.as_ref(), key, &value);
                    }
                    Some(value)
                }))
            }
            None => None,
        };

        let memory = MemoryCache::with_hooks(memory_capacity, weigher, create, listener)?;
        Ok(TwoLevelCache {
            memory,
            disk: store,
            converter,
        })
    }
}

/// Serialize `value` and commit it under `key`, logging instead of failing.
///
/// A key already under edit is skipped; the concurrent editor's outcome
/// stands. An encode error abandons the edit, which keeps any previous
/// committed value intact.
fn write_through_quietly<V>(store: &DiskStore, converter: &dyn Converter<V>, key: &str, value: &V) {
    let mut edit = match store.edit(key) {
        Ok(Some(edit)) => edit,
        Ok(None) => {
            debug!("Write-through skipped for key={}: edit in progress", key);
            return;
        }
        Err(e) => {
            warn!("Unable to write disk entry for key={}: {}", key, e);
            return;
        }
    };
    if let Err(e) = converter.to_writer(value, &mut edit) {
        warn!("Unable to encode value for key={}: {}", key, e);
        return;
    }
    if let Err(e) = edit.commit() {
        warn!("Unable to commit disk entry for key={}: {}", key, e);
    }
}

fn remove_quietly(store: &DiskStore, key: &str) {
    if let Err(e) = store.remove(key) {
        warn!("Unable to remove disk entry for key={}: {}", key, e);
    }
}
