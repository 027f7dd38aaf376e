//! # Strata Cache
//!
//! Two-level caching for Rust - a bounded in-memory LRU tier over an
//! optional persistent disk tier
//!
//! ## Features
//!
//! - ⚡ **Memory tier**: Weight-bounded LRU map with per-instance statistics
//! - 💾 **Disk tier**: Journaled, checksummed, byte-bounded store that
//!   survives restarts
//! - 🔄 **Write-through**: Memory is authoritative; disk copies are kept
//!   best-effort and never fail a caller
//! - 📦 **Converters**: Pluggable serialization (raw bytes, UTF-8 strings,
//!   JSON, bincode)
//! - 🔔 **Hooks**: Create-on-miss, custom entry weighers, removal
//!   notifications
//!
//! ## Quick Start
//!
//! ```rust
//! use strata_cache::TwoLevelCache;
//!
//! let cache = TwoLevelCache::builder().memory_capacity(64).build()?;
//! cache.put("user:1", "Ada".to_string());
//! assert_eq!(cache.get("user:1"), Some("Ada".to_string()));
//! # Ok::<(), strata_cache::CacheError>(())
//! ```
//!
//! With a disk tier attached, entries evicted from memory survive on disk
//! and are promoted back on their next access:
//!
//! ```rust,no_run
//! use strata_cache::{StringConverter, TwoLevelCache};
//!
//! let cache = TwoLevelCache::builder()
//!     .memory_capacity(64)
//!     .converter(StringConverter)
//!     .disk_store("./data/cache", 1, 10 * 1024 * 1024)
//!     .build()?;
//! cache.put("user:1", "Ada".to_string());
//! # Ok::<(), strata_cache::CacheError>(())
//! ```

pub mod convert;
pub mod core;
pub mod disk;
pub mod memory;

pub use convert::{BincodeConverter, BytesConverter, Converter, JsonConverter, StringConverter};
pub use disk::{DiskStore, DiskStoreConfig, Edit};
pub use memory::MemoryCache;
pub use self::core::error::{CacheError, Result};
pub use self::core::two_level::{CacheBuilder, TwoLevelCache};
pub use self::core::types::{
    CacheStats, CreateHook, Removal, RemovalCause, RemovalHook, Weigher,
};
