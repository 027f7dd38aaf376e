//! Persistent disk tier.
//!
//! A directory-resident key/blob store. Each value lives in its own file
//! named by the SHA-256 of the key; which files exist, their checksums, and
//! their recency order are recorded in an append-only journal (see
//! [`journal`]). Writes publish atomically: bytes go to a `.tmp` file that
//! is renamed into place and journaled in one locked step. Recovery on open
//! replays the journal and reconciles it with the directory, and reads
//! verify the journaled checksum; a crash mid-publish may lose the entry
//! being written, but torn data is never served.

mod journal;

use crate::core::error::{CacheError, Result};
use journal::{Header, JournalRecord};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const JOURNAL_FILE: &str = "journal";
const VALUE_SUFFIX: &str = ".val";
const TMP_SUFFIX: &str = ".tmp";

/// Disk tier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskStoreConfig {
    /// Directory holding the journal and value files
    pub directory: PathBuf,
    /// Caller's data version; opening a store written under a different
    /// version fails
    pub app_version: u32,
    /// Maximum total value bytes before least-recently-used entries are
    /// dropped
    pub max_bytes: u64,
}

impl Default for DiskStoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./data/cache"),
            app_version: 1,
            max_bytes: 1024 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct EntryMeta {
    size: u64,
    checksum: u32,
}

struct StoreState {
    /// Live entries in recency order; rebuilt from the journal on open.
    index: LruCache<String, EntryMeta>,
    total_bytes: u64,
    journal: BufWriter<File>,
    /// Journal records no longer backed by a live entry.
    redundant_ops: usize,
    active_edits: HashSet<String>,
    closed: bool,
}

/// Persistent key/blob store bounded by total byte size.
///
/// One operation runs at a time; all of them may block on file I/O. Entry
/// reads refresh recency, and recency survives restarts through the
/// journal.
pub struct DiskStore {
    config: DiskStoreConfig,
    state: Mutex<StoreState>,
}

impl DiskStore {
    /// Open or create a store in `config.directory`.
    ///
    /// Fails if the directory is unusable, holds a foreign file where the
    /// journal belongs, or was written under a different format or app
    /// version. A journal with a torn tail is tolerated and rewritten.
    pub fn open(config: DiskStoreConfig) -> Result<Self> {
        if config.max_bytes == 0 {
            return Err(CacheError::Config(
                "disk capacity must be greater than zero".to_string(),
            ));
        }
        fs::create_dir_all(&config.directory)?;
        let journal_path = config.directory.join(JOURNAL_FILE);

        let mut index: LruCache<String, EntryMeta> = LruCache::unbounded();
        let mut record_count = 0usize;
        let mut needs_rewrite = false;

        if journal_path.exists() {
            let mut reader = BufReader::new(File::open(&journal_path)?);
            let header = journal::read_header(&mut reader)?;
            if header.app_version != config.app_version {
                return Err(CacheError::VersionMismatch {
                    expected: config.app_version,
                    found: header.app_version,
                });
            }
            let replay = journal::replay(&mut reader);
            needs_rewrite = replay.damaged;
            record_count = replay.records.len();
            for record in replay.records {
                match record {
                    JournalRecord::Put {
                        key,
                        size,
                        checksum,
                    } => {
                        index.put(key, EntryMeta { size, checksum });
                    }
                    JournalRecord::Remove { key } => {
                        index.pop(&key);
                    }
                    JournalRecord::Touch { key } => {
                        index.get(&key);
                    }
                }
            }
        } else {
            let mut file = File::create(&journal_path)?;
            journal::write_header(
                &mut file,
                &Header {
                    format_version: journal::FORMAT_VERSION,
                    app_version: config.app_version,
                },
            )?;
            file.sync_all()?;
        }

        let dropped = reconcile(&config.directory, &mut index)?;
        needs_rewrite = needs_rewrite || dropped > 0;
        let redundant_ops = record_count.saturating_sub(index.len());
        let total_bytes: u64 = index.iter().map(|(_, meta)| meta.size).sum();

        let file = OpenOptions::new().append(true).open(&journal_path)?;
        let store = Self {
            config,
            state: Mutex::new(StoreState {
                index,
                total_bytes,
                journal: BufWriter::new(file),
                redundant_ops,
                active_edits: HashSet::new(),
                closed: false,
            }),
        };

        {
            let mut state = store.state.lock();
            if needs_rewrite {
                store.rewrite_journal_locked(&mut state)?;
            }
            store.trim_locked(&mut state)?;
            info!(
                "Disk store opened at {:?}: {} entries, {} bytes",
                store.config.directory,
                state.index.len(),
                state.total_bytes
            );
        }
        Ok(store)
    }

    /// Read the blob stored under `key`, refreshing its recency.
    ///
    /// A missing value file drops the entry and reads as absent; a checksum
    /// mismatch drops the entry and surfaces the corruption.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut state = self.state.lock();
        self.ensure_open(&state)?;
        let Some(meta) = state.index.get(key).copied() else {
            return Ok(None);
        };

        let bytes = match fs::read(self.value_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Value file missing for key={}, dropping entry", key);
                self.remove_locked(&mut state, key)?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let actual = crc32fast::hash(&bytes);
        if actual != meta.checksum {
            warn!(
                "Checksum mismatch for key={}: expected {:#010x}, got {:#010x}; dropping entry",
                key, meta.checksum, actual
            );
            self.remove_locked(&mut state, key)?;
            return Err(CacheError::ChecksumMismatch {
                expected: meta.checksum,
                actual,
            });
        }

        journal::write_record(
            &mut state.journal,
            &JournalRecord::Touch {
                key: key.to_string(),
            },
        )?;
        state.redundant_ops += 1;
        self.maybe_compact_locked(&mut state)?;
        Ok(Some(bytes))
    }

    /// Begin writing a value for `key`.
    ///
    /// Returns `Ok(None)` while another editor for the same key is alive.
    /// The previous value, if any, stays readable until the edit commits.
    pub fn edit(&self, key: &str) -> Result<Option<Edit<'_>>> {
        let mut state = self.state.lock();
        self.ensure_open(&state)?;
        if !state.active_edits.insert(key.to_string()) {
            debug!("Edit already in progress for key={}", key);
            return Ok(None);
        }
        Ok(Some(Edit {
            store: self,
            key: key.to_string(),
            buffer: Vec::new(),
            finished: false,
        }))
    }

    /// Remove `key` and its value file.
    ///
    /// Returns false when the key is absent or currently under edit.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut state = self.state.lock();
        self.ensure_open(&state)?;
        if state.active_edits.contains(key) {
            debug!("Remove skipped for key={}: edit in progress", key);
            return Ok(false);
        }
        self.remove_locked(&mut state, key)
    }

    /// Close the store and delete everything in its directory, including
    /// files the store did not create. The directory itself is kept.
    pub fn delete(&self) -> Result<()> {
        self.close()?;
        let mut state = self.state.lock();
        info!("Deleting disk store at {:?}", self.config.directory);
        for entry in fs::read_dir(&self.config.directory)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        state.index.clear();
        state.total_bytes = 0;
        Ok(())
    }

    /// Flush buffered journal records to durable storage.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.ensure_open(&state)?;
        state.journal.flush()?;
        state.journal.get_ref().sync_all()?;
        Ok(())
    }

    /// Flush and stop accepting operations. Idempotent.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        state.journal.flush()?;
        state.journal.get_ref().sync_all()?;
        state.closed = true;
        debug!("Disk store at {:?} closed", self.config.directory);
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Total bytes of stored values.
    pub fn size(&self) -> u64 {
        self.state.lock().total_bytes
    }

    /// Maximum total bytes before eviction.
    pub fn capacity(&self) -> u64 {
        self.config.max_bytes
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    fn ensure_open(&self, state: &StoreState) -> Result<()> {
        if state.closed {
            Err(CacheError::StoreClosed)
        } else {
            Ok(())
        }
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.config
            .directory
            .join(format!("{}{}", value_file_stem(key), VALUE_SUFFIX))
    }

    fn tmp_path(&self, key: &str) -> PathBuf {
        self.config
            .directory
            .join(format!("{}{}", value_file_stem(key), TMP_SUFFIX))
    }

    fn remove_locked(&self, state: &mut StoreState, key: &str) -> Result<bool> {
        if !state.index.contains(key) {
            return Ok(false);
        }
        remove_value_file(&self.value_path(key))?;
        if let Some(meta) = state.index.pop(key) {
            state.total_bytes -= meta.size;
        }
        // both the Put and the Remove record are now dead weight
        state.redundant_ops += 2;
        journal::write_record(
            &mut state.journal,
            &JournalRecord::Remove {
                key: key.to_string(),
            },
        )?;
        state.journal.flush()?;
        debug!("Removed key={} from disk", key);
        self.maybe_compact_locked(state)?;
        Ok(true)
    }

    fn commit_edit(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let checksum = crc32fast::hash(&bytes);
        let size = bytes.len() as u64;
        let tmp_path = self.tmp_path(key);

        // the editor registration keeps this path private, so the write can
        // happen outside the store lock
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&bytes)?;
        }

        let mut state = self.state.lock();
        if state.closed {
            let _ = fs::remove_file(&tmp_path);
            return Err(CacheError::StoreClosed);
        }
        fs::rename(&tmp_path, self.value_path(key))?;
        if let Some(old) = state.index.put(key.to_string(), EntryMeta { size, checksum }) {
            state.total_bytes -= old.size;
            state.redundant_ops += 1;
        }
        state.total_bytes += size;
        journal::write_record(
            &mut state.journal,
            &JournalRecord::Put {
                key: key.to_string(),
                size,
                checksum,
            },
        )?;
        state.journal.flush()?;
        debug!("Committed key={} ({} bytes) to disk", key, size);
        self.trim_locked(&mut state)?;
        self.maybe_compact_locked(&mut state)?;
        Ok(())
    }

    fn release_edit(&self, key: &str) {
        self.state.lock().active_edits.remove(key);
    }

    fn trim_locked(&self, state: &mut StoreState) -> Result<()> {
        let mut evicted = 0usize;
        let mut result = Ok(());
        while state.total_bytes > self.config.max_bytes {
            // oldest key not pinned by an in-flight edit; scanning instead
            // of popping leaves skipped entries in their recency slots
            let active = &state.active_edits;
            let victim = state
                .index
                .iter()
                .rev()
                .find(|(key, _)| !active.contains(key.as_str()))
                .map(|(key, _)| key.clone());
            let Some(key) = victim else {
                break;
            };
            if let Err(e) = remove_value_file(&self.value_path(&key)) {
                result = Err(e);
                break;
            }
            let Some(meta) = state.index.pop(&key) else {
                break;
            };
            state.total_bytes -= meta.size;
            state.redundant_ops += 2;
            debug!("Evicting key={} ({} bytes) from disk", key, meta.size);
            if let Err(e) = journal::write_record(&mut state.journal, &JournalRecord::Remove { key })
            {
                result = Err(e);
                break;
            }
            evicted += 1;
        }
        if evicted > 0 {
            state.journal.flush()?;
        }
        result
    }

    fn maybe_compact_locked(&self, state: &mut StoreState) -> Result<()> {
        if state.redundant_ops >= journal::COMPACT_THRESHOLD
            && state.redundant_ops >= state.index.len()
        {
            self.rewrite_journal_locked(state)?;
        }
        Ok(())
    }

    /// Replace the journal with one Put per live entry, atomically.
    fn rewrite_journal_locked(&self, state: &mut StoreState) -> Result<()> {
        let tmp_path = self.config.directory.join(format!("{JOURNAL_FILE}{TMP_SUFFIX}"));
        let journal_path = self.config.directory.join(JOURNAL_FILE);
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            journal::write_header(
                &mut writer,
                &Header {
                    format_version: journal::FORMAT_VERSION,
                    app_version: self.config.app_version,
                },
            )?;
            // written least recent first so replay rebuilds the same order
            let live: Vec<(String, EntryMeta)> = state
                .index
                .iter()
                .map(|(key, meta)| (key.clone(), *meta))
                .collect();
            for (key, meta) in live.iter().rev() {
                journal::write_record(
                    &mut writer,
                    &JournalRecord::Put {
                        key: key.clone(),
                        size: meta.size,
                        checksum: meta.checksum,
                    },
                )?;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &journal_path)?;
        let file = OpenOptions::new().append(true).open(&journal_path)?;
        state.journal = BufWriter::new(file);
        state.redundant_ops = 0;
        info!("Journal rewritten: {} live entries", state.index.len());
        Ok(())
    }
}

/// In-flight write for one key. Buffered until [`Edit::commit`]; dropping
/// the editor without committing leaves the previous value untouched.
pub struct Edit<'a> {
    store: &'a DiskStore,
    key: String,
    buffer: Vec<u8>,
    finished: bool,
}

impl Edit<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Atomically publish the buffered bytes as the value for this key.
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        let key = std::mem::take(&mut self.key);
        let buffer = std::mem::take(&mut self.buffer);
        let result = self.store.commit_edit(&key, buffer);
        self.store.release_edit(&key);
        result
    }

    /// Discard the buffered bytes. Dropping the editor does the same.
    pub fn abort(self) {}
}

impl Write for Edit<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Edit<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.store.release_edit(&self.key);
        }
    }
}

fn value_file_stem(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

fn remove_value_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Bring the directory and the replayed index into agreement: stale temp
/// files and value files the journal never committed are deleted, and index
/// entries whose value file disappeared are dropped. Returns the number of
/// dropped entries.
fn reconcile(directory: &Path, index: &mut LruCache<String, EntryMeta>) -> Result<usize> {
    let mut value_files: HashSet<String> = HashSet::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == JOURNAL_FILE {
            continue;
        }
        if name.ends_with(TMP_SUFFIX) {
            debug!("Removing stale temp file {:?}", entry.path());
            fs::remove_file(entry.path())?;
            continue;
        }
        if name.ends_with(VALUE_SUFFIX) {
            value_files.insert(name);
        }
    }

    let keys: Vec<String> = index.iter().map(|(key, _)| key.clone()).collect();
    let mut referenced: HashSet<String> = HashSet::new();
    let mut dropped = 0usize;
    for key in keys {
        let file = format!("{}{}", value_file_stem(&key), VALUE_SUFFIX);
        if value_files.contains(&file) {
            referenced.insert(file);
        } else {
            warn!("Value file missing for key={}, dropping entry", key);
            index.pop(&key);
            dropped += 1;
        }
    }
    for file in value_files.difference(&referenced) {
        debug!("Removing unreferenced value file {}", file);
        fs::remove_file(directory.join(file))?;
    }
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config(directory: &Path, max_bytes: u64) -> DiskStoreConfig {
        DiskStoreConfig {
            directory: directory.to_path_buf(),
            app_version: 1,
            max_bytes,
        }
    }

    fn put(store: &DiskStore, key: &str, value: &[u8]) {
        let mut edit = store.edit(key).unwrap().expect("editor available");
        edit.write_all(value).unwrap();
        edit.commit().unwrap();
    }

    #[test]
    fn test_put_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 1024)).unwrap();

        assert_eq!(store.get("k").unwrap(), None);
        put(&store, "k", b"value");
        assert_eq!(store.get("k").unwrap(), Some(b"value".to_vec()));
        assert_eq!(store.size(), 5);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let dir = tempdir().unwrap();
        let result = DiskStore::open(test_config(dir.path(), 0));
        assert!(matches!(result, Err(CacheError::Config(_))));
        // config failures must not touch the directory
        assert!(!dir.path().join(JOURNAL_FILE).exists());
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 1024)).unwrap();
        put(&store, "k", b"first");
        put(&store, "k", b"second!");
        assert_eq!(store.get("k").unwrap(), Some(b"second!".to_vec()));
        assert_eq!(store.size(), 7);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 1024)).unwrap();
        put(&store, "k", b"value");

        assert!(store.remove("k").unwrap());
        assert_eq!(store.get("k").unwrap(), None);
        assert_eq!(store.size(), 0);
        assert!(!store.remove("k").unwrap());
    }

    #[test]
    fn test_eviction_prefers_least_recently_used() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 10)).unwrap();
        put(&store, "a", b"aaaa");
        put(&store, "b", b"bbbb");
        // reading "a" makes "b" the eviction candidate
        store.get("a").unwrap();
        put(&store, "c", b"cccc");

        assert_eq!(store.get("b").unwrap(), None);
        assert_eq!(store.get("a").unwrap(), Some(b"aaaa".to_vec()));
        assert_eq!(store.get("c").unwrap(), Some(b"cccc".to_vec()));
        assert_eq!(store.size(), 8);
    }

    #[test]
    fn test_trim_skips_key_under_edit_without_promoting_it() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 10)).unwrap();
        put(&store, "a", b"aaaa");
        put(&store, "b", b"bbbb");

        // "a" is oldest but pinned by an open editor, so making room for
        // "c" reaches past it and drops "b" instead
        let edit = store.edit("a").unwrap().expect("editor available");
        put(&store, "c", b"cccc");
        assert_eq!(store.get("b").unwrap(), None);
        assert_eq!(store.len(), 2);

        edit.abort();
        // being pinned must not have refreshed "a": it still ranks oldest,
        // so the next overflow evicts it rather than "c"
        put(&store, "d", b"dddd");
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("c").unwrap(), Some(b"cccc".to_vec()));
        assert_eq!(store.get("d").unwrap(), Some(b"dddd".to_vec()));
        assert_eq!(store.size(), 8);
    }

    #[test]
    fn test_edit_is_exclusive_per_key() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 1024)).unwrap();

        let first = store.edit("k").unwrap().expect("editor available");
        assert!(store.edit("k").unwrap().is_none());
        // a different key is unaffected
        assert!(store.edit("other").unwrap().is_some());
        drop(first);
        assert!(store.edit("k").unwrap().is_some());
    }

    #[test]
    fn test_abort_keeps_previous_value() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 1024)).unwrap();
        put(&store, "k", b"keep me");

        let mut edit = store.edit("k").unwrap().expect("editor available");
        edit.write_all(b"discard me").unwrap();
        edit.abort();

        assert_eq!(store.get("k").unwrap(), Some(b"keep me".to_vec()));
    }

    #[test]
    fn test_remove_refused_while_editing() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 1024)).unwrap();
        put(&store, "k", b"value");

        let edit = store.edit("k").unwrap().expect("editor available");
        assert!(!store.remove("k").unwrap());
        drop(edit);
        assert!(store.remove("k").unwrap());
    }

    #[test]
    fn test_checksum_mismatch_drops_entry() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 1024)).unwrap();
        put(&store, "k", b"pristine");

        // corrupt the value file behind the store's back
        let path = store.value_path("k");
        fs::write(&path, b"scribble").unwrap();

        let err = store.get("k").unwrap_err();
        assert!(matches!(err, CacheError::ChecksumMismatch { .. }));
        // the entry self-healed into absence
        assert_eq!(store.get("k").unwrap(), None);
        assert!(!path.exists());
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn test_missing_value_file_reads_as_absent() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 1024)).unwrap();
        put(&store, "k", b"value");

        fs::remove_file(store.value_path("k")).unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_closed_store_refuses_operations() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 1024)).unwrap();
        put(&store, "k", b"value");

        store.close().unwrap();
        assert!(store.is_closed());
        // close is idempotent
        store.close().unwrap();

        assert!(matches!(store.get("k"), Err(CacheError::StoreClosed)));
        assert!(matches!(store.edit("k"), Err(CacheError::StoreClosed)));
        assert!(matches!(store.remove("k"), Err(CacheError::StoreClosed)));
        assert!(matches!(store.flush(), Err(CacheError::StoreClosed)));
    }

    #[test]
    fn test_commit_after_close_fails_cleanly() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 1024)).unwrap();

        let mut edit = store.edit("k").unwrap().expect("editor available");
        edit.write_all(b"late").unwrap();
        store.close().unwrap();

        assert!(matches!(edit.commit(), Err(CacheError::StoreClosed)));
        // no stray temp file remains
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(TMP_SUFFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_delete_wipes_directory_contents() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(test_config(dir.path(), 1024)).unwrap();
        put(&store, "k", b"value");
        // files the store did not create are wiped too
        fs::write(dir.path().join("foreign.txt"), b"junk").unwrap();

        store.delete().unwrap();
        assert!(store.is_closed());
        assert!(dir.path().exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
