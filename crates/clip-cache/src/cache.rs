//! File-backed clip storage with per-entry eviction timers

use crate::error::{CacheError, Result};
use crate::key::CacheKey;
use crate::types::{CacheEntry, CacheStats, EntryRef};
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Extension of stored clips
pub const ENTRY_EXTENSION: &str = "mp3";

/// Extension of in-progress writes; never visible under an entry name
const TEMP_EXTENSION: &str = "part";

/// rw-r--r--
#[cfg(unix)]
const ENTRY_MODE: u32 = 0o644;

struct EvictionTimer {
    id: u64,
    handle: AbortHandle,
}

/// A clip cache backed by a flat directory of `<key>.mp3` files
#[derive(Clone)]
pub struct ClipCache {
    /// Directory where clips are stored
    cache_dir: PathBuf,
    /// In-memory metadata for entries written by this process
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    /// Pending eviction timers, one per key
    timers: Arc<Mutex<HashMap<CacheKey, EvictionTimer>>>,
    /// Source of temp file suffixes and timer ids
    next_id: Arc<AtomicU64>,
    /// Eviction counter
    evictions: Arc<AtomicU64>,
}

impl ClipCache {
    /// Create a new clip cache rooted at `cache_dir`
    pub fn new(cache_dir: PathBuf) -> Self {
        let cache_dir = std::path::absolute(&cache_dir).unwrap_or(cache_dir);
        Self {
            cache_dir,
            entries: Arc::new(RwLock::new(HashMap::new())),
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            evictions: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Ensure the cache directory exists and drop anything a previous
    /// process left behind (its eviction timers died with it).
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.cache_dir).await?;
        let removed = self.sweep().await?;
        info!(cache_dir = ?self.cache_dir, removed, "Cache initialized");
        Ok(())
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the file backing `key`
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(entry_file_name(key))
    }

    /// True iff a clip for `key` is currently on disk
    pub async fn exists(&self, key: &CacheKey) -> bool {
        fs::metadata(self.entry_path(key))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    /// Store a clip held in memory
    pub async fn put(&self, key: &CacheKey, data: &[u8]) -> Result<EntryRef> {
        let chunk = Ok::<_, std::convert::Infallible>(data);
        self.put_stream(key, futures_util::stream::iter([chunk]))
            .await
    }

    /// Store a clip from a chunk stream.
    ///
    /// Chunks go to a temp file in the cache directory which is renamed into
    /// place only after the stream ends cleanly. On any failure the temp file
    /// is removed, so a reader never sees a partial clip.
    pub async fn put_stream<S, B, E>(&self, key: &CacheKey, stream: S) -> Result<EntryRef>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let temp_path = self
            .cache_dir
            .join(format!(".{}.{}.{}", key, id, TEMP_EXTENSION));
        let path = self.entry_path(key);

        let written = match write_file(&temp_path, stream).await {
            Ok(size) => fs::rename(&temp_path, &path)
                .await
                .map(|_| size)
                .map_err(CacheError::from),
            Err(e) => Err(e),
        };

        let size = match written {
            Ok(size) => size,
            Err(e) => {
                discard_temp(&temp_path).await;
                return Err(e);
            }
        };

        let entry = CacheEntry {
            key: key.clone(),
            path: path.clone(),
            size,
            created_at: Utc::now(),
        };
        self.entries.write().await.insert(key.clone(), entry);
        debug!(key = %key, size, "Stored clip");

        Ok(EntryRef {
            file_name: entry_file_name(key),
            path,
            size,
        })
    }

    /// Remove the clip for `key` once `delay` has elapsed.
    ///
    /// A timer already pending for `key` is aborted and replaced, so an older
    /// timer can never delete a clip written after it was scheduled. Reads do
    /// not touch timers.
    pub fn schedule_evict(&self, key: &CacheKey, delay: Duration) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cache = self.clone();
        let task_key = key.clone();

        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            cache.remove(&task_key).await;
            cache.evictions.fetch_add(1, Ordering::Relaxed);
            cache.finish_timer(&task_key, id);
        })
        .abort_handle();

        if let Some(prior) = timers.insert(key.clone(), EvictionTimer { id, handle }) {
            prior.handle.abort();
            debug!(key = %key, "Replaced pending eviction");
        }
        debug!(key = %key, delay_ms = delay.as_millis() as u64, "Scheduled eviction");
    }

    /// Delete the clip for `key` now. Failures are logged, never returned:
    /// nobody waits on an eviction.
    pub async fn remove(&self, key: &CacheKey) {
        self.entries.write().await.remove(key);

        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => debug!(key = %key, "Evicted clip"),
            Err(e) => warn!(key = %key, path = ?path, error = %e, "Failed to remove clip"),
        }
    }

    /// Get current cache statistics
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let pending_evictions = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();

        CacheStats {
            entries: entries.len(),
            total_size: entries.values().map(|e| e.size).sum(),
            pending_evictions,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn finish_timer(&self, key: &CacheKey, id: u64) {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        if timers.get(key).is_some_and(|t| t.id == id) {
            timers.remove(key);
        }
    }

    /// Remove clips and temp files found in the cache directory.
    ///
    /// Only names this cache produces are touched: `<key>.mp3` for a valid
    /// key and `.<key>.<n>.part`. Each removal is logged at warn level.
    async fn sweep(&self) -> Result<usize> {
        let mut removed = 0;
        let mut dir = fs::read_dir(&self.cache_dir).await?;

        while let Some(item) = dir.next_entry().await? {
            if !item.file_type().await?.is_file() {
                continue;
            }

            let name = item.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if CacheKey::from_file_name(name).is_none() && !is_temp_file_name(name) {
                continue;
            }

            let path = item.path();
            match fs::remove_file(&path).await {
                Ok(()) => {
                    warn!(path = ?path, "Removed file left by a previous run");
                    removed += 1;
                }
                Err(e) => warn!(path = ?path, error = %e, "Failed to remove leftover file"),
            }
        }

        Ok(removed)
    }
}

fn entry_file_name(key: &CacheKey) -> String {
    format!("{}.{}", key, ENTRY_EXTENSION)
}

/// Matches the `.<key>.<n>.part` names written by `put_stream`
fn is_temp_file_name(name: &str) -> bool {
    let Some(inner) = name
        .strip_prefix('.')
        .and_then(|n| n.strip_suffix(TEMP_EXTENSION))
        .and_then(|n| n.strip_suffix('.'))
    else {
        return false;
    };

    match inner.rsplit_once('.') {
        Some((stem, id)) => {
            id.parse::<u64>().is_ok() && CacheKey::parse(stem).is_ok_and(|k| k.as_str() == stem)
        }
        None => false,
    }
}

async fn write_file<S, B, E>(path: &Path, stream: S) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut file = fs::File::create(path).await?;
    let mut stream = std::pin::pin!(stream);
    let mut size = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| CacheError::Stream(e.into()))?;
        let bytes = chunk.as_ref();
        file.write_all(bytes).await?;
        size += bytes.len() as u64;
    }

    file.flush().await?;
    drop(file);
    set_entry_mode(path).await?;

    Ok(size)
}

#[cfg(unix)]
async fn set_entry_mode(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(ENTRY_MODE)).await
}

#[cfg(not(unix))]
async fn set_entry_mode(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

async fn discard_temp(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = ?path, error = %e, "Failed to remove temp file");
        }
    }
}
