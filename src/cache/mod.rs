//! Result cache - fingerprint-keyed entries with lazy TTL eviction
//!
//! One abstraction owns eviction policy and concurrency behavior:
//! backends ([`MemoryCache`], [`SledCache`]) store entries verbatim, and
//! [`CacheManager`] layers TTL checks on top. Expiry is checked against
//! entry age at read time; there is no background sweep. A backend fault
//! is never fatal to a pipeline call: the orchestrator treats it as a
//! miss and recomputes.

mod fingerprint;

pub use fingerprint::fingerprint;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::types::PipelineResult;

/// Cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for CacheError {
    fn from(err: sled::Error) -> Self {
        CacheError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// One cached pipeline result plus its lifetime bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: PipelineResult,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Entry age relative to `now`, saturating at zero for clock skew.
    pub fn age_ms(&self, now: DateTime<Utc>) -> u64 {
        (now - self.stored_at).num_milliseconds().max(0) as u64
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Key/value backend consumed by [`CacheManager`].
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks, tolerate concurrent reads, and resolve concurrent
/// writes to the same key as last-writer-wins.
pub trait InsightCache: Send + Sync {
    /// Fetch an entry as stored. TTL is not interpreted here.
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Store an entry, replacing any live entry under the same key.
    fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Drop an entry if present.
    fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Drop every entry.
    fn clear(&self) -> Result<(), CacheError>;

    /// All live keys, for maintenance sweeps.
    fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Number of stored entries, expired ones included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

// ============================================================================
// In-Memory Backend
// ============================================================================

/// In-memory cache for tests and minimal deployments.
///
/// Thread-safe via `RwLock`. Not durable; entries lost on restart.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InsightCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        entries.insert(key.to_string(), entry.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        entries.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(entries.keys().cloned().collect())
    }

    fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

// ============================================================================
// Sled Backend
// ============================================================================

/// Durable cache on a sled embedded database.
///
/// Values are serde_json-encoded [`CacheEntry`] blobs. An undecodable
/// value (written by an incompatible build, or torn) is dropped and
/// reported as a miss rather than failing the read.
pub struct SledCache {
    db: Db,
}

impl SledCache {
    /// Open or create the cache database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an ephemeral database (for tests and throwaway runs).
    pub fn open_temp() -> Result<Self, CacheError> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Ok(Self { db })
    }

    /// Flush any pending writes to disk.
    pub fn flush(&self) -> Result<(), CacheError> {
        self.db.flush()?;
        Ok(())
    }

    #[cfg(test)]
    fn insert_raw(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        self.db.insert(key.as_bytes(), bytes)?;
        Ok(())
    }
}

impl InsightCache for SledCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let bytes = match self.db.get(key.as_bytes())? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                let _ = self.db.remove(key.as_bytes());
                Ok(None)
            }
        }
    }

    fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let value = serde_json::to_vec(entry)?;
        self.db.insert(key.as_bytes(), value)?;
        debug!(key = %key, "Stored cache entry");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.db.remove(key.as_bytes())?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.db.clear()?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys = Vec::with_capacity(self.db.len());
        for item in self.db.iter() {
            let (key, _) = item?;
            if let Ok(key_str) = std::str::from_utf8(&key) {
                keys.push(key_str.to_string());
            }
        }
        Ok(keys)
    }

    fn len(&self) -> usize {
        self.db.len()
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}

// ============================================================================
// Cache Manager
// ============================================================================

/// Counter snapshot for diagnostics.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Reads that found an entry past its lifetime and dropped it.
    pub expired_evictions: u64,
}

/// TTL-aware front over a cache backend.
///
/// All lifetime decisions happen here so they are testable without any
/// particular backend. Callers pass `now` explicitly; the manager never
/// reads the clock itself.
pub struct CacheManager {
    backend: Arc<dyn InsightCache>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    expired_evictions: AtomicU64,
}

impl CacheManager {
    pub fn new(backend: Arc<dyn InsightCache>, ttl_ms: u64) -> Self {
        Self {
            backend,
            ttl: Duration::milliseconds(ttl_ms as i64),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired_evictions: AtomicU64::new(0),
        }
    }

    /// Fetch a live entry. Expired entries are evicted and reported as
    /// absent; an eviction failure is logged, not propagated, so a stale
    /// backend can never block recomputation.
    pub fn fetch(&self, key: &str, now: DateTime<Utc>) -> Result<Option<CacheEntry>, CacheError> {
        match self.backend.get(key)? {
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Some(entry) if entry.is_expired(now) => {
                self.expired_evictions.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = self.backend.remove(key) {
                    warn!(key = %key, error = %e, "Failed to evict expired cache entry");
                }
                debug!(key = %key, "Cache entry expired");
                Ok(None)
            }
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, age_ms = entry.age_ms(now), "Cache hit");
                Ok(Some(entry))
            }
        }
    }

    /// Store `result` under `key` with the configured lifetime.
    pub fn store(
        &self,
        key: &str,
        result: &PipelineResult,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            result: result.clone(),
            stored_at: now,
            expires_at: now + self.ttl,
        };
        self.backend.put(key, &entry)
    }

    /// Sweep every expired entry out of the backend. Returns the number
    /// of entries dropped. Optional maintenance; reads stay correct
    /// without it.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let mut purged = 0;
        for key in self.backend.keys()? {
            if let Some(entry) = self.backend.get(&key)? {
                if entry.is_expired(now) {
                    self.backend.remove(&key)?;
                    purged += 1;
                }
            }
        }
        if purged > 0 {
            debug!(purged, "Purged expired cache entries");
        }
        Ok(purged)
    }

    /// Drop every entry, live or expired.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.backend.clear()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.backend.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired_evictions: self.expired_evictions.load(Ordering::Relaxed),
        }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl.num_milliseconds().max(0) as u64
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }
}
