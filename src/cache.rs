//! Persisted last-known-good quote cache.
//!
//! The cache is one namespaced JSON blob behind an injected [`KvStore`]
//! capability, so the binary persists to disk while tests swap in an
//! in-memory store. Entries expire softly: anything older than seven days
//! is dropped while loading. Storage failures never propagate; a cache
//! that cannot be written is simply not written.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Storage key of the cache blob; bump the suffix on layout changes.
pub const CACHE_BLOB_KEY: &str = "quoteboard.cache.v1";

/// Entries older than this are treated as absent on read.
pub const MAX_ENTRY_AGE_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Minimal persisted string-to-string storage capability.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    /// Persist `value` under `key`; `false` when storage refused the write.
    fn set(&self, key: &str, value: &str) -> bool;
}

/// Directory-backed store, one file per key.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        if let Err(err) = fs::create_dir_all(&self.dir) {
            warn!(%err, dir = %self.dir.display(), "cache directory unavailable");
            return false;
        }
        match fs::write(self.path_for(key), value) {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, key, "cache write failed");
                false
            }
        }
    }
}

/// In-memory store for tests and ceremony-free preview runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        match self.inner.lock() {
            Ok(mut guard) => {
                guard.insert(key.to_string(), value.to_string());
                true
            }
            Err(_) => false,
        }
    }
}

/// Last written quote fields for one provider+symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_pe: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_high: Option<f64>,
}

impl CachedFields {
    /// Shallow merge: only present, finite incoming values overwrite.
    pub fn merge_from(&mut self, incoming: &CachedFields) {
        keep(&mut self.price, incoming.price);
        keep(&mut self.change_percent, incoming.change_percent);
        keep(&mut self.day_high, incoming.day_high);
        keep(&mut self.day_low, incoming.day_low);
        keep(&mut self.market_cap, incoming.market_cap);
        keep(&mut self.volume, incoming.volume);
        keep(&mut self.trailing_pe, incoming.trailing_pe);
        keep(&mut self.fifty_two_week_high, incoming.fifty_two_week_high);
    }
}

fn keep(slot: &mut Option<f64>, incoming: Option<f64>) {
    if let Some(value) = incoming {
        if value.is_finite() {
            *slot = Some(value);
        }
    }
}

/// One cached quote with its capture stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub fields: CachedFields,
    pub captured_at_ms: i64,
}

/// Namespaced cache key for one provider+symbol pair.
pub fn cache_key(provider: &str, symbol: &str) -> String {
    format!("{provider}:{symbol}")
}

/// Expiring cache over an injected [`KvStore`].
pub struct CacheStore {
    store: Arc<dyn KvStore>,
}

impl CacheStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Read the whole mapping, dropping expired entries as a side effect.
    /// Any decode failure yields an empty mapping.
    pub fn load(&self) -> HashMap<String, CacheEntry> {
        let raw = match self.store.get(CACHE_BLOB_KEY) {
            Some(raw) => raw,
            None => return HashMap::new(),
        };
        let mut entries: HashMap<String, CacheEntry> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(%err, "cache blob unreadable, starting empty");
                return HashMap::new();
            }
        };

        let now = Utc::now().timestamp_millis();
        let before = entries.len();
        entries.retain(|_, entry| now - entry.captured_at_ms <= MAX_ENTRY_AGE_MS);
        if entries.len() != before {
            debug!(purged = before - entries.len(), "expired cache entries dropped");
            self.save(&entries);
        }
        entries
    }

    /// Persist the mapping; a refused write is logged and swallowed.
    pub fn save(&self, entries: &HashMap<String, CacheEntry>) {
        match serde_json::to_string(entries) {
            Ok(raw) => {
                if !self.store.set(CACHE_BLOB_KEY, &raw) {
                    debug!("cache save skipped, storage unavailable");
                }
            }
            Err(err) => debug!(%err, "cache serialize failed"),
        }
    }

    /// Merge `incoming` into the entry for `key` and stamp the capture time.
    pub fn set_entry(&self, key: &str, incoming: &CachedFields) {
        let mut entries = self.load();
        let entry = entries.entry(key.to_string()).or_insert_with(|| CacheEntry {
            fields: CachedFields::default(),
            captured_at_ms: 0,
        });
        entry.fields.merge_from(incoming);
        entry.captured_at_ms = Utc::now().timestamp_millis();
        self.save(&entries);
    }

    pub fn get_entry(&self, key: &str) -> Option<CacheEntry> {
        self.load().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (Arc<MemoryStore>, CacheStore) {
        let kv = Arc::new(MemoryStore::new());
        let cache = CacheStore::new(kv.clone());
        (kv, cache)
    }

    #[test]
    fn merge_ignores_absent_and_non_finite_values() {
        let mut fields = CachedFields {
            price: Some(100.0),
            change_percent: Some(1.0),
            ..CachedFields::default()
        };
        fields.merge_from(&CachedFields {
            price: Some(f64::NAN),
            change_percent: None,
            volume: Some(5e6),
            ..CachedFields::default()
        });
        assert_eq!(fields.price, Some(100.0));
        assert_eq!(fields.change_percent, Some(1.0));
        assert_eq!(fields.volume, Some(5e6));
    }

    #[test]
    fn entries_older_than_seven_days_vanish_on_load() {
        let (kv, cache) = store();
        let now = Utc::now().timestamp_millis();
        let blob = json!({
            "yahoo:AAPL": {"price": 150.23, "captured_at_ms": now - 3_600_000},
            "yahoo:OLD": {"price": 1.0, "captured_at_ms": now - MAX_ENTRY_AGE_MS - 1},
        });
        kv.set(CACHE_BLOB_KEY, &blob.to_string());

        let entries = cache.load();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["yahoo:AAPL"].fields.price, Some(150.23));

        // The purge is persisted, not just filtered in memory.
        let rewritten = kv.get(CACHE_BLOB_KEY).unwrap();
        assert!(!rewritten.contains("yahoo:OLD"));
    }

    #[test]
    fn corrupted_blobs_read_as_empty() {
        let (kv, cache) = store();
        kv.set(CACHE_BLOB_KEY, "{not json");
        assert!(cache.load().is_empty());
        kv.set(CACHE_BLOB_KEY, "[1, 2, 3]");
        assert!(cache.load().is_empty());
    }

    #[test]
    fn set_entry_merges_and_advances_the_capture_stamp() {
        let (_kv, cache) = store();
        cache.set_entry(
            "coingecko:bitcoin",
            &CachedFields {
                price: Some(67_000.0),
                change_percent: Some(-2.3),
                ..CachedFields::default()
            },
        );
        cache.set_entry(
            "coingecko:bitcoin",
            &CachedFields {
                price: Some(67_100.0),
                ..CachedFields::default()
            },
        );

        let entry = cache.get_entry("coingecko:bitcoin").unwrap();
        assert_eq!(entry.fields.price, Some(67_100.0));
        // Untouched fields survive the second write.
        assert_eq!(entry.fields.change_percent, Some(-2.3));
        assert!(entry.captured_at_ms > 0);
        assert!(cache.get_entry("coingecko:ethereum").is_none());
    }

    #[test]
    fn file_store_round_trips_through_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(FileStore::new(dir.path()));
        let cache = CacheStore::new(kv.clone());

        cache.set_entry(
            "yahoo:^GSPC",
            &CachedFields {
                price: Some(5_432.1),
                ..CachedFields::default()
            },
        );

        let reopened = CacheStore::new(Arc::new(FileStore::new(dir.path())));
        let entry = reopened.get_entry("yahoo:^GSPC").unwrap();
        assert_eq!(entry.fields.price, Some(5_432.1));
    }

    #[test]
    fn file_store_write_failure_is_swallowed() {
        // A file path in place of a directory makes create_dir_all fail.
        let file = tempfile::NamedTempFile::new().unwrap();
        let kv = Arc::new(FileStore::new(file.path()));
        let cache = CacheStore::new(kv);
        cache.set_entry(
            "yahoo:AAPL",
            &CachedFields {
                price: Some(1.0),
                ..CachedFields::default()
            },
        );
        assert!(cache.get_entry("yahoo:AAPL").is_none());
    }
}
