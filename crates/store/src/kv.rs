//! Durable string key-value stores.
//!
//! The TTL cache sits on top of this trait; only the fetch coordinator
//! writes through it, so TTL and tier invariants stay centrally enforced.

use std::fs;
use std::path::PathBuf;

use dashmap::DashMap;
use tracing::warn;

/// Synchronous, best-effort string store.
///
/// Write failures are logged and swallowed: caching must never break
/// the caller.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn delete(&self, key: &str);
}

// ── File-backed store ─────────────────────────────────────────────────

/// One JSON file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a cache key to a file path. Keys may contain characters that
    /// are not filename-safe (`^NSEI`, `RELIANCE.NS`), so anything
    /// outside `[A-Za-z0-9._-]` is rewritten.
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.root.join(format!("{name}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = fs::create_dir_all(&self.root) {
            warn!("cache dir {} unavailable: {}", self.root.display(), e);
            return;
        }
        if let Err(e) = fs::write(self.path_for(key), value) {
            warn!("cache write failed for {}: {}", key, e);
        }
    }

    fn delete(&self, key: &str) {
        if let Err(e) = fs::remove_file(self.path_for(key)) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("cache delete failed for {}: {}", key, e);
            }
        }
    }
}

// ── In-memory store ───────────────────────────────────────────────────

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
    }

    fn delete(&self, key: &str) {
        self.map.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn scratch_dir() -> PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("quotefeed-kv-{}-{}", std::process::id(), n))
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k"), None);

        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));

        store.delete("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = scratch_dir();
        let store = FileStore::new(&dir);

        store.set("qf_v2_quote_RELIANCE.NS", r#"{"points":[]}"#);
        assert_eq!(
            store.get("qf_v2_quote_RELIANCE.NS").as_deref(),
            Some(r#"{"points":[]}"#)
        );

        store.delete("qf_v2_quote_RELIANCE.NS");
        assert_eq!(store.get("qf_v2_quote_RELIANCE.NS"), None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let dir = scratch_dir();
        let store = FileStore::new(&dir);

        store.set("qf_v2_quote_^NSEI", "payload");
        assert_eq!(store.get("qf_v2_quote_^NSEI").as_deref(), Some("payload"));
        // Path separators must not escape the cache directory.
        store.set("a/b", "nope");
        assert!(dir.join("a-b.json").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_delete_missing_key_is_silent() {
        let dir = scratch_dir();
        let store = FileStore::new(&dir);
        store.delete("never-written");

        let _ = fs::remove_dir_all(&dir);
    }
}
