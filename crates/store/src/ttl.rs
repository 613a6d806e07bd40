//! TTL wrapper over a [`KvStore`].
//!
//! Every value is stored with its write timestamp and re-validated on
//! read; expired and corrupt entries are evicted at read time. There is
//! no background sweep.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use common::CacheEntry;

use crate::kv::KvStore;

/// Millisecond clock, injectable so TTL tests don't sleep.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Epoch millis from the wall clock.
pub fn wall_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn KvStore>,
    now_ms: Clock,
}

#[derive(Serialize)]
struct BorrowedEntry<'a, T: Serialize> {
    payload: &'a T,
    written_at: i64,
}

impl TtlCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_clock(store, Arc::new(wall_clock_ms))
    }

    pub fn with_clock(store: Arc<dyn KvStore>, now_ms: Clock) -> Self {
        Self { store, now_ms }
    }

    /// Store `payload` under `key`, stamped with the current time.
    ///
    /// Best-effort: serialization and write failures are swallowed.
    pub fn set<T: Serialize>(&self, key: &str, payload: &T) {
        let entry = BorrowedEntry {
            payload,
            written_at: (self.now_ms)(),
        };
        match serde_json::to_string(&entry) {
            Ok(raw) => self.store.set(key, &raw),
            Err(e) => warn!("cache serialize failed for {}: {}", key, e),
        }
    }

    /// Read `key` if present and younger than `ttl_ms`.
    ///
    /// Expired and unparseable entries are deleted and reported as
    /// absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str, ttl_ms: i64) -> Option<T> {
        let raw = self.store.get(key)?;

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("evicting corrupt cache entry {}: {}", key, e);
                self.store.delete(key);
                return None;
            }
        };

        let age_ms = (self.now_ms)() - entry.written_at;
        if age_ms > ttl_ms {
            debug!("evicting expired cache entry {} (age {}ms)", key, age_ms);
            self.store.delete(key);
            return None;
        }

        Some(entry.payload)
    }

    /// Drop `key` unconditionally.
    pub fn invalidate(&self, key: &str) {
        self.store.delete(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use common::{Series, SeriesPoint};
    use std::sync::atomic::{AtomicI64, Ordering};

    fn fixed_series() -> Series {
        vec![
            SeriesPoint::new(1_700_000_000_000, 2834.5),
            SeriesPoint::new(1_700_086_400_000, 2851.0),
        ]
    }

    fn test_cache() -> (Arc<MemoryStore>, TtlCache, Arc<AtomicI64>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(AtomicI64::new(1_000_000));
        let clock_handle = Arc::clone(&clock);
        let cache = TtlCache::with_clock(
            store.clone() as Arc<dyn KvStore>,
            Arc::new(move || clock_handle.load(Ordering::SeqCst)),
        );
        (store, cache, clock)
    }

    #[test]
    fn test_fresh_entry_is_returned() {
        let (_store, cache, clock) = test_cache();
        cache.set("k", &fixed_series());

        clock.fetch_add(5_999, Ordering::SeqCst);
        let got: Option<Series> = cache.get("k", 6_000);
        assert_eq!(got, Some(fixed_series()));
    }

    #[test]
    fn test_expired_entry_is_evicted_from_store() {
        let (store, cache, clock) = test_cache();
        cache.set("k", &fixed_series());

        clock.fetch_add(6_001, Ordering::SeqCst);
        let got: Option<Series> = cache.get("k", 6_000);
        assert_eq!(got, None);
        // Eager eviction: gone from the underlying store too.
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_read_at_exact_ttl_boundary_still_fresh() {
        let (_store, cache, clock) = test_cache();
        cache.set("k", &fixed_series());

        clock.fetch_add(6_000, Ordering::SeqCst);
        let got: Option<Series> = cache.get("k", 6_000);
        assert!(got.is_some());
    }

    #[test]
    fn test_corrupt_entry_treated_as_absent() {
        let (store, cache, _clock) = test_cache();
        store.set("k", "{not json");

        let got: Option<Series> = cache.get("k", 6_000);
        assert_eq!(got, None);
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_missing_key_is_none() {
        let (_store, cache, _clock) = test_cache();
        let got: Option<Series> = cache.get("absent", 6_000);
        assert_eq!(got, None);
    }

    #[test]
    fn test_set_overwrites_previous_entry() {
        let (_store, cache, _clock) = test_cache();
        cache.set("k", &fixed_series());

        let newer = vec![SeriesPoint::new(1_700_172_800_000, 2900.0)];
        cache.set("k", &newer);

        let got: Option<Series> = cache.get("k", 6_000);
        assert_eq!(got, Some(newer));
    }
}
