//! In-flight request registry.
//!
//! Coalesces concurrent fetches for one key into a single operation:
//! the first caller starts the fetch, later callers join the same
//! shared future. The registry entry is removed inside the shared
//! future, before its value is visible, so a call issued right after
//! completion can never observe a stale pending entry.

use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use tracing::debug;

type SharedFetch<T> = Shared<BoxFuture<'static, T>>;

pub struct InflightRegistry<T: Clone + Send + Sync + 'static> {
    pending: Arc<DashMap<String, SharedFetch<T>>>,
}

impl<T: Clone + Send + Sync + 'static> Default for InflightRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> InflightRegistry<T> {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Join the pending fetch for `key`, or start one via `factory`.
    pub async fn coalesce<F, Fut>(&self, key: &str, factory: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let fetch = match self.pending.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                debug!("{}: joining in-flight fetch", key);
                entry.get().clone()
            }
            Entry::Vacant(slot) => {
                let pending = Arc::clone(&self.pending);
                let owned_key = key.to_string();
                let inner = factory();
                let fetch = async move {
                    let result = inner.await;
                    // Unregister before any observer sees the value,
                    // success and failure alike.
                    pending.remove(&owned_key);
                    result
                }
                .boxed()
                .shared();
                slot.insert(fetch.clone());
                fetch
            }
        };

        fetch.await
    }

    /// Number of fetches currently in flight.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_concurrent_calls_share_one_fetch() {
        let registry = Arc::new(InflightRegistry::<Vec<i64>>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let registry = Arc::clone(&registry);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                registry
                    .coalesce("NIFTY50", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(30)).await;
                        vec![1, 2, 3]
                    })
                    .await
            }));
        }

        for handle in handles {
            let result = handle.await.expect("task should not panic");
            assert_eq!(result, vec![1, 2, 3]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entry_removed_after_completion() {
        let registry = InflightRegistry::<i64>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first_calls = Arc::clone(&calls);
        let first = registry
            .coalesce("K", move || async move {
                first_calls.fetch_add(1, Ordering::SeqCst);
                7
            })
            .await;
        assert_eq!(first, 7);
        assert!(registry.is_empty());

        // A fresh call after completion starts a new fetch.
        let second_calls = Arc::clone(&calls);
        let second = registry
            .coalesce("K", move || async move {
                second_calls.fetch_add(1, Ordering::SeqCst);
                9
            })
            .await;
        assert_eq!(second, 9);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_coalesce() {
        let registry = Arc::new(InflightRegistry::<&'static str>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            {
                let calls = Arc::clone(&calls);
                registry.coalesce("A", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    sleep(Duration::from_millis(10)).await;
                    "a"
                })
            },
            {
                let calls = Arc::clone(&calls);
                registry.coalesce("B", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    sleep(Duration::from_millis(10)).await;
                    "b"
                })
            },
        );

        assert_eq!((a, b), ("a", "b"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
