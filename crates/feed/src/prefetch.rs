//! Prefetch scheduler — staggered cache warming.
//!
//! Issues `resolve` calls for symbols expected to be needed soon (the
//! top of a discovery deck, dashboard tiles) ahead of user interaction.
//! Dispatches are staggered rather than burst so the rate-limited
//! provider isn't tripped into throttling, and they are fire-and-forget:
//! an abandoned batch still completes and warms the cache for next time.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use common::config::PrefetchConfig;

use crate::coordinator::FetchCoordinator;

#[derive(Clone)]
pub struct PrefetchScheduler {
    coordinator: Arc<FetchCoordinator>,
    config: PrefetchConfig,
}

impl PrefetchScheduler {
    pub fn new(coordinator: Arc<FetchCoordinator>, config: PrefetchConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Dispatch staggered resolves for `symbols`, in order, and return
    /// immediately. Symbol `i` starts after `i * stagger_ms`.
    pub fn schedule(&self, symbols: &[String]) {
        if symbols.len() > self.config.max_batch {
            debug!(
                "prefetch batch truncated from {} to {}",
                symbols.len(),
                self.config.max_batch
            );
        }

        for (i, symbol) in symbols.iter().take(self.config.max_batch).enumerate() {
            let coordinator = Arc::clone(&self.coordinator);
            let symbol = symbol.clone();
            let delay = Duration::from_millis(self.config.stagger_ms * i as u64);

            tokio::spawn(async move {
                sleep(delay).await;
                let series = coordinator.resolve(&symbol).await;
                debug!("{}: prefetched {} points", symbol, series.len());
            });
        }
    }

    /// Worst-case dispatch span of a batch, for callers that want to
    /// wait out a warm-up before exiting.
    pub fn batch_span(&self, batch_len: usize) -> Duration {
        let dispatched = batch_len.min(self.config.max_batch) as u64;
        Duration::from_millis(self.config.stagger_ms * dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::config::FeedConfig;
    use common::{Error, NewsItem, Series, SeriesPoint};
    use snapshot_client::SnapshotStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use store::{KvStore, MemoryStore, TtlCache};

    use crate::coordinator::FallbackSource;

    struct NoSnapshot;

    #[async_trait]
    impl SnapshotStore for NoSnapshot {
        async fn fetch_points(
            &self,
            _collection: &str,
            _id: &str,
        ) -> Result<Option<Vec<SeriesPoint>>, Error> {
            Ok(None)
        }
    }

    struct CountingFallback {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FallbackSource for CountingFallback {
        async fn fetch_daily(&self, _symbol: &str) -> Result<Series, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                SeriesPoint::new(1_700_000_000_000, 100.0),
                SeriesPoint::new(1_700_086_400_000, 101.0),
            ])
        }

        async fn fetch_news(&self, _symbol: &str) -> Result<Vec<NewsItem>, Error> {
            Ok(Vec::new())
        }
    }

    fn build_scheduler(
        config: PrefetchConfig,
    ) -> (PrefetchScheduler, Arc<MemoryStore>, Arc<CountingFallback>) {
        let kv = Arc::new(MemoryStore::new());
        let cache = TtlCache::new(kv.clone() as Arc<dyn KvStore>);
        let fallback = Arc::new(CountingFallback {
            calls: AtomicUsize::new(0),
        });
        let coordinator = Arc::new(FetchCoordinator::new(
            Arc::new(NoSnapshot),
            fallback.clone() as Arc<dyn FallbackSource>,
            cache,
            FeedConfig::default(),
        ));
        (
            PrefetchScheduler::new(coordinator, config),
            kv,
            fallback,
        )
    }

    #[tokio::test]
    async fn test_schedule_warms_cache_for_each_symbol() {
        let config = PrefetchConfig {
            stagger_ms: 5,
            max_batch: 12,
        };
        let (scheduler, kv, fallback) = build_scheduler(config);

        let symbols: Vec<String> = vec!["RELIANCE".into(), "TCS".into(), "INFY".into()];
        scheduler.schedule(&symbols);

        // Fire-and-forget: give the staggered tasks time to land.
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(fallback.calls.load(Ordering::SeqCst), 3);
        let cache_cfg = FeedConfig::default().cache;
        for symbol in &symbols {
            assert!(kv.get(&cache_cfg.quote_key(symbol)).is_some());
        }
    }

    #[tokio::test]
    async fn test_schedule_respects_max_batch() {
        let config = PrefetchConfig {
            stagger_ms: 1,
            max_batch: 2,
        };
        let (scheduler, _kv, fallback) = build_scheduler(config);

        let symbols: Vec<String> =
            vec!["A".into(), "B".into(), "C".into(), "D".into(), "E".into()];
        scheduler.schedule(&symbols);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_batch_span_caps_at_max_batch() {
        let config = PrefetchConfig {
            stagger_ms: 100,
            max_batch: 4,
        };
        let kv: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let cache = TtlCache::new(kv as Arc<dyn KvStore>);
        let coordinator = Arc::new(FetchCoordinator::new(
            Arc::new(NoSnapshot),
            Arc::new(CountingFallback {
                calls: AtomicUsize::new(0),
            }),
            cache,
            FeedConfig::default(),
        ));
        let scheduler = PrefetchScheduler::new(coordinator, config);

        assert_eq!(scheduler.batch_span(2), Duration::from_millis(200));
        assert_eq!(scheduler.batch_span(10), Duration::from_millis(400));
    }
}
