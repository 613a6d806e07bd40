//! Fetch coordinator — walks the tier chain for a logical request.
//!
//! Tier order for a daily series: authoritative snapshot store, then
//! the durable TTL cache, then the coalesced fallback provider. Each
//! tier probe yields a [`TierOutcome`]; failures fold into misses so no
//! error ever crosses `resolve` — an exhausted chain is an empty
//! series, a valid "no data" result that is deliberately never cached.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use common::config::FeedConfig;
use common::{Error, NewsItem, Series, TierOutcome};
use snapshot_client::SnapshotStore;
use store::TtlCache;
use yahoo_client::YahooClient;

use crate::inflight::InflightRegistry;
use crate::series::normalize;

/// The fallback tier: a rate-limited remote provider.
#[async_trait]
pub trait FallbackSource: Send + Sync {
    async fn fetch_daily(&self, symbol: &str) -> Result<Series, Error>;
    async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>, Error>;
}

#[async_trait]
impl FallbackSource for YahooClient {
    async fn fetch_daily(&self, symbol: &str) -> Result<Series, Error> {
        YahooClient::fetch_daily(self, symbol).await
    }

    async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>, Error> {
        YahooClient::fetch_news(self, symbol).await
    }
}

/// Resolves logical series/news requests against the tier chain.
///
/// Owns all tier-crossing logic: nothing else writes cache entries, so
/// the TTL and tier-precedence invariants are enforced in one place.
pub struct FetchCoordinator {
    snapshot: Arc<dyn SnapshotStore>,
    fallback: Arc<dyn FallbackSource>,
    cache: TtlCache,
    config: FeedConfig,
    series_inflight: InflightRegistry<Series>,
    news_inflight: InflightRegistry<Vec<NewsItem>>,
}

impl FetchCoordinator {
    pub fn new(
        snapshot: Arc<dyn SnapshotStore>,
        fallback: Arc<dyn FallbackSource>,
        cache: TtlCache,
        config: FeedConfig,
    ) -> Self {
        Self {
            snapshot,
            fallback,
            cache,
            config,
            series_inflight: InflightRegistry::new(),
            news_inflight: InflightRegistry::new(),
        }
    }

    /// Resolve the daily series for `symbol`.
    ///
    /// Never fails; `[]` means the whole chain came up empty and the
    /// next call will retry the provider.
    pub async fn resolve(&self, symbol: &str) -> Series {
        let key = self.config.cache.quote_key(symbol);

        match self.snapshot_tier(symbol).await {
            TierOutcome::Hit(series) => {
                // Warm the cache so later calls skip straight here.
                self.cache.set(&key, &series);
                return series;
            }
            TierOutcome::Miss => debug!("{}: snapshot tier miss", symbol),
            TierOutcome::Failed(reason) => warn!("{}: snapshot tier failed: {}", symbol, reason),
        }

        match self.cache_tier::<Series>(&key, self.config.cache.quote_ttl_ms) {
            TierOutcome::Hit(series) => {
                debug!("{}: cache tier hit ({} points)", symbol, series.len());
                return series;
            }
            _ => debug!("{}: cache tier miss", symbol),
        }

        self.fallback_series_tier(symbol, &key).await
    }

    /// Resolve recent headlines for `symbol`: TTL cache, then provider.
    /// Same contract as [`resolve`]: empty on an exhausted chain, and
    /// empty results are not cached.
    pub async fn resolve_news(&self, symbol: &str) -> Vec<NewsItem> {
        let key = self.config.cache.news_key(symbol);

        match self.cache_tier::<Vec<NewsItem>>(&key, self.config.cache.news_ttl_ms) {
            TierOutcome::Hit(items) => {
                debug!("{}: news cache hit ({} items)", symbol, items.len());
                return items;
            }
            _ => debug!("{}: news cache miss", symbol),
        }

        let fallback = Arc::clone(&self.fallback);
        let cache = self.cache.clone();
        let owned_symbol = symbol.to_string();
        let cache_key = key.clone();

        self.news_inflight
            .coalesce(&key, move || async move {
                match fallback.fetch_news(&owned_symbol).await {
                    Ok(items) => {
                        if items.is_empty() {
                            debug!("{}: provider returned no headlines", owned_symbol);
                        } else {
                            cache.set(&cache_key, &items);
                        }
                        items
                    }
                    Err(e) => {
                        warn!("{}: news fallback failed: {}", owned_symbol, e);
                        Vec::new()
                    }
                }
            })
            .await
    }

    // ── Tiers ─────────────────────────────────────────────────────────

    async fn snapshot_tier(&self, symbol: &str) -> TierOutcome<Series> {
        let collection = self.config.snapshot.collection_for(symbol);

        match self.snapshot.fetch_points(collection, symbol).await {
            Ok(Some(points)) => {
                let series = normalize(points);
                if series.len() > self.config.snapshot.min_points {
                    TierOutcome::Hit(series)
                } else {
                    // Short documents are partially written; don't trust them.
                    debug!(
                        "{}: snapshot document too short ({} <= {})",
                        symbol,
                        series.len(),
                        self.config.snapshot.min_points
                    );
                    TierOutcome::Miss
                }
            }
            Ok(None) => TierOutcome::Miss,
            Err(e) => TierOutcome::Failed(e.to_string()),
        }
    }

    fn cache_tier<T: serde::de::DeserializeOwned>(&self, key: &str, ttl_ms: i64) -> TierOutcome<T> {
        match self.cache.get::<T>(key, ttl_ms) {
            Some(payload) => TierOutcome::Hit(payload),
            None => TierOutcome::Miss,
        }
    }

    async fn fallback_series_tier(&self, symbol: &str, key: &str) -> Series {
        let fallback = Arc::clone(&self.fallback);
        let cache = self.cache.clone();
        let owned_symbol = symbol.to_string();
        let cache_key = key.to_string();

        self.series_inflight
            .coalesce(key, move || async move {
                match fallback.fetch_daily(&owned_symbol).await {
                    Ok(raw) => {
                        let series = normalize(raw);
                        if series.is_empty() {
                            // An empty result is not pinned into the
                            // cache; the next resolve retries.
                            debug!("{}: provider returned no usable points", owned_symbol);
                        } else {
                            cache.set(&cache_key, &series);
                        }
                        series
                    }
                    Err(e) => {
                        warn!("{}: fallback tier failed: {}", owned_symbol, e);
                        Vec::new()
                    }
                }
            })
            .await
    }
}
