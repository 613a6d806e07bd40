//! Feed configuration types.

use serde::{Deserialize, Serialize};

/// Top-level feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Directory for the durable series cache.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Cache keying and TTLs.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Authoritative snapshot store.
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Fallback provider.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Prefetch scheduling.
    #[serde(default)]
    pub prefetch: PrefetchConfig,
}

/// Cache key scheme and freshness windows.
///
/// Keys take the form `<prefix>_<version>_<class>_<id>`; bumping
/// `schema_version` invalidates every old entry without a migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Max age for cached daily series (millis).
    #[serde(default = "default_quote_ttl")]
    pub quote_ttl_ms: i64,

    /// Max age for cached headlines (millis).
    #[serde(default = "default_news_ttl")]
    pub news_ttl_ms: i64,
}

impl CacheConfig {
    /// Cache key for a symbol's daily series.
    pub fn quote_key(&self, symbol: &str) -> String {
        format!(
            "{}_{}_quote_{}",
            self.key_prefix, self.schema_version, symbol
        )
    }

    /// Cache key for a symbol's headlines.
    pub fn news_key(&self, symbol: &str) -> String {
        format!("{}_{}_news_{}", self.key_prefix, self.schema_version, symbol)
    }
}

/// Authoritative snapshot-store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Base URL of the document store.
    #[serde(default = "default_snapshot_base_url")]
    pub base_url: String,

    /// Collection holding per-ticker documents.
    #[serde(default = "default_stocks_collection")]
    pub stocks_collection: String,

    /// Collection holding per-index documents.
    #[serde(default = "default_indices_collection")]
    pub indices_collection: String,

    /// Ids routed to the indices collection.
    #[serde(default = "default_index_ids")]
    pub index_ids: Vec<String>,

    /// Documents with this many points or fewer are treated as
    /// partially written and skipped.
    #[serde(default = "default_min_points")]
    pub min_points: usize,
}

impl SnapshotConfig {
    /// Which collection a logical id lives in.
    pub fn collection_for(&self, id: &str) -> &str {
        if id.starts_with('^') || self.index_ids.iter().any(|ix| ix == id) {
            &self.indices_collection
        } else {
            &self.stocks_collection
        }
    }
}

/// Fallback provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_chart_base_url")]
    pub chart_base_url: String,

    #[serde(default = "default_news_base_url")]
    pub news_base_url: String,

    /// URL-encoding relay used when the direct call fails.
    #[serde(default = "default_relay_base_url")]
    pub relay_base_url: String,

    /// Chart lookback range, in the provider's range syntax.
    #[serde(default = "default_chart_range")]
    pub chart_range: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Headlines kept per symbol.
    #[serde(default = "default_news_limit")]
    pub news_limit: usize,

    /// Outbound request quota.
    #[serde(default = "default_requests_per_sec")]
    pub requests_per_sec: u32,
}

/// Prefetch scheduling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefetchConfig {
    /// Delay between consecutive prefetch dispatches (millis).
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    /// Max symbols accepted per batch; overflow is dropped.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_data_dir() -> String {
    ".quotefeed-cache".into()
}

fn default_key_prefix() -> String {
    "qf".into()
}
fn default_schema_version() -> String {
    "v2".into()
}
fn default_quote_ttl() -> i64 {
    6 * 60 * 60 * 1000
}
fn default_news_ttl() -> i64 {
    60 * 60 * 1000
}

fn default_snapshot_base_url() -> String {
    "http://localhost:8089/api/snapshots".into()
}
fn default_stocks_collection() -> String {
    "stocks".into()
}
fn default_indices_collection() -> String {
    "indices".into()
}
fn default_index_ids() -> Vec<String> {
    vec!["NIFTY50".into(), "SENSEX".into(), "BANKNIFTY".into()]
}
fn default_min_points() -> usize {
    5
}

fn default_chart_base_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".into()
}
fn default_news_base_url() -> String {
    "https://query1.finance.yahoo.com/v1/finance/search".into()
}
fn default_relay_base_url() -> String {
    "https://api.allorigins.win/raw".into()
}
fn default_chart_range() -> String {
    "1y".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_news_limit() -> usize {
    6
}
fn default_requests_per_sec() -> u32 {
    5
}

fn default_stagger_ms() -> u64 {
    350
}
fn default_max_batch() -> usize {
    12
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            schema_version: default_schema_version(),
            quote_ttl_ms: default_quote_ttl(),
            news_ttl_ms: default_news_ttl(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            base_url: default_snapshot_base_url(),
            stocks_collection: default_stocks_collection(),
            indices_collection: default_indices_collection(),
            index_ids: default_index_ids(),
            min_points: default_min_points(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            chart_base_url: default_chart_base_url(),
            news_base_url: default_news_base_url(),
            relay_base_url: default_relay_base_url(),
            chart_range: default_chart_range(),
            timeout_secs: default_timeout_secs(),
            news_limit: default_news_limit(),
            requests_per_sec: default_requests_per_sec(),
        }
    }
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            stagger_ms: default_stagger_ms(),
            max_batch: default_max_batch(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache: CacheConfig::default(),
            snapshot: SnapshotConfig::default(),
            provider: ProviderConfig::default(),
            prefetch: PrefetchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_scheme_versioned() {
        let mut cache = CacheConfig::default();
        let before = cache.quote_key("RELIANCE.NS");
        assert_eq!(before, "qf_v2_quote_RELIANCE.NS");

        cache.schema_version = "v3".into();
        assert_ne!(cache.quote_key("RELIANCE.NS"), before);
    }

    #[test]
    fn test_quote_and_news_keys_differ() {
        let cache = CacheConfig::default();
        assert_ne!(cache.quote_key("TCS.NS"), cache.news_key("TCS.NS"));
    }

    #[test]
    fn test_collection_routing() {
        let snapshot = SnapshotConfig::default();
        assert_eq!(snapshot.collection_for("NIFTY50"), "indices");
        assert_eq!(snapshot.collection_for("^NSEI"), "indices");
        assert_eq!(snapshot.collection_for("RELIANCE.NS"), "stocks");
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: FeedConfig = serde_json::from_str("{}").expect("defaults should apply");
        assert_eq!(config.cache.quote_ttl_ms, 6 * 60 * 60 * 1000);
        assert_eq!(config.snapshot.min_points, 5);
        assert_eq!(config.prefetch.stagger_ms, 350);
    }
}
