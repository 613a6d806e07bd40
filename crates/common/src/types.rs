//! Domain types shared across the feed.

use serde::{Deserialize, Serialize};

// ── Series Types ──────────────────────────────────────────────────────

/// One point of a daily OHLCV series.
///
/// Stored series keep timestamps non-decreasing and `close` finite;
/// normalization enforces both before anything is cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Epoch millis.
    pub ts: i64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
}

impl SeriesPoint {
    /// A close-only point.
    pub fn new(ts: i64, close: f64) -> Self {
        Self {
            ts,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
        }
    }
}

/// An ordered series of points, oldest first.
///
/// An empty series is a valid "no data" result, distinct from an error.
pub type Series = Vec<SeriesPoint>;

// ── News Types ────────────────────────────────────────────────────────

/// A headline from the fallback provider's news endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub link: String,
    /// Epoch millis.
    pub published_at: i64,
}

// ── Cache Types ───────────────────────────────────────────────────────

/// Envelope stored in the durable store: payload plus write time.
///
/// Read back and re-validated against a TTL on every lookup; deleted on
/// read once expired. There is no background sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub payload: T,
    /// Epoch millis at write time.
    pub written_at: i64,
}

/// Outcome of probing one tier of the resolution chain.
///
/// `Failed` carries a reason for logging but is treated like `Miss` by
/// the coordinator's fold: the chain keeps descending either way.
#[derive(Debug, Clone, PartialEq)]
pub enum TierOutcome<T> {
    Hit(T),
    Miss,
    Failed(String),
}
