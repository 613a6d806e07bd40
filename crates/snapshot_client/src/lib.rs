//! Authoritative snapshot-store client.
//!
//! Reads precomputed series documents written by an out-of-band batch
//! job on a daily/monthly cadence. Strictly read-only: absence of a
//! document means "not yet populated", never an error.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use common::{Error, SeriesPoint};

/// Keyed, read-only lookup into the snapshot store.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Fetch the points of one document. `Ok(None)` when the document
    /// does not exist yet.
    async fn fetch_points(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Vec<SeriesPoint>>, Error>;
}

// ── Document types ────────────────────────────────────────────────────

/// A series document as stored by the batch writer.
#[derive(Debug, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub points: Vec<SnapshotPoint>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
}

/// Raw point inside a document. `close` is optional because partially
/// written documents carry null closes; those rows are dropped.
#[derive(Debug, Deserialize)]
pub struct SnapshotPoint {
    #[serde(alias = "timestamp")]
    pub ts: i64,
    pub close: Option<f64>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub volume: Option<u64>,
}

impl SnapshotDocument {
    /// Rows with a usable close, in document order.
    pub fn into_points(self) -> Vec<SeriesPoint> {
        self.points
            .into_iter()
            .filter_map(|p| {
                let close = p.close?;
                Some(SeriesPoint {
                    ts: p.ts,
                    close,
                    open: p.open,
                    high: p.high,
                    low: p.low,
                    volume: p.volume,
                })
            })
            .collect()
    }
}

// ── HTTP implementation ───────────────────────────────────────────────

/// HTTP client for the snapshot document store.
#[derive(Debug, Clone)]
pub struct HttpSnapshotStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSnapshotStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("failed to build snapshot HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SnapshotStore for HttpSnapshotStore {
    async fn fetch_points(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Vec<SeriesPoint>>, Error> {
        let url = format!("{}/{}/{}", self.base_url, collection, id);
        debug!("Fetching snapshot document: {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        if status == 404 {
            debug!("{}/{}: no snapshot document", collection, id);
            return Ok(None);
        }
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            warn!("snapshot store returned {} for {}/{}", status, collection, id);
            return Err(Error::Snapshot(format!(
                "status {} for {}/{}: {}",
                status,
                collection,
                id,
                &body[..body.len().min(200)]
            )));
        }

        let doc: SnapshotDocument = resp
            .json()
            .await
            .map_err(|e| Error::Snapshot(format!("parse error for {}/{}: {}", collection, id, e)))?;

        let points = doc.into_points();
        debug!("{}/{}: {} snapshot points", collection, id, points.len());
        Ok(Some(points))
    }
}
