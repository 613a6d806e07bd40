//! Chart envelope parsing.
//!
//! The provider returns a deeply nested envelope; only the first result
//! block carries the series. Rows without a finite close are dropped
//! before anything reaches a cache.

use serde::Deserialize;

use common::{Error, Series, SeriesPoint};

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    /// Epoch seconds, one per row.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteBlock>,
}

/// Column-oriented OHLCV arrays, index-aligned with `timestamp`.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteBlock {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

fn column(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten().filter(|v| v.is_finite())
}

/// Parse a chart envelope body into a series, oldest row order preserved.
pub fn parse_chart(raw: &str) -> Result<Series, Error> {
    let envelope: ChartEnvelope = serde_json::from_str(raw)?;

    if let Some(err) = envelope.chart.error {
        if !err.is_null() {
            return Err(Error::Provider {
                status: 200,
                message: format!("chart error payload: {err}"),
            });
        }
    }

    let result = envelope
        .chart
        .result
        .and_then(|mut blocks| {
            if blocks.is_empty() {
                None
            } else {
                Some(blocks.remove(0))
            }
        })
        .ok_or_else(|| Error::Provider {
            status: 200,
            message: "chart envelope has no result block".into(),
        })?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut series: Series = Vec::with_capacity(result.timestamp.len());
    for (i, ts_secs) in result.timestamp.iter().enumerate() {
        let Some(close) = column(&quote.close, i) else {
            continue;
        };
        series.push(SeriesPoint {
            ts: ts_secs * 1000,
            close,
            open: column(&quote.open, i),
            high: column(&quote.high, i),
            low: column(&quote.low, i),
            volume: quote.volume.get(i).copied().flatten(),
        });
    }

    Ok(series)
}
