//! Series normalization and return calculations.

use common::{Series, SeriesPoint};

/// Canonical form: ascending timestamps, finite closes only.
///
/// The sort is stable, so normalizing an already-normal series returns
/// it unchanged.
pub fn normalize(mut series: Series) -> Series {
    series.retain(|p| p.close.is_finite());
    series.sort_by(|a, b| a.ts.cmp(&b.ts));
    series
}

/// Percentage change from the first point at or after `from_ts` to the
/// last point of a normalized series.
///
/// `None` — not `0` — when the series has fewer than two points, when
/// no point falls at or after `from_ts`, when the reference point is
/// already the last point, or when the reference close is zero.
pub fn percent_return(series: &[SeriesPoint], from_ts: i64) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }

    let start = series.iter().find(|p| p.ts >= from_ts)?;
    let end = series.last()?;
    if end.ts <= start.ts || start.close == 0.0 {
        return None;
    }

    Some((end.close / start.close - 1.0) * 100.0)
}

/// Return over the trailing `period_ms`, anchored at the series end.
pub fn trailing_return(series: &[SeriesPoint], period_ms: i64) -> Option<f64> {
    let end = series.last()?;
    percent_return(series, end.ts - period_ms)
}
