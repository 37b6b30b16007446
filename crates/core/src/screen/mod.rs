pub mod error;
pub mod metrics;
pub mod normalize;
pub mod ranking;
pub mod technical;

use crate::domain::instrument::PriceSeries;
use crate::domain::ranking::{MetricsSnapshot, ScoredInstrument};
use crate::screen::error::ScreenError;
use crate::screen::technical::ScoreWeights;

/// Computes the latest metrics snapshot for every non-benchmark series.
///
/// Series with insufficient history are skipped silently. A missing or empty benchmark series is
/// a `ScreenError::BenchmarkMissing`.
pub fn build_snapshots(
    universe: &[PriceSeries],
    benchmark_id: &str,
) -> anyhow::Result<Vec<MetricsSnapshot>> {
    let benchmark = universe
        .iter()
        .find(|s| s.instrument.series_id == benchmark_id && !s.closes.is_empty())
        .ok_or_else(|| ScreenError::BenchmarkMissing {
            benchmark_id: benchmark_id.to_string(),
        })?;

    let mut out = Vec::with_capacity(universe.len().saturating_sub(1));
    for series in universe
        .iter()
        .filter(|s| s.instrument.series_id != benchmark_id)
    {
        match metrics::compute_metrics(series, benchmark) {
            Some(m) => out.push(m),
            None => tracing::debug!(
                series_id = %series.instrument.series_id,
                observations = series.closes.len(),
                "insufficient history; excluded from ranking"
            ),
        }
    }
    Ok(out)
}

pub fn screen_universe(
    universe: &[PriceSeries],
    benchmark_id: &str,
    weights: &ScoreWeights,
) -> anyhow::Result<Vec<ScoredInstrument>> {
    let snapshots = build_snapshots(universe, benchmark_id)?;
    Ok(technical::score_universe(snapshots, weights))
}
