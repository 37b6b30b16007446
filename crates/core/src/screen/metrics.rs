use crate::domain::instrument::PriceSeries;
use crate::domain::ranking::{Horizon, HorizonReturns, MetricsSnapshot};
use chrono::NaiveDate;

pub const SHORT_MA_WINDOW: usize = 20;
pub const LONG_MA_WINDOW: usize = 60;
pub const VOL_WINDOW: usize = 21;
pub const DRAWDOWN_WINDOW: usize = 126;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Horizons longer than the drawdown window are reported when available but never required,
/// so an instrument only needs ~6 months of joined history to be ranked.
fn is_required(h: Horizon) -> bool {
    h.sessions() <= DRAWDOWN_WINDOW
}

/// Joins two date-sorted series on exact date. Dates missing from either side are dropped, so
/// the result follows the benchmark's trading calendar (no forward fill).
pub fn inner_join(
    instrument: &[(NaiveDate, f64)],
    benchmark: &[(NaiveDate, f64)],
) -> Vec<(NaiveDate, f64, f64)> {
    let mut out = Vec::with_capacity(instrument.len().min(benchmark.len()));
    let (mut i, mut j) = (0, 0);
    while i < instrument.len() && j < benchmark.len() {
        let (di, ci) = instrument[i];
        let (dj, cj) = benchmark[j];
        match di.cmp(&dj) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push((di, ci, cj));
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// `x[t] / x[t-n] - 1`; NaN where the lookback is not available.
pub fn pct_change(xs: &[f64], n: usize) -> Vec<f64> {
    (0..xs.len())
        .map(|t| if t >= n { xs[t] / xs[t - n] - 1.0 } else { f64::NAN })
        .collect()
}

pub fn rolling_mean(xs: &[f64], window: usize) -> Vec<f64> {
    rolling(xs, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Sample standard deviation (N-1 divisor) over each window.
pub fn rolling_std(xs: &[f64], window: usize) -> Vec<f64> {
    rolling(xs, window, |w| {
        if w.len() < 2 {
            return f64::NAN;
        }
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let ss: f64 = w.iter().map(|x| (x - mean) * (x - mean)).sum();
        (ss / (n - 1.0)).sqrt()
    })
}

/// Worst peak-to-trough decline inside each window, where the peak is the running maximum
/// within that same window. Always <= 0 for positive prices.
pub fn rolling_max_drawdown(xs: &[f64], window: usize) -> Vec<f64> {
    rolling(xs, window, max_drawdown)
}

pub fn max_drawdown(window: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &x in window {
        if x.is_nan() {
            return f64::NAN;
        }
        peak = peak.max(x);
        // A zero peak gives 0/0; `f64::min` would swallow it.
        let dd = x / peak - 1.0;
        if dd.is_nan() {
            return f64::NAN;
        }
        worst = worst.min(dd);
    }
    worst
}

fn rolling(xs: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    (0..xs.len())
        .map(|t| {
            if window == 0 || t + 1 < window {
                f64::NAN
            } else {
                f(&xs[t + 1 - window..=t])
            }
        })
        .collect()
}

/// Metrics for the most recent joined date where every required field is finite.
/// Returns `None` when no such row exists (insufficient or degenerate history).
pub fn compute_metrics(series: &PriceSeries, benchmark: &PriceSeries) -> Option<MetricsSnapshot> {
    let joined = inner_join(&series.closes, &benchmark.closes);
    if joined.is_empty() {
        return None;
    }

    let close: Vec<f64> = joined.iter().map(|(_, c, _)| *c).collect();
    let bm_close: Vec<f64> = joined.iter().map(|(_, _, b)| *b).collect();

    let horizon_cols: Vec<(Horizon, Vec<f64>, Vec<f64>)> = Horizon::ALL
        .iter()
        .map(|&h| (h, pct_change(&close, h.sessions()), pct_change(&bm_close, h.sessions())))
        .collect();

    let ma_short = rolling_mean(&close, SHORT_MA_WINDOW);
    let ma_long = rolling_mean(&close, LONG_MA_WINDOW);
    let ret_1d = pct_change(&close, 1);
    let vol: Vec<f64> = rolling_std(&ret_1d, VOL_WINDOW)
        .into_iter()
        .map(|s| s * TRADING_DAYS_PER_YEAR.sqrt())
        .collect();
    let mdd = rolling_max_drawdown(&close, DRAWDOWN_WINDOW);

    let complete = |t: usize| {
        ma_short[t].is_finite()
            && ma_long[t].is_finite()
            && vol[t].is_finite()
            && mdd[t].is_finite()
            && horizon_cols
                .iter()
                .filter(|(h, _, _)| is_required(*h))
                .all(|(_, r, b)| r[t].is_finite() && b[t].is_finite())
    };

    let t = (0..joined.len()).rev().find(|&t| complete(t))?;

    let at = |col: &[f64]| Some(col[t]).filter(|v| v.is_finite());
    let mut returns = HorizonReturns::default();
    let mut benchmark_returns = HorizonReturns::default();
    let mut relative_strength = HorizonReturns::default();
    for (h, r, b) in &horizon_cols {
        let (r, b) = match (at(r), at(b)) {
            (Some(r), Some(b)) => (Some(r), Some(b)),
            _ => (None, None),
        };
        let rs = r.zip(b).map(|(r, b)| r - b);
        set_horizon(&mut returns, *h, r);
        set_horizon(&mut benchmark_returns, *h, b);
        set_horizon(&mut relative_strength, *h, rs);
    }

    Some(MetricsSnapshot {
        instrument: series.instrument.clone(),
        as_of: joined[t].0,
        returns,
        benchmark_returns,
        relative_strength,
        trend_flag: u8::from(ma_short[t] > ma_long[t]),
        vol_1m: vol[t],
        mdd_6m: mdd[t],
    })
}

fn set_horizon(out: &mut HorizonReturns, h: Horizon, v: Option<f64>) {
    // Required horizons are guaranteed finite by the completeness check.
    match h {
        Horizon::OneWeek => out.one_week = v.unwrap_or(f64::NAN),
        Horizon::OneMonth => out.one_month = v.unwrap_or(f64::NAN),
        Horizon::ThreeMonths => out.three_months = v.unwrap_or(f64::NAN),
        Horizon::SixMonths => out.six_months = v.unwrap_or(f64::NAN),
        Horizon::OneYear => out.one_year = v,
    }
}
