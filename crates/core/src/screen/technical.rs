use crate::domain::ranking::{MetricsSnapshot, Regime, ScoredInstrument};
use crate::screen::normalize::zscore;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreWeights {
    pub ret_1m: f64,
    pub ret_3m: f64,
    pub rs_3m: f64,
    pub trend: f64,
    /// Subtracted.
    pub vol_1m: f64,
    /// Subtracted.
    pub mdd_6m: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            ret_1m: 25.0,
            ret_3m: 35.0,
            rs_3m: 25.0,
            trend: 10.0,
            vol_1m: 15.0,
            mdd_6m: 20.0,
        }
    }
}

pub fn classify_regime(trend_flag: u8, ret_1m: f64) -> Regime {
    if trend_flag == 1 && ret_1m > 0.0 {
        Regime::Up
    } else if trend_flag == 0 && ret_1m < 0.0 {
        Regime::Down
    } else {
        Regime::Side
    }
}

fn has_required_metrics(s: &MetricsSnapshot) -> bool {
    [
        s.returns.one_month,
        s.returns.three_months,
        s.relative_strength.three_months,
        s.vol_1m,
        s.mdd_6m,
    ]
    .iter()
    .all(|v| v.is_finite())
        && s.trend_flag <= 1
}

/// Scores the whole universe at once (z-scores are cross-sectional) and returns it sorted by
/// `base_score` descending. Ties keep input order.
pub fn score_universe(snapshots: Vec<MetricsSnapshot>, weights: &ScoreWeights) -> Vec<ScoredInstrument> {
    let snapshots: Vec<MetricsSnapshot> = snapshots
        .into_iter()
        .filter(has_required_metrics)
        .collect();

    let column = |f: fn(&MetricsSnapshot) -> f64| -> Vec<f64> {
        zscore(&snapshots.iter().map(f).collect::<Vec<_>>())
    };
    let z_ret_1m = column(|s| s.returns.one_month);
    let z_ret_3m = column(|s| s.returns.three_months);
    let z_rs_3m = column(|s| s.relative_strength.three_months);
    let z_vol = column(|s| s.vol_1m);
    let z_mdd = column(|s| s.mdd_6m);

    let mut out: Vec<ScoredInstrument> = snapshots
        .into_iter()
        .enumerate()
        .map(|(i, snapshot)| {
            let base_score = weights.ret_1m * z_ret_1m[i]
                + weights.ret_3m * z_ret_3m[i]
                + weights.rs_3m * z_rs_3m[i]
                + weights.trend * f64::from(snapshot.trend_flag)
                - weights.vol_1m * z_vol[i]
                - weights.mdd_6m * z_mdd[i];
            let regime = classify_regime(snapshot.trend_flag, snapshot.returns.one_month);
            ScoredInstrument {
                snapshot,
                base_score,
                regime,
            }
        })
        .collect();

    out.sort_by(|a, b| {
        b.base_score
            .partial_cmp(&a.base_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instrument::AssetClass;
    use crate::domain::ranking::HorizonReturns;
    use crate::screen::metrics::tests::instrument;
    use chrono::NaiveDate;

    fn snapshot(id: &str, ret_1m: f64, ret_3m: f64, rs_3m: f64, trend: u8, vol: f64, mdd: f64) -> MetricsSnapshot {
        let returns = HorizonReturns {
            one_week: 0.0,
            one_month: ret_1m,
            three_months: ret_3m,
            six_months: 0.0,
            one_year: None,
        };
        let relative_strength = HorizonReturns {
            three_months: rs_3m,
            ..HorizonReturns::default()
        };
        MetricsSnapshot {
            instrument: instrument(id, AssetClass::EquitySector),
            as_of: NaiveDate::from_ymd_opt(2026, 1, 30).unwrap(),
            returns,
            benchmark_returns: HorizonReturns::default(),
            relative_strength,
            trend_flag: trend,
            vol_1m: vol,
            mdd_6m: mdd,
        }
    }

    #[test]
    fn regime_rules_are_mutually_exclusive() {
        assert_eq!(classify_regime(1, 0.02), Regime::Up);
        assert_eq!(classify_regime(0, -0.02), Regime::Down);
        assert_eq!(classify_regime(1, -0.02), Regime::Side);
        assert_eq!(classify_regime(0, 0.02), Regime::Side);
        assert_eq!(classify_regime(1, 0.0), Regime::Side);
        assert_eq!(classify_regime(0, 0.0), Regime::Side);
    }

    #[test]
    fn base_score_matches_weighted_formula() {
        let scored = score_universe(
            vec![
                snapshot("A", 0.05, 0.10, 0.02, 1, 0.10, -0.02),
                snapshot("B", -0.05, -0.10, -0.02, 0, 0.30, -0.20),
            ],
            &ScoreWeights::default(),
        );
        // Two-element z-scores are exactly +/-1.
        let a = scored.iter().find(|s| s.snapshot.instrument.series_id == "A").unwrap();
        let b = scored.iter().find(|s| s.snapshot.instrument.series_id == "B").unwrap();
        // A has the shallower drawdown (higher mdd value), which the formula penalises.
        assert!((a.base_score - (25.0 + 35.0 + 25.0 + 10.0 + 15.0 - 20.0)).abs() < 1e-9);
        assert!((b.base_score - (-25.0 - 35.0 - 25.0 - 15.0 + 20.0)).abs() < 1e-9);
        assert_eq!(scored[0].snapshot.instrument.series_id, "A");
        assert_eq!(a.regime, Regime::Up);
        assert_eq!(b.regime, Regime::Down);
    }

    #[test]
    fn identical_metrics_tie_and_keep_input_order() {
        let scored = score_universe(
            vec![
                snapshot("X", 0.01, 0.02, 0.0, 1, 0.1, -0.05),
                snapshot("Y", 0.01, 0.02, 0.0, 1, 0.1, -0.05),
            ],
            &ScoreWeights::default(),
        );
        assert_eq!(scored[0].base_score, scored[1].base_score);
        // Constant columns normalise to zero; only the trend term remains.
        assert_eq!(scored[0].base_score, 10.0);
        assert_eq!(scored[0].snapshot.instrument.series_id, "X");
    }

    #[test]
    fn incomplete_snapshots_are_dropped_before_normalising() {
        let scored = score_universe(
            vec![
                snapshot("A", 0.05, 0.10, 0.02, 1, 0.10, -0.02),
                snapshot("NAN", f64::NAN, 0.10, 0.02, 1, 0.10, -0.02),
                snapshot("B", -0.05, -0.10, -0.02, 0, 0.30, -0.20),
            ],
            &ScoreWeights::default(),
        );
        assert_eq!(scored.len(), 2);
        assert!(scored.iter().all(|s| s.snapshot.instrument.series_id != "NAN"));
    }
}
