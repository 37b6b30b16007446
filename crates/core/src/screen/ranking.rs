use crate::domain::instrument::AssetClass;
use crate::domain::news::AiScore;
use crate::domain::ranking::{RankingRow, Regime, ScoredInstrument, SortKey};
use anyhow::ensure;
use std::collections::HashMap;

/// Left-joins AI scores onto technically scored instruments, blends them with weight `alpha`,
/// sorts descending by `sort_key` (stable) and numbers the rows 1..=N.
///
/// Instruments without a technical score never appear, even if they have an AI score.
pub fn compose(
    scored: &[ScoredInstrument],
    ai_scores: &HashMap<String, AiScore>,
    alpha: f64,
    sort_key: SortKey,
) -> anyhow::Result<Vec<RankingRow>> {
    ensure!(
        alpha.is_finite() && (0.0..=1.0).contains(&alpha),
        "alpha must be within [0, 1] (got {alpha})"
    );

    let mut rows: Vec<RankingRow> = scored
        .iter()
        .map(|s| {
            let m = &s.snapshot;
            let ai = ai_scores.get(&m.instrument.series_id);
            let ai_score = ai.map(|a| a.ai_score).unwrap_or(0.0);
            RankingRow {
                rank: 0,
                instrument: m.instrument.clone(),
                as_of: m.as_of,
                returns: m.returns,
                relative_strength: m.relative_strength,
                trend_flag: m.trend_flag,
                vol_1m: m.vol_1m,
                mdd_6m: m.mdd_6m,
                regime: s.regime,
                base_score: s.base_score,
                ai_score,
                n_articles: ai.map(|a| a.n_articles).unwrap_or(0),
                ai_score_date: ai.map(|a| a.date),
                final_score: s.base_score + alpha * ai_score,
            }
        })
        .collect();

    let key = |r: &RankingRow| match sort_key {
        SortKey::FinalScore => r.final_score,
        SortKey::BaseScore => r.base_score,
        SortKey::AiScore => r.ai_score,
    };
    rows.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = idx + 1;
    }

    Ok(rows)
}

/// Display filter applied after ranking; ranks are left as computed over the full universe.
#[derive(Debug, Clone, Default)]
pub struct RankingFilter {
    pub asset_classes: Vec<AssetClass>,
    pub regimes: Vec<Regime>,
    pub top_n: Option<usize>,
}

impl RankingFilter {
    pub fn apply(&self, rows: Vec<RankingRow>) -> Vec<RankingRow> {
        let limit = self.top_n.unwrap_or(usize::MAX);
        rows.into_iter()
            .filter(|r| {
                self.asset_classes.is_empty() || self.asset_classes.contains(&r.instrument.asset_class)
            })
            .filter(|r| self.regimes.is_empty() || self.regimes.contains(&r.regime))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ranking::{HorizonReturns, MetricsSnapshot};
    use crate::screen::metrics::tests::instrument;
    use chrono::NaiveDate;

    fn scored(id: &str, class: AssetClass, base_score: f64, regime: Regime) -> ScoredInstrument {
        ScoredInstrument {
            snapshot: MetricsSnapshot {
                instrument: instrument(id, class),
                as_of: NaiveDate::from_ymd_opt(2026, 1, 30).unwrap(),
                returns: HorizonReturns::default(),
                benchmark_returns: HorizonReturns::default(),
                relative_strength: HorizonReturns::default(),
                trend_flag: 0,
                vol_1m: 0.2,
                mdd_6m: -0.1,
            },
            base_score,
            regime,
        }
    }

    fn ai(id: &str, score: f64, n: i32) -> (String, AiScore) {
        (
            id.to_string(),
            AiScore {
                date: NaiveDate::from_ymd_opt(2026, 1, 29).unwrap(),
                series_id: id.to_string(),
                ai_score: score,
                n_articles: n,
            },
        )
    }

    fn universe() -> Vec<ScoredInstrument> {
        vec![
            scored("US_XLK", AssetClass::EquitySector, 30.0, Regime::Up),
            scored("COM_GLD", AssetClass::Commodity, 25.0, Regime::Side),
            scored("US_XLE", AssetClass::EquitySector, -10.0, Regime::Down),
        ]
    }

    #[test]
    fn zero_alpha_keeps_base_score() {
        let ai_scores: HashMap<_, _> = [ai("COM_GLD", 12.0, 4)].into_iter().collect();
        let rows = compose(&universe(), &ai_scores, 0.0, SortKey::FinalScore).unwrap();
        for r in &rows {
            assert_eq!(r.final_score, r.base_score);
        }
        assert_eq!(rows[0].instrument.series_id, "US_XLK");
    }

    #[test]
    fn full_alpha_adds_clipped_ai_score_and_reorders() {
        let ai_scores: HashMap<_, _> = [ai("COM_GLD", 12.0, 4), ai("US_XLK", -3.0, 1)].into_iter().collect();
        let rows = compose(&universe(), &ai_scores, 1.0, SortKey::FinalScore).unwrap();
        assert_eq!(rows[0].instrument.series_id, "COM_GLD");
        assert_eq!(rows[0].final_score, 37.0);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].final_score, 27.0);
        assert_eq!(rows[1].n_articles, 1);
    }

    #[test]
    fn missing_ai_score_defaults_to_zero_and_ai_only_rows_are_dropped() {
        let ai_scores: HashMap<_, _> = [ai("COM_USO", 5.0, 2)].into_iter().collect();
        let rows = compose(&universe(), &ai_scores, 0.5, SortKey::FinalScore).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.ai_score == 0.0 && r.n_articles == 0 && r.ai_score_date.is_none()));
        assert!(rows.iter().all(|r| r.instrument.series_id != "COM_USO"));
    }

    #[test]
    fn ties_keep_input_order_and_ranks_are_contiguous() {
        let rows = compose(&universe(), &HashMap::new(), 0.3, SortKey::AiScore).unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.instrument.series_id.as_str()).collect();
        assert_eq!(ids, vec!["US_XLK", "COM_GLD", "US_XLE"]);
        let ranks: Vec<_> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn does_not_mutate_inputs() {
        let input = universe();
        let before = input.clone();
        let _ = compose(&input, &HashMap::new(), 1.0, SortKey::BaseScore).unwrap();
        assert_eq!(input, before);
    }

    #[test]
    fn rejects_alpha_out_of_range() {
        assert!(compose(&universe(), &HashMap::new(), 1.5, SortKey::FinalScore).is_err());
        assert!(compose(&universe(), &HashMap::new(), f64::NAN, SortKey::FinalScore).is_err());
    }

    #[test]
    fn filter_keeps_global_ranks() {
        let rows = compose(&universe(), &HashMap::new(), 0.0, SortKey::BaseScore).unwrap();
        let filter = RankingFilter {
            asset_classes: vec![AssetClass::EquitySector],
            regimes: vec![Regime::Down],
            top_n: Some(5),
        };
        let out = filter.apply(rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].instrument.series_id, "US_XLE");
        assert_eq!(out[0].rank, 3);
    }
}
