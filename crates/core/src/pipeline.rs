use crate::config::env_parse;
use crate::domain::news::AiScore;
use crate::domain::ranking::{RankingRow, SortKey};
use crate::news::aggregate::{InstrumentOutcome, InstrumentScore, RunReport};
use crate::screen::technical::ScoreWeights;
use crate::screen::{ranking, screen_universe};
use crate::storage;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct RankingOptions {
    pub alpha: f64,
    pub sort_key: SortKey,
    pub top_n: usize,
    pub weights: ScoreWeights,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            sort_key: SortKey::FinalScore,
            top_n: 10,
            weights: ScoreWeights::default(),
        }
    }
}

impl RankingOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Some(a) = env_parse::<f64>("RANK_ALPHA").filter(|a| (0.0..=1.0).contains(a)) {
            out.alpha = a;
        }
        if let Some(k) = env_parse::<SortKey>("RANK_SORT_BY") {
            out.sort_key = k;
        }
        if let Some(n) = env_parse::<usize>("RANK_TOP_N").filter(|n| *n >= 1) {
            out.top_n = n;
        }

        out
    }
}

/// Loads prices and the latest AI scores and returns the full ranking (unfiltered).
///
/// Price history is required; an unreadable AI score table degrades to "no AI scores".
pub async fn load_ranking(
    pool: &sqlx::PgPool,
    benchmark_id: &str,
    opts: &RankingOptions,
) -> anyhow::Result<Vec<RankingRow>> {
    let universe = storage::prices::load_price_history(pool).await?;
    let scored = screen_universe(&universe, benchmark_id, &opts.weights)?;

    let ai_scores = match storage::ai_scores::load_latest_scores(pool).await {
        Ok(m) => m,
        Err(err) => {
            tracing::warn!(error = %err, "AI scores unavailable; ranking on technicals only");
            HashMap::new()
        }
    };

    ranking::compose(&scored, &ai_scores, opts.alpha, opts.sort_key)
}

/// What a run writes for one instrument's day.
#[derive(Debug, Clone, PartialEq)]
pub enum DayWrite<'a> {
    /// Replace the day's score and evidence.
    Replace(&'a InstrumentScore),
    /// Zero score unless the day already has a row (an earlier successful run is kept).
    ZeroIfAbsent(AiScore),
}

/// A failed fetch still files a zero for the day, so the ranking does not fall back to an
/// older non-zero score.
pub fn day_writes(report: &RunReport) -> Vec<DayWrite<'_>> {
    report
        .outcomes
        .iter()
        .map(|outcome| match outcome {
            InstrumentOutcome::Scored(scored) => DayWrite::Replace(scored),
            InstrumentOutcome::FetchFailed { series_id, .. } => DayWrite::ZeroIfAbsent(AiScore {
                date: report.date,
                series_id: series_id.clone(),
                ai_score: 0.0,
                n_articles: 0,
            }),
        })
        .collect()
}

/// Applies `day_writes` for a run; returns the number of instruments fully scored.
pub async fn persist_report(pool: &sqlx::PgPool, report: &RunReport) -> anyhow::Result<usize> {
    let mut written = 0;
    for write in day_writes(report) {
        match write {
            DayWrite::Replace(scored) => {
                storage::ai_scores::replace_instrument_day(pool, scored).await?;
                written += 1;
            }
            DayWrite::ZeroIfAbsent(score) => {
                let inserted = storage::ai_scores::insert_score_if_absent(pool, &score).await?;
                tracing::debug!(
                    series_id = %score.series_id,
                    date = %score.date,
                    inserted,
                    "fetch failed; zero AI score filed unless the day was already scored"
                );
            }
        }
    }
    Ok(written)
}
