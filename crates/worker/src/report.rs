use std::fmt::Write;
use truestone_core::domain::ranking::{RankingRow, SortKey};
use truestone_core::pipeline::RankingOptions;

/// Env defaults overridden by CLI flags.
pub fn ranking_options(
    alpha: Option<f64>,
    sort_by: Option<&str>,
    top_n: Option<usize>,
) -> anyhow::Result<RankingOptions> {
    let mut opts = RankingOptions::from_env();
    if let Some(a) = alpha {
        anyhow::ensure!((0.0..=1.0).contains(&a), "--alpha must be within [0, 1] (got {a})");
        opts.alpha = a;
    }
    if let Some(s) = sort_by {
        opts.sort_key = s.parse::<SortKey>()?;
    }
    if let Some(n) = top_n {
        anyhow::ensure!(n >= 1, "--top-n must be >= 1");
        opts.top_n = n;
    }
    Ok(opts)
}

fn pct(x: f64) -> String {
    format!("{:.2}%", x * 100.0)
}

fn opt_pct(x: Option<f64>) -> String {
    x.map(pct).unwrap_or_else(|| "-".to_string())
}

pub fn render_table(rows: &[RankingRow], top_n: usize, alpha: f64) -> String {
    let mut out = String::new();
    let as_of = rows.first().map(|r| r.as_of.to_string()).unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "=== TOP {top_n} by score (as of {as_of}, alpha={alpha}) ===");
    let _ = writeln!(
        out,
        "{:>4}  {:<30} {:<13} {:<5} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>2} {:>6} {:>8} {:>8} {:>7} {:>8} {:>4}",
        "rank", "name", "asset_class", "reg", "ret_1w", "ret_1m", "ret_3m", "ret_6m", "ret_1y",
        "rs_1m", "rs_3m", "tr", "vol_1m", "mdd_6m", "base", "ai", "final", "n"
    );
    for r in rows.iter().take(top_n) {
        let _ = writeln!(
            out,
            "{:>4}  {:<30} {:<13} {:<5} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>2} {:>6.2} {:>8} {:>8.2} {:>7.2} {:>8.2} {:>4}",
            r.rank,
            r.instrument.name,
            r.instrument.asset_class.as_str(),
            r.regime.as_str(),
            pct(r.returns.one_week),
            pct(r.returns.one_month),
            pct(r.returns.three_months),
            pct(r.returns.six_months),
            opt_pct(r.returns.one_year),
            pct(r.relative_strength.one_month),
            pct(r.relative_strength.three_months),
            r.trend_flag,
            r.vol_1m,
            pct(r.mdd_6m),
            r.base_score,
            r.ai_score,
            r.final_score,
            r.n_articles,
        );
    }
    out
}
