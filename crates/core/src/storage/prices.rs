use crate::domain::instrument::{PricePoint, PriceSeries};
use crate::storage::instruments::load_instruments;
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::HashMap;

const DEFAULT_BATCH: usize = 500;

/// Appends price rows. Existing (series_id, date) rows are never overwritten.
pub async fn insert_prices(pool: &sqlx::PgPool, points: &[PricePoint]) -> anyhow::Result<u64> {
    anyhow::ensure!(!points.is_empty(), "price points must be non-empty");
    for p in points {
        anyhow::ensure!(
            p.close.is_finite(),
            "close must be finite (series_id={}, date={})",
            p.series_id,
            p.date
        );
    }

    let chunk_size: usize = std::env::var("PRICES_INSERT_BATCH")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_BATCH);
    anyhow::ensure!(chunk_size >= 1, "PRICES_INSERT_BATCH must be >= 1");

    let mut tx = pool.begin().await.context("begin transaction failed")?;
    let mut inserted: u64 = 0;

    for (batch_idx, chunk) in points.chunks(chunk_size).enumerate() {
        let t0 = std::time::Instant::now();
        let mut qb = sqlx::QueryBuilder::new(
            "INSERT INTO series_prices (series_id, date, open, high, low, close, volume) ",
        );
        qb.push_values(chunk, |mut b, p| {
            b.push_bind(p.series_id.trim())
                .push_bind(p.date)
                .push_bind(p.open)
                .push_bind(p.high)
                .push_bind(p.low)
                .push_bind(p.close)
                .push_bind(p.volume);
        });
        qb.push(" ON CONFLICT (series_id, date) DO NOTHING");

        let res = qb
            .build()
            .persistent(false)
            .execute(&mut *tx)
            .await
            .context("batch insert series_prices failed")?;
        inserted += res.rows_affected();

        tracing::debug!(
            batch_idx,
            batch_size = chunk.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "series_prices batch insert"
        );
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(inserted)
}

/// Every instrument with its close history (date ascending). Instruments without prices come
/// back with an empty series.
pub async fn load_price_history(pool: &sqlx::PgPool) -> anyhow::Result<Vec<PriceSeries>> {
    let instruments = load_instruments(pool).await?;

    let rows = sqlx::query_as::<_, (String, NaiveDate, f64)>(
        "SELECT series_id, date, close \
         FROM series_prices \
         ORDER BY series_id ASC, date ASC",
    )
    .persistent(false)
    .fetch_all(pool)
    .await
    .context("select series_prices failed")?;

    let mut by_series: HashMap<String, Vec<(NaiveDate, f64)>> = HashMap::new();
    for (series_id, date, close) in rows {
        by_series.entry(series_id).or_default().push((date, close));
    }

    Ok(instruments
        .into_iter()
        .map(|inst| {
            let closes = by_series.remove(&inst.series_id).unwrap_or_default();
            PriceSeries::new(inst, closes)
        })
        .collect())
}

pub async fn latest_price_date(pool: &sqlx::PgPool) -> anyhow::Result<Option<NaiveDate>> {
    let row: (Option<NaiveDate>,) = sqlx::query_as("SELECT MAX(date) FROM series_prices")
        .persistent(false)
        .fetch_one(pool)
        .await
        .context("select max(series_prices.date) failed")?;
    Ok(row.0)
}
