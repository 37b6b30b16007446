use anyhow::Context;
use std::path::Path;
use truestone_core::domain::instrument::PricePoint;

pub async fn import_prices_file(pool: &sqlx::PgPool, path: &Path) -> anyhow::Result<u64> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {} failed", path.display()))?;
    let points = parse_price_points(&text)?;
    truestone_core::storage::prices::insert_prices(pool, &points).await
}

fn parse_price_points(text: &str) -> anyhow::Result<Vec<PricePoint>> {
    let points: Vec<PricePoint> =
        serde_json::from_str(text).context("prices file must be a JSON array of price points")?;
    anyhow::ensure!(!points.is_empty(), "prices file has no rows");
    for p in &points {
        anyhow::ensure!(!p.series_id.trim().is_empty(), "series_id must be non-empty");
    }
    Ok(points)
}
