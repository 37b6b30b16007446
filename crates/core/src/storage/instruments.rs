use crate::domain::instrument::{AssetClass, Instrument};
use anyhow::Context;

pub async fn upsert_instruments(pool: &sqlx::PgPool, instruments: &[Instrument]) -> anyhow::Result<u64> {
    anyhow::ensure!(!instruments.is_empty(), "instruments must be non-empty");

    let mut qb = sqlx::QueryBuilder::new(
        "INSERT INTO series_master (series_id, name, asset_class, region, vendor_symbol) ",
    );
    qb.push_values(instruments, |mut b, inst| {
        b.push_bind(inst.series_id.trim())
            .push_bind(inst.name.trim())
            .push_bind(inst.asset_class.as_str())
            .push_bind(inst.region.trim())
            .push_bind(inst.vendor_symbol.as_deref());
    });
    qb.push(
        " ON CONFLICT (series_id) DO UPDATE \
           SET name = EXCLUDED.name, asset_class = EXCLUDED.asset_class, \
               region = EXCLUDED.region, vendor_symbol = EXCLUDED.vendor_symbol",
    );

    let res = qb
        .build()
        .persistent(false)
        .execute(pool)
        .await
        .context("upsert series_master failed")?;
    Ok(res.rows_affected())
}

pub async fn load_instruments(pool: &sqlx::PgPool) -> anyhow::Result<Vec<Instrument>> {
    let rows = sqlx::query_as::<_, (String, String, String, String, Option<String>)>(
        "SELECT series_id, name, asset_class, region, vendor_symbol \
         FROM series_master \
         ORDER BY series_id ASC",
    )
    .persistent(false)
    .fetch_all(pool)
    .await
    .context("select series_master failed")?;

    rows.into_iter()
        .map(|(series_id, name, asset_class, region, vendor_symbol)| {
            let asset_class = asset_class
                .parse::<AssetClass>()
                .with_context(|| format!("invalid asset_class in DB for series_id={series_id}"))?;
            Ok(Instrument {
                series_id,
                name,
                asset_class,
                region,
                vendor_symbol,
            })
        })
        .collect()
}
