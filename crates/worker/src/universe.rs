use truestone_core::domain::universe::default_universe;

pub async fn seed_universe(pool: &sqlx::PgPool) -> anyhow::Result<u64> {
    let instruments = default_universe();
    truestone_core::storage::instruments::upsert_instruments(pool, &instruments).await
}
