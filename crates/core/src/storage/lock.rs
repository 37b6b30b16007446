use anyhow::Context;
use chrono::{Datelike, NaiveDate};

// Advisory locks are scoped to the Postgres session. Used to keep one writer per job and date.
const LOCK_NAMESPACE: i64 = 0x5452_5545_5354; // "TRUEST"

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    AiScores,
}

impl Job {
    fn tag(self) -> i64 {
        match self {
            Job::AiScores => 1,
        }
    }
}

fn lock_key(job: Job, date: NaiveDate) -> i64 {
    LOCK_NAMESPACE ^ (job.tag() << 40) ^ i64::from(date.num_days_from_ce())
}

/// Holds the connection that owns the session-scoped lock; release on the same connection.
pub struct RunLock {
    conn: sqlx::pool::PoolConnection<sqlx::Postgres>,
    key: i64,
}

pub async fn try_acquire_run_lock(
    pool: &sqlx::PgPool,
    job: Job,
    date: NaiveDate,
) -> anyhow::Result<Option<RunLock>> {
    let key = lock_key(job, date);
    let mut conn = pool.acquire().await.context("acquire lock connection failed")?;
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to acquire advisory lock (key={key})"))?;
    Ok(acquired.0.then_some(RunLock { conn, key }))
}

impl RunLock {
    pub async fn release(mut self) -> anyhow::Result<()> {
        let key = self.key;
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .persistent(false)
            .bind(key)
            .execute(&mut *self.conn)
            .await
            .with_context(|| format!("failed to release advisory lock (key={key})"))?;
        Ok(())
    }
}
