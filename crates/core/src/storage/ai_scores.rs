use crate::domain::news::{AiScore, ArticleEvidence};
use crate::news::aggregate::{InstrumentScore, RunReport};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Replaces one instrument's score and evidence for `score.date` in a single transaction, so a
/// re-run of the same day overwrites instead of appending.
pub async fn replace_instrument_day(pool: &sqlx::PgPool, scored: &InstrumentScore) -> anyhow::Result<()> {
    let s = &scored.score;
    let mut tx = pool.begin().await.context("begin transaction failed")?;

    sqlx::query(
        "INSERT INTO ai_scores (date, series_id, ai_score, n_articles) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (date, series_id) DO UPDATE \
           SET ai_score = EXCLUDED.ai_score, n_articles = EXCLUDED.n_articles",
    )
    .persistent(false)
    .bind(s.date)
    .bind(&s.series_id)
    .bind(s.ai_score)
    .bind(s.n_articles)
    .execute(&mut *tx)
    .await
    .context("upsert ai_scores failed")?;

    sqlx::query("DELETE FROM ai_score_explanations WHERE date = $1 AND series_id = $2")
        .persistent(false)
        .bind(s.date)
        .bind(&s.series_id)
        .execute(&mut *tx)
        .await
        .context("delete ai_score_explanations failed")?;

    if !scored.evidence.is_empty() {
        let mut qb = sqlx::QueryBuilder::new(
            "INSERT INTO ai_score_explanations \
             (date, series_id, article_url, title, published_at, topic, \
              sentiment, impact, confidence, novelty, decay, contribution, reason) ",
        );
        qb.push_values(&scored.evidence, |mut b, e| {
            b.push_bind(e.date)
                .push_bind(&e.series_id)
                .push_bind(&e.article_url)
                .push_bind(&e.title)
                .push_bind(&e.published_at)
                .push_bind(&e.topic)
                .push_bind(e.sentiment)
                .push_bind(e.impact)
                .push_bind(e.confidence)
                .push_bind(e.novelty)
                .push_bind(e.decay)
                .push_bind(e.contribution)
                .push_bind(&e.reason);
        });
        qb.build()
            .persistent(false)
            .execute(&mut *tx)
            .await
            .context("insert ai_score_explanations failed")?;
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(())
}

/// Files `score` only if its (date, series_id) has no row yet. Returns whether a row was written.
pub async fn insert_score_if_absent(pool: &sqlx::PgPool, score: &AiScore) -> anyhow::Result<bool> {
    let res = sqlx::query(
        "INSERT INTO ai_scores (date, series_id, ai_score, n_articles) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (date, series_id) DO NOTHING",
    )
    .persistent(false)
    .bind(score.date)
    .bind(&score.series_id)
    .bind(score.ai_score)
    .bind(score.n_articles)
    .execute(pool)
    .await
    .with_context(|| format!("insert ai_scores failed (series_id={})", score.series_id))?;
    Ok(res.rows_affected() > 0)
}

/// Most recent AI score per instrument (dates may differ between instruments).
pub async fn load_latest_scores(pool: &sqlx::PgPool) -> anyhow::Result<HashMap<String, AiScore>> {
    let rows = sqlx::query_as::<_, (NaiveDate, String, f64, i32)>(
        "SELECT DISTINCT ON (series_id) date, series_id, ai_score, n_articles \
         FROM ai_scores \
         ORDER BY series_id ASC, date DESC",
    )
    .persistent(false)
    .fetch_all(pool)
    .await
    .context("select latest ai_scores failed")?;

    Ok(rows
        .into_iter()
        .map(|(date, series_id, ai_score, n_articles)| {
            (
                series_id.clone(),
                AiScore {
                    date,
                    series_id,
                    ai_score,
                    n_articles,
                },
            )
        })
        .collect())
}

/// Top `limit` evidence rows by |contribution| for the instrument's latest scored date.
pub async fn load_latest_explanations(
    pool: &sqlx::PgPool,
    series_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<ArticleEvidence>> {
    type Row = (
        NaiveDate,
        String,
        String,
        String,
        String,
        String,
        i32,
        i32,
        f64,
        f64,
        f64,
        f64,
        String,
    );

    let rows = sqlx::query_as::<_, Row>(
        "SELECT date, series_id, article_url, title, published_at, topic, \
                sentiment, impact, confidence, novelty, decay, contribution, reason \
         FROM ai_score_explanations \
         WHERE series_id = $1 \
           AND date = (SELECT MAX(date) FROM ai_scores WHERE series_id = $1) \
         ORDER BY ABS(contribution) DESC, article_url ASC \
         LIMIT $2",
    )
    .persistent(false)
    .bind(series_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .with_context(|| format!("select ai_score_explanations failed (series_id={series_id})"))?;

    Ok(rows
        .into_iter()
        .map(
            |(
                date,
                series_id,
                article_url,
                title,
                published_at,
                topic,
                sentiment,
                impact,
                confidence,
                novelty,
                decay,
                contribution,
                reason,
            )| ArticleEvidence {
                date,
                series_id,
                article_url,
                title,
                published_at,
                topic,
                sentiment,
                impact,
                confidence,
                novelty,
                decay,
                contribution,
                reason,
            },
        )
        .collect())
}

pub async fn record_run(
    pool: &sqlx::PgPool,
    report: &RunReport,
    provider: &str,
    extractor: &str,
    status: &str,
    error: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let generated_at: DateTime<Utc> = Utc::now();
    let scored = report.scored().count() as i32;
    let failures = report.failures() as i32;

    sqlx::query(
        "INSERT INTO ai_score_runs (id, date, generated_at, provider, extractor, status, scored, failures, error) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .persistent(false)
    .bind(id)
    .bind(report.date)
    .bind(generated_at)
    .bind(provider)
    .bind(extractor)
    .bind(status)
    .bind(scored)
    .bind(failures)
    .bind(error)
    .execute(pool)
    .await
    .context("insert ai_score_runs failed")?;

    Ok(id)
}
