use truestone_core::config::Settings;
use truestone_core::domain::universe::default_news_queries;
use truestone_core::news::aggregate::{run_aggregation, RunReport};
use truestone_core::news::features::HeuristicExtractor;
use truestone_core::news::newsapi::NewsApiClient;
use truestone_core::news::{FeatureExtractor, NewsOptions, NewsProvider};
use truestone_core::storage;
use truestone_core::storage::lock::Job;
use truestone_core::time::run_date::resolve_run_date;

pub async fn run(
    settings: &Settings,
    pool: &sqlx::PgPool,
    as_of_date_arg: Option<&str>,
) -> anyhow::Result<()> {
    let now = chrono::Utc::now();
    let date = resolve_run_date(as_of_date_arg, now)?;
    let opts = NewsOptions::from_env();
    let provider = NewsApiClient::from_settings(settings, &opts)?;
    let extractor = HeuristicExtractor::default();

    let Some(lock) = storage::lock::try_acquire_run_lock(pool, Job::AiScores, date).await? else {
        tracing::warn!(%date, "ai-scores lock not acquired; another run in progress");
        return Ok(());
    };

    let report = aggregate(&provider, &extractor, &opts, date, now).await;
    let persisted = truestone_core::pipeline::persist_report(pool, &report).await;

    let (status, error) = match &persisted {
        Ok(_) if report.failures() == 0 => ("success", None),
        Ok(_) => ("partial", Some(format!("{} instrument fetches failed", report.failures()))),
        Err(err) => ("error", Some(format!("{err:#}"))),
    };
    let run_id = storage::ai_scores::record_run(
        pool,
        &report,
        provider.provider_name(),
        extractor.name(),
        status,
        error.as_deref(),
    )
    .await;

    if let Err(err) = lock.release().await {
        tracing::warn!(%date, error = %format!("{err:#}"), "ai-scores lock release failed");
    }

    let written = persisted?;
    let run_id = run_id?;
    tracing::info!(%date, %run_id, written, failures = report.failures(), status, "ai-scores run finished");
    Ok(())
}

/// Fetches and scores without touching the database; prints the top explanations.
pub async fn run_dry(settings: &Settings, as_of_date_arg: Option<&str>) -> anyhow::Result<()> {
    let now = chrono::Utc::now();
    let date = resolve_run_date(as_of_date_arg, now)?;
    let opts = NewsOptions::from_env();
    let provider = NewsApiClient::from_settings(settings, &opts)?;
    let extractor = HeuristicExtractor::default();

    let report = aggregate(&provider, &extractor, &opts, date, now).await;
    for scored in report.scored() {
        println!(
            "[{}] ai_score={:.3} n_articles={}",
            scored.score.series_id, scored.score.ai_score, scored.score.n_articles
        );
        for e in scored.top_explanations(opts.explanations_top_n) {
            println!("  {:+.3}  {}  ({})", e.contribution, e.title, e.reason);
        }
    }
    tracing::info!(%date, dry_run = true, failures = report.failures(), "ai-scores dry run finished");
    Ok(())
}

async fn aggregate(
    provider: &dyn NewsProvider,
    extractor: &dyn FeatureExtractor,
    opts: &NewsOptions,
    date: chrono::NaiveDate,
    now: chrono::DateTime<chrono::Utc>,
) -> RunReport {
    let queries = default_news_queries();
    tracing::info!(%date, instruments = queries.len(), extractor = extractor.name(), "ai-scores run started");
    run_aggregation(provider, extractor, &queries, opts, date, now).await
}
