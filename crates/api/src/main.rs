use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use truestone_core::domain::instrument::AssetClass;
use truestone_core::domain::news::ArticleEvidence;
use truestone_core::domain::ranking::{RankingRow, Regime, SortKey};
use truestone_core::news::NewsOptions;
use truestone_core::pipeline::{load_ranking, RankingOptions};
use truestone_core::screen::error::ScreenError;
use truestone_core::screen::ranking::RankingFilter;

const MAX_EXPLANATION_LIMIT: i64 = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = truestone_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();
    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match truestone_core::storage::connect(db_url).await {
            Ok(pool) => match truestone_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %e, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        pool,
        benchmark_id: settings.benchmark_id.clone(),
        explanations_top_n: NewsOptions::from_env().explanations_top_n,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/rankings", get(get_rankings))
        .route("/instruments/:series_id/explanations", get(get_explanations))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    pool: Option<PgPool>,
    benchmark_id: String,
    explanations_top_n: usize,
}

#[derive(Debug, Default, Deserialize)]
struct RankingQuery {
    alpha: Option<f64>,
    sort_by: Option<String>,
    top_n: Option<usize>,
    /// Comma separated, e.g. `EQUITY_SECTOR,COMMODITY`.
    asset_class: Option<String>,
    regime: Option<String>,
}

impl RankingQuery {
    fn into_options(self) -> anyhow::Result<(RankingOptions, RankingFilter)> {
        let mut opts = RankingOptions::from_env();
        if let Some(a) = self.alpha {
            anyhow::ensure!((0.0..=1.0).contains(&a), "alpha must be within [0, 1]");
            opts.alpha = a;
        }
        if let Some(s) = self.sort_by.as_deref() {
            opts.sort_key = s.parse::<SortKey>()?;
        }
        if let Some(n) = self.top_n {
            anyhow::ensure!(n >= 1, "top_n must be >= 1");
            opts.top_n = n;
        }

        let filter = RankingFilter {
            asset_classes: parse_list::<AssetClass>(self.asset_class.as_deref())?,
            regimes: parse_list::<Regime>(self.regime.as_deref())?,
            top_n: Some(opts.top_n),
        };
        Ok((opts, filter))
    }
}

fn parse_list<T>(raw: Option<&str>) -> anyhow::Result<Vec<T>>
where
    T: std::str::FromStr<Err = anyhow::Error>,
{
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<T>)
        .collect()
}

#[derive(Debug, Serialize)]
struct ApiRanking {
    alpha: f64,
    sort_by: SortKey,
    benchmark_id: String,
    rows: Vec<RankingRow>,
}

async fn get_rankings(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<ApiRanking>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let (opts, filter) = query.into_options().map_err(|e| {
        tracing::debug!(error = %e, "rejected ranking query");
        StatusCode::BAD_REQUEST
    })?;

    let rows = load_ranking(pool, &state.benchmark_id, &opts)
        .await
        .map_err(|e| {
            if let Some(ScreenError::BenchmarkMissing { benchmark_id }) = e.downcast_ref::<ScreenError>() {
                tracing::error!(%benchmark_id, "benchmark prices missing; cannot rank");
            }
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(ApiRanking {
        alpha: opts.alpha,
        sort_by: opts.sort_key,
        benchmark_id: state.benchmark_id.clone(),
        rows: filter.apply(rows),
    }))
}

#[derive(Debug, Default, Deserialize)]
struct ExplanationQuery {
    limit: Option<i64>,
}

async fn get_explanations(
    State(state): State<AppState>,
    Path(series_id): Path<String>,
    Query(query): Query<ExplanationQuery>,
) -> Result<Json<Vec<ArticleEvidence>>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let limit =
        explanation_limit(query.limit, state.explanations_top_n).ok_or(StatusCode::BAD_REQUEST)?;

    let rows = truestone_core::storage::ai_scores::load_latest_explanations(pool, &series_id, limit)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(rows))
}

/// An explicit `limit` must be within 1..=MAX; the configured default is clamped into range.
fn explanation_limit(requested: Option<i64>, default_top_n: usize) -> Option<i64> {
    match requested {
        Some(n) => (1..=MAX_EXPLANATION_LIMIT).contains(&n).then_some(n),
        None => Some(
            i64::try_from(default_top_n)
                .unwrap_or(MAX_EXPLANATION_LIMIT)
                .clamp(1, MAX_EXPLANATION_LIMIT),
        ),
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &truestone_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
