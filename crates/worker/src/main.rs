use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use truestone_core::config::Settings;

mod ai_scores;
mod ingest;
mod report;
mod universe;

#[derive(Debug, Parser)]
#[command(name = "truestone_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply database migrations.
    Migrate,

    /// Upsert the default sector/commodity universe and benchmark.
    SeedUniverse,

    /// Append daily prices from a JSON array of {series_id, date, close, open?, high?, low?, volume?}.
    ImportPrices {
        #[arg(long)]
        file: PathBuf,
    },

    /// Fetch news and rebuild AI scores for one calendar day.
    AiScores {
        /// Run date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of_date: Option<String>,

        /// Do everything except writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the current ranking.
    Rank {
        /// AI score weight in [0, 1].
        #[arg(long)]
        alpha: Option<f64>,

        /// final_score | base_score | ai_score
        #[arg(long)]
        sort_by: Option<String>,

        #[arg(long)]
        top_n: Option<usize>,

        /// Emit the full ranking as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let res = run(&settings, args.command).await;
    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "worker run failed");
    }
    res
}

async fn run(settings: &Settings, command: Command) -> anyhow::Result<()> {
    if let Command::AiScores {
        as_of_date,
        dry_run: true,
    } = &command
    {
        return ai_scores::run_dry(settings, as_of_date.as_deref()).await;
    }

    let pool = truestone_core::storage::connect(settings.require_database_url()?).await?;
    truestone_core::storage::migrate(&pool).await?;

    match command {
        Command::Migrate => {
            tracing::info!("migrations applied");
        }
        Command::SeedUniverse => {
            let n = universe::seed_universe(&pool).await?;
            tracing::info!(rows = n, "universe seeded");
        }
        Command::ImportPrices { file } => {
            let n = ingest::import_prices_file(&pool, &file)
                .await
                .with_context(|| format!("import prices from {} failed", file.display()))?;
            let latest = truestone_core::storage::prices::latest_price_date(&pool).await?;
            tracing::info!(
                inserted = n,
                file = %file.display(),
                latest = ?latest,
                "prices imported"
            );
        }
        Command::AiScores { as_of_date, .. } => {
            ai_scores::run(settings, &pool, as_of_date.as_deref()).await?;
        }
        Command::Rank {
            alpha,
            sort_by,
            top_n,
            json,
        } => {
            let opts = report::ranking_options(alpha, sort_by.as_deref(), top_n)?;
            let rows =
                truestone_core::pipeline::load_ranking(&pool, &settings.benchmark_id, &opts).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", report::render_table(&rows, opts.top_n, opts.alpha));
            }
        }
    }

    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
