pub mod domain;
pub mod news;
pub mod pipeline;
pub mod screen;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_BENCHMARK_ID: &str = "US_SPY";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub newsapi_key: Option<String>,
        pub newsapi_base_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub benchmark_id: String,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let benchmark_id = std::env::var("BENCHMARK_ID")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_BENCHMARK_ID.to_string());

            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                newsapi_key: std::env::var("NEWSAPI_KEY").ok().filter(|s| !s.trim().is_empty()),
                newsapi_base_url: std::env::var("NEWSAPI_BASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                benchmark_id,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_newsapi_key(&self) -> anyhow::Result<&str> {
            self.newsapi_key
                .as_deref()
                .context("NEWSAPI_KEY is required (export NEWSAPI_KEY='...')")
        }
    }

    pub(crate) fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
    }
}
