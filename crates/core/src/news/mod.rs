pub mod aggregate;
pub mod features;
pub mod newsapi;

use crate::config::env_parse;
use crate::domain::news::{ArticleFeatures, NewsArticle};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub page_size: u32,
}

/// Source of recent articles for a keyword query. Provider-level failures surface as one error
/// per call.
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_articles(&self, query: &str, window: FetchWindow) -> anyhow::Result<Vec<NewsArticle>>;
}

/// Turns one article into scoring features. Aggregation, decay and clipping do not depend on how
/// the features are produced.
pub trait FeatureExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, article: &NewsArticle) -> ArticleFeatures;
}

/// What to do with articles whose `published_at` cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndatedPolicy {
    /// Treat as published at run time (no decay).
    #[default]
    AssumeFresh,
    /// Drop the article; it still claims its URL.
    Skip,
}

impl std::str::FromStr for UndatedPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fresh" => Ok(UndatedPolicy::AssumeFresh),
            "skip" => Ok(UndatedPolicy::Skip),
            other => anyhow::bail!("unknown undated policy: {other} (expected fresh|skip)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsOptions {
    pub days_back: i64,
    pub page_size: u32,
    pub half_life_days: f64,
    /// Symmetric cap K on the daily AI score.
    pub clip: f64,
    pub explanations_top_n: usize,
    pub timeout_secs: u64,
    pub undated: UndatedPolicy,
}

impl Default for NewsOptions {
    fn default() -> Self {
        Self {
            days_back: 3,
            page_size: 30,
            half_life_days: 7.0,
            clip: 12.0,
            explanations_top_n: 10,
            timeout_secs: 30,
            undated: UndatedPolicy::AssumeFresh,
        }
    }
}

impl NewsOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Some(n) = env_parse::<i64>("NEWS_DAYS_BACK").filter(|n| *n >= 0) {
            out.days_back = n;
        }
        if let Some(n) = env_parse::<u32>("NEWS_PAGE_SIZE").filter(|n| (1..=100).contains(n)) {
            out.page_size = n;
        }
        if let Some(n) = env_parse::<f64>("NEWS_HALF_LIFE_DAYS").filter(|n| n.is_finite() && *n > 0.0) {
            out.half_life_days = n;
        }
        if let Some(n) = env_parse::<f64>("NEWS_SCORE_CLIP").filter(|n| n.is_finite() && *n > 0.0) {
            out.clip = n;
        }
        if let Some(n) = env_parse::<usize>("NEWS_EXPLANATIONS_TOP_N") {
            out.explanations_top_n = n;
        }
        if let Some(n) = env_parse::<u64>("NEWS_TIMEOUT_SECS") {
            out.timeout_secs = n;
        }
        if let Some(p) = env_parse::<UndatedPolicy>("NEWS_UNDATED_POLICY") {
            out.undated = p;
        }

        out
    }

    pub fn window(&self, now: DateTime<Utc>) -> FetchWindow {
        FetchWindow {
            from: now - chrono::Duration::days(self.days_back),
            to: now,
            page_size: self.page_size,
        }
    }
}
