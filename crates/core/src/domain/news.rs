use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An article as returned by a news provider. `url` is the dedup key within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    /// Provider timestamp, kept verbatim (usually RFC 3339).
    pub published_at: String,
}

/// Per-article features produced by a `FeatureExtractor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleFeatures {
    /// -2..=2
    pub sentiment: i32,
    /// 0..=3
    pub impact: i32,
    /// 0..=1
    pub confidence: f64,
    /// 0..=1
    pub novelty: f64,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleEvidence {
    pub date: NaiveDate,
    pub series_id: String,
    pub article_url: String,
    pub title: String,
    pub published_at: String,
    pub topic: String,
    pub sentiment: i32,
    pub impact: i32,
    pub confidence: f64,
    pub novelty: f64,
    pub decay: f64,
    pub contribution: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiScore {
    pub date: NaiveDate,
    pub series_id: String,
    pub ai_score: f64,
    pub n_articles: i32,
}
