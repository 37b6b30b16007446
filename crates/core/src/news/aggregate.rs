use crate::domain::news::{AiScore, ArticleEvidence, NewsArticle};
use crate::domain::universe::NewsQuery;
use crate::news::{FeatureExtractor, NewsOptions, NewsProvider, UndatedPolicy};
use crate::time::run_date::{age_in_days, parse_published_at};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

/// `exp(-ln2 / half_life * age)`: 1.0 at age 0, 0.5 after one half-life.
pub fn decay(age_days: f64, half_life_days: f64) -> f64 {
    let lambda = std::f64::consts::LN_2 / half_life_days;
    (-lambda * age_days).exp()
}

/// Per-run URL ownership: the first instrument to claim an article keeps it for the whole run.
/// Only one run loop writes to it, in the fixed query order.
#[derive(Debug, Clone, Default)]
pub struct UrlClaims {
    owners: HashMap<String, String>,
}

impl UrlClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if `series_id` now owns `url`; `false` if any instrument (including this one)
    /// claimed it earlier in the run.
    pub fn claim(&mut self, url: &str, series_id: &str) -> bool {
        if self.owners.contains_key(url) {
            return false;
        }
        self.owners.insert(url.to_string(), series_id.to_string());
        true
    }

    pub fn owner(&self, url: &str) -> Option<&str> {
        self.owners.get(url).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentScore {
    pub score: AiScore,
    /// Every non-zero contribution, in article order.
    pub evidence: Vec<ArticleEvidence>,
}

impl InstrumentScore {
    /// Top `n` evidence rows by |contribution|; ties keep article order.
    pub fn top_explanations(&self, n: usize) -> Vec<&ArticleEvidence> {
        let mut refs: Vec<&ArticleEvidence> = self.evidence.iter().collect();
        refs.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        refs.truncate(n);
        refs
    }
}

/// Scores one instrument's articles for `date`. Articles already claimed in this run, articles
/// without a URL, and zero contributions leave no evidence.
pub fn score_articles(
    date: NaiveDate,
    series_id: &str,
    articles: &[NewsArticle],
    extractor: &dyn FeatureExtractor,
    claims: &mut UrlClaims,
    now: DateTime<Utc>,
    opts: &NewsOptions,
) -> InstrumentScore {
    let mut total = 0.0_f64;
    let mut evidence = Vec::new();

    for article in articles {
        if article.url.is_empty() || !claims.claim(&article.url, series_id) {
            continue;
        }

        let age = match parse_published_at(&article.published_at) {
            Some(published) => age_in_days(published, now),
            None => match opts.undated {
                UndatedPolicy::AssumeFresh => 0.0,
                UndatedPolicy::Skip => {
                    tracing::debug!(%series_id, url = %article.url, "unparsable published_at; skipped");
                    continue;
                }
            },
        };

        let f = extractor.extract(article);
        let d = decay(age, opts.half_life_days);
        let contribution = f64::from(f.sentiment) * f64::from(f.impact) * f.confidence * f.novelty * d;
        if contribution == 0.0 || !contribution.is_finite() {
            continue;
        }

        let reason = format!(
            "sent={}, impact={}, conf={}, nov={}, decay={d:.2}",
            f.sentiment, f.impact, f.confidence, f.novelty
        );

        total += contribution;
        evidence.push(ArticleEvidence {
            date,
            series_id: series_id.to_string(),
            article_url: article.url.clone(),
            title: article.title.clone(),
            published_at: article.published_at.clone(),
            topic: f.topic,
            sentiment: f.sentiment,
            impact: f.impact,
            confidence: f.confidence,
            novelty: f.novelty,
            decay: d,
            contribution,
            reason,
        });
    }

    InstrumentScore {
        score: AiScore {
            date,
            series_id: series_id.to_string(),
            ai_score: total.clamp(-opts.clip, opts.clip),
            n_articles: evidence.len() as i32,
        },
        evidence,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentOutcome {
    Scored(InstrumentScore),
    FetchFailed { series_id: String, error: String },
}

impl InstrumentOutcome {
    pub fn series_id(&self) -> &str {
        match self {
            InstrumentOutcome::Scored(s) => &s.score.series_id,
            InstrumentOutcome::FetchFailed { series_id, .. } => series_id,
        }
    }

    /// Effective score for the day; a failed fetch counts as zero.
    pub fn ai_score(&self) -> f64 {
        match self {
            InstrumentOutcome::Scored(s) => s.score.ai_score,
            InstrumentOutcome::FetchFailed { .. } => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub date: NaiveDate,
    pub outcomes: Vec<InstrumentOutcome>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, InstrumentOutcome::FetchFailed { .. }))
            .count()
    }

    pub fn scored(&self) -> impl Iterator<Item = &InstrumentScore> {
        self.outcomes.iter().filter_map(|o| match o {
            InstrumentOutcome::Scored(s) => Some(s),
            InstrumentOutcome::FetchFailed { .. } => None,
        })
    }
}

/// Fetches and scores every query in order. One instrument's fetch failure is logged and recorded
/// without affecting the others; there are no retries within a run.
pub async fn run_aggregation(
    provider: &dyn NewsProvider,
    extractor: &dyn FeatureExtractor,
    queries: &[NewsQuery],
    opts: &NewsOptions,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> RunReport {
    let window = opts.window(now);
    let mut claims = UrlClaims::new();
    let mut outcomes = Vec::with_capacity(queries.len());

    for q in queries {
        let articles = match provider.fetch_articles(&q.query, window).await {
            Ok(a) => a,
            Err(err) => {
                tracing::warn!(
                    series_id = %q.series_id,
                    provider = provider.provider_name(),
                    error = %err,
                    "news fetch failed; instrument gets no AI signal today"
                );
                outcomes.push(InstrumentOutcome::FetchFailed {
                    series_id: q.series_id.clone(),
                    error: format!("{err:#}"),
                });
                continue;
            }
        };

        let scored = score_articles(date, &q.series_id, &articles, extractor, &mut claims, now, opts);
        tracing::info!(
            series_id = %q.series_id,
            query = %q.query,
            fetched = articles.len(),
            ai_score = scored.score.ai_score,
            n_articles = scored.score.n_articles,
            "AI score computed"
        );
        outcomes.push(InstrumentOutcome::Scored(scored));
    }

    RunReport { date, outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::features::HeuristicExtractor;
    use crate::news::FetchWindow;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 27, 12, 0, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 27).unwrap()
    }

    fn article(url: &str, title: &str, published: DateTime<Utc>) -> NewsArticle {
        NewsArticle {
            url: url.to_string(),
            title: title.to_string(),
            description: None,
            published_at: published.to_rfc3339(),
        }
    }

    struct FakeProvider {
        by_query: HashMap<String, Result<Vec<NewsArticle>, String>>,
    }

    #[async_trait::async_trait]
    impl NewsProvider for FakeProvider {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_articles(&self, query: &str, _window: FetchWindow) -> anyhow::Result<Vec<NewsArticle>> {
            match self.by_query.get(query) {
                Some(Ok(a)) => Ok(a.clone()),
                Some(Err(e)) => Err(anyhow::anyhow!(e.clone())),
                None => Ok(Vec::new()),
            }
        }
    }

    fn query(id: &str, q: &str) -> NewsQuery {
        NewsQuery {
            series_id: id.to_string(),
            query: q.to_string(),
        }
    }

    #[test]
    fn decay_is_one_at_age_zero_and_half_after_one_half_life() {
        assert_eq!(decay(0.0, 7.0), 1.0);
        assert!((decay(7.0, 7.0) - 0.5).abs() < 1e-12);
        assert!(decay(14.0, 7.0) < decay(7.0, 7.0));
    }

    #[test]
    fn contribution_uses_decay_from_publish_time() {
        let mut claims = UrlClaims::new();
        let articles = vec![
            article("https://a/fresh", "Oil prices surge", now()),
            article("https://a/old", "Oil prices surge", now() - Duration::days(7)),
        ];
        let s = score_articles(
            date(),
            "US_XLE",
            &articles,
            &HeuristicExtractor::default(),
            &mut claims,
            now(),
            &NewsOptions::default(),
        );
        assert_eq!(s.evidence.len(), 2);
        assert_eq!(s.evidence[0].decay, 1.0);
        assert!((s.evidence[1].decay - 0.5).abs() < 1e-9);
        let base = 1.0 * 1.0 * 0.7 * 0.8;
        assert!((s.evidence[0].contribution - base).abs() < 1e-12);
        assert!((s.score.ai_score - base * 1.5).abs() < 1e-9);
        assert_eq!(s.evidence[1].reason, "sent=1, impact=1, conf=0.7, nov=0.8, decay=0.50");
    }

    #[test]
    fn duplicate_url_counts_once() {
        let mut claims = UrlClaims::new();
        let a = article("https://a/1", "Gold rally", now());
        let s = score_articles(
            date(),
            "COM_GLD",
            &[a.clone(), a],
            &HeuristicExtractor::default(),
            &mut claims,
            now(),
            &NewsOptions::default(),
        );
        assert_eq!(s.evidence.len(), 1);
        assert_eq!(s.score.n_articles, 1);
        assert!((s.score.ai_score - 0.56).abs() < 1e-12);
    }

    #[test]
    fn neutral_articles_leave_no_evidence_but_still_claim_the_url() {
        let mut claims = UrlClaims::new();
        let s = score_articles(
            date(),
            "US_XLE",
            &[article("https://a/flat", "Refinery maintenance scheduled", now())],
            &HeuristicExtractor::default(),
            &mut claims,
            now(),
            &NewsOptions::default(),
        );
        assert!(s.evidence.is_empty());
        assert_eq!(s.score.ai_score, 0.0);
        assert_eq!(claims.owner("https://a/flat"), Some("US_XLE"));
    }

    #[test]
    fn score_is_clipped_to_cap() {
        let mut claims = UrlClaims::new();
        let articles: Vec<_> = (0..50)
            .map(|i| article(&format!("https://a/{i}"), "plunge slump crisis", now()))
            .collect();
        let s = score_articles(
            date(),
            "COM_USO",
            &articles,
            &HeuristicExtractor::default(),
            &mut claims,
            now(),
            &NewsOptions::default(),
        );
        assert_eq!(s.score.ai_score, -12.0);
        assert_eq!(s.score.n_articles, 50);
    }

    #[test]
    fn undated_articles_follow_policy() {
        let undated = NewsArticle {
            url: "https://a/undated".to_string(),
            title: "Gold rally".to_string(),
            description: None,
            published_at: "not a date".to_string(),
        };

        let mut claims = UrlClaims::new();
        let fresh = score_articles(
            date(),
            "COM_GLD",
            std::slice::from_ref(&undated),
            &HeuristicExtractor::default(),
            &mut claims,
            now(),
            &NewsOptions::default(),
        );
        assert_eq!(fresh.evidence[0].decay, 1.0);

        let mut claims = UrlClaims::new();
        let opts = NewsOptions {
            undated: UndatedPolicy::Skip,
            ..NewsOptions::default()
        };
        let skipped = score_articles(
            date(),
            "COM_GLD",
            std::slice::from_ref(&undated),
            &HeuristicExtractor::default(),
            &mut claims,
            now(),
            &opts,
        );
        assert!(skipped.evidence.is_empty());
        assert_eq!(claims.owner("https://a/undated"), Some("COM_GLD"));
    }

    #[test]
    fn top_explanations_rank_by_magnitude() {
        let mut claims = UrlClaims::new();
        let articles = vec![
            article("https://a/1", "Oil rises", now()),
            article("https://a/2", "Oil plunge deepens as demand weak", now()),
            article("https://a/3", "Oil rises", now() - Duration::days(3)),
        ];
        let s = score_articles(
            date(),
            "US_XLE",
            &articles,
            &HeuristicExtractor::default(),
            &mut claims,
            now(),
            &NewsOptions::default(),
        );
        let top = s.top_explanations(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].article_url, "https://a/2");
        assert_eq!(top[1].article_url, "https://a/1");
    }

    #[tokio::test]
    async fn first_query_in_order_claims_shared_articles() {
        let shared = article("https://a/opec", "OPEC cut lifts crude, prices rise", now());
        let provider = FakeProvider {
            by_query: [
                ("oil".to_string(), Ok(vec![shared.clone()])),
                ("wti".to_string(), Ok(vec![shared])),
            ]
            .into_iter()
            .collect(),
        };
        let queries = vec![query("US_XLE", "oil"), query("COM_USO", "wti")];
        let report = run_aggregation(
            &provider,
            &HeuristicExtractor::default(),
            &queries,
            &NewsOptions::default(),
            date(),
            now(),
        )
        .await;

        let scored: Vec<_> = report.scored().collect();
        assert_eq!(scored[0].score.series_id, "US_XLE");
        assert_eq!(scored[0].score.n_articles, 1);
        assert_eq!(scored[1].score.series_id, "COM_USO");
        assert_eq!(scored[1].score.n_articles, 0);
        assert_eq!(scored[1].score.ai_score, 0.0);
    }

    #[tokio::test]
    async fn fetch_failure_is_isolated() {
        let provider = FakeProvider {
            by_query: [
                ("oil".to_string(), Err("HTTP 429".to_string())),
                ("gold".to_string(), Ok(vec![article("https://a/g", "Gold hits record", now())])),
            ]
            .into_iter()
            .collect(),
        };
        let queries = vec![query("US_XLE", "oil"), query("COM_GLD", "gold")];
        let report = run_aggregation(
            &provider,
            &HeuristicExtractor::default(),
            &queries,
            &NewsOptions::default(),
            date(),
            now(),
        )
        .await;

        assert_eq!(report.failures(), 1);
        assert_eq!(report.outcomes[0].series_id(), "US_XLE");
        assert_eq!(report.outcomes[0].ai_score(), 0.0);
        assert!(report.outcomes[1].ai_score() > 0.0);
    }

    #[tokio::test]
    async fn rerun_with_same_inputs_is_identical() {
        let provider = FakeProvider {
            by_query: [(
                "oil".to_string(),
                Ok(vec![
                    article("https://a/1", "Crude rally", now() - Duration::hours(30)),
                    article("https://a/2", "Refinery delay", now() - Duration::days(2)),
                ]),
            )]
            .into_iter()
            .collect(),
        };
        let queries = vec![query("US_XLE", "oil")];
        let opts = NewsOptions::default();
        let extractor = HeuristicExtractor::default();

        let first = run_aggregation(&provider, &extractor, &queries, &opts, date(), now()).await;
        let second = run_aggregation(&provider, &extractor, &queries, &opts, date(), now()).await;
        assert_eq!(first, second);
    }
}
