use crate::config::Settings;
use crate::domain::news::NewsArticle;
use crate::news::{FetchWindow, NewsOptions, NewsProvider};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://newsapi.org";
const EVERYTHING_PATH: &str = "/v2/everything";

#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn from_settings(settings: &Settings, opts: &NewsOptions) -> Result<Self> {
        let api_key = settings.require_newsapi_key()?.to_string();
        let base_url = settings
            .newsapi_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .context("failed to build news provider http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), EVERYTHING_PATH)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl NewsProvider for NewsApiClient {
    fn provider_name(&self) -> &'static str {
        "newsapi"
    }

    async fn fetch_articles(&self, query: &str, window: FetchWindow) -> Result<Vec<NewsArticle>> {
        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .query(&[
                ("q", query.to_string()),
                ("from", window.from.format("%Y-%m-%d").to_string()),
                ("to", window.to.format("%Y-%m-%d").to_string()),
                ("language", "en".to_string()),
                ("sortBy", "publishedAt".to_string()),
                ("pageSize", window.page_size.to_string()),
            ])
            .send()
            .await
            .context("news provider request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read news provider response")?;

        if !status.is_success() {
            anyhow::bail!("news provider HTTP {status}: {text}");
        }

        parse_everything(&text)
    }
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

fn parse_everything(text: &str) -> Result<Vec<NewsArticle>> {
    let parsed = serde_json::from_str::<EverythingResponse>(text)
        .with_context(|| format!("news provider response is not valid JSON: {text}"))?;

    if parsed.status != "ok" {
        anyhow::bail!(
            "news provider error: status={} code={} message={}",
            parsed.status,
            parsed.code.as_deref().unwrap_or("-"),
            parsed.message.as_deref().unwrap_or("-"),
        );
    }

    Ok(parsed
        .articles
        .into_iter()
        .filter_map(|a| {
            let url = a.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;
            Some(NewsArticle {
                url,
                title: a.title.unwrap_or_default(),
                description: a.description.filter(|d| !d.trim().is_empty()),
                published_at: a.published_at.unwrap_or_default(),
            })
        })
        .collect())
}
