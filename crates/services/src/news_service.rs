//! Client for the external news source and its paged view.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use catalog_core::listing::PageInfo;
use catalog_core::model::NewsArticle;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ServiceError;

pub const DEFAULT_NEWS_BASE_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_NEWS_QUERY: &str = "AI";

/// Errors emitted by a `NewsSource`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NewsError {
    #[error("news source is not configured")]
    Disabled,
    #[error("news request failed with status {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("news source reported {code}: {message}")]
    Api { code: String, message: String },
    #[error("malformed news response: {0}")]
    Shape(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl From<NewsError> for ServiceError {
    fn from(err: NewsError) -> Self {
        match err {
            NewsError::Shape(msg) => Self::UnexpectedShape(msg),
            other => Self::RemoteFailure(other.to_string()),
        }
    }
}

/// Ordering requested from the news source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum NewsSortKey {
    Relevancy,
    Popularity,
    #[default]
    PublishedAt,
}

impl NewsSortKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relevancy => "relevancy",
            Self::Popularity => "popularity",
            Self::PublishedAt => "publishedAt",
        }
    }
}

impl fmt::Display for NewsSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown news sort key: {0}")]
pub struct ParseNewsSortKeyError(String);

impl FromStr for NewsSortKey {
    type Err = ParseNewsSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "relevancy" => Ok(Self::Relevancy),
            "popularity" => Ok(Self::Popularity),
            "publishedAt" | "published-at" | "" => Ok(Self::PublishedAt),
            other => Err(ParseNewsSortKeyError(other.to_owned())),
        }
    }
}

/// One page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub query: String,
    pub sort: NewsSortKey,
    pub page_size: usize,
    pub page: usize,
}

impl NewsQuery {
    #[must_use]
    pub fn new(query: impl Into<String>, page_size: usize, page: usize) -> Self {
        Self {
            query: query.into(),
            sort: NewsSortKey::default(),
            page_size: page_size.max(1),
            page: page.max(1),
        }
    }

    #[must_use]
    pub fn sorted_by(mut self, sort: NewsSortKey) -> Self {
        self.sort = sort;
        self
    }
}

/// What the news source returned for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsBatch {
    pub articles: Vec<NewsArticle>,
    pub total_results: usize,
}

/// The external news collaborator.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `NewsError` for transport failures, error statuses and
    /// responses that do not match the expected shape.
    async fn fetch(&self, query: &NewsQuery) -> Result<NewsBatch, NewsError>;
}

#[derive(Clone, Debug)]
pub struct NewsConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl NewsConfig {
    /// `None` when the key is blank.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: &str, timeout: Duration) -> Option<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return None;
        }
        Some(Self {
            base_url: base_url.into(),
            api_key: api_key.to_owned(),
            timeout,
        })
    }
}

/// `NewsSource` speaking the NewsAPI `everything` endpoint.
#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    config: NewsConfig,
}

impl NewsApiClient {
    /// # Errors
    ///
    /// Returns `NewsError::Http` if the HTTP client cannot be built.
    pub fn new(config: NewsConfig) -> Result<Self, NewsError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn fetch(&self, query: &NewsQuery) -> Result<NewsBatch, NewsError> {
        let url = format!("{}/everything", self.config.base_url.trim_end_matches('/'));
        let page_size = query.page_size.to_string();
        let page = query.page.to_string();

        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.config.api_key)
            .query(&[
                ("q", query.query.as_str()),
                ("sortBy", query.sort.as_str()),
                ("pageSize", page_size.as_str()),
                ("page", page.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(ApiError { code, message }) = serde_json::from_str::<ApiError>(&body) {
                return Err(NewsError::Api { code, message });
            }
            return Err(NewsError::HttpStatus { status, body });
        }

        let parsed: EverythingResponse =
            serde_json::from_str(&body).map_err(|e| NewsError::Shape(e.to_string()))?;
        parsed.into_batch()
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    total_results: Option<u64>,
    #[serde(default)]
    articles: Option<Vec<RawArticle>>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    source: RawSource,
    title: String,
    description: Option<String>,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: String,
}

impl EverythingResponse {
    fn into_batch(self) -> Result<NewsBatch, NewsError> {
        if self.status != "ok" {
            return Err(NewsError::Api {
                code: self.code.unwrap_or_else(|| self.status.clone()),
                message: self.message.unwrap_or_default(),
            });
        }
        let total = self
            .total_results
            .ok_or_else(|| NewsError::Shape("missing totalResults".into()))?;
        let articles = self
            .articles
            .ok_or_else(|| NewsError::Shape("missing articles".into()))?;

        Ok(NewsBatch {
            total_results: usize::try_from(total)
                .map_err(|_| NewsError::Shape(format!("totalResults out of range: {total}")))?,
            articles: articles
                .into_iter()
                .map(|raw| NewsArticle {
                    title: raw.title,
                    description: raw.description,
                    url: raw.url,
                    source_name: raw.source.name,
                })
                .collect(),
        })
    }
}

/// A page of news plus its position, derived from the reported total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsPage {
    pub articles: Vec<NewsArticle>,
    pub info: PageInfo,
}

/// Pages through the news source with the shared pagination rules.
#[derive(Clone)]
pub struct NewsService {
    source: Option<Arc<dyn NewsSource>>,
}

impl NewsService {
    #[must_use]
    pub fn new(source: Arc<dyn NewsSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { source: None }
    }

    /// Builds a NewsAPI-backed service, or a disabled one without config.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the HTTP client cannot be built.
    pub fn from_config(config: Option<NewsConfig>) -> Result<Self, ServiceError> {
        match config {
            Some(config) => Ok(Self::new(Arc::new(NewsApiClient::new(config)?))),
            None => Ok(Self::disabled()),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.source.is_some()
    }

    /// # Errors
    ///
    /// Returns `RemoteFailure` for transport or API errors (and when no
    /// source is configured) and `UnexpectedShape` for malformed responses.
    pub async fn page(&self, query: &NewsQuery) -> Result<NewsPage, ServiceError> {
        let source = self.source.as_ref().ok_or(NewsError::Disabled)?;
        let batch = source.fetch(query).await.inspect_err(|err| {
            tracing::warn!(
                error = %err,
                query = %query.query,
                page = query.page,
                "news fetch failed"
            );
        })?;

        let info = PageInfo::new(batch.total_results, query.page_size, query.page);
        tracing::debug!(
            total = batch.total_results,
            page = info.current_page,
            pages = info.total_pages,
            "loaded news page"
        );
        Ok(NewsPage {
            articles: batch.articles,
            info,
        })
    }
}
