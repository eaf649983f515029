//! Tavily-backed knowledge source.
//!
//! Sends the claim as a search query and turns each result into a hit.
//! When the source has `metadata.domain` set, results are restricted to
//! that domain, so one backend can serve several registry entries
//! (an encyclopedia, a news site, a journal index).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{ConfigResult, SourceError, SourceResult};
use crate::security::ApiKey;
use crate::traits::knowledge::{KnowledgeQuery, QueryContext, SourceHit};
use crate::types::source::KnowledgeSource;

pub const TAVILY_API_KEY_ENV: &str = "TAVILY_API_KEY";
pub const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

lazy_static! {
    static ref DEFAULT_ENDPOINT: Url = Url::parse(TAVILY_SEARCH_URL).unwrap();
}

#[derive(Debug, Serialize, PartialEq)]
struct SearchRequest {
    query: String,
    search_depth: String,
    max_results: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    include_domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResultItem>,
}

#[derive(Debug, Deserialize)]
struct SearchResultItem {
    url: String,
    title: Option<String>,
    content: Option<String>,
    score: Option<f64>,
    published_date: Option<String>,
}

/// Knowledge source backed by the Tavily search API.
#[derive(Debug, Clone)]
pub struct TavilyKnowledgeSource {
    api_key: ApiKey,
    client: reqwest::Client,
    endpoint: Url,
    /// Results requested per claim.
    pub max_results: usize,
    /// "basic" or "advanced".
    pub search_depth: String,
}

impl TavilyKnowledgeSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_key(ApiKey::new(api_key))
    }

    /// Read the key from `TAVILY_API_KEY`.
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self::with_key(ApiKey::from_env(TAVILY_API_KEY_ENV)?))
    }

    fn with_key(api_key: ApiKey) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.clone(),
            max_results: 5,
            search_depth: "basic".to_string(),
        }
    }

    /// Point at a different search endpoint (a proxy or a local stub).
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_request(&self, source: &KnowledgeSource, claim: &str) -> SearchRequest {
        SearchRequest {
            query: claim.to_string(),
            search_depth: self.search_depth.clone(),
            max_results: self.max_results,
            include_domains: source.metadata.domain.iter().cloned().collect(),
        }
    }

    async fn send(&self, source: &KnowledgeSource, claim: &str, ctx: &QueryContext) -> SourceResult<Vec<SourceHit>> {
        let request = self.build_request(source, claim);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .timeout(ctx.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(source, ctx, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited {
                source_id: source.id.clone(),
            });
        }
        if !status.is_success() {
            return Err(SourceError::Unavailable {
                source_id: source.id.clone(),
                reason: format!("Tavily API error: {}", status),
            });
        }

        let body = response.text().await.map_err(|e| request_error(source, ctx, e))?;
        let hits = parse_response(&source.id, &body)?;
        debug!(source = %source.id, hits = hits.len(), "Tavily search complete");
        Ok(hits)
    }
}

#[async_trait]
impl KnowledgeQuery for TavilyKnowledgeSource {
    async fn query(
        &self,
        source: &KnowledgeSource,
        claim: &str,
        ctx: &QueryContext,
    ) -> SourceResult<Vec<SourceHit>> {
        tokio::select! {
            result = self.send(source, claim, ctx) => result,
            _ = ctx.cancel.cancelled() => Err(SourceError::Cancelled),
        }
    }
}

fn request_error(source: &KnowledgeSource, ctx: &QueryContext, e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout {
            source_id: source.id.clone(),
            timeout_ms: ctx.timeout.as_millis() as u64,
        }
    } else {
        SourceError::Http(Box::new(e))
    }
}

/// Turn a Tavily response body into hits, dropping results with unusable URLs.
fn parse_response(source_id: &str, body: &str) -> SourceResult<Vec<SourceHit>> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| SourceError::InvalidResponse {
            source_id: source_id.to_string(),
            reason: e.to_string(),
        })?;

    let hits = response
        .results
        .into_iter()
        .filter_map(|r| {
            let url = Url::parse(&r.url).ok()?;
            let snippet = r.content.filter(|c| !c.trim().is_empty())?;

            let mut hit = SourceHit::new(snippet, r.score.unwrap_or(0.0)).with_url(url.to_string());
            if let Some(title) = r.title {
                hit = hit.with_title(title);
            }
            if let Some(published) = r.published_date.as_deref().and_then(parse_published_date) {
                hit = hit.with_published_at(published);
            }
            Some(hit)
        })
        .collect();

    Ok(hits)
}

/// Accepts RFC 3339, RFC 2822, or a bare `YYYY-MM-DD` date.
fn parse_published_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
