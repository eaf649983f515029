//! Knowledge source query trait.
//!
//! This is the only I/O boundary inside the verification core. The library
//! asks "what does this source say about this claim?" and the implementation
//! decides how to answer: an HTTP search API, a local corpus, a database.
//!
//! ```rust,ignore
//! let ctx = QueryContext::new(Duration::from_secs(5), cancel.child_token());
//! let hits = backend.query(&source, "Water boils at 100 degrees Celsius", &ctx).await?;
//!
//! for hit in hits {
//!     println!("{:.2} {}", hit.raw_relevance, hit.snippet);
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::SourceResult;
use crate::types::source::KnowledgeSource;

/// A candidate snippet returned by a knowledge source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceHit {
    pub snippet: String,

    /// Relevance as reported by the source (clamped to [0, 1] on use).
    pub raw_relevance: f64,

    pub title: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,

    /// Freshness in [0, 1], if the source knows it.
    pub recency: Option<f64>,
}

impl SourceHit {
    /// Create a hit from a snippet and its relevance.
    pub fn new(snippet: impl Into<String>, raw_relevance: f64) -> Self {
        Self {
            snippet: snippet.into(),
            raw_relevance,
            title: None,
            url: None,
            published_at: None,
            recency: None,
        }
    }

    /// Add a title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Add a publication date.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Add a freshness score.
    pub fn with_recency(mut self, recency: f64) -> Self {
        self.recency = Some(recency);
        self
    }
}

/// Per-call limits handed to a query implementation.
///
/// The retriever enforces both the timeout and the cancellation itself;
/// implementations may also use them to abort early (e.g. as an HTTP
/// request timeout).
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub timeout: Duration,
    pub cancel: CancellationToken,
}

impl QueryContext {
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), CancellationToken::new())
    }
}

/// Queries one knowledge source for evidence about a claim.
///
/// # Implementations
///
/// - `CorpusKnowledgeBase` - in-memory snippets per source
/// - `TavilyKnowledgeSource` - Tavily search API
/// - `QueryRouter` - dispatches each source id to its own backend
/// - `MockKnowledgeQuery` - For testing
#[async_trait]
pub trait KnowledgeQuery: Send + Sync {
    /// Return candidate snippets for `claim` from `source`.
    async fn query(
        &self,
        source: &KnowledgeSource,
        claim: &str,
        ctx: &QueryContext,
    ) -> SourceResult<Vec<SourceHit>>;
}

#[async_trait]
impl<T: KnowledgeQuery + ?Sized> KnowledgeQuery for std::sync::Arc<T> {
    async fn query(
        &self,
        source: &KnowledgeSource,
        claim: &str,
        ctx: &QueryContext,
    ) -> SourceResult<Vec<SourceHit>> {
        (**self).query(source, claim, ctx).await
    }
}
