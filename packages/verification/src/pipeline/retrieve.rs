//! Evidence retrieval for a single claim.
//!
//! Queries every enabled source concurrently, each query holding one permit
//! of the shared query semaphore. Failing sources are skipped; only
//! cancellation aborts the retrieval.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::stance::classify_stance;
use crate::error::{RetrievalError, SourceError, SourceResult};
use crate::traits::knowledge::{KnowledgeQuery, QueryContext, SourceHit};
use crate::types::claim::ClaimSpan;
use crate::types::config::EngineConfig;
use crate::types::evidence::RetrievedDocument;
use crate::types::source::KnowledgeSource;

/// Evidence gathered for one claim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieval {
    /// Documents above the relevance floor, best first.
    pub documents: Vec<RetrievedDocument>,

    /// Sources that answered, in query order.
    pub consulted: Vec<String>,

    /// Sources that failed or timed out.
    pub failed: Vec<String>,
}

impl Retrieval {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Whether sources were queried and none of them answered.
    pub fn all_failed(&self) -> bool {
        self.consulted.is_empty() && !self.failed.is_empty()
    }
}

/// Fetches and ranks evidence for claims.
pub struct SourceRetriever<Q: KnowledgeQuery> {
    backend: Arc<Q>,
    permits: Arc<Semaphore>,
    query_timeout: Duration,
    min_relevance: f64,
}

impl<Q: KnowledgeQuery> Clone for SourceRetriever<Q> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            permits: Arc::clone(&self.permits),
            query_timeout: self.query_timeout,
            min_relevance: self.min_relevance,
        }
    }
}

impl<Q: KnowledgeQuery> SourceRetriever<Q> {
    /// Create a retriever sharing `permits` with every other retriever of the engine.
    pub fn new(backend: Arc<Q>, permits: Arc<Semaphore>, config: &EngineConfig) -> Self {
        Self {
            backend,
            permits,
            query_timeout: config.query_timeout(),
            min_relevance: config.min_relevance,
        }
    }

    /// Query `sources` for evidence about `claim`.
    ///
    /// Disabled sources in `sources` are ignored.
    pub async fn retrieve(
        &self,
        claim: &ClaimSpan,
        sources: &[&KnowledgeSource],
        cancel: &CancellationToken,
    ) -> Result<Retrieval, RetrievalError> {
        if cancel.is_cancelled() {
            return Err(RetrievalError::Cancelled);
        }

        let enabled: Vec<&KnowledgeSource> = sources.iter().copied().filter(|s| s.enabled).collect();
        if enabled.is_empty() {
            return Ok(Retrieval::default());
        }

        let queries = enabled
            .iter()
            .map(|source| self.query_source(source, &claim.text, cancel));

        let outcomes = tokio::select! {
            _ = cancel.cancelled() => return Err(RetrievalError::Cancelled),
            outcomes = join_all(queries) => outcomes,
        };

        let mut retrieval = Retrieval::default();
        for (source, outcome) in enabled.iter().zip(outcomes) {
            match outcome {
                Ok(hits) => {
                    retrieval.consulted.push(source.id.clone());
                    retrieval
                        .documents
                        .extend(self.to_documents(source, &claim.text, hits));
                }
                Err(e) => {
                    warn!(source_id = %source.id, error = %e, "Knowledge source unavailable, skipping");
                    retrieval.failed.push(source.id.clone());
                }
            }
        }

        let reliability: HashMap<&str, f64> = enabled
            .iter()
            .map(|s| (s.id.as_str(), s.reliability_score))
            .collect();
        sort_documents(&mut retrieval.documents, &reliability);

        debug!(
            documents = retrieval.documents.len(),
            consulted = retrieval.consulted.len(),
            failed = retrieval.failed.len(),
            "Retrieved evidence for claim"
        );

        Ok(retrieval)
    }

    async fn query_source(
        &self,
        source: &KnowledgeSource,
        claim: &str,
        cancel: &CancellationToken,
    ) -> SourceResult<Vec<SourceHit>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SourceError::Unavailable {
                source_id: source.id.clone(),
                reason: "query semaphore closed".to_string(),
            })?;

        let ctx = QueryContext::new(self.query_timeout, cancel.child_token());
        match tokio::time::timeout(self.query_timeout, self.backend.query(source, claim, &ctx)).await
        {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                source_id: source.id.clone(),
                timeout_ms: self.query_timeout.as_millis() as u64,
            }),
        }
    }

    fn to_documents(
        &self,
        source: &KnowledgeSource,
        claim: &str,
        hits: Vec<SourceHit>,
    ) -> Vec<RetrievedDocument> {
        hits.into_iter()
            .filter_map(|hit| {
                let relevance = hit.raw_relevance.clamp(0.0, 1.0);
                if relevance.is_nan() || relevance < self.min_relevance {
                    return None;
                }

                let stance = classify_stance(claim, &hit.snippet);
                let mut doc = RetrievedDocument::new(&source.id, hit.snippet, relevance, stance);
                doc.title = hit.title;
                doc.url = hit.url;
                doc.published_at = hit.published_at;
                if let Some(recency) = hit.recency {
                    doc = doc.with_recency(recency);
                }
                Some(doc)
            })
            .collect()
    }
}

/// Relevance descending, then source reliability descending, then source id.
fn sort_documents(documents: &mut [RetrievedDocument], reliability: &HashMap<&str, f64>) {
    documents.sort_by(|a, b| {
        let rel_a = reliability.get(a.source_id.as_str()).copied().unwrap_or(0.0);
        let rel_b = reliability.get(b.source_id.as_str()).copied().unwrap_or(0.0);
        b.relevance
            .total_cmp(&a.relevance)
            .then_with(|| rel_b.total_cmp(&rel_a))
            .then_with(|| a.source_id.cmp(&b.source_id))
    });
}
