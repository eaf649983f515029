//! The Analyzer - main entry point for verifying one document.
//!
//! Runs extraction, then retrieval and verification for every claim
//! concurrently, then aggregation. The whole run is bounded by the document
//! timeout and can be cancelled by the caller.

use futures::future::join_all;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use super::aggregate::{AccuracyAggregator, Coverage};
use super::extract::ClaimExtractor;
use super::retrieve::SourceRetriever;
use super::rules::RuleSet;
use super::verify::ClaimVerifier;
use crate::error::{AnalysisError, Result, RetrievalError};
use crate::registry::SourceRegistry;
use crate::traits::knowledge::KnowledgeQuery;
use crate::types::analysis::AnalysisResult;
use crate::types::claim::ClaimSpan;
use crate::types::config::EngineConfig;
use crate::types::evidence::ClaimVerification;
use crate::types::options::AnalysisOptions;

/// Verifies documents against a knowledge source registry.
///
/// Cheap to clone; clones share the registry, the backend and the query
/// semaphore, so every document analyzed through any clone counts against
/// the same global query limit.
///
/// # Example
///
/// ```rust,ignore
/// let registry = Arc::new(SourceRegistry::from_file("sources.json")?);
/// let analyzer = Analyzer::new(Arc::new(CorpusKnowledgeBase::new()), registry);
///
/// let result = analyzer
///     .analyze("Recent studies show 73.4% of users prefer dark mode.", &AnalysisOptions::default())
///     .await?;
/// println!("{:.1} {:?}", result.accuracy, result.risk_level);
/// ```
pub struct Analyzer<Q: KnowledgeQuery> {
    registry: Arc<SourceRegistry>,
    config: EngineConfig,
    extractor: Arc<ClaimExtractor>,
    retriever: SourceRetriever<Q>,
    verifier: ClaimVerifier,
    aggregator: AccuracyAggregator,
}

impl<Q: KnowledgeQuery> Clone for Analyzer<Q> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
            extractor: Arc::clone(&self.extractor),
            retriever: self.retriever.clone(),
            verifier: self.verifier.clone(),
            aggregator: self.aggregator.clone(),
        }
    }
}

impl<Q: KnowledgeQuery> Analyzer<Q> {
    /// Create an analyzer with the default configuration.
    pub fn new(backend: Arc<Q>, registry: Arc<SourceRegistry>) -> Self {
        Self::with_config(backend, registry, EngineConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(backend: Arc<Q>, registry: Arc<SourceRegistry>, config: EngineConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_queries.max(1)));
        Self {
            retriever: SourceRetriever::new(backend, permits, &config),
            verifier: ClaimVerifier::new(&config),
            aggregator: AccuracyAggregator::new(&config),
            extractor: Arc::new(ClaimExtractor::default()),
            registry,
            config,
        }
    }

    /// Replace the pattern rules.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.extractor = Arc::new(ClaimExtractor::new(rules));
        self
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get a reference to the source registry.
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Analyze one document.
    pub async fn analyze(&self, content: &str, options: &AnalysisOptions) -> Result<AnalysisResult> {
        self.analyze_with_cancel(content, options, &CancellationToken::new())
            .await
    }

    /// Analyze one document, aborting when `cancel` fires.
    ///
    /// Cancellation and the document timeout both discard all partial work;
    /// in-flight queries are dropped and release their permits.
    pub async fn analyze_with_cancel(
        &self,
        content: &str,
        options: &AnalysisOptions,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("analyze_document", %run_id, bytes = content.len());

        async {
            let started = Instant::now();

            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            if content.len() > self.config.max_content_bytes {
                return Err(AnalysisError::ContentTooLarge {
                    size: content.len(),
                    limit: self.config.max_content_bytes,
                });
            }

            if !content.chars().any(char::is_alphanumeric) {
                let mut result = AnalysisResult::trivially_accurate(content_hash(content));
                result.processing_time_ms = started.elapsed().as_millis() as u64;
                return Ok(result);
            }

            let run_cancel = cancel.child_token();
            let deadline = self.config.document_timeout();

            tokio::select! {
                _ = cancel.cancelled() => {
                    run_cancel.cancel();
                    info!("Analysis cancelled");
                    Err(AnalysisError::Cancelled)
                }
                outcome = tokio::time::timeout(deadline, self.run(content, options, &run_cancel, started)) => {
                    match outcome {
                        Ok(result) => result,
                        Err(_) => {
                            run_cancel.cancel();
                            warn!(timeout_ms = deadline.as_millis() as u64, "Document analysis timed out");
                            Err(AnalysisError::timeout(started.elapsed()))
                        }
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        content: &str,
        options: &AnalysisOptions,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<AnalysisResult> {
        let extraction = self.extractor.extract(content);

        let (verifications, consulted) = if options.enable_rag {
            self.verify_claims(&extraction.claims, cancel).await?
        } else {
            (Vec::new(), HashSet::new())
        };

        let coverage = Coverage::new(consulted.len(), self.registry.total_enabled());
        let aggregate = self.aggregator.aggregate(
            &extraction.pattern_candidates,
            &verifications,
            coverage,
            options,
        );

        let result = AnalysisResult {
            accuracy: aggregate.accuracy,
            risk_level: aggregate.risk_level,
            hallucinations: aggregate.hallucinations,
            verification_sources_consulted: consulted.len(),
            processing_time_ms: started.elapsed().as_millis() as u64,
            rag_enhancement: aggregate.rag_enhancement,
            claims_analyzed: extraction.claims.len(),
            claim_verifications: options.include_source_verification.then_some(verifications),
            explanations: aggregate.explanations,
            content_hash: content_hash(content),
        };

        info!(
            "Analysis complete: accuracy={:.1}, risk={:?}, claims={}, findings={}, sources={}",
            result.accuracy,
            result.risk_level,
            result.claims_analyzed,
            result.hallucinations.len(),
            result.verification_sources_consulted
        );

        Ok(result)
    }

    /// Retrieve and verify every claim concurrently.
    async fn verify_claims(
        &self,
        claims: &[ClaimSpan],
        cancel: &CancellationToken,
    ) -> Result<(Vec<ClaimVerification>, HashSet<String>)> {
        let sources = self.registry.list_enabled_sources();

        let tasks = claims.iter().map(|claim| {
            let sources = &sources;
            async move {
                let retrieval = self.retriever.retrieve(claim, sources, cancel).await?;
                let verification = self.verifier.verify(claim, &retrieval, &self.registry);
                Ok::<_, RetrievalError>((verification, retrieval.consulted))
            }
        });

        let mut verifications = Vec::with_capacity(claims.len());
        let mut consulted = HashSet::new();
        for outcome in join_all(tasks).await {
            let (verification, answered) = outcome?;
            consulted.extend(answered);
            verifications.push(verification);
        }

        Ok((verifications, consulted))
    }
}

/// SHA-256 of the content, hex encoded.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
