//! Batch orchestration - analyze many documents with bounded concurrency.
//!
//! At most `worker_count` documents run at once. External queries are
//! bounded separately by the analyzer's shared semaphore, so a batch never
//! exceeds the global query limit however many documents are in flight.
//! Results come back in input order.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::analyzer::Analyzer;
use crate::error::AnalysisError;
use crate::traits::knowledge::KnowledgeQuery;
use crate::types::analysis::{
    AnalysisResult, BatchDocument, BatchResult, BatchSummary, DocumentOutcome,
};
use crate::types::options::AnalysisOptions;

/// Runs the single-document pipeline over a batch.
pub struct BatchOrchestrator<Q: KnowledgeQuery + 'static> {
    analyzer: Analyzer<Q>,
    worker_count: usize,
}

impl<Q: KnowledgeQuery + 'static> BatchOrchestrator<Q> {
    /// Create an orchestrator using the analyzer's configured worker count.
    pub fn new(analyzer: Analyzer<Q>) -> Self {
        let worker_count = analyzer.config().worker_count;
        Self {
            analyzer,
            worker_count,
        }
    }

    /// Override the number of documents analyzed at once.
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count.max(1)
    }

    /// Analyze every document; one document failing never aborts the others.
    pub async fn run_batch(&self, documents: Vec<BatchDocument>, options: &AnalysisOptions) -> BatchResult {
        self.run_batch_with_cancel(documents, options, &CancellationToken::new())
            .await
    }

    /// Analyze every document, cancelling all unfinished ones when `cancel` fires.
    ///
    /// Cancelled documents are reported as [`AnalysisError::Cancelled`];
    /// documents that already finished keep their results.
    pub async fn run_batch_with_cancel(
        &self,
        documents: Vec<BatchDocument>,
        options: &AnalysisOptions,
        cancel: &CancellationToken,
    ) -> BatchResult {
        let started = Instant::now();
        let total = documents.len();
        let workers = self.worker_count();
        info!(documents = total, workers, "Starting batch analysis");

        let ids: Vec<String> = documents.iter().map(|d| d.id.clone()).collect();
        let mut slots: Vec<Option<crate::error::Result<AnalysisResult>>> = (0..total).map(|_| None).collect();
        let mut pending = documents.into_iter().enumerate();
        let mut join_set = JoinSet::new();

        loop {
            while join_set.len() < workers {
                let Some((index, document)) = pending.next() else {
                    break;
                };
                let analyzer = self.analyzer.clone();
                let options = options.clone();
                let token = cancel.child_token();

                join_set.spawn(async move {
                    let analysis = analyzer.analyze_with_cancel(&document.content, &options, &token);
                    let result = match AssertUnwindSafe(analysis).catch_unwind().await {
                        Ok(result) => result,
                        Err(_) => Err(AnalysisError::Internal("analysis panicked".to_string())),
                    };
                    (index, result)
                });
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };
            match joined {
                Ok((index, result)) => {
                    if let Err(e) = &result {
                        error!(document_id = %ids[index], error = %e, "Document analysis failed");
                    }
                    slots[index] = Some(result);
                }
                Err(e) => error!(error = %e, "Batch worker task failed"),
            }
        }

        let results: Vec<DocumentOutcome> = ids
            .into_iter()
            .zip(slots)
            .map(|(id, slot)| DocumentOutcome {
                id,
                result: slot.unwrap_or_else(|| {
                    Err(AnalysisError::Internal("analysis task did not complete".to_string()))
                }),
            })
            .collect();

        let summary = BatchSummary::from_outcomes(&results, started.elapsed().as_millis() as u64);
        info!(
            "Batch complete: {} succeeded, {} failed, average accuracy {:.1}",
            summary.succeeded, summary.failed, summary.average_accuracy
        );

        BatchResult { results, summary }
    }
}
