//! Analysis output types - one result per document, plus batch summaries.

use serde::{Deserialize, Serialize};

use super::claim::HallucinationCandidate;
use super::evidence::ClaimVerification;
use crate::error::AnalysisError;

/// Four-tier classification derived from accuracy and finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify a 0-100 accuracy score.
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 85.0 {
            RiskLevel::Low
        } else if accuracy >= 65.0 {
            RiskLevel::Medium
        } else if accuracy >= 40.0 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }
}

/// How retrieval changed the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RagEnhancement {
    /// Pattern-only accuracy
    pub base_accuracy: f64,

    /// Accuracy after evidence was taken into account
    pub enhanced_accuracy: f64,

    /// `enhanced_accuracy - base_accuracy`
    pub improvement_score: f64,

    /// Percentage (0-100) of enabled sources that answered.
    pub source_coverage: f64,
}

/// Final output for one document.
///
/// Immutable after construction; the caller owns storage and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Accuracy in [0, 100]
    pub accuracy: f64,

    pub risk_level: RiskLevel,

    /// Ordered by descending confidence
    pub hallucinations: Vec<HallucinationCandidate>,

    /// Distinct sources that answered at least one query.
    pub verification_sources_consulted: usize,

    pub processing_time_ms: u64,

    /// Present only when RAG was enabled for the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_enhancement: Option<RagEnhancement>,

    /// Number of claim spans found in the content.
    #[serde(default)]
    pub claims_analyzed: usize,

    /// Per-claim verdicts, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_verifications: Option<Vec<ClaimVerification>>,

    /// Notes on how the score and risk level were reached.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explanations: Vec<String>,

    /// SHA-256 of the analyzed content (hex).
    pub content_hash: String,
}

impl AnalysisResult {
    /// Result for content with nothing to check.
    pub fn trivially_accurate(content_hash: String) -> Self {
        Self {
            accuracy: 100.0,
            risk_level: RiskLevel::Low,
            hallucinations: Vec::new(),
            verification_sources_consulted: 0,
            processing_time_ms: 0,
            rag_enhancement: None,
            claims_analyzed: 0,
            claim_verifications: None,
            explanations: vec!["No verifiable content".to_string()],
            content_hash,
        }
    }

    /// Source coverage percentage, if retrieval ran.
    pub fn source_coverage(&self) -> Option<f64> {
        self.rag_enhancement.map(|r| r.source_coverage)
    }
}

/// A document submitted to the batch orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDocument {
    pub id: String,
    pub content: String,
}

impl BatchDocument {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Outcome for one batch document.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub id: String,
    pub result: std::result::Result<AnalysisResult, AnalysisError>,
}

impl DocumentOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Number of successful results per risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl RiskCounts {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High => self.high += 1,
            RiskLevel::Critical => self.critical += 1,
        }
    }

    pub fn get(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
            RiskLevel::Critical => self.critical,
        }
    }
}

/// Aggregate view of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_documents: usize,
    pub succeeded: usize,
    pub failed: usize,

    /// Mean accuracy over successful results (0 when none succeeded).
    pub average_accuracy: f64,

    pub risk_counts: RiskCounts,

    /// Wall-clock time of the whole batch.
    pub total_processing_time_ms: u64,
}

impl BatchSummary {
    /// Summarize outcomes (in any order).
    pub fn from_outcomes(outcomes: &[DocumentOutcome], total_processing_time_ms: u64) -> Self {
        let mut summary = Self {
            total_documents: outcomes.len(),
            total_processing_time_ms,
            ..Default::default()
        };

        let mut accuracy_sum = 0.0;
        for outcome in outcomes {
            match &outcome.result {
                Ok(result) => {
                    summary.succeeded += 1;
                    accuracy_sum += result.accuracy;
                    summary.risk_counts.record(result.risk_level);
                }
                Err(_) => summary.failed += 1,
            }
        }

        if summary.succeeded > 0 {
            summary.average_accuracy = accuracy_sum / summary.succeeded as f64;
        }

        summary
    }

    /// Every document failed (the only case worth an error dialog).
    pub fn all_failed(&self) -> bool {
        self.total_documents > 0 && self.succeeded == 0
    }
}

/// Output of a batch run, in input order.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub results: Vec<DocumentOutcome>,
    pub summary: BatchSummary,
}

impl BatchResult {
    /// Look up the outcome for a document id.
    pub fn get(&self, id: &str) -> Option<&DocumentOutcome> {
        self.results.iter().find(|o| o.id == id)
    }
}
