//! Evidence and per-claim verification verdicts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::claim::ClaimSpan;

/// Position of a document relative to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Supports,
    Contradicts,
    Neutral,
}

/// A snippet returned by a knowledge source for one claim.
///
/// Exists only within one claim-verification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub source_id: String,
    pub snippet: String,

    /// Relevance in [0, 1].
    pub relevance: f64,

    pub stance: Stance,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    /// Freshness in [0, 1] when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recency: Option<f64>,
}

impl RetrievedDocument {
    pub fn new(
        source_id: impl Into<String>,
        snippet: impl Into<String>,
        relevance: f64,
        stance: Stance,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            snippet: snippet.into(),
            relevance: relevance.clamp(0.0, 1.0),
            stance,
            title: None,
            url: None,
            published_at: None,
            recency: None,
        }
    }

    /// Set the freshness score.
    pub fn with_recency(mut self, recency: f64) -> Self {
        self.recency = Some(recency.clamp(0.0, 1.0));
        self
    }

    /// Set the publication date.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// Verdict for a single claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    Verified,
    Contradicted,
    Unsupported,
    Partial,
}

/// Breakdown of how trustworthy the evidence behind a verdict is.
///
/// Every field is in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReliabilityAssessment {
    /// Mean reliability of the sources that answered.
    pub source_quality: f64,

    /// Agreement fraction between supporting and contradicting evidence.
    pub consensus_level: f64,

    /// Freshness of the evidence; 0.5 when unknown.
    pub recency: f64,

    pub overall_score: f64,
}

/// Verification verdict for one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerification {
    pub claim: ClaimSpan,
    pub status: VerificationStatus,

    /// Confidence in [0, 1].
    pub confidence: f64,

    /// Ordered by descending relevance
    pub supporting_documents: Vec<RetrievedDocument>,

    /// Ordered by descending relevance
    pub contradicting_documents: Vec<RetrievedDocument>,

    pub explanation: String,
    pub reliability: ReliabilityAssessment,

    /// Sources that answered for this claim.
    #[serde(default)]
    pub sources_consulted: Vec<String>,
}

impl ClaimVerification {
    pub fn has_evidence(&self) -> bool {
        !self.supporting_documents.is_empty() || !self.contradicting_documents.is_empty()
    }
}
