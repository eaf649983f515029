//! Claim spans and hallucination candidates.
//!
//! Offsets are byte offsets into the analyzed content and always fall on
//! UTF-8 character boundaries, so `&content[start..end]` is valid.

use serde::{Deserialize, Serialize};

/// What sort of checkable fact a claim asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    /// Numeric statistic ("73.4% of users...")
    Statistic,
    /// Attributed claim ("studies show...", "according to...")
    Attribution,
    /// Named superlative ("the largest...")
    Superlative,
    /// Causal statement ("X leads to Y")
    Causal,
    Other,
}

/// A span of text asserting a checkable fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub kind: ClaimKind,
}

impl ClaimSpan {
    pub fn new(text: impl Into<String>, start: usize, end: usize, kind: ClaimKind) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            kind,
        }
    }

    /// Whether `[start, end)` lies inside this claim.
    pub fn contains_span(&self, start: usize, end: usize) -> bool {
        start >= self.start && end <= self.end
    }
}

/// Type of suspected hallucination.
///
/// Variant order is used as the final deterministic tie-break when
/// deduplicating candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HallucinationKind {
    ImpossibleMetric,
    TechnicalImpossibility,
    FalsePrecision,
    UnverifiableClaim,
    Other,
}

impl HallucinationKind {
    /// Points deducted from accuracy per unit of confidence.
    pub fn severity_weight(&self) -> f64 {
        match self {
            HallucinationKind::ImpossibleMetric => 15.0,
            HallucinationKind::TechnicalImpossibility => 15.0,
            HallucinationKind::FalsePrecision => 10.0,
            HallucinationKind::UnverifiableClaim => 8.0,
            HallucinationKind::Other => 8.0,
        }
    }

    /// Kinds that can force the risk level up regardless of the score.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            HallucinationKind::ImpossibleMetric | HallucinationKind::TechnicalImpossibility
        )
    }
}

/// Where a candidate came from. Pattern sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    /// A direct pattern rule.
    #[default]
    Pattern,
    /// A contradicted or unsupported verification verdict.
    Verification,
}

/// A statement judged fabricated, unverifiable, or statistically implausible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallucinationCandidate {
    pub text: String,

    #[serde(rename = "type")]
    pub kind: HallucinationKind,

    /// Confidence in [0, 1].
    pub confidence: f64,

    /// Human-readable reason
    pub explanation: String,

    pub start: usize,
    pub end: usize,

    #[serde(default)]
    pub origin: CandidateOrigin,
}

impl HallucinationCandidate {
    /// Create a pattern candidate. Confidence is clamped into [0, 1].
    pub fn new(
        kind: HallucinationKind,
        text: impl Into<String>,
        start: usize,
        end: usize,
        confidence: f64,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            kind,
            confidence: confidence.clamp(0.0, 1.0),
            explanation: explanation.into(),
            start,
            end,
            origin: CandidateOrigin::Pattern,
        }
    }

    /// Mark the candidate as derived from a verification verdict.
    pub fn from_verification(mut self) -> Self {
        self.origin = CandidateOrigin::Verification;
        self
    }

    /// Span length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fraction of the shorter span covered by the intersection.
    pub fn overlap_ratio(&self, other: &HallucinationCandidate) -> f64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if end <= start {
            return 0.0;
        }
        let shorter = self.len().min(other.len());
        if shorter == 0 {
            return 0.0;
        }
        (end - start) as f64 / shorter as f64
    }

    /// Points this candidate deducts from a 100-point accuracy score.
    pub fn penalty(&self) -> f64 {
        self.confidence * self.kind.severity_weight()
    }
}
