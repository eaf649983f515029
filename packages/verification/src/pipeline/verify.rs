//! Claim verification - turn retrieved evidence into a verdict.
//!
//! The verdict rule is fixed: one side must carry at least 1.5 times the
//! weighted evidence of the other to win, otherwise the claim is Partial
//! with confidence 0.5.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::retrieve::Retrieval;
use crate::registry::SourceRegistry;
use crate::types::claim::ClaimSpan;
use crate::types::config::{EngineConfig, ReliabilityWeights};
use crate::types::evidence::{
    ClaimVerification, ReliabilityAssessment, RetrievedDocument, Stance, VerificationStatus,
};

/// Margin one side needs over the other to decide a verdict.
pub const DOMINANCE_RATIO: f64 = 1.5;

/// Confidence reported for ambiguous evidence.
pub const PARTIAL_CONFIDENCE: f64 = 0.5;

/// Upper bound on a Verified or Contradicted confidence.
pub const MAX_VERDICT_CONFIDENCE: f64 = 0.95;

/// Recency assumed when no document says how fresh it is.
pub const NEUTRAL_RECENCY: f64 = 0.5;

const EPSILON: f64 = 1e-9;

/// Weighted evidence totals for one claim.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Tally {
    support: f64,
    contradiction: f64,
    supporting: usize,
    contradicting: usize,
}

/// Decides a verdict for each claim from its retrieved evidence.
#[derive(Debug, Clone)]
pub struct ClaimVerifier {
    weights: ReliabilityWeights,
    recency_horizon_days: u32,
}

impl Default for ClaimVerifier {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ClaimVerifier {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            weights: config.reliability_weights,
            recency_horizon_days: config.recency_horizon_days,
        }
    }

    /// Verify a claim against its evidence.
    pub fn verify(
        &self,
        claim: &ClaimSpan,
        retrieval: &Retrieval,
        registry: &SourceRegistry,
    ) -> ClaimVerification {
        self.verify_at(claim, retrieval, registry, Utc::now())
    }

    /// Verify with an explicit clock, for deriving recency from publication dates.
    pub fn verify_at(
        &self,
        claim: &ClaimSpan,
        retrieval: &Retrieval,
        registry: &SourceRegistry,
        now: DateTime<Utc>,
    ) -> ClaimVerification {
        let mut supporting = Vec::new();
        let mut contradicting = Vec::new();
        let mut known = Vec::new();
        let mut tally = Tally::default();

        for doc in &retrieval.documents {
            let Ok(source) = registry.get_source(&doc.source_id) else {
                debug!(source_id = %doc.source_id, "Skipping document from unknown source");
                continue;
            };

            let weight = doc.relevance * source.reliability_score;
            match doc.stance {
                Stance::Supports => {
                    tally.support += weight;
                    tally.supporting += 1;
                    supporting.push(doc.clone());
                }
                Stance::Contradicts => {
                    tally.contradiction += weight;
                    tally.contradicting += 1;
                    contradicting.push(doc.clone());
                }
                Stance::Neutral => {}
            }
            known.push(doc);
        }

        let (status, confidence) = decide(&tally);

        let source_quality = self.source_quality(retrieval, registry);
        let consensus_level = consensus(&tally);
        let recency = self.recency(&known, now);
        let reliability = ReliabilityAssessment {
            source_quality,
            consensus_level,
            recency,
            overall_score: self.weights.combine(source_quality, consensus_level, recency),
        };

        let explanation = explain(status, &tally, retrieval);
        debug!(
            claim = %claim.text,
            status = ?status,
            confidence,
            support = tally.support,
            contradiction = tally.contradiction,
            "Claim verified"
        );

        ClaimVerification {
            claim: claim.clone(),
            status,
            confidence,
            supporting_documents: supporting,
            contradicting_documents: contradicting,
            explanation,
            reliability,
            sources_consulted: retrieval.consulted.clone(),
        }
    }

    /// Mean reliability of the sources that answered.
    fn source_quality(&self, retrieval: &Retrieval, registry: &SourceRegistry) -> f64 {
        let scores: Vec<f64> = retrieval
            .consulted
            .iter()
            .filter_map(|id| registry.get_source(id).ok())
            .map(|s| s.reliability_score)
            .collect();
        mean(&scores).unwrap_or(0.0)
    }

    fn recency(&self, documents: &[&RetrievedDocument], now: DateTime<Utc>) -> f64 {
        let scores: Vec<f64> = documents
            .iter()
            .filter_map(|doc| {
                doc.recency.or_else(|| {
                    doc.published_at
                        .map(|published| self.recency_from_date(published, now))
                })
            })
            .collect();
        mean(&scores).unwrap_or(NEUTRAL_RECENCY)
    }

    /// Linear decay from 1 (published now) to 0 at the horizon.
    fn recency_from_date(&self, published: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        if self.recency_horizon_days == 0 {
            return NEUTRAL_RECENCY;
        }
        let age_days = (now - published).num_days().max(0) as f64;
        (1.0 - age_days / self.recency_horizon_days as f64).clamp(0.0, 1.0)
    }
}

fn decide(tally: &Tally) -> (VerificationStatus, f64) {
    if tally.supporting == 0 && tally.contradicting == 0 {
        return (VerificationStatus::Unsupported, 0.0);
    }

    let (s, c) = (tally.support, tally.contradiction);
    if s + c > 0.0 {
        if s > 0.0 && s >= DOMINANCE_RATIO * c {
            return (
                VerificationStatus::Verified,
                (s / (s + c + EPSILON)).min(MAX_VERDICT_CONFIDENCE),
            );
        }
        if c > 0.0 && c >= DOMINANCE_RATIO * s {
            return (
                VerificationStatus::Contradicted,
                (c / (s + c + EPSILON)).min(MAX_VERDICT_CONFIDENCE),
            );
        }
        return (VerificationStatus::Partial, PARTIAL_CONFIDENCE);
    }

    // Evidence exists but carries no weight: decide on document counts.
    let (ns, nc) = (tally.supporting as f64, tally.contradicting as f64);
    if ns > 0.0 && ns >= DOMINANCE_RATIO * nc {
        (VerificationStatus::Verified, 0.0)
    } else if nc > 0.0 && nc >= DOMINANCE_RATIO * ns {
        (VerificationStatus::Contradicted, 0.0)
    } else {
        (VerificationStatus::Partial, PARTIAL_CONFIDENCE)
    }
}

fn consensus(tally: &Tally) -> f64 {
    let total = tally.support + tally.contradiction;
    if total <= 0.0 {
        return 0.0;
    }
    tally.support.max(tally.contradiction) / total
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn explain(status: VerificationStatus, tally: &Tally, retrieval: &Retrieval) -> String {
    match status {
        VerificationStatus::Unsupported if retrieval.all_failed() => {
            "No knowledge source answered for this claim".to_string()
        }
        VerificationStatus::Unsupported => {
            "No supporting or contradicting evidence found".to_string()
        }
        VerificationStatus::Verified => format!(
            "Supported by {} document(s) (support {:.2} vs contradiction {:.2})",
            tally.supporting, tally.support, tally.contradiction
        ),
        VerificationStatus::Contradicted => format!(
            "Contradicted by {} document(s) (contradiction {:.2} vs support {:.2})",
            tally.contradicting, tally.contradiction, tally.support
        ),
        VerificationStatus::Partial => format!(
            "Evidence is mixed: {} supporting and {} contradicting document(s)",
            tally.supporting, tally.contradicting
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::claim::ClaimKind;
    use crate::types::source::{KnowledgeSource, SourceKind};
    use chrono::Duration;

    fn claim() -> ClaimSpan {
        ClaimSpan::new("The bridge is 2,737 meters long.", 0, 32, ClaimKind::Statistic)
    }

    fn registry() -> SourceRegistry {
        SourceRegistry::new(vec![
            KnowledgeSource::new("a", SourceKind::GeneralEncyclopedia, 0.9),
            KnowledgeSource::new("b", SourceKind::News, 0.6),
            KnowledgeSource::new("half", SourceKind::Government, 0.5),
            KnowledgeSource::new("zero", SourceKind::Custom, 0.0),
        ])
        .unwrap()
    }

    fn doc(source: &str, relevance: f64, stance: Stance) -> RetrievedDocument {
        RetrievedDocument::new(source, "snippet", relevance, stance)
    }

    fn retrieval(documents: Vec<RetrievedDocument>, consulted: &[&str]) -> Retrieval {
        Retrieval {
            documents,
            consulted: consulted.iter().map(|s| s.to_string()).collect(),
            failed: Vec::new(),
        }
    }

    #[test]
    fn test_single_supporting_document_verifies() {
        let r = retrieval(vec![doc("a", 0.9, Stance::Supports)], &["a"]);
        let v = ClaimVerifier::default().verify(&claim(), &r, &registry());

        assert_eq!(v.status, VerificationStatus::Verified);
        assert!(v.confidence >= 0.81 && v.confidence <= 0.95);
        assert_eq!(v.supporting_documents.len(), 1);
        assert_eq!(v.reliability.consensus_level, 1.0);
        assert_eq!(v.reliability.source_quality, 0.9);
        assert_eq!(v.reliability.recency, NEUTRAL_RECENCY);
    }

    #[test]
    fn test_contradiction_dominates() {
        let r = retrieval(
            vec![
                doc("a", 0.9, Stance::Contradicts),
                doc("b", 0.5, Stance::Supports),
            ],
            &["a", "b"],
        );
        let v = ClaimVerifier::default().verify(&claim(), &r, &registry());

        // 0.81 contradiction vs 0.30 support
        assert_eq!(v.status, VerificationStatus::Contradicted);
        assert!((v.confidence - 0.81 / 1.11).abs() < 1e-6);
        assert!((v.reliability.source_quality - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_balanced_evidence_is_partial() {
        let r = retrieval(
            vec![
                doc("a", 0.6, Stance::Supports),
                doc("b", 0.9, Stance::Contradicts),
            ],
            &["a", "b"],
        );
        let v = ClaimVerifier::default().verify(&claim(), &r, &registry());

        // 0.54 vs 0.54
        assert_eq!(v.status, VerificationStatus::Partial);
        assert_eq!(v.confidence, PARTIAL_CONFIDENCE);
    }

    #[test]
    fn test_dominance_boundary() {
        // support 0.75 * 0.5 = 0.375, contradiction 0.5 * 0.5 = 0.25; exactly 1.5x
        let r = retrieval(
            vec![
                doc("half", 0.75, Stance::Supports),
                doc("half", 0.5, Stance::Contradicts),
            ],
            &["half"],
        );
        let v = ClaimVerifier::default().verify(&claim(), &r, &registry());
        assert_eq!(v.status, VerificationStatus::Verified);
    }

    #[test]
    fn test_no_evidence_is_unsupported() {
        let r = retrieval(vec![doc("a", 0.9, Stance::Neutral)], &["a"]);
        let v = ClaimVerifier::default().verify(&claim(), &r, &registry());

        assert_eq!(v.status, VerificationStatus::Unsupported);
        assert_eq!(v.confidence, 0.0);
        assert!(!v.has_evidence());
        assert_eq!(v.reliability.consensus_level, 0.0);
    }

    #[test]
    fn test_all_sources_failed() {
        let r = Retrieval {
            documents: Vec::new(),
            consulted: Vec::new(),
            failed: vec!["a".to_string()],
        };
        let v = ClaimVerifier::default().verify(&claim(), &r, &registry());

        assert_eq!(v.status, VerificationStatus::Unsupported);
        assert_eq!(v.reliability.source_quality, 0.0);
        assert!(v.explanation.contains("No knowledge source answered"));
    }

    #[test]
    fn test_zero_weight_evidence_uses_counts() {
        let r = retrieval(vec![doc("zero", 0.9, Stance::Supports)], &["zero"]);
        let v = ClaimVerifier::default().verify(&claim(), &r, &registry());

        assert_eq!(v.status, VerificationStatus::Verified);
        assert_eq!(v.confidence, 0.0);
        assert!(v.has_evidence());
    }

    #[test]
    fn test_unknown_source_is_skipped() {
        let r = retrieval(vec![doc("ghost", 0.9, Stance::Supports)], &["ghost"]);
        let v = ClaimVerifier::default().verify(&claim(), &r, &registry());

        assert_eq!(v.status, VerificationStatus::Unsupported);
        assert!(v.supporting_documents.is_empty());
    }

    #[test]
    fn test_recency_from_publication_date() {
        let now = Utc::now();
        let config = EngineConfig {
            recency_horizon_days: 100,
            ..EngineConfig::default()
        };
        let r = retrieval(
            vec![
                doc("a", 0.9, Stance::Supports).with_published_at(now - Duration::days(50)),
                doc("b", 0.9, Stance::Supports).with_recency(1.0),
            ],
            &["a", "b"],
        );
        let v = ClaimVerifier::new(&config).verify_at(&claim(), &r, &registry(), now);

        assert!((v.reliability.recency - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_overall_uses_weights() {
        let config = EngineConfig::default().with_reliability_weights(ReliabilityWeights {
            source_quality: 1.0,
            consensus_level: 0.0,
            recency: 0.0,
        });
        let r = retrieval(vec![doc("b", 0.9, Stance::Supports)], &["b"]);
        let v = ClaimVerifier::new(&config).verify(&claim(), &r, &registry());

        assert!((v.reliability.overall_score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_iff_no_documents() {
        let cases = vec![
            vec![],
            vec![doc("a", 0.5, Stance::Neutral)],
            vec![doc("a", 0.5, Stance::Supports)],
            vec![doc("b", 0.5, Stance::Contradicts)],
            vec![doc("zero", 0.5, Stance::Contradicts)],
        ];
        for documents in cases {
            let r = retrieval(documents, &["a", "b"]);
            let v = ClaimVerifier::default().verify(&claim(), &r, &registry());
            assert_eq!(v.status == VerificationStatus::Unsupported, !v.has_evidence());
        }
    }
}
