//! Accuracy aggregation - combine findings and verdicts into a score.
//!
//! # Scoring
//!
//! 1. Pattern candidates under the sensitivity cutoff are dropped, and
//!    confident Contradicted/Unsupported verdicts become candidates too.
//!    Everything is deduplicated by span overlap.
//! 2. Base accuracy is 100 minus the severity-weighted confidence of the
//!    pattern candidates.
//! 3. With retrieval enabled, candidates inside verified claims are
//!    discounted, candidates inside contradicted claims are reinforced, and
//!    confident verdicts add a bonus or an extra penalty.
//! 4. Risk follows the reported accuracy; a near-certain critical finding
//!    forces at least High.

use std::cmp::Ordering;
use tracing::debug;

use crate::types::analysis::{RagEnhancement, RiskLevel};
use crate::types::claim::{HallucinationCandidate, HallucinationKind};
use crate::types::config::EngineConfig;
use crate::types::evidence::{ClaimVerification, VerificationStatus};
use crate::types::options::AnalysisOptions;

/// Spans overlapping by at least this share of the shorter one are duplicates.
pub const DUPLICATE_OVERLAP: f64 = 0.5;

/// Verdicts at or above this confidence earn the bonus or extra penalty.
pub const STRONG_VERDICT: f64 = 0.8;

/// Bonus per strongly verified claim.
pub const VERIFIED_BONUS: f64 = 2.0;

/// Cap on the total verified bonus.
pub const MAX_VERIFIED_BONUS: f64 = 15.0;

/// Extra penalty per strongly contradicted claim.
pub const CONTRADICTED_PENALTY: f64 = 5.0;

/// Critical findings at or above this confidence force at least High risk.
pub const CRITICAL_CONFIDENCE: f64 = 0.9;

/// How many enabled sources answered during a document's analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverage {
    pub consulted: usize,
    pub total_enabled: usize,
}

impl Coverage {
    pub fn new(consulted: usize, total_enabled: usize) -> Self {
        Self {
            consulted,
            total_enabled,
        }
    }

    /// Percentage (0-100) of enabled sources that answered.
    pub fn percentage(&self) -> f64 {
        if self.total_enabled == 0 {
            return 0.0;
        }
        (self.consulted as f64 / self.total_enabled as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// Scored findings for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// Reported accuracy in [0, 100].
    pub accuracy: f64,
    pub risk_level: RiskLevel,

    /// Highest confidence first, truncated to the requested maximum.
    pub hallucinations: Vec<HallucinationCandidate>,

    pub rag_enhancement: Option<RagEnhancement>,
    pub explanations: Vec<String>,
}

/// Turns candidates and verdicts into an accuracy score and risk level.
#[derive(Debug, Clone)]
pub struct AccuracyAggregator {
    verdict_threshold: f64,
}

impl Default for AccuracyAggregator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl AccuracyAggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            verdict_threshold: config.verdict_hallucination_threshold,
        }
    }

    pub fn aggregate(
        &self,
        pattern_candidates: &[HallucinationCandidate],
        verifications: &[ClaimVerification],
        coverage: Coverage,
        options: &AnalysisOptions,
    ) -> Aggregate {
        let admitted: Vec<HallucinationCandidate> = pattern_candidates
            .iter()
            .filter(|c| options.sensitivity.admits(c.confidence))
            .cloned()
            .collect();

        let base_findings = deduplicate(&admitted);
        let base_accuracy = score(&base_findings);
        let mut explanations = vec![format!(
            "Base accuracy {:.1} from {} pattern finding(s)",
            base_accuracy,
            base_findings.len()
        )];

        let (accuracy, mut findings, rag_enhancement) = if options.enable_rag {
            let derived = self.derive_from_verdicts(verifications);
            let adjusted: Vec<HallucinationCandidate> = admitted
                .iter()
                .map(|c| adjust_for_verdict(c, verifications))
                .filter(|c| options.sensitivity.admits(c.confidence))
                .collect();

            let combined: Vec<HallucinationCandidate> =
                adjusted.into_iter().chain(derived).collect();
            let findings = deduplicate(&combined);

            let verified = count_strong(verifications, VerificationStatus::Verified);
            let contradicted = count_strong(verifications, VerificationStatus::Contradicted);
            let bonus = (VERIFIED_BONUS * verified as f64).min(MAX_VERIFIED_BONUS);
            let penalty = CONTRADICTED_PENALTY * contradicted as f64;
            let enhanced = (score(&findings) + bonus - penalty).clamp(0.0, 100.0);

            let enhancement = RagEnhancement {
                base_accuracy,
                enhanced_accuracy: enhanced,
                improvement_score: enhanced - base_accuracy,
                source_coverage: coverage.percentage(),
            };
            explanations.push(format!(
                "Evidence adjusted accuracy to {:.1} ({} strongly verified, {} strongly contradicted claim(s))",
                enhanced, verified, contradicted
            ));
            explanations.push(format!(
                "{} of {} enabled source(s) answered ({:.0}% coverage)",
                coverage.consulted,
                coverage.total_enabled,
                enhancement.source_coverage
            ));

            (enhanced, findings, Some(enhancement))
        } else {
            (base_accuracy, base_findings, None)
        };

        let mut risk_level = RiskLevel::from_accuracy(accuracy);
        let has_critical = findings
            .iter()
            .any(|c| c.kind.is_critical() && c.confidence >= CRITICAL_CONFIDENCE);
        if has_critical && risk_level < RiskLevel::High {
            risk_level = RiskLevel::High;
            explanations.push("Risk raised to High by a critical finding".to_string());
        }

        findings.sort_by(report_order);
        let total = findings.len();
        findings.truncate(options.max_hallucinations);
        if findings.len() < total {
            explanations.push(format!("Showing {} of {} findings", findings.len(), total));
        }

        debug!(
            base_accuracy,
            accuracy,
            risk = ?risk_level,
            findings = total,
            "Aggregated document score"
        );

        Aggregate {
            accuracy,
            risk_level,
            hallucinations: findings,
            rag_enhancement,
            explanations,
        }
    }

    /// Candidates for confident Contradicted or Unsupported verdicts.
    fn derive_from_verdicts(&self, verifications: &[ClaimVerification]) -> Vec<HallucinationCandidate> {
        verifications
            .iter()
            .filter(|v| v.confidence > self.verdict_threshold)
            .filter_map(|v| {
                let kind = match v.status {
                    VerificationStatus::Contradicted => HallucinationKind::Other,
                    VerificationStatus::Unsupported => HallucinationKind::UnverifiableClaim,
                    VerificationStatus::Verified | VerificationStatus::Partial => return None,
                };
                Some(
                    HallucinationCandidate::new(
                        kind,
                        v.claim.text.clone(),
                        v.claim.start,
                        v.claim.end,
                        v.confidence,
                        v.explanation.clone(),
                    )
                    .from_verification(),
                )
            })
            .collect()
    }
}

/// Re-weight a pattern candidate by the verdict of the claim that contains it.
fn adjust_for_verdict(
    candidate: &HallucinationCandidate,
    verifications: &[ClaimVerification],
) -> HallucinationCandidate {
    let mut adjusted = candidate.clone();
    let verdict = verifications
        .iter()
        .find(|v| v.claim.contains_span(candidate.start, candidate.end));

    if let Some(v) = verdict {
        match v.status {
            VerificationStatus::Verified => {
                adjusted.confidence = candidate.confidence * (1.0 - v.confidence);
            }
            VerificationStatus::Contradicted => {
                adjusted.confidence = candidate.confidence.max(v.confidence);
            }
            VerificationStatus::Unsupported | VerificationStatus::Partial => {}
        }
    }
    adjusted
}

fn count_strong(verifications: &[ClaimVerification], status: VerificationStatus) -> usize {
    verifications
        .iter()
        .filter(|v| v.status == status && v.confidence >= STRONG_VERDICT)
        .count()
}

/// 100 minus the total penalty, clamped to [0, 100].
fn score(findings: &[HallucinationCandidate]) -> f64 {
    let penalty: f64 = findings.iter().map(|c| c.penalty()).sum();
    (100.0 - penalty).clamp(0.0, 100.0)
}

/// Higher confidence first, then earlier span, then kind order.
fn report_order(a: &HallucinationCandidate, b: &HallucinationCandidate) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.start.cmp(&b.start))
        .then_with(|| a.kind.cmp(&b.kind))
}

/// Drop candidates overlapping a stronger one by at least half the shorter span.
///
/// Greedy, highest confidence first. Confidence ties go to the heavier kind,
/// then to a pattern finding over a verification-derived one, then to the
/// earlier span and lower kind. A derived candidate therefore never absorbs a
/// contained pattern finding it was raised to match. The output never contains
/// a duplicate pair, which makes the operation idempotent.
pub fn deduplicate(candidates: &[HallucinationCandidate]) -> Vec<HallucinationCandidate> {
    let mut ordered: Vec<&HallucinationCandidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.kind.severity_weight().total_cmp(&a.kind.severity_weight()))
            .then_with(|| a.origin.cmp(&b.origin))
            .then_with(|| a.start.cmp(&b.start))
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.end.cmp(&b.end))
            .then_with(|| a.text.cmp(&b.text))
    });

    let mut kept: Vec<HallucinationCandidate> = Vec::with_capacity(ordered.len());
    for candidate in ordered {
        let duplicate = kept
            .iter()
            .any(|k| k.overlap_ratio(candidate) >= DUPLICATE_OVERLAP);
        if !duplicate {
            kept.push(candidate.clone());
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::claim::{CandidateOrigin, ClaimKind, ClaimSpan};
    use crate::types::evidence::ReliabilityAssessment;
    use crate::types::options::Sensitivity;
    use proptest::prelude::*;

    fn candidate(kind: HallucinationKind, start: usize, end: usize, confidence: f64) -> HallucinationCandidate {
        HallucinationCandidate::new(kind, "x".repeat(end - start), start, end, confidence, "test")
    }

    fn verdict(start: usize, end: usize, status: VerificationStatus, confidence: f64) -> ClaimVerification {
        ClaimVerification {
            claim: ClaimSpan::new("c".repeat(end - start), start, end, ClaimKind::Statistic),
            status,
            confidence,
            supporting_documents: Vec::new(),
            contradicting_documents: Vec::new(),
            explanation: format!("{:?}", status),
            reliability: ReliabilityAssessment::default(),
            sources_consulted: Vec::new(),
        }
    }

    fn pattern_only(sensitivity: Sensitivity) -> AnalysisOptions {
        AnalysisOptions::pattern_only().with_sensitivity(sensitivity)
    }

    #[test]
    fn test_base_accuracy_weights() {
        let candidates = vec![
            candidate(HallucinationKind::FalsePrecision, 29, 34, 0.85),
            candidate(HallucinationKind::ImpossibleMetric, 50, 70, 0.85),
        ];
        let result = AccuracyAggregator::default().aggregate(
            &candidates,
            &[],
            Coverage::default(),
            &pattern_only(Sensitivity::High),
        );

        // 100 - 8.5 - 12.75
        assert!((result.accuracy - 78.75).abs() < 1e-9);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(result.hallucinations.len(), 2);
        assert!(result.rag_enhancement.is_none());
        assert_eq!(result.hallucinations[0].kind, HallucinationKind::FalsePrecision);
    }

    #[test]
    fn test_sensitivity_cutoff() {
        let candidates = vec![
            candidate(HallucinationKind::UnverifiableClaim, 0, 10, 0.7),
            candidate(HallucinationKind::FalsePrecision, 20, 25, 0.5),
        ];
        let aggregator = AccuracyAggregator::default();

        let low = aggregator.aggregate(&candidates, &[], Coverage::default(), &pattern_only(Sensitivity::Low));
        let medium = aggregator.aggregate(&candidates, &[], Coverage::default(), &pattern_only(Sensitivity::Medium));
        let high = aggregator.aggregate(&candidates, &[], Coverage::default(), &pattern_only(Sensitivity::High));

        assert_eq!(low.hallucinations.len(), 0);
        assert_eq!(low.accuracy, 100.0);
        assert_eq!(medium.hallucinations.len(), 1);
        assert_eq!(high.hallucinations.len(), 2);
    }

    #[test]
    fn test_deduplicate_keeps_higher_confidence() {
        let candidates = vec![
            candidate(HallucinationKind::FalsePrecision, 0, 10, 0.6),
            candidate(HallucinationKind::ImpossibleMetric, 4, 12, 0.85),
            candidate(HallucinationKind::Other, 40, 50, 0.7),
        ];
        let kept = deduplicate(&candidates);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].kind, HallucinationKind::ImpossibleMetric);
        assert_eq!(kept[1].kind, HallucinationKind::Other);
    }

    #[test]
    fn test_deduplicate_tie_breaks() {
        let later = candidate(HallucinationKind::FalsePrecision, 5, 15, 0.8);
        let earlier = candidate(HallucinationKind::FalsePrecision, 0, 10, 0.8);
        let kept = deduplicate(&[later, earlier]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start, 0);

        let a = candidate(HallucinationKind::UnverifiableClaim, 0, 10, 0.8);
        let b = candidate(HallucinationKind::TechnicalImpossibility, 0, 10, 0.8);
        let kept = deduplicate(&[a, b]);
        assert_eq!(kept[0].kind, HallucinationKind::TechnicalImpossibility);
    }

    #[test]
    fn test_deduplicate_prefers_heavier_kind_on_tie() {
        let earlier = candidate(HallucinationKind::UnverifiableClaim, 0, 10, 0.8);
        let later = candidate(HallucinationKind::FalsePrecision, 5, 15, 0.8);
        let kept = deduplicate(&[earlier, later]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].kind, HallucinationKind::FalsePrecision);
    }

    #[test]
    fn test_deduplicate_prefers_pattern_over_derived_on_tie() {
        let derived = candidate(HallucinationKind::Other, 0, 40, 0.9).from_verification();
        let pattern = candidate(HallucinationKind::Other, 10, 20, 0.9);
        let kept = deduplicate(&[derived, pattern]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].origin, CandidateOrigin::Pattern);
        assert_eq!(kept[0].start, 10);
    }

    #[test]
    fn test_contradicted_claim_never_raises_accuracy() {
        let candidates = vec![
            candidate(HallucinationKind::FalsePrecision, 29, 34, 0.85),
            candidate(HallucinationKind::ImpossibleMetric, 50, 70, 0.85),
        ];
        let verifications = vec![verdict(0, 80, VerificationStatus::Contradicted, 0.95)];
        let options = AnalysisOptions::new().with_sensitivity(Sensitivity::High);
        let result = AccuracyAggregator::default().aggregate(
            &candidates,
            &verifications,
            Coverage::new(1, 1),
            &options,
        );
        let rag = result.rag_enhancement.unwrap();

        // Both findings raised to 0.95 and kept; the derived Other is absorbed
        assert!((rag.base_accuracy - 78.75).abs() < 1e-9);
        assert!((rag.enhanced_accuracy - 71.25).abs() < 1e-9);
        assert!(rag.enhanced_accuracy <= rag.base_accuracy);
        assert!(result.risk_level >= RiskLevel::High);
        assert_eq!(result.hallucinations.len(), 2);
        assert!(result
            .hallucinations
            .iter()
            .all(|h| h.origin == CandidateOrigin::Pattern));
    }

    #[test]
    fn test_verified_claim_discounts_candidate() {
        let candidates = vec![candidate(HallucinationKind::FalsePrecision, 10, 15, 0.8)];
        let verifications = vec![verdict(0, 40, VerificationStatus::Verified, 0.9)];
        let options = AnalysisOptions::new().with_sensitivity(Sensitivity::High);

        let result = AccuracyAggregator::default().aggregate(
            &candidates,
            &verifications,
            Coverage::new(2, 2),
            &options,
        );
        let rag = result.rag_enhancement.unwrap();

        assert!((rag.base_accuracy - 92.0).abs() < 1e-9);
        // 0.8 * 0.1 = 0.08 falls below the cutoff; +2 bonus
        assert!(result.hallucinations.is_empty());
        assert_eq!(rag.enhanced_accuracy, 100.0);
        assert!((rag.improvement_score - 8.0).abs() < 1e-9);
        assert_eq!(rag.source_coverage, 100.0);
    }

    #[test]
    fn test_contradicted_claim_penalises() {
        let verifications = vec![verdict(0, 40, VerificationStatus::Contradicted, 0.9)];
        let result = AccuracyAggregator::default().aggregate(
            &[],
            &verifications,
            Coverage::new(1, 2),
            &AnalysisOptions::new(),
        );
        let rag = result.rag_enhancement.unwrap();

        // Derived Other candidate 0.9 * 8 = 7.2, then -5 extra
        assert_eq!(result.hallucinations.len(), 1);
        assert_eq!(result.hallucinations[0].kind, HallucinationKind::Other);
        assert!((rag.enhanced_accuracy - 87.8).abs() < 1e-9);
        assert_eq!(rag.base_accuracy, 100.0);
        assert_eq!(rag.source_coverage, 50.0);
    }

    #[test]
    fn test_contradicted_claim_reinforces_contained_candidate() {
        // Verdict stays under the derivation threshold, so only the pattern remains
        let candidates = vec![candidate(HallucinationKind::FalsePrecision, 10, 15, 0.45)];
        let verifications = vec![verdict(0, 40, VerificationStatus::Contradicted, 0.55)];
        let options = AnalysisOptions::new().with_sensitivity(Sensitivity::High);
        let result = AccuracyAggregator::default().aggregate(
            &candidates,
            &verifications,
            Coverage::new(1, 1),
            &options,
        );

        assert_eq!(result.hallucinations.len(), 1);
        assert_eq!(result.hallucinations[0].kind, HallucinationKind::FalsePrecision);
        assert_eq!(result.hallucinations[0].confidence, 0.55);
    }

    #[test]
    fn test_verified_bonus_is_capped() {
        let verifications: Vec<_> = (0..10)
            .map(|i| verdict(i * 10, i * 10 + 5, VerificationStatus::Verified, 0.9))
            .collect();
        let candidates = vec![candidate(HallucinationKind::ImpossibleMetric, 200, 220, 1.0)];
        let result = AccuracyAggregator::default().aggregate(
            &candidates,
            &verifications,
            Coverage::new(1, 1),
            &AnalysisOptions::new(),
        );

        // 85 + min(15, 20)
        assert_eq!(result.rag_enhancement.unwrap().enhanced_accuracy, 100.0);
    }

    #[test]
    fn test_unsupported_verdicts_under_threshold_add_nothing() {
        let verifications = vec![verdict(0, 40, VerificationStatus::Unsupported, 0.0)];
        let result = AccuracyAggregator::default().aggregate(
            &[],
            &verifications,
            Coverage::new(0, 0),
            &AnalysisOptions::new(),
        );
        assert!(result.hallucinations.is_empty());
        assert_eq!(result.accuracy, 100.0);
        assert_eq!(result.rag_enhancement.unwrap().source_coverage, 0.0);
    }

    #[test]
    fn test_critical_finding_forces_high() {
        let candidates = vec![candidate(HallucinationKind::TechnicalImpossibility, 0, 10, 0.95)];
        let result = AccuracyAggregator::default().aggregate(
            &candidates,
            &[],
            Coverage::default(),
            &pattern_only(Sensitivity::Medium),
        );

        // 100 - 14.25 = 85.75 would be Low
        assert_eq!(result.risk_level, RiskLevel::High);
        assert!(result
            .explanations
            .iter()
            .any(|e| e.contains("critical finding")));
    }

    #[test]
    fn test_truncation_keeps_score_of_full_list() {
        let candidates: Vec<_> = (0..5)
            .map(|i| candidate(HallucinationKind::UnverifiableClaim, i * 20, i * 20 + 10, 0.7 + i as f64 * 0.05))
            .collect();
        let options = pattern_only(Sensitivity::Medium).with_max_hallucinations(2);
        let result = AccuracyAggregator::default().aggregate(&candidates, &[], Coverage::default(), &options);

        assert_eq!(result.hallucinations.len(), 2);
        assert!(result.hallucinations[0].confidence > result.hallucinations[1].confidence);
        let expected: f64 = 100.0 - candidates.iter().map(|c| c.penalty()).sum::<f64>();
        assert!((result.accuracy - expected).abs() < 1e-9);
    }

    #[test]
    fn test_risk_boundaries() {
        assert_eq!(RiskLevel::from_accuracy(85.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_accuracy(84.99), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_accuracy(65.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_accuracy(64.99), RiskLevel::High);
        assert_eq!(RiskLevel::from_accuracy(40.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_accuracy(39.99), RiskLevel::Critical);
    }

    fn arb_kind() -> impl Strategy<Value = HallucinationKind> {
        prop_oneof![
            Just(HallucinationKind::ImpossibleMetric),
            Just(HallucinationKind::TechnicalImpossibility),
            Just(HallucinationKind::FalsePrecision),
            Just(HallucinationKind::UnverifiableClaim),
            Just(HallucinationKind::Other),
        ]
    }

    fn arb_candidate() -> impl Strategy<Value = HallucinationCandidate> {
        (arb_kind(), 0usize..200, 1usize..40, 0.0f64..=1.0)
            .prop_map(|(kind, start, len, conf)| candidate(kind, start, start + len, conf))
    }

    fn arb_status() -> impl Strategy<Value = VerificationStatus> {
        prop_oneof![
            Just(VerificationStatus::Verified),
            Just(VerificationStatus::Contradicted),
            Just(VerificationStatus::Unsupported),
            Just(VerificationStatus::Partial),
        ]
    }

    fn arb_verdict() -> impl Strategy<Value = ClaimVerification> {
        (0usize..200, 1usize..80, arb_status(), 0.0f64..=0.95)
            .prop_map(|(start, len, status, conf)| verdict(start, start + len, status, conf))
    }

    proptest! {
        #[test]
        fn prop_accuracy_in_bounds(
            candidates in prop::collection::vec(arb_candidate(), 0..30),
            verdicts in prop::collection::vec(arb_verdict(), 0..10),
            rag in any::<bool>(),
        ) {
            let options = AnalysisOptions::new().with_rag(rag).with_sensitivity(Sensitivity::High);
            let result = AccuracyAggregator::default().aggregate(
                &candidates, &verdicts, Coverage::new(1, 3), &options,
            );
            prop_assert!((0.0..=100.0).contains(&result.accuracy));
            if let Some(rag) = result.rag_enhancement {
                prop_assert!((0.0..=100.0).contains(&rag.base_accuracy));
                prop_assert!((0.0..=100.0).contains(&rag.enhanced_accuracy));
            }
            prop_assert!(result.hallucinations.len() <= options.max_hallucinations);
        }

        #[test]
        fn prop_deduplicate_idempotent(candidates in prop::collection::vec(arb_candidate(), 0..30)) {
            let once = deduplicate(&candidates);
            let twice = deduplicate(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_aggregate_deterministic(
            candidates in prop::collection::vec(arb_candidate(), 0..20),
            verdicts in prop::collection::vec(arb_verdict(), 0..8),
        ) {
            let aggregator = AccuracyAggregator::default();
            let options = AnalysisOptions::new().with_sensitivity(Sensitivity::High);
            let first = aggregator.aggregate(&candidates, &verdicts, Coverage::new(2, 2), &options);
            let second = aggregator.aggregate(&candidates, &verdicts, Coverage::new(2, 2), &options);
            prop_assert_eq!(first, second);
        }
    }
}
