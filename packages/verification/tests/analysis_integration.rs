//! Integration tests for single-document analysis.
//!
//! These tests drive the public API end to end:
//! 1. Extract claims and pattern findings
//! 2. Retrieve evidence from the configured sources
//! 3. Verify each claim
//! 4. Aggregate into accuracy, risk and findings

mod common;

use std::sync::Arc;

use proptest::prelude::*;
use verification::pipeline::extract;
use verification::testing::{fixture_registry, MockKnowledgeQuery};
use verification::{
    AnalysisOptions, Analyzer, CorpusKnowledgeBase, HallucinationKind, QueryRouter, RiskLevel,
    Sensitivity, SourceHit, VerificationStatus,
};

use common::{disabled_registry, init_tracing, single_source_registry};

#[tokio::test]
async fn test_empty_string_is_accurate() {
    init_tracing();
    let analyzer = Analyzer::new(Arc::new(MockKnowledgeQuery::new()), Arc::new(fixture_registry()));

    let result = analyzer.analyze("", &AnalysisOptions::default()).await.unwrap();

    assert_eq!(result.accuracy, 100.0);
    assert_eq!(result.risk_level, RiskLevel::Low);
    assert!(result.hallucinations.is_empty());
}

#[tokio::test]
async fn test_false_precision_and_impossible_metric() {
    init_tracing();
    let analyzer = Analyzer::new(Arc::new(MockKnowledgeQuery::new()), Arc::new(fixture_registry()));
    let options = AnalysisOptions::pattern_only().with_sensitivity(Sensitivity::High);

    let result = analyzer
        .analyze(
            "Our product achieves exactly 99.7% accuracy with zero false positives.",
            &options,
        )
        .await
        .unwrap();

    assert!(result.hallucinations.len() >= 2);
    assert!(result.accuracy < 80.0);

    let precision = result
        .hallucinations
        .iter()
        .find(|h| h.kind == HallucinationKind::FalsePrecision)
        .expect("false precision finding");
    assert!(precision.text.contains("99.7%"));

    let metric = result
        .hallucinations
        .iter()
        .find(|h| h.kind == HallucinationKind::ImpossibleMetric)
        .expect("impossible metric finding");
    assert!(metric.text.to_lowercase().contains("zero false positives"));
}

#[tokio::test]
async fn test_single_supporting_document_verifies() {
    init_tracing();
    let claim = "Water boils at 100 degrees Celsius at sea level.";
    let mock = MockKnowledgeQuery::new().with_hit("wiki", SourceHit::new(claim, 0.9));
    let analyzer = Analyzer::new(Arc::new(mock), single_source_registry());

    let result = analyzer
        .analyze(claim, &AnalysisOptions::new().with_source_verification())
        .await
        .unwrap();

    let verifications = result.claim_verifications.unwrap();
    assert_eq!(verifications.len(), 1);

    let verdict = &verifications[0];
    assert_eq!(verdict.status, VerificationStatus::Verified);
    assert!(
        (0.81..=0.95).contains(&verdict.confidence),
        "confidence {}",
        verdict.confidence
    );
    assert_eq!(verdict.supporting_documents.len(), 1);
    assert!(verdict.contradicting_documents.is_empty());
    assert_eq!(result.verification_sources_consulted, 1);
}

#[tokio::test]
async fn test_contradicted_claim_does_not_raise_accuracy() {
    init_tracing();
    let mock = MockKnowledgeQuery::new().with_hit(
        "wiki",
        SourceHit::new(
            "Independent tests found the product achieves 91.2% accuracy with zero false positives.",
            0.9,
        ),
    );
    let analyzer = Analyzer::new(Arc::new(mock), single_source_registry());
    let options = AnalysisOptions::new()
        .with_source_verification()
        .with_sensitivity(Sensitivity::High);

    let result = analyzer
        .analyze(
            "Our product achieves exactly 99.7% accuracy with zero false positives.",
            &options,
        )
        .await
        .unwrap();

    let verifications = result.claim_verifications.as_ref().unwrap();
    assert_eq!(verifications[0].status, VerificationStatus::Contradicted);

    let rag = result.rag_enhancement.as_ref().unwrap();
    assert!(
        rag.enhanced_accuracy <= rag.base_accuracy,
        "enhanced {} base {}",
        rag.enhanced_accuracy,
        rag.base_accuracy
    );
    assert!(result.risk_level >= RiskLevel::High);
    assert!(result
        .hallucinations
        .iter()
        .any(|h| h.kind == HallucinationKind::ImpossibleMetric));
}

#[tokio::test]
async fn test_snippet_calling_claim_false_contradicts() {
    init_tracing();
    let mock = MockKnowledgeQuery::new().with_hit(
        "wiki",
        SourceHit::new(
            "The claim that the product achieves 99.7% accuracy with zero false positives is false.",
            0.9,
        ),
    );
    let analyzer = Analyzer::new(Arc::new(mock), single_source_registry());

    let result = analyzer
        .analyze(
            "Our product achieves exactly 99.7% accuracy with zero false positives.",
            &AnalysisOptions::new().with_source_verification(),
        )
        .await
        .unwrap();

    let verdict = &result.claim_verifications.unwrap()[0];
    assert_eq!(verdict.status, VerificationStatus::Contradicted);
    assert!(verdict.supporting_documents.is_empty());
    assert_eq!(verdict.contradicting_documents.len(), 1);
}

#[tokio::test]
async fn test_unsupported_exactly_when_no_documents() {
    init_tracing();
    let mock = MockKnowledgeQuery::new()
        .with_claim_hit(
            "encyclopedia",
            "Eiffel",
            SourceHit::new("The Eiffel Tower is 330 meters tall.", 0.9),
        )
        .with_claim_hit(
            "newswire",
            "Eiffel",
            SourceHit::new("Tourism in Paris rose last summer.", 0.4),
        )
        .with_failure("journals");
    let analyzer = Analyzer::new(Arc::new(mock), Arc::new(fixture_registry()));

    let content = "The Eiffel Tower is 330 meters tall. \
                   Roughly 12 percent of visitors arrive by train. \
                   The museum opened in 1986.";
    let result = analyzer
        .analyze(content, &AnalysisOptions::new().with_source_verification())
        .await
        .unwrap();

    let verifications = result.claim_verifications.unwrap();
    assert_eq!(verifications.len(), 3);
    for v in &verifications {
        let empty = v.supporting_documents.is_empty() && v.contradicting_documents.is_empty();
        assert_eq!(v.status == VerificationStatus::Unsupported, empty, "{:?}", v.claim.text);
    }
    assert_eq!(verifications[0].status, VerificationStatus::Verified);
}

#[tokio::test]
async fn test_all_sources_disabled() {
    init_tracing();
    let mock = MockKnowledgeQuery::new().with_hit("wiki", SourceHit::new("anything", 1.0));
    let analyzer = Analyzer::new(Arc::new(mock.clone()), disabled_registry());

    let result = analyzer
        .analyze(
            "The bridge is 2,737 meters long. It opened in 1937.",
            &AnalysisOptions::new().with_source_verification(),
        )
        .await
        .unwrap();

    let verifications = result.claim_verifications.clone().unwrap();
    assert!(!verifications.is_empty());
    for v in &verifications {
        assert_eq!(v.status, VerificationStatus::Unsupported);
        assert_eq!(v.confidence, 0.0);
    }
    assert_eq!(result.source_coverage(), Some(0.0));
    assert_eq!(result.verification_sources_consulted, 0);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_router_coverage_counts_answering_sources() {
    init_tracing();
    let corpus = CorpusKnowledgeBase::new()
        .with_snippet("encyclopedia", "The Eiffel Tower is 330 meters tall and stands in Paris.");
    // journals and newswire are not routed and fail with NotRouted
    let router = QueryRouter::new().route("encyclopedia", corpus);
    let analyzer = Analyzer::new(Arc::new(router), Arc::new(fixture_registry()));

    let result = analyzer
        .analyze(
            "The Eiffel Tower is 330 meters tall.",
            &AnalysisOptions::new().with_source_verification(),
        )
        .await
        .unwrap();

    assert_eq!(result.verification_sources_consulted, 1);
    let coverage = result.source_coverage().unwrap();
    assert!((coverage - 100.0 / 3.0).abs() < 1e-6, "coverage {}", coverage);

    let verifications = result.claim_verifications.unwrap();
    assert_eq!(verifications[0].status, VerificationStatus::Verified);
}

#[test]
fn test_risk_level_boundaries() {
    assert_eq!(RiskLevel::from_accuracy(85.0), RiskLevel::Low);
    assert_eq!(RiskLevel::from_accuracy(84.9), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_accuracy(65.0), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_accuracy(64.9), RiskLevel::High);
    assert_eq!(RiskLevel::from_accuracy(40.0), RiskLevel::High);
    assert_eq!(RiskLevel::from_accuracy(39.9), RiskLevel::Critical);
}

const PLAIN_WORDS: &[&str] = &[
    "the", "cat", "sat", "on", "a", "mat", "garden", "river", "blue", "quiet", "walked",
    "morning", "window", "bread", "table", "green", "slowly", "house", "near", "old",
];

fn plain_sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(PLAIN_WORDS), 3..10).prop_map(|words| {
        let mut sentence = words.join(" ");
        sentence.push('.');
        sentence
    })
}

proptest! {
    #[test]
    fn prop_plain_content_has_no_pattern_findings(
        sentences in prop::collection::vec(plain_sentence(), 1..5)
    ) {
        let content = sentences.join(" ");
        let extraction = extract(&content);
        prop_assert!(extraction.pattern_candidates.is_empty());

        let result = tokio_test::block_on(async {
            Analyzer::new(Arc::new(MockKnowledgeQuery::new()), Arc::new(fixture_registry()))
                .analyze(&content, &AnalysisOptions::pattern_only())
                .await
        }).unwrap();
        prop_assert_eq!(result.accuracy, 100.0);
        prop_assert!(result.hallucinations.is_empty());
    }
}
