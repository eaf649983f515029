//! Analysis pipeline - the core of the library.
//!
//! The pipeline runs, per document:
//! - Sentence splitting and claim extraction
//! - Pattern rules (false precision, vague attribution, impossible metrics)
//! - Retrieval from every enabled knowledge source, per claim
//! - Stance classification and evidence-weighted verdicts
//! - Aggregation into an accuracy score, risk level and ranked findings
//!
//! [`BatchOrchestrator`] runs the same pipeline over many documents.

pub mod aggregate;
pub mod analyzer;
pub mod batch;
pub mod extract;
pub mod retrieve;
pub mod rules;
pub mod sentences;
pub mod stance;
pub mod verify;

pub use aggregate::{deduplicate, AccuracyAggregator, Aggregate, Coverage};
pub use analyzer::{content_hash, Analyzer};
pub use batch::BatchOrchestrator;
pub use extract::{classify_claim, extract, ClaimExtractor, Extraction};
pub use retrieve::{Retrieval, SourceRetriever};
pub use rules::{
    FalsePrecisionRule, ImpossibleMetricRule, PatternRule, RuleSet, TechnicalImpossibilityRule,
    UnverifiableClaimRule,
};
pub use sentences::{split_sentences, Sentence};
pub use stance::classify_stance;
pub use verify::ClaimVerifier;
