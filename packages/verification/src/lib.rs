//! Content Verification Library
//!
//! Finds likely hallucinations in generated text and scores how accurate
//! it is, optionally checking each factual claim against external
//! knowledge sources.
//!
//! # Design Philosophy
//!
//! - Cheap pattern rules first, evidence second
//! - One I/O seam ([`KnowledgeQuery`]); everything else is pure and deterministic
//! - Source failures degrade coverage, never the whole analysis
//! - Library handles mechanics, app decides what to do with the findings
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use verification::{AnalysisOptions, Analyzer, CorpusKnowledgeBase, SourceRegistry};
//!
//! let registry = Arc::new(SourceRegistry::from_file("sources.json")?);
//! let corpus = CorpusKnowledgeBase::new()
//!     .with_snippet("encyclopedia", "Water boils at 100 degrees Celsius at sea level.");
//! let analyzer = Analyzer::new(Arc::new(corpus), registry);
//!
//! let result = analyzer
//!     .analyze("Water boils at exactly 99.7% efficiency.", &AnalysisOptions::default())
//!     .await?;
//!
//! println!("{:.1} {:?}", result.accuracy, result.risk_level);
//! for h in &result.hallucinations {
//!     println!("{:?} {:.2} {}", h.kind, h.confidence, h.text);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - The knowledge query seam
//! - [`types`] - Options, claims, evidence and results
//! - [`pipeline`] - Extraction, retrieval, verification, aggregation, batching
//! - [`registry`] - Immutable knowledge source snapshot
//! - [`sources`] - Query backends (corpus, Tavily, rate limiter, router)
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod pipeline;
pub mod registry;
pub mod security;
pub mod sources;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{AnalysisError, ConfigError, RegistryError, RetrievalError, SourceError};
pub use pipeline::{
    content_hash, AccuracyAggregator, Analyzer, BatchOrchestrator, ClaimExtractor, ClaimVerifier,
    PatternRule, RuleSet, SourceRetriever,
};
pub use registry::SourceRegistry;
pub use sources::{
    CorpusKnowledgeBase, KnowledgeQueryExt, QueryRouter, RateLimitedQuery, TavilyKnowledgeSource,
};
pub use traits::knowledge::{KnowledgeQuery, QueryContext, SourceHit};
pub use types::{
    analysis::{
        AnalysisResult, BatchDocument, BatchResult, BatchSummary, DocumentOutcome,
        RagEnhancement, RiskCounts, RiskLevel,
    },
    claim::{CandidateOrigin, ClaimKind, ClaimSpan, HallucinationCandidate, HallucinationKind},
    config::{EngineConfig, ReliabilityWeights},
    evidence::{
        ClaimVerification, ReliabilityAssessment, RetrievedDocument, Stance, VerificationStatus,
    },
    options::{AnalysisOptions, Sensitivity},
    source::{KnowledgeSource, SourceKind, SourceMetadata},
};

// Cancellation handle used by `analyze_with_cancel` and `run_batch_with_cancel`
pub use tokio_util::sync::CancellationToken;
