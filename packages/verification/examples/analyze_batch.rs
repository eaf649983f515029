//! Batch analysis - Reference Implementation
//!
//! Analyzes a handful of documents against a small offline corpus, or
//! against Tavily when `TAVILY_API_KEY` is set, and prints the findings.
//!
//! ```bash
//! RUST_LOG=verification=debug cargo run --example analyze_batch
//! ```

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verification::{
    AnalysisOptions, Analyzer, BatchDocument, BatchOrchestrator, CorpusKnowledgeBase,
    EngineConfig, KnowledgeQueryExt, KnowledgeSource, QueryRouter, SourceKind, SourceRegistry,
    TavilyKnowledgeSource,
};

fn registry() -> SourceRegistry {
    SourceRegistry::new(vec![
        KnowledgeSource::new("encyclopedia", SourceKind::GeneralEncyclopedia, 0.85)
            .with_domain("en.wikipedia.org"),
        KnowledgeSource::new("news", SourceKind::News, 0.6).with_domain("reuters.com"),
    ])
    .unwrap_or_else(|e| panic!("invalid demo registry: {}", e))
}

fn backend() -> QueryRouter {
    match TavilyKnowledgeSource::from_env() {
        Ok(tavily) => {
            tracing::info!("Using Tavily search");
            QueryRouter::new().with_fallback(tavily.rate_limited(5))
        }
        Err(e) => {
            tracing::info!("Tavily unavailable ({}), using offline corpus", e);
            let corpus = CorpusKnowledgeBase::new()
                .with_snippet("encyclopedia", "The Eiffel Tower is 330 metres (1,083 ft) tall.")
                .with_snippet("encyclopedia", "Water boils at 100 degrees Celsius at sea level.")
                .with_snippet("news", "The tower welcomed about 6 million visitors last year.");
            QueryRouter::new().with_fallback(corpus)
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,verification=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config = EngineConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Ignoring environment configuration: {}", e);
        EngineConfig::default()
    });

    let analyzer = Analyzer::with_config(Arc::new(backend()), Arc::new(registry()), config);
    let batch = BatchOrchestrator::new(analyzer);

    let documents = vec![
        BatchDocument::new("tower", "The Eiffel Tower is 330 meters tall."),
        BatchDocument::new(
            "marketing",
            "Our product achieves exactly 99.7% accuracy with zero false positives.",
        ),
        BatchDocument::new(
            "science",
            "Recent studies show water boils at 100 degrees Celsius at sea level.",
        ),
    ];

    let options = AnalysisOptions::new().with_source_verification();
    let result = batch.run_batch(documents, &options).await;

    for outcome in &result.results {
        match &outcome.result {
            Ok(analysis) => {
                println!(
                    "{}: accuracy {:.1}, risk {:?}, {} finding(s)",
                    outcome.id,
                    analysis.accuracy,
                    analysis.risk_level,
                    analysis.hallucinations.len()
                );
                for h in &analysis.hallucinations {
                    println!("  - {:?} ({:.2}): {}", h.kind, h.confidence, h.explanation);
                }
            }
            Err(e) => println!("{}: failed: {}", outcome.id, e),
        }
    }

    println!(
        "\n{} of {} documents analyzed, average accuracy {:.1}",
        result.summary.succeeded, result.summary.total_documents, result.summary.average_accuracy
    );
}
