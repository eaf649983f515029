// Common test utilities
#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;

use verification::{
    Analyzer, EngineConfig, KnowledgeQuery, KnowledgeSource, SourceKind, SourceRegistry,
};

static TRACING: Once = Once::new();

/// Install a fmt subscriber once per test binary.
///
/// Honors `RUST_LOG`; defaults to warnings plus debug output from this crate.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn,verification=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

/// A registry with one enabled source, `wiki`, at reliability 0.9.
pub fn single_source_registry() -> Arc<SourceRegistry> {
    Arc::new(
        SourceRegistry::new(vec![KnowledgeSource::new(
            "wiki",
            SourceKind::GeneralEncyclopedia,
            0.9,
        )])
        .unwrap(),
    )
}

/// A registry whose sources are all disabled.
pub fn disabled_registry() -> Arc<SourceRegistry> {
    Arc::new(
        SourceRegistry::new(vec![
            KnowledgeSource::new("wiki", SourceKind::GeneralEncyclopedia, 0.9).disabled(),
            KnowledgeSource::new("news", SourceKind::News, 0.6).disabled(),
        ])
        .unwrap(),
    )
}

/// Analyzer with a short per-query timeout.
pub fn fast_analyzer<Q: KnowledgeQuery>(backend: Q, registry: Arc<SourceRegistry>) -> Analyzer<Q> {
    let config = EngineConfig::default()
        .with_query_timeout(Duration::from_millis(50))
        .with_document_timeout(Duration::from_secs(5));
    Analyzer::with_config(Arc::new(backend), registry, config)
}
