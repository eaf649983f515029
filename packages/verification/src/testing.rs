//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the verification
//! library without querying real knowledge sources.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{SourceError, SourceResult};
use crate::registry::SourceRegistry;
use crate::traits::knowledge::{KnowledgeQuery, QueryContext, SourceHit};
use crate::types::source::{KnowledgeSource, SourceKind};

/// A mock knowledge backend for testing.
///
/// Returns configurable hits per source, optionally only for claims that
/// contain a given substring, and can simulate failures and slow sources.
/// Unconfigured sources answer with no hits.
#[derive(Default, Clone)]
pub struct MockKnowledgeQuery {
    /// Hits returned for every claim, by source id
    hits: Arc<RwLock<HashMap<String, Vec<SourceHit>>>>,

    /// (source id, claim substring, hit)
    claim_hits: Arc<RwLock<Vec<(String, String, SourceHit)>>>,

    /// Sources that always fail
    failures: Arc<RwLock<HashSet<String>>>,

    /// Delay before answering, by source id
    delays: Arc<RwLock<HashMap<String, Duration>>>,

    /// Delay before answering claims containing a substring, for every source
    claim_delays: Arc<RwLock<Vec<(String, Duration)>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockQueryCall>>>,
}

/// Record of a query made to the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockQueryCall {
    pub source_id: String,
    pub claim: String,
}

impl MockKnowledgeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `hit` from `source_id` for every claim.
    pub fn with_hit(self, source_id: impl Into<String>, hit: SourceHit) -> Self {
        self.hits
            .write()
            .unwrap()
            .entry(source_id.into())
            .or_default()
            .push(hit);
        self
    }

    /// Return `hit` from `source_id` only for claims containing `needle`.
    pub fn with_claim_hit(
        self,
        source_id: impl Into<String>,
        needle: impl Into<String>,
        hit: SourceHit,
    ) -> Self {
        self.claim_hits
            .write()
            .unwrap()
            .push((source_id.into(), needle.into(), hit));
        self
    }

    /// Make every query to `source_id` fail.
    pub fn with_failure(self, source_id: impl Into<String>) -> Self {
        self.failures.write().unwrap().insert(source_id.into());
        self
    }

    /// Delay every answer from `source_id`.
    pub fn with_delay(self, source_id: impl Into<String>, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(source_id.into(), delay);
        self
    }

    /// Delay answers, from any source, for claims containing `needle`.
    pub fn with_claim_delay(self, needle: impl Into<String>, delay: Duration) -> Self {
        self.claim_delays
            .write()
            .unwrap()
            .push((needle.into(), delay));
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockQueryCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Calls made to one source.
    pub fn calls_for(&self, source_id: &str) -> Vec<MockQueryCall> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.source_id == source_id)
            .cloned()
            .collect()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn delay_for(&self, source_id: &str, claim: &str) -> Option<Duration> {
        let source_delay = self.delays.read().unwrap().get(source_id).copied();
        let claim_delay = self
            .claim_delays
            .read()
            .unwrap()
            .iter()
            .filter(|(needle, _)| claim.contains(needle.as_str()))
            .map(|(_, d)| *d)
            .max();
        source_delay.max(claim_delay)
    }

    fn hits_for(&self, source_id: &str, claim: &str) -> Vec<SourceHit> {
        let mut hits = self
            .hits
            .read()
            .unwrap()
            .get(source_id)
            .cloned()
            .unwrap_or_default();
        hits.extend(
            self.claim_hits
                .read()
                .unwrap()
                .iter()
                .filter(|(id, needle, _)| id == source_id && claim.contains(needle.as_str()))
                .map(|(_, _, hit)| hit.clone()),
        );
        hits
    }
}

#[async_trait]
impl KnowledgeQuery for MockKnowledgeQuery {
    async fn query(
        &self,
        source: &KnowledgeSource,
        claim: &str,
        ctx: &QueryContext,
    ) -> SourceResult<Vec<SourceHit>> {
        self.calls.write().unwrap().push(MockQueryCall {
            source_id: source.id.clone(),
            claim: claim.to_string(),
        });

        if let Some(delay) = self.delay_for(&source.id, claim) {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = ctx.cancel.cancelled() => return Err(SourceError::Cancelled),
            }
        }

        if self.failures.read().unwrap().contains(&source.id) {
            return Err(SourceError::Unavailable {
                source_id: source.id.clone(),
                reason: "mock failure".to_string(),
            });
        }

        Ok(self.hits_for(&source.id, claim))
    }
}

/// A small source set: three enabled sources and one disabled.
///
/// | id             | kind                | reliability |
/// |----------------|---------------------|-------------|
/// | `encyclopedia` | GeneralEncyclopedia | 0.85        |
/// | `journals`     | Academic            | 0.95        |
/// | `newswire`     | News                | 0.6         |
/// | `archive`      | Custom (disabled)   | 0.5         |
pub fn fixture_sources() -> Vec<KnowledgeSource> {
    vec![
        KnowledgeSource::new("encyclopedia", SourceKind::GeneralEncyclopedia, 0.85)
            .with_language("en"),
        KnowledgeSource::new("journals", SourceKind::Academic, 0.95).with_category("science"),
        KnowledgeSource::new("newswire", SourceKind::News, 0.6),
        KnowledgeSource::new("archive", SourceKind::Custom, 0.5).disabled(),
    ]
}

/// Registry built from [`fixture_sources`].
pub fn fixture_registry() -> SourceRegistry {
    SourceRegistry::new(fixture_sources()).expect("fixture sources are valid")
}
