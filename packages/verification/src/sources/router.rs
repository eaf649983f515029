//! Per-source backend routing.
//!
//! A registry usually mixes backends: a local corpus for one source, a
//! rate-limited search API for another. The router holds one backend per
//! source id and forwards each query to it.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;

use crate::error::{SourceError, SourceResult};
use crate::traits::knowledge::{KnowledgeQuery, QueryContext, SourceHit};
use crate::types::source::KnowledgeSource;

/// Dispatches queries to a backend chosen by source id.
#[derive(Clone, Default)]
pub struct QueryRouter {
    routes: IndexMap<String, Arc<dyn KnowledgeQuery>>,
    fallback: Option<Arc<dyn KnowledgeQuery>>,
}

impl QueryRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `source_id` to `backend`, replacing any earlier route.
    pub fn route(mut self, source_id: impl Into<String>, backend: impl KnowledgeQuery + 'static) -> Self {
        self.routes.insert(source_id.into(), Arc::new(backend));
        self
    }

    /// Route `source_id` to a backend that is shared with other routes.
    pub fn route_shared(mut self, source_id: impl Into<String>, backend: Arc<dyn KnowledgeQuery>) -> Self {
        self.routes.insert(source_id.into(), backend);
        self
    }

    /// Backend for every source without its own route.
    pub fn with_fallback(mut self, backend: impl KnowledgeQuery + 'static) -> Self {
        self.fallback = Some(Arc::new(backend));
        self
    }

    /// Routed source ids, in insertion order.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn is_routed(&self, source_id: &str) -> bool {
        self.routes.contains_key(source_id) || self.fallback.is_some()
    }

    fn backend_for(&self, source_id: &str) -> Option<&Arc<dyn KnowledgeQuery>> {
        self.routes.get(source_id).or(self.fallback.as_ref())
    }
}

impl std::fmt::Debug for QueryRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRouter")
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

#[async_trait]
impl KnowledgeQuery for QueryRouter {
    async fn query(
        &self,
        source: &KnowledgeSource,
        claim: &str,
        ctx: &QueryContext,
    ) -> SourceResult<Vec<SourceHit>> {
        let backend = self
            .backend_for(&source.id)
            .ok_or_else(|| SourceError::NotRouted {
                source_id: source.id.clone(),
            })?;
        backend.query(source, claim, ctx).await
    }
}
