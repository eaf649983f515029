//! Rate-limited knowledge query wrapper.
//!
//! Wraps any KnowledgeQuery implementation with rate limiting using the
//! governor crate. Waiting for a permit counts against the query timeout
//! and stops as soon as the query is cancelled.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::{SourceError, SourceResult};
use crate::traits::knowledge::{KnowledgeQuery, QueryContext, SourceHit};
use crate::types::source::KnowledgeSource;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

/// A knowledge backend wrapper that enforces a request rate.
///
/// Clones share the same limiter.
pub struct RateLimitedQuery<Q: KnowledgeQuery> {
    inner: Q,
    limiter: Arc<DefaultRateLimiter>,
}

impl<Q: KnowledgeQuery + Clone> Clone for RateLimitedQuery<Q> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: self.limiter.clone(),
        }
    }
}

impl<Q: KnowledgeQuery> RateLimitedQuery<Q> {
    /// Allow `requests_per_second` queries per second (0 is treated as 1).
    pub fn new(inner: Q, requests_per_second: u32) -> Self {
        Self::with_quota(inner, Quota::per_second(non_zero(requests_per_second)))
    }

    pub fn with_quota(inner: Q, quota: Quota) -> Self {
        Self {
            inner,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Sustained rate plus a burst allowance.
    pub fn with_burst(inner: Q, requests_per_second: u32, burst: u32) -> Self {
        let quota = Quota::per_second(non_zero(requests_per_second)).allow_burst(non_zero(burst));
        Self::with_quota(inner, quota)
    }

    pub fn inner(&self) -> &Q {
        &self.inner
    }
}

#[async_trait]
impl<Q: KnowledgeQuery> KnowledgeQuery for RateLimitedQuery<Q> {
    async fn query(
        &self,
        source: &KnowledgeSource,
        claim: &str,
        ctx: &QueryContext,
    ) -> SourceResult<Vec<SourceHit>> {
        tokio::select! {
            _ = self.limiter.until_ready() => {}
            _ = ctx.cancel.cancelled() => return Err(SourceError::Cancelled),
        }
        self.inner.query(source, claim, ctx).await
    }
}

/// Builder for RateLimitedQuery.
pub struct RateLimitedQueryBuilder<Q: KnowledgeQuery> {
    inner: Q,
    requests_per_second: u32,
    burst: Option<u32>,
}

impl<Q: KnowledgeQuery> RateLimitedQueryBuilder<Q> {
    pub fn new(inner: Q) -> Self {
        Self {
            inner,
            requests_per_second: 1,
            burst: None,
        }
    }

    pub fn requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = rps;
        self
    }

    pub fn burst(mut self, burst: u32) -> Self {
        self.burst = Some(burst);
        self
    }

    pub fn build(self) -> RateLimitedQuery<Q> {
        match self.burst {
            Some(burst) => RateLimitedQuery::with_burst(self.inner, self.requests_per_second, burst),
            None => RateLimitedQuery::new(self.inner, self.requests_per_second),
        }
    }
}

/// Extension trait for easy rate limiting.
pub trait KnowledgeQueryExt: KnowledgeQuery + Sized {
    /// Wrap this backend with rate limiting.
    fn rate_limited(self, requests_per_second: u32) -> RateLimitedQuery<Self> {
        RateLimitedQuery::new(self, requests_per_second)
    }

    /// Wrap with rate limiting and burst support.
    fn rate_limited_with_burst(self, requests_per_second: u32, burst: u32) -> RateLimitedQuery<Self> {
        RateLimitedQuery::with_burst(self, requests_per_second, burst)
    }
}

impl<Q: KnowledgeQuery + Sized> KnowledgeQueryExt for Q {}
