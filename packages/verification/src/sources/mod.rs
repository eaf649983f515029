//! Knowledge query backends.
//!
//! - [`CorpusKnowledgeBase`] - in-memory snippets, scored by keyword overlap
//! - [`TavilyKnowledgeSource`] - Tavily search API over HTTP
//! - [`RateLimitedQuery`] - wraps any backend with a `governor` rate limiter
//! - [`QueryRouter`] - sends each source id to its own backend

pub mod corpus;
pub mod rate_limited;
pub mod router;
pub mod tavily;

pub use corpus::{keyword_match, CorpusKnowledgeBase};
pub use rate_limited::{KnowledgeQueryExt, RateLimitedQuery, RateLimitedQueryBuilder};
pub use router::QueryRouter;
pub use tavily::TavilyKnowledgeSource;
