//! Engine configuration.
//!
//! Values can be set programmatically with the `with_*` builders or loaded
//! from the environment (a `.env` file is honoured in development).

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

const ENV_MAX_CONCURRENT_QUERIES: &str = "VERIFICATION_MAX_CONCURRENT_QUERIES";
const ENV_WORKER_COUNT: &str = "VERIFICATION_WORKER_COUNT";
const ENV_QUERY_TIMEOUT_MS: &str = "VERIFICATION_QUERY_TIMEOUT_MS";
const ENV_DOCUMENT_TIMEOUT_MS: &str = "VERIFICATION_DOCUMENT_TIMEOUT_MS";
const ENV_MIN_RELEVANCE: &str = "VERIFICATION_MIN_RELEVANCE";
const ENV_MAX_CONTENT_BYTES: &str = "VERIFICATION_MAX_CONTENT_BYTES";

/// Weights combining the reliability components into `overall_score`.
///
/// Defaults to an unweighted mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityWeights {
    pub source_quality: f64,
    pub consensus_level: f64,
    pub recency: f64,
}

impl Default for ReliabilityWeights {
    fn default() -> Self {
        Self {
            source_quality: 1.0,
            consensus_level: 1.0,
            recency: 1.0,
        }
    }
}

impl ReliabilityWeights {
    /// Weighted mean of the three components, in [0, 1].
    pub fn combine(&self, source_quality: f64, consensus_level: f64, recency: f64) -> f64 {
        let total = self.source_quality + self.consensus_level + self.recency;
        if total <= 0.0 {
            return 0.0;
        }
        let score = (source_quality * self.source_quality
            + consensus_level * self.consensus_level
            + recency * self.recency)
            / total;
        score.clamp(0.0, 1.0)
    }
}

/// Configuration for the analysis engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Global cap on in-flight knowledge source queries, shared by every
    /// document of a batch.
    ///
    /// Default: 12.
    pub max_concurrent_queries: usize,

    /// Documents analyzed at once by the batch orchestrator.
    ///
    /// Default: 4.
    pub worker_count: usize,

    /// Timeout for a single knowledge source query.
    ///
    /// Default: 5000ms.
    pub query_timeout_ms: u64,

    /// Wall-clock limit for one document, however many claims it has.
    ///
    /// Default: 60000ms.
    pub document_timeout_ms: u64,

    /// Retrieved documents below this relevance are dropped.
    ///
    /// Default: 0.3.
    pub min_relevance: f64,

    /// Largest content accepted for analysis.
    ///
    /// Default: 1 MiB.
    pub max_content_bytes: usize,

    /// Verification-derived hallucinations need more than this confidence.
    ///
    /// Default: 0.6.
    pub verdict_hallucination_threshold: f64,

    /// Age (in days) at which a dated document's recency reaches zero.
    ///
    /// Default: 3650 (ten years).
    pub recency_horizon_days: u32,

    #[serde(default)]
    pub reliability_weights: ReliabilityWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_queries: 12,
            worker_count: 4,
            query_timeout_ms: 5_000,
            document_timeout_ms: 60_000,
            min_relevance: 0.3,
            max_content_bytes: 1024 * 1024,
            verdict_hallucination_threshold: 0.6,
            recency_horizon_days: 3650,
            reliability_weights: ReliabilityWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults; set but unparseable ones are
    /// an error.
    pub fn from_env() -> ConfigResult<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let config = Self {
            max_concurrent_queries: env_or(ENV_MAX_CONCURRENT_QUERIES, defaults.max_concurrent_queries)?,
            worker_count: env_or(ENV_WORKER_COUNT, defaults.worker_count)?,
            query_timeout_ms: env_or(ENV_QUERY_TIMEOUT_MS, defaults.query_timeout_ms)?,
            document_timeout_ms: env_or(ENV_DOCUMENT_TIMEOUT_MS, defaults.document_timeout_ms)?,
            min_relevance: env_or(ENV_MIN_RELEVANCE, defaults.min_relevance)?,
            max_content_bytes: env_or(ENV_MAX_CONTENT_BYTES, defaults.max_content_bytes)?,
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that limits are usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrent_queries == 0 {
            return Err(invalid(ENV_MAX_CONCURRENT_QUERIES, "0", "must be at least 1"));
        }
        if self.worker_count == 0 {
            return Err(invalid(ENV_WORKER_COUNT, "0", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.min_relevance) {
            return Err(invalid(
                ENV_MIN_RELEVANCE,
                &self.min_relevance.to_string(),
                "must be within [0, 1]",
            ));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn document_timeout(&self) -> Duration {
        Duration::from_millis(self.document_timeout_ms)
    }

    /// Set the global query concurrency.
    pub fn with_max_concurrent_queries(mut self, max: usize) -> Self {
        self.max_concurrent_queries = max;
        self
    }

    /// Set the number of documents analyzed concurrently.
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    /// Set the per-query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the per-document timeout.
    pub fn with_document_timeout(mut self, timeout: Duration) -> Self {
        self.document_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the minimum document relevance.
    pub fn with_min_relevance(mut self, min: f64) -> Self {
        self.min_relevance = min;
        self
    }

    /// Set the content size limit.
    pub fn with_max_content_bytes(mut self, max: usize) -> Self {
        self.max_content_bytes = max;
        self
    }

    /// Set the reliability component weights.
    pub fn with_reliability_weights(mut self, weights: ReliabilityWeights) -> Self {
        self.reliability_weights = weights;
        self
    }
}

fn env_or<T>(key: &str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(key, &raw, &e.to_string())),
        Err(_) => Ok(default),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
