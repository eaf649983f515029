//! Per-request analysis options.

use serde::{Deserialize, Serialize};

/// How eagerly pattern findings are reported.
///
/// Sensitivity only moves the reporting cutoff; detection itself is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl Sensitivity {
    /// Minimum candidate confidence that gets reported.
    pub fn confidence_cutoff(&self) -> f64 {
        match self {
            Sensitivity::Low => 0.8,
            Sensitivity::Medium => 0.6,
            Sensitivity::High => 0.4,
        }
    }

    pub fn admits(&self, confidence: f64) -> bool {
        confidence >= self.confidence_cutoff()
    }
}

/// Options supplied with each piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    #[serde(default)]
    pub sensitivity: Sensitivity,

    /// Cross-reference claims against knowledge sources.
    ///
    /// Default: true.
    #[serde(default = "default_enable_rag")]
    pub enable_rag: bool,

    /// Maximum hallucinations kept in the result (highest confidence first).
    ///
    /// Default: 10.
    #[serde(default = "default_max_hallucinations")]
    pub max_hallucinations: usize,

    /// Include per-claim verification verdicts in the result.
    #[serde(default)]
    pub include_source_verification: bool,
}

fn default_enable_rag() -> bool {
    true
}

fn default_max_hallucinations() -> usize {
    10
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::default(),
            enable_rag: default_enable_rag(),
            max_hallucinations: default_max_hallucinations(),
            include_source_verification: false,
        }
    }
}

impl AnalysisOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pattern detection only, no knowledge source queries.
    pub fn pattern_only() -> Self {
        Self::default().with_rag(false)
    }

    /// Set sensitivity.
    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Enable or disable retrieval-augmented verification.
    pub fn with_rag(mut self, enabled: bool) -> Self {
        self.enable_rag = enabled;
        self
    }

    /// Set the hallucination list limit.
    pub fn with_max_hallucinations(mut self, max: usize) -> Self {
        self.max_hallucinations = max;
        self
    }

    /// Include per-claim verdicts in the result.
    pub fn with_source_verification(mut self) -> Self {
        self.include_source_verification = true;
        self
    }
}
