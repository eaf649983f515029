//! Knowledge source configuration types.

use serde::{Deserialize, Serialize};

/// Category of an evidence provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    GeneralEncyclopedia,
    Academic,
    News,
    Government,
    Custom,
}

/// Optional descriptive tags for a source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Domain the source is restricted to (e.g. "nih.gov").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Content language (e.g. "en").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Subject category (e.g. "medicine").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A configured evidence provider with a static reliability weight.
///
/// Read-only during analysis. Disabled sources are never queried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSource {
    /// Stable identifier
    pub id: String,

    /// Provider category
    pub kind: SourceKind,

    /// Static configured weight in [0, 1].
    pub reliability_score: f64,

    /// Whether the source takes part in verification.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub metadata: SourceMetadata,
}

fn default_enabled() -> bool {
    true
}

impl KnowledgeSource {
    /// Create an enabled source.
    pub fn new(id: impl Into<String>, kind: SourceKind, reliability_score: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            reliability_score,
            enabled: true,
            metadata: SourceMetadata::default(),
        }
    }

    /// Mark the source as disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Restrict the source to a domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.metadata.domain = Some(domain.into());
        self
    }

    /// Set the content language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.metadata.language = Some(language.into());
        self
    }

    /// Set the subject category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.metadata.category = Some(category.into());
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata.tags.push(tag.into());
        self
    }
}
