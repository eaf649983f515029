//! Knowledge source registry.
//!
//! An immutable snapshot of the configured evidence sources. Build it once
//! at startup (or on config reload) and share it as `Arc<SourceRegistry>`;
//! concurrent analyses never observe the source list changing mid-run.

use indexmap::IndexMap;
use std::path::Path;

use crate::error::{RegistryError, RegistryResult};
use crate::types::source::KnowledgeSource;

/// Read-only set of knowledge sources, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: IndexMap<String, KnowledgeSource>,
}

impl SourceRegistry {
    /// Build a registry, validating ids and reliability weights.
    pub fn new(sources: impl IntoIterator<Item = KnowledgeSource>) -> RegistryResult<Self> {
        let mut map = IndexMap::new();

        for source in sources {
            if !(0.0..=1.0).contains(&source.reliability_score) {
                return Err(RegistryError::InvalidReliability {
                    id: source.id,
                    value: source.reliability_score,
                });
            }
            if map.contains_key(&source.id) {
                return Err(RegistryError::DuplicateSource { id: source.id });
            }
            map.insert(source.id.clone(), source);
        }

        Ok(Self { sources: map })
    }

    /// A registry with no sources.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a JSON array of sources.
    pub fn from_json(json: &str) -> RegistryResult<Self> {
        let sources: Vec<KnowledgeSource> = serde_json::from_str(json)?;
        Self::new(sources)
    }

    /// Load a JSON array of sources from disk.
    pub fn from_file(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let registry = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.as_ref().display(),
            sources = registry.len(),
            enabled = registry.total_enabled(),
            "Loaded knowledge source registry"
        );
        Ok(registry)
    }

    /// Sources that take part in verification, in configuration order.
    pub fn list_enabled_sources(&self) -> Vec<&KnowledgeSource> {
        self.sources.values().filter(|s| s.enabled).collect()
    }

    /// Look up a source by id.
    ///
    /// Callers treat `NotFound` as "skip this source".
    pub fn get_source(&self, id: &str) -> RegistryResult<&KnowledgeSource> {
        self.sources.get(id).ok_or_else(|| RegistryError::NotFound {
            id: id.to_string(),
        })
    }

    /// Number of enabled sources.
    pub fn total_enabled(&self) -> usize {
        self.sources.values().filter(|s| s.enabled).count()
    }

    /// Number of configured sources, enabled or not.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// All sources, in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &KnowledgeSource> {
        self.sources.values()
    }
}
